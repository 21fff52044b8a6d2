use arrow::error::ArrowError;
use datafusion::error::DataFusionError;
use parquet::errors::ParquetError;
use thiserror::Error;

pub mod config;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ::config::ConfigError),

    #[error("Parquet error: {0}")]
    Parquet(#[from] ParquetError),

    #[error("Arrow error: {0}")]
    Arrow(#[from] ArrowError),

    #[error("DataFusion error: {0}")]
    DataFusion(#[from] DataFusionError),

    #[error("Missing required columns: {missing:?}")]
    MissingColumns { missing: Vec<String> },

    #[error("Found {count} orphaned rows in {table}.{column}")]
    OrphanedReference {
        table: String,
        column: String,
        count: u64,
    },

    #[error("Found {count} rows violating the value domain of {field}")]
    DomainViolation { field: String, count: u64 },

    #[error("Found null values in required fields: {fields:?}")]
    NullField { fields: Vec<String> },

    #[error("Could not resolve {key} against the {dimension} dimension")]
    UnresolvedKey { dimension: String, key: String },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("{0}")]
    Other(String),
}
