use arrow::datatypes::{DataType, Field, Schema, SchemaRef, TimeUnit};
use common::{Error, Result};
use lazy_static::lazy_static;
use std::sync::Arc;

pub const DIM_DATETIME: &str = "dim_datetime";
pub const DIM_LOCATION: &str = "dim_location";
pub const DIM_PAYMENT: &str = "dim_payment";
pub const DIM_PASSENGER: &str = "dim_passenger";
pub const FACT_TRIPS: &str = "fact_trips";

/// Columns every raw trip file must provide before any transformation runs.
pub const REQUIRED_RAW_COLUMNS: [&str; 12] = [
    "pickup_datetime",
    "dropoff_datetime",
    "pickup_latitude",
    "pickup_longitude",
    "dropoff_latitude",
    "dropoff_longitude",
    "passenger_count",
    "trip_distance",
    "payment_type",
    "fare_amount",
    "tip_amount",
    "total_amount",
];

/// Checks the raw header set against [`REQUIRED_RAW_COLUMNS`]. Extra columns
/// are allowed; a missing required column aborts the whole pipeline.
pub fn validate_columns<S: AsRef<str>>(columns: &[S]) -> Result<()> {
    let missing: Vec<String> = REQUIRED_RAW_COLUMNS
        .iter()
        .filter(|required| !columns.iter().any(|c| c.as_ref() == **required))
        .map(|required| required.to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(Error::MissingColumns { missing })
    }
}

pub fn dim_datetime_schema() -> Schema {
    Schema::new(vec![
        Field::new("datetime_id", DataType::Int64, false),
        Field::new(
            "pickup_datetime",
            DataType::Timestamp(TimeUnit::Second, None),
            false,
        ),
        Field::new("pickup_hour", DataType::Int64, false),
        Field::new("pickup_day", DataType::Int64, false),
        Field::new("pickup_month", DataType::Int64, false),
        Field::new("pickup_year", DataType::Int64, false),
        Field::new("pickup_weekday", DataType::Int64, false),
        Field::new(
            "dropoff_datetime",
            DataType::Timestamp(TimeUnit::Second, None),
            false,
        ),
        Field::new("dropoff_hour", DataType::Int64, false),
        Field::new("dropoff_day", DataType::Int64, false),
        Field::new("dropoff_month", DataType::Int64, false),
        Field::new("dropoff_year", DataType::Int64, false),
        Field::new("dropoff_weekday", DataType::Int64, false),
    ])
}

pub fn dim_location_schema() -> Schema {
    Schema::new(vec![
        Field::new("location_id", DataType::Int64, false),
        Field::new("pickup_latitude", DataType::Float64, false),
        Field::new("pickup_longitude", DataType::Float64, false),
        Field::new("dropoff_latitude", DataType::Float64, false),
        Field::new("dropoff_longitude", DataType::Float64, false),
    ])
}

pub fn dim_payment_schema() -> Schema {
    Schema::new(vec![
        Field::new("payment_id", DataType::Int64, false),
        Field::new("payment_type", DataType::Int64, false),
        Field::new("payment_name", DataType::Utf8, false),
        Field::new("payment_description", DataType::Utf8, false),
    ])
}

pub fn dim_passenger_schema() -> Schema {
    Schema::new(vec![
        Field::new("passenger_id", DataType::Int64, false),
        Field::new("passenger_count", DataType::Int64, false),
    ])
}

pub fn fact_trips_schema() -> Schema {
    Schema::new(vec![
        Field::new("trip_id", DataType::Int64, false),
        Field::new("datetime_id", DataType::Int64, false),
        Field::new("location_id", DataType::Int64, false),
        Field::new("payment_id", DataType::Int64, false),
        Field::new("passenger_id", DataType::Int64, false),
        Field::new("trip_distance", DataType::Float64, false),
        Field::new("trip_duration", DataType::Int64, false),
        Field::new("fare_amount", DataType::Float64, false),
        Field::new("tip_amount", DataType::Float64, false),
        Field::new("total_amount", DataType::Float64, false),
    ])
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarehouseTable {
    Datetime,
    Location,
    Payment,
    Passenger,
    FactTrips,
}

impl WarehouseTable {
    pub const ALL: [WarehouseTable; 5] = [
        WarehouseTable::Datetime,
        WarehouseTable::Location,
        WarehouseTable::Payment,
        WarehouseTable::Passenger,
        WarehouseTable::FactTrips,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            WarehouseTable::Datetime => DIM_DATETIME,
            WarehouseTable::Location => DIM_LOCATION,
            WarehouseTable::Payment => DIM_PAYMENT,
            WarehouseTable::Passenger => DIM_PASSENGER,
            WarehouseTable::FactTrips => FACT_TRIPS,
        }
    }

    pub fn schema(&self) -> SchemaRef {
        match self {
            WarehouseTable::Datetime => DIM_DATETIME_SCHEMA.clone(),
            WarehouseTable::Location => DIM_LOCATION_SCHEMA.clone(),
            WarehouseTable::Payment => DIM_PAYMENT_SCHEMA.clone(),
            WarehouseTable::Passenger => DIM_PASSENGER_SCHEMA.clone(),
            WarehouseTable::FactTrips => FACT_TRIPS_SCHEMA.clone(),
        }
    }
}

// Lazy-loaded static schemas
lazy_static! {
    static ref DIM_DATETIME_SCHEMA: SchemaRef = Arc::new(dim_datetime_schema());
    static ref DIM_LOCATION_SCHEMA: SchemaRef = Arc::new(dim_location_schema());
    static ref DIM_PAYMENT_SCHEMA: SchemaRef = Arc::new(dim_payment_schema());
    static ref DIM_PASSENGER_SCHEMA: SchemaRef = Arc::new(dim_passenger_schema());
    static ref FACT_TRIPS_SCHEMA: SchemaRef = Arc::new(fact_trips_schema());
}
