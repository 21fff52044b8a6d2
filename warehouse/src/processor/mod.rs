pub mod dimensions;
pub mod facts;
pub mod validation;

pub use dimensions::{DimensionBuilder, DimensionTables};
pub use facts::FactResolver;
pub use validation::ConsistencyValidator;

use crate::models::RawTripRecord;
use crate::schema::{
    DIM_DATETIME, DIM_LOCATION, DIM_PASSENGER, DIM_PAYMENT, FACT_TRIPS, WarehouseTable,
};
use crate::storage::StorageEngine;
use common::Result;
use std::fs;
use std::path::Path;
use tracing::info;

/// Coordinates the transformation stages over a shared engine handle:
/// dimension build, fact resolution, table publication, the consistency
/// gate, and parquet persistence.
pub struct WarehouseProcessor {
    engine: StorageEngine,
}

impl WarehouseProcessor {
    pub fn new(engine: StorageEngine) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &StorageEngine {
        &self.engine
    }

    /// Rebuilds all five tables from the raw batch and publishes them.
    /// Dimensions are derived first; fact resolution then joins through
    /// their indexes before anything is registered, so a resolution failure
    /// never publishes half a star schema.
    pub async fn load_batch(&self, records: &[RawTripRecord]) -> Result<()> {
        let dims = DimensionBuilder::build(records);
        let facts = FactResolver::resolve(records, &dims)?;

        info!(
            datetime = dims.datetime.len(),
            location = dims.location.len(),
            payment = dims.payment.len(),
            passenger = dims.passenger.len(),
            facts = facts.len(),
            "Resolved star schema from raw batch"
        );

        self.engine
            .publish_table(DIM_DATETIME, dimensions::datetime_batch(&dims.datetime)?)?;
        self.engine
            .publish_table(DIM_LOCATION, dimensions::location_batch(&dims.location)?)?;
        self.engine
            .publish_table(DIM_PAYMENT, dimensions::payment_batch(&dims.payment)?)?;
        self.engine
            .publish_table(DIM_PASSENGER, dimensions::passenger_batch(&dims.passenger)?)?;
        self.engine
            .publish_table(FACT_TRIPS, facts::fact_batch(&facts)?)?;

        Ok(())
    }

    /// Post-load referential and value-domain gate.
    pub async fn validate(&self) -> Result<()> {
        ConsistencyValidator::validate(&self.engine).await
    }

    /// Writes every published table as parquet under `dir`.
    pub async fn persist_tables(&self, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir)?;
        for table in WarehouseTable::ALL {
            self.engine.persist_parquet(table.name(), dir).await?;
        }
        Ok(())
    }
}
