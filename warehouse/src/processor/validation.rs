use crate::schema::{DIM_DATETIME, DIM_LOCATION, DIM_PASSENGER, DIM_PAYMENT, FACT_TRIPS};
use crate::storage::StorageEngine;
use common::{Error, Result};
use tracing::info;

/// Foreign-key columns and the dimension table each must resolve against.
const FOREIGN_KEYS: [(&str, &str); 4] = [
    (DIM_DATETIME, "datetime_id"),
    (DIM_LOCATION, "location_id"),
    (DIM_PAYMENT, "payment_id"),
    (DIM_PASSENGER, "passenger_id"),
];

/// Measures that must be non-negative across all fact rows.
const NON_NEGATIVE_MEASURES: [&str; 3] = ["trip_distance", "trip_duration", "fare_amount"];

/// Columns of the fact table that must never contain a missing value.
const REQUIRED_FACT_COLUMNS: [&str; 10] = [
    "trip_id",
    "datetime_id",
    "location_id",
    "payment_id",
    "passenger_id",
    "trip_distance",
    "trip_duration",
    "fare_amount",
    "tip_amount",
    "total_amount",
];

/// Post-load gate verifying referential and value integrity. Runs strictly
/// after the full fact table is materialized in the engine; any violation
/// aborts the run.
pub struct ConsistencyValidator;

impl ConsistencyValidator {
    pub async fn validate(engine: &StorageEngine) -> Result<()> {
        Self::check_references(engine).await?;
        Self::check_value_domains(engine).await?;
        Self::check_nulls(engine).await?;
        info!("Consistency checks passed");
        Ok(())
    }

    /// Left anti-join count per foreign key; a nonzero count means orphaned
    /// fact rows.
    async fn check_references(engine: &StorageEngine) -> Result<()> {
        for (dimension, column) in FOREIGN_KEYS {
            let query = format!(
                "SELECT COUNT(*) FROM {FACT_TRIPS} f \
                 LEFT JOIN {dimension} d ON f.{column} = d.{column} \
                 WHERE d.{column} IS NULL"
            );
            let orphans = engine.count(&query).await?;
            if orphans > 0 {
                return Err(Error::OrphanedReference {
                    table: FACT_TRIPS.to_string(),
                    column: column.to_string(),
                    count: orphans as u64,
                });
            }
        }
        Ok(())
    }

    async fn check_value_domains(engine: &StorageEngine) -> Result<()> {
        for field in NON_NEGATIVE_MEASURES {
            let query = format!("SELECT COUNT(*) FROM {FACT_TRIPS} WHERE {field} < 0");
            let violations = engine.count(&query).await?;
            if violations > 0 {
                return Err(Error::DomainViolation {
                    field: field.to_string(),
                    count: violations as u64,
                });
            }
        }
        Ok(())
    }

    async fn check_nulls(engine: &StorageEngine) -> Result<()> {
        let mut fields = Vec::new();
        for column in REQUIRED_FACT_COLUMNS {
            let query = format!("SELECT COUNT(*) FROM {FACT_TRIPS} WHERE {column} IS NULL");
            if engine.count(&query).await? > 0 {
                fields.push(column.to_string());
            }
        }
        if fields.is_empty() {
            Ok(())
        } else {
            Err(Error::NullField { fields })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FactRow, RawTripRecord, parse_datetime};
    use crate::processor::WarehouseProcessor;
    use crate::processor::facts::fact_batch;

    fn record(fare: f64, distance: f64) -> RawTripRecord {
        RawTripRecord {
            pickup_datetime: parse_datetime("2016-03-01 08:00:00").unwrap(),
            dropoff_datetime: parse_datetime("2016-03-01 08:20:00").unwrap(),
            pickup_latitude: 40.71,
            pickup_longitude: -74.0,
            dropoff_latitude: 40.75,
            dropoff_longitude: -73.98,
            passenger_count: 1,
            trip_distance: distance,
            payment_type: 1,
            fare_amount: fare,
            tip_amount: 1.0,
            total_amount: fare + 1.0,
        }
    }

    #[tokio::test]
    async fn test_valid_batch_passes() {
        let processor = WarehouseProcessor::new(StorageEngine::new());
        processor
            .load_batch(&[record(10.0, 2.0), record(20.0, 4.5)])
            .await
            .unwrap();
        processor.validate().await.unwrap();
    }

    #[tokio::test]
    async fn test_empty_batch_passes_trivially() {
        let processor = WarehouseProcessor::new(StorageEngine::new());
        processor.load_batch(&[]).await.unwrap();
        processor.validate().await.unwrap();
    }

    #[tokio::test]
    async fn test_negative_fare_is_a_domain_violation() {
        let processor = WarehouseProcessor::new(StorageEngine::new());
        processor
            .load_batch(&[record(10.0, 2.0), record(-5.0, 1.0)])
            .await
            .unwrap();

        let err = processor.validate().await.unwrap_err();
        match err {
            Error::DomainViolation { field, count } => {
                assert_eq!(field, "fare_amount");
                assert_eq!(count, 1);
            }
            other => panic!("Expected DomainViolation, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_negative_distance_is_a_domain_violation() {
        let processor = WarehouseProcessor::new(StorageEngine::new());
        processor.load_batch(&[record(10.0, -2.0)]).await.unwrap();

        let err = processor.validate().await.unwrap_err();
        match err {
            Error::DomainViolation { field, .. } => assert_eq!(field, "trip_distance"),
            other => panic!("Expected DomainViolation, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_varied_batch_loads_without_orphans() {
        // Deterministic pseudo-random batch with heavy natural-key
        // duplication and edge-case payment codes.
        fn next(state: &mut u64) -> u64 {
            *state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            *state >> 33
        }

        let base = parse_datetime("2016-03-01 00:00:00").unwrap();
        let mut state = 0x9E3779B97F4A7C15_u64;
        let mut records = Vec::new();
        for i in 0..200 {
            let pickup = base + chrono::Duration::minutes(i);
            let dropoff = pickup + chrono::Duration::seconds((next(&mut state) % 3600) as i64);
            records.push(RawTripRecord {
                pickup_datetime: pickup,
                dropoff_datetime: dropoff,
                pickup_latitude: 40.70 + (next(&mut state) % 5) as f64 * 0.01,
                pickup_longitude: -74.00 + (next(&mut state) % 5) as f64 * 0.01,
                dropoff_latitude: 40.75,
                dropoff_longitude: -73.98,
                passenger_count: (next(&mut state) % 4) as i64,
                trip_distance: (next(&mut state) % 200) as f64 / 10.0,
                payment_type: (next(&mut state) % 7) as i64 - 1,
                fare_amount: (next(&mut state) % 500) as f64 / 10.0,
                tip_amount: (next(&mut state) % 100) as f64 / 10.0,
                total_amount: (next(&mut state) % 600) as f64 / 10.0,
            });
        }

        let processor = WarehouseProcessor::new(StorageEngine::new());
        processor.load_batch(&records).await.unwrap();
        processor.validate().await.unwrap();

        let facts = processor
            .engine()
            .count(&format!("SELECT COUNT(*) FROM {FACT_TRIPS}"))
            .await
            .unwrap();
        assert_eq!(facts, 200);
    }

    #[tokio::test]
    async fn test_orphaned_fact_row_is_detected() {
        let processor = WarehouseProcessor::new(StorageEngine::new());
        processor.load_batch(&[record(10.0, 2.0)]).await.unwrap();

        // Overwrite the fact table with a row pointing at a datetime key the
        // dimension does not contain.
        let orphan = FactRow {
            trip_id: 0,
            datetime_id: 99,
            location_id: 0,
            payment_id: 0,
            passenger_id: 0,
            trip_distance: 1.0,
            trip_duration: 60,
            fare_amount: 5.0,
            tip_amount: 0.0,
            total_amount: 5.0,
        };
        processor
            .engine()
            .publish_table(FACT_TRIPS, fact_batch(&[orphan]).unwrap())
            .unwrap();

        let err = processor.validate().await.unwrap_err();
        match err {
            Error::OrphanedReference { column, count, .. } => {
                assert_eq!(column, "datetime_id");
                assert_eq!(count, 1);
            }
            other => panic!("Expected OrphanedReference, got {other:?}"),
        }
    }
}
