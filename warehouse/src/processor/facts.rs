use super::dimensions::{DimensionTables, coord_key};
use crate::models::{FactRow, RawTripRecord};
use crate::schema::{DIM_LOCATION, DIM_PASSENGER, DIM_PAYMENT, WarehouseTable};
use arrow::array::{ArrayRef, Float64Array, Int64Array};
use arrow::record_batch::RecordBatch;
use common::{Error, Result};
use std::sync::Arc;

pub struct FactResolver;

impl FactResolver {
    /// Assembles one fact row per raw record by resolving its natural keys
    /// through the dimension indexes.
    ///
    /// The datetime key is the row index itself (identity join, 1:1 with the
    /// non-deduplicated datetime dimension). The other three dimensions were
    /// built from this same batch, so a missing index entry is an internal
    /// inconsistency and fails the run rather than silently dropping the row.
    pub fn resolve(records: &[RawTripRecord], dims: &DimensionTables) -> Result<Vec<FactRow>> {
        let mut facts = Vec::with_capacity(records.len());

        for (row_idx, record) in records.iter().enumerate() {
            let location_id = *dims.location_index.get(&coord_key(record)).ok_or_else(|| {
                Error::UnresolvedKey {
                    dimension: DIM_LOCATION.to_string(),
                    key: format!(
                        "({}, {}) -> ({}, {})",
                        record.pickup_latitude,
                        record.pickup_longitude,
                        record.dropoff_latitude,
                        record.dropoff_longitude
                    ),
                }
            })?;

            let payment_id = *dims
                .payment_index
                .get(&record.payment_type)
                .ok_or_else(|| Error::UnresolvedKey {
                    dimension: DIM_PAYMENT.to_string(),
                    key: record.payment_type.to_string(),
                })?;

            let passenger_id = *dims
                .passenger_index
                .get(&record.passenger_count)
                .ok_or_else(|| Error::UnresolvedKey {
                    dimension: DIM_PASSENGER.to_string(),
                    key: record.passenger_count.to_string(),
                })?;

            facts.push(FactRow {
                trip_id: row_idx as i64,
                datetime_id: row_idx as i64,
                location_id,
                payment_id,
                passenger_id,
                trip_distance: record.trip_distance,
                trip_duration: record.trip_duration_seconds(),
                fare_amount: record.fare_amount,
                tip_amount: record.tip_amount,
                total_amount: record.total_amount,
            });
        }

        Ok(facts)
    }
}

pub fn fact_batch(rows: &[FactRow]) -> Result<RecordBatch> {
    let columns: Vec<ArrayRef> = vec![
        Arc::new(Int64Array::from_iter_values(rows.iter().map(|r| r.trip_id))),
        Arc::new(Int64Array::from_iter_values(
            rows.iter().map(|r| r.datetime_id),
        )),
        Arc::new(Int64Array::from_iter_values(
            rows.iter().map(|r| r.location_id),
        )),
        Arc::new(Int64Array::from_iter_values(
            rows.iter().map(|r| r.payment_id),
        )),
        Arc::new(Int64Array::from_iter_values(
            rows.iter().map(|r| r.passenger_id),
        )),
        Arc::new(Float64Array::from_iter_values(
            rows.iter().map(|r| r.trip_distance),
        )),
        Arc::new(Int64Array::from_iter_values(
            rows.iter().map(|r| r.trip_duration),
        )),
        Arc::new(Float64Array::from_iter_values(
            rows.iter().map(|r| r.fare_amount),
        )),
        Arc::new(Float64Array::from_iter_values(
            rows.iter().map(|r| r.tip_amount),
        )),
        Arc::new(Float64Array::from_iter_values(
            rows.iter().map(|r| r.total_amount),
        )),
    ];
    RecordBatch::try_new(WarehouseTable::FactTrips.schema(), columns).map_err(Into::into)
}
