use crate::models::{DatetimeRow, LocationRow, PassengerRow, PaymentRow, RawTripRecord};
use crate::schema::WarehouseTable;
use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray, TimestampSecondArray};
use arrow::record_batch::RecordBatch;
use common::Result;
use std::collections::HashMap;
use std::sync::Arc;

/// Natural key for the location dimension: the four coordinates compared by
/// bit pattern, making exact `f64` equality hashable.
pub type CoordKey = [u64; 4];

pub fn coord_key(record: &RawTripRecord) -> CoordKey {
    [
        record.pickup_latitude.to_bits(),
        record.pickup_longitude.to_bits(),
        record.dropoff_latitude.to_bits(),
        record.dropoff_longitude.to_bits(),
    ]
}

/// The four dimension tables plus the natural-key → surrogate-key indexes
/// the Fact Resolver joins through. Surrogate keys are assigned in
/// first-seen order, so a fixed input order yields identical tables.
pub struct DimensionTables {
    pub datetime: Vec<DatetimeRow>,
    pub location: Vec<LocationRow>,
    pub payment: Vec<PaymentRow>,
    pub passenger: Vec<PassengerRow>,
    pub location_index: HashMap<CoordKey, i64>,
    pub payment_index: HashMap<i64, i64>,
    pub passenger_index: HashMap<i64, i64>,
}

pub struct DimensionBuilder;

impl DimensionBuilder {
    /// Projects the four dimensions out of the raw batch.
    ///
    /// The datetime dimension is not deduplicated: one row per raw record
    /// with the row index as surrogate key, so the fact join is an identity
    /// join and duplicate timestamp pairs cannot fan out. The other three
    /// dimensions deduplicate on their natural keys.
    pub fn build(records: &[RawTripRecord]) -> DimensionTables {
        let mut datetime = Vec::with_capacity(records.len());
        let mut location = Vec::new();
        let mut payment = Vec::new();
        let mut passenger = Vec::new();
        let mut location_index: HashMap<CoordKey, i64> = HashMap::new();
        let mut payment_index: HashMap<i64, i64> = HashMap::new();
        let mut passenger_index: HashMap<i64, i64> = HashMap::new();

        for (row_idx, record) in records.iter().enumerate() {
            datetime.push(DatetimeRow::new(
                row_idx as i64,
                record.pickup_datetime,
                record.dropoff_datetime,
            ));

            let key = coord_key(record);
            location_index.entry(key).or_insert_with(|| {
                let location_id = location.len() as i64;
                location.push(LocationRow {
                    location_id,
                    pickup_latitude: record.pickup_latitude,
                    pickup_longitude: record.pickup_longitude,
                    dropoff_latitude: record.dropoff_latitude,
                    dropoff_longitude: record.dropoff_longitude,
                });
                location_id
            });

            payment_index.entry(record.payment_type).or_insert_with(|| {
                let payment_id = payment.len() as i64;
                payment.push(PaymentRow::new(payment_id, record.payment_type));
                payment_id
            });

            passenger_index
                .entry(record.passenger_count)
                .or_insert_with(|| {
                    let passenger_id = passenger.len() as i64;
                    passenger.push(PassengerRow {
                        passenger_id,
                        passenger_count: record.passenger_count,
                    });
                    passenger_id
                });
        }

        DimensionTables {
            datetime,
            location,
            payment,
            passenger,
            location_index,
            payment_index,
            passenger_index,
        }
    }
}

pub fn datetime_batch(rows: &[DatetimeRow]) -> Result<RecordBatch> {
    let columns: Vec<ArrayRef> = vec![
        Arc::new(Int64Array::from_iter_values(
            rows.iter().map(|r| r.datetime_id),
        )),
        Arc::new(TimestampSecondArray::from_iter_values(
            rows.iter().map(|r| r.pickup_datetime.and_utc().timestamp()),
        )),
        Arc::new(Int64Array::from_iter_values(
            rows.iter().map(|r| r.pickup_hour),
        )),
        Arc::new(Int64Array::from_iter_values(
            rows.iter().map(|r| r.pickup_day),
        )),
        Arc::new(Int64Array::from_iter_values(
            rows.iter().map(|r| r.pickup_month),
        )),
        Arc::new(Int64Array::from_iter_values(
            rows.iter().map(|r| r.pickup_year),
        )),
        Arc::new(Int64Array::from_iter_values(
            rows.iter().map(|r| r.pickup_weekday),
        )),
        Arc::new(TimestampSecondArray::from_iter_values(
            rows.iter().map(|r| r.dropoff_datetime.and_utc().timestamp()),
        )),
        Arc::new(Int64Array::from_iter_values(
            rows.iter().map(|r| r.dropoff_hour),
        )),
        Arc::new(Int64Array::from_iter_values(
            rows.iter().map(|r| r.dropoff_day),
        )),
        Arc::new(Int64Array::from_iter_values(
            rows.iter().map(|r| r.dropoff_month),
        )),
        Arc::new(Int64Array::from_iter_values(
            rows.iter().map(|r| r.dropoff_year),
        )),
        Arc::new(Int64Array::from_iter_values(
            rows.iter().map(|r| r.dropoff_weekday),
        )),
    ];
    RecordBatch::try_new(WarehouseTable::Datetime.schema(), columns).map_err(Into::into)
}

pub fn location_batch(rows: &[LocationRow]) -> Result<RecordBatch> {
    let columns: Vec<ArrayRef> = vec![
        Arc::new(Int64Array::from_iter_values(
            rows.iter().map(|r| r.location_id),
        )),
        Arc::new(Float64Array::from_iter_values(
            rows.iter().map(|r| r.pickup_latitude),
        )),
        Arc::new(Float64Array::from_iter_values(
            rows.iter().map(|r| r.pickup_longitude),
        )),
        Arc::new(Float64Array::from_iter_values(
            rows.iter().map(|r| r.dropoff_latitude),
        )),
        Arc::new(Float64Array::from_iter_values(
            rows.iter().map(|r| r.dropoff_longitude),
        )),
    ];
    RecordBatch::try_new(WarehouseTable::Location.schema(), columns).map_err(Into::into)
}

pub fn payment_batch(rows: &[PaymentRow]) -> Result<RecordBatch> {
    let columns: Vec<ArrayRef> = vec![
        Arc::new(Int64Array::from_iter_values(
            rows.iter().map(|r| r.payment_id),
        )),
        Arc::new(Int64Array::from_iter_values(
            rows.iter().map(|r| r.payment_type),
        )),
        Arc::new(StringArray::from_iter_values(
            rows.iter().map(|r| r.payment_name.as_str()),
        )),
        Arc::new(StringArray::from_iter_values(
            rows.iter().map(|r| r.payment_description.as_str()),
        )),
    ];
    RecordBatch::try_new(WarehouseTable::Payment.schema(), columns).map_err(Into::into)
}

pub fn passenger_batch(rows: &[PassengerRow]) -> Result<RecordBatch> {
    let columns: Vec<ArrayRef> = vec![
        Arc::new(Int64Array::from_iter_values(
            rows.iter().map(|r| r.passenger_id),
        )),
        Arc::new(Int64Array::from_iter_values(
            rows.iter().map(|r| r.passenger_count),
        )),
    ];
    RecordBatch::try_new(WarehouseTable::Passenger.schema(), columns).map_err(Into::into)
}
