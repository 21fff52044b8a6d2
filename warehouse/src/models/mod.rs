use chrono::{Datelike, NaiveDateTime, Timelike};
use common::{Error, Result};
use serde::{Deserialize, Deserializer};

/// One ingested trip row. Immutable once read; source of truth for all
/// downstream derivation.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawTripRecord {
    #[serde(deserialize_with = "de_naive_datetime")]
    pub pickup_datetime: NaiveDateTime,
    #[serde(deserialize_with = "de_naive_datetime")]
    pub dropoff_datetime: NaiveDateTime,
    pub pickup_latitude: f64,
    pub pickup_longitude: f64,
    pub dropoff_latitude: f64,
    pub dropoff_longitude: f64,
    pub passenger_count: i64,
    pub trip_distance: f64,
    pub payment_type: i64,
    pub fare_amount: f64,
    pub tip_amount: f64,
    pub total_amount: f64,
}

impl RawTripRecord {
    /// Trip duration in whole seconds; negative when dropoff precedes pickup.
    /// The Consistency Validator rejects negative durations after load.
    pub fn trip_duration_seconds(&self) -> i64 {
        (self.dropoff_datetime - self.pickup_datetime).num_seconds()
    }
}

/// Parses the source timestamp layout (`2016-03-01 00:00:00`), accepting the
/// ISO 8601 `T` separator as a fallback.
pub fn parse_datetime(value: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S"))
        .map_err(|e| Error::InvalidInput(format!("Unparseable timestamp '{value}': {e}")))
}

fn de_naive_datetime<'de, D>(deserializer: D) -> std::result::Result<NaiveDateTime, D::Error>
where
    D: Deserializer<'de>,
{
    let value = String::deserialize(deserializer)?;
    parse_datetime(&value).map_err(serde::de::Error::custom)
}

/// Datetime dimension row: one per raw record, surrogate key = row index.
/// Weekday convention is 0 = Monday.
#[derive(Debug, Clone, PartialEq)]
pub struct DatetimeRow {
    pub datetime_id: i64,
    pub pickup_datetime: NaiveDateTime,
    pub pickup_hour: i64,
    pub pickup_day: i64,
    pub pickup_month: i64,
    pub pickup_year: i64,
    pub pickup_weekday: i64,
    pub dropoff_datetime: NaiveDateTime,
    pub dropoff_hour: i64,
    pub dropoff_day: i64,
    pub dropoff_month: i64,
    pub dropoff_year: i64,
    pub dropoff_weekday: i64,
}

impl DatetimeRow {
    pub fn new(datetime_id: i64, pickup: NaiveDateTime, dropoff: NaiveDateTime) -> Self {
        Self {
            datetime_id,
            pickup_datetime: pickup,
            pickup_hour: pickup.hour() as i64,
            pickup_day: pickup.day() as i64,
            pickup_month: pickup.month() as i64,
            pickup_year: pickup.year() as i64,
            pickup_weekday: pickup.weekday().num_days_from_monday() as i64,
            dropoff_datetime: dropoff,
            dropoff_hour: dropoff.hour() as i64,
            dropoff_day: dropoff.day() as i64,
            dropoff_month: dropoff.month() as i64,
            dropoff_year: dropoff.year() as i64,
            dropoff_weekday: dropoff.weekday().num_days_from_monday() as i64,
        }
    }
}

/// Location dimension row, deduplicated by exact coordinate-pair equality.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationRow {
    pub location_id: i64,
    pub pickup_latitude: f64,
    pub pickup_longitude: f64,
    pub dropoff_latitude: f64,
    pub dropoff_longitude: f64,
}

/// Payment dimension row, deduplicated by payment-type code.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentRow {
    pub payment_id: i64,
    pub payment_type: i64,
    pub payment_name: String,
    pub payment_description: String,
}

impl PaymentRow {
    pub fn new(payment_id: i64, payment_type: i64) -> Self {
        Self {
            payment_id,
            payment_type,
            payment_name: payment_name(payment_type).to_string(),
            payment_description: payment_description(payment_type).to_string(),
        }
    }
}

/// Passenger dimension row, deduplicated by distinct passenger count.
#[derive(Debug, Clone, PartialEq)]
pub struct PassengerRow {
    pub passenger_id: i64,
    pub passenger_count: i64,
}

/// Fact table row: surrogate trip key, foreign keys into the four
/// dimensions, and the trip measures.
#[derive(Debug, Clone, PartialEq)]
pub struct FactRow {
    pub trip_id: i64,
    pub datetime_id: i64,
    pub location_id: i64,
    pub payment_id: i64,
    pub passenger_id: i64,
    pub trip_distance: f64,
    pub trip_duration: i64,
    pub fare_amount: f64,
    pub tip_amount: f64,
    pub total_amount: f64,
}

/// Fixed payment-type lookup. Unknown codes map to "Unknown" and never fail.
pub fn payment_name(code: i64) -> &'static str {
    match code {
        1 => "Credit Card",
        2 => "Cash",
        3 => "No Charge",
        4 => "Dispute",
        _ => "Unknown",
    }
}

pub fn payment_description(code: i64) -> &'static str {
    match code {
        1 => "Payment by credit card",
        2 => "Cash payment",
        3 => "Free ride",
        4 => "Disputed charge",
        _ => "Unknown payment type",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_name_mapping_exhaustive() {
        let cases = [
            (0, "Unknown"),
            (1, "Credit Card"),
            (2, "Cash"),
            (3, "No Charge"),
            (4, "Dispute"),
            (5, "Unknown"),
            (-1, "Unknown"),
        ];
        for (code, expected) in cases {
            assert_eq!(payment_name(code), expected, "code {code}");
        }
    }

    #[test]
    fn test_payment_description_for_unknown_codes() {
        assert_eq!(payment_description(2), "Cash payment");
        assert_eq!(payment_description(99), "Unknown payment type");
    }

    #[test]
    fn test_parse_datetime_space_and_t_separators() {
        let a = parse_datetime("2016-03-01 07:45:00").unwrap();
        let b = parse_datetime("2016-03-01T07:45:00").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.hour(), 7);
    }

    #[test]
    fn test_parse_datetime_rejects_garbage() {
        assert!(parse_datetime("03/01/2016 07:45").is_err());
    }

    #[test]
    fn test_datetime_row_weekday_is_monday_based() {
        // 2016-03-07 was a Monday, 2016-03-13 a Sunday.
        let monday = parse_datetime("2016-03-07 09:00:00").unwrap();
        let sunday = parse_datetime("2016-03-13 09:30:00").unwrap();
        let row = DatetimeRow::new(0, monday, sunday);
        assert_eq!(row.pickup_weekday, 0);
        assert_eq!(row.dropoff_weekday, 6);
        assert_eq!(row.pickup_year, 2016);
        assert_eq!(row.dropoff_day, 13);
    }

    #[test]
    fn test_trip_duration_seconds() {
        let record = RawTripRecord {
            pickup_datetime: parse_datetime("2016-03-01 00:00:00").unwrap(),
            dropoff_datetime: parse_datetime("2016-03-01 00:10:30").unwrap(),
            pickup_latitude: 40.7,
            pickup_longitude: -73.9,
            dropoff_latitude: 40.8,
            dropoff_longitude: -73.95,
            passenger_count: 1,
            trip_distance: 2.5,
            payment_type: 1,
            fare_amount: 9.5,
            tip_amount: 1.5,
            total_amount: 11.0,
        };
        assert_eq!(record.trip_duration_seconds(), 630);
    }
}
