use crate::schema::{DIM_DATETIME, DIM_LOCATION, DIM_PAYMENT, FACT_TRIPS};
use crate::storage::StorageEngine;
use crate::utils::arrow::{f64_opt, f64_value, i64_value, round2, string_value};
use arrow::record_batch::RecordBatch;
use common::Result;
use serde::{Deserialize, Serialize};
use tracing::info;

pub const HOURLY_FARES: &str = "hourly_fares";
pub const POPULAR_LOCATIONS: &str = "popular_locations";
pub const PAYMENT_ANALYSIS: &str = "payment_analysis";
pub const DAILY_STATS: &str = "daily_stats";
pub const PAYMENT_DISTRIBUTION: &str = "payment_distribution";

/// Average fare, tip and total per pickup hour, hour ascending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyFareRow {
    pub pickup_hour: i64,
    pub avg_fare: f64,
    pub num_trips: i64,
    pub avg_tip: f64,
    pub avg_total: f64,
}

/// Pickup counts and trip averages per distinct pickup coordinate,
/// most-frequented first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopularLocationRow {
    pub pickup_latitude: f64,
    pub pickup_longitude: f64,
    pub num_pickups: i64,
    pub avg_fare: f64,
    pub avg_distance: f64,
    pub avg_duration: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentAnalysisRow {
    pub payment_name: String,
    pub num_trips: i64,
    pub avg_fare: f64,
    pub avg_tip: f64,
    pub avg_total: f64,
    pub avg_distance: f64,
}

/// Per-day trip counts and revenue, chronological.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyStatsRow {
    pub pickup_year: i64,
    pub pickup_month: i64,
    pub pickup_day: i64,
    pub num_trips: i64,
    pub avg_fare: f64,
    pub total_revenue: f64,
    pub avg_distance: f64,
    pub avg_duration: f64,
}

/// Whole-batch totals; currency and duration fields rounded to 2 decimals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripSummary {
    pub total_trips: i64,
    pub total_revenue: f64,
    pub avg_distance: f64,
    pub avg_duration_minutes: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentShareRow {
    pub payment_name: String,
    pub trip_count: i64,
    pub percentage: f64,
}

/// All analytical views computed from the current fact and dimension state.
/// Pure recomputation on demand; nothing here is a source of truth.
#[derive(Debug, Clone)]
pub struct AnalyticalViews {
    pub hourly_fares: Vec<HourlyFareRow>,
    pub popular_locations: Vec<PopularLocationRow>,
    pub payment_analysis: Vec<PaymentAnalysisRow>,
    pub daily_stats: Vec<DailyStatsRow>,
    pub summary: TripSummary,
    pub payment_distribution: Vec<PaymentShareRow>,
}

pub struct AggregationEngine;

impl AggregationEngine {
    pub async fn compute_all(engine: &StorageEngine) -> Result<AnalyticalViews> {
        let views = AnalyticalViews {
            hourly_fares: Self::hourly_fares(engine).await?,
            popular_locations: Self::popular_locations(engine).await?,
            payment_analysis: Self::payment_analysis(engine).await?,
            daily_stats: Self::daily_stats(engine).await?,
            summary: Self::overall_summary(engine).await?,
            payment_distribution: Self::payment_distribution(engine).await?,
        };
        info!(
            hourly = views.hourly_fares.len(),
            locations = views.popular_locations.len(),
            daily = views.daily_stats.len(),
            "Computed analytical views"
        );
        Ok(views)
    }

    pub async fn hourly_fares(engine: &StorageEngine) -> Result<Vec<HourlyFareRow>> {
        let query = format!(
            "SELECT d.pickup_hour, \
                    AVG(f.fare_amount) AS avg_fare, \
                    COUNT(*) AS num_trips, \
                    AVG(f.tip_amount) AS avg_tip, \
                    AVG(f.total_amount) AS avg_total \
             FROM {FACT_TRIPS} f \
             JOIN {DIM_DATETIME} d ON f.datetime_id = d.datetime_id \
             GROUP BY d.pickup_hour \
             ORDER BY d.pickup_hour"
        );
        let batches = engine.sql(&query).await?.collect().await?;

        let mut rows = Vec::new();
        for batch in &batches {
            for row in 0..batch.num_rows() {
                rows.push(HourlyFareRow {
                    pickup_hour: i64_value(batch, "pickup_hour", row)?,
                    avg_fare: f64_value(batch, "avg_fare", row)?,
                    num_trips: i64_value(batch, "num_trips", row)?,
                    avg_tip: f64_value(batch, "avg_tip", row)?,
                    avg_total: f64_value(batch, "avg_total", row)?,
                });
            }
        }
        Ok(rows)
    }

    pub async fn popular_locations(engine: &StorageEngine) -> Result<Vec<PopularLocationRow>> {
        let query = format!(
            "SELECT l.pickup_latitude, \
                    l.pickup_longitude, \
                    COUNT(*) AS num_pickups, \
                    AVG(f.fare_amount) AS avg_fare, \
                    AVG(f.trip_distance) AS avg_distance, \
                    AVG(f.trip_duration) AS avg_duration \
             FROM {FACT_TRIPS} f \
             JOIN {DIM_LOCATION} l ON f.location_id = l.location_id \
             GROUP BY l.pickup_latitude, l.pickup_longitude \
             ORDER BY num_pickups DESC, l.pickup_latitude, l.pickup_longitude"
        );
        let batches = engine.sql(&query).await?.collect().await?;

        let mut rows = Vec::new();
        for batch in &batches {
            for row in 0..batch.num_rows() {
                rows.push(PopularLocationRow {
                    pickup_latitude: f64_value(batch, "pickup_latitude", row)?,
                    pickup_longitude: f64_value(batch, "pickup_longitude", row)?,
                    num_pickups: i64_value(batch, "num_pickups", row)?,
                    avg_fare: f64_value(batch, "avg_fare", row)?,
                    avg_distance: f64_value(batch, "avg_distance", row)?,
                    avg_duration: f64_value(batch, "avg_duration", row)?,
                });
            }
        }
        Ok(rows)
    }

    pub async fn payment_analysis(engine: &StorageEngine) -> Result<Vec<PaymentAnalysisRow>> {
        let query = format!(
            "SELECT p.payment_name, \
                    COUNT(*) AS num_trips, \
                    AVG(f.fare_amount) AS avg_fare, \
                    AVG(f.tip_amount) AS avg_tip, \
                    AVG(f.total_amount) AS avg_total, \
                    AVG(f.trip_distance) AS avg_distance \
             FROM {FACT_TRIPS} f \
             JOIN {DIM_PAYMENT} p ON f.payment_id = p.payment_id \
             GROUP BY p.payment_name \
             ORDER BY num_trips DESC, p.payment_name"
        );
        let batches = engine.sql(&query).await?.collect().await?;

        let mut rows = Vec::new();
        for batch in &batches {
            for row in 0..batch.num_rows() {
                rows.push(PaymentAnalysisRow {
                    payment_name: string_value(batch, "payment_name", row)?,
                    num_trips: i64_value(batch, "num_trips", row)?,
                    avg_fare: f64_value(batch, "avg_fare", row)?,
                    avg_tip: f64_value(batch, "avg_tip", row)?,
                    avg_total: f64_value(batch, "avg_total", row)?,
                    avg_distance: f64_value(batch, "avg_distance", row)?,
                });
            }
        }
        Ok(rows)
    }

    pub async fn daily_stats(engine: &StorageEngine) -> Result<Vec<DailyStatsRow>> {
        let query = format!(
            "SELECT d.pickup_year, \
                    d.pickup_month, \
                    d.pickup_day, \
                    COUNT(*) AS num_trips, \
                    AVG(f.fare_amount) AS avg_fare, \
                    SUM(f.total_amount) AS total_revenue, \
                    AVG(f.trip_distance) AS avg_distance, \
                    AVG(f.trip_duration) AS avg_duration \
             FROM {FACT_TRIPS} f \
             JOIN {DIM_DATETIME} d ON f.datetime_id = d.datetime_id \
             GROUP BY d.pickup_year, d.pickup_month, d.pickup_day \
             ORDER BY d.pickup_year, d.pickup_month, d.pickup_day"
        );
        let batches = engine.sql(&query).await?.collect().await?;

        let mut rows = Vec::new();
        for batch in &batches {
            for row in 0..batch.num_rows() {
                rows.push(DailyStatsRow {
                    pickup_year: i64_value(batch, "pickup_year", row)?,
                    pickup_month: i64_value(batch, "pickup_month", row)?,
                    pickup_day: i64_value(batch, "pickup_day", row)?,
                    num_trips: i64_value(batch, "num_trips", row)?,
                    avg_fare: f64_value(batch, "avg_fare", row)?,
                    total_revenue: f64_value(batch, "total_revenue", row)?,
                    avg_distance: f64_value(batch, "avg_distance", row)?,
                    avg_duration: f64_value(batch, "avg_duration", row)?,
                });
            }
        }
        Ok(rows)
    }

    /// Whole-batch summary. Aggregates over an empty fact table come back
    /// NULL and are reported as zero.
    pub async fn overall_summary(engine: &StorageEngine) -> Result<TripSummary> {
        let query = format!(
            "SELECT COUNT(*) AS total_trips, \
                    SUM(f.total_amount) AS total_revenue, \
                    AVG(f.trip_distance) AS avg_distance, \
                    AVG(f.trip_duration) / 60.0 AS avg_duration_minutes \
             FROM {FACT_TRIPS} f"
        );
        let batches = engine.sql(&query).await?.collect().await?;
        let batch = Self::single_row(&batches)?;

        Ok(TripSummary {
            total_trips: i64_value(batch, "total_trips", 0)?,
            total_revenue: round2(f64_opt(batch, "total_revenue", 0)?.unwrap_or(0.0)),
            avg_distance: round2(f64_opt(batch, "avg_distance", 0)?.unwrap_or(0.0)),
            avg_duration_minutes: round2(
                f64_opt(batch, "avg_duration_minutes", 0)?.unwrap_or(0.0),
            ),
        })
    }

    /// Trip count and share of total per payment name, largest share first.
    pub async fn payment_distribution(engine: &StorageEngine) -> Result<Vec<PaymentShareRow>> {
        let query = format!(
            "SELECT p.payment_name, COUNT(*) AS trip_count \
             FROM {FACT_TRIPS} f \
             JOIN {DIM_PAYMENT} p ON f.payment_id = p.payment_id \
             GROUP BY p.payment_name \
             ORDER BY trip_count DESC, p.payment_name"
        );
        let batches = engine.sql(&query).await?.collect().await?;

        let mut counts = Vec::new();
        for batch in &batches {
            for row in 0..batch.num_rows() {
                counts.push((
                    string_value(batch, "payment_name", row)?,
                    i64_value(batch, "trip_count", row)?,
                ));
            }
        }

        let total: i64 = counts.iter().map(|(_, c)| c).sum();
        let rows = counts
            .into_iter()
            .map(|(payment_name, trip_count)| PaymentShareRow {
                payment_name,
                trip_count,
                percentage: if total > 0 {
                    round2(trip_count as f64 * 100.0 / total as f64)
                } else {
                    0.0
                },
            })
            .collect();
        Ok(rows)
    }

    fn single_row(batches: &[RecordBatch]) -> Result<&RecordBatch> {
        batches
            .iter()
            .find(|b| b.num_rows() > 0)
            .ok_or_else(|| common::Error::Other("Aggregate query returned no rows".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RawTripRecord, parse_datetime};
    use crate::processor::WarehouseProcessor;

    fn record(pickup: &str, total: f64, payment: i64) -> RawTripRecord {
        RawTripRecord {
            pickup_datetime: parse_datetime(pickup).unwrap(),
            dropoff_datetime: parse_datetime(pickup).unwrap() + chrono::Duration::minutes(12),
            pickup_latitude: 40.71,
            pickup_longitude: -74.0,
            dropoff_latitude: 40.75,
            dropoff_longitude: -73.98,
            passenger_count: 1,
            trip_distance: 3.0,
            payment_type: payment,
            fare_amount: total - 2.0,
            tip_amount: 2.0,
            total_amount: total,
        }
    }

    async fn loaded_processor(records: &[RawTripRecord]) -> WarehouseProcessor {
        let processor = WarehouseProcessor::new(StorageEngine::new());
        processor.load_batch(records).await.unwrap();
        processor
    }

    #[tokio::test]
    async fn test_overall_summary_totals() {
        let records = vec![
            record("2016-03-01 08:00:00", 10.0, 1),
            record("2016-03-01 09:00:00", 20.0, 1),
            record("2016-03-02 10:00:00", 15.5, 2),
        ];
        let processor = loaded_processor(&records).await;

        let summary = AggregationEngine::overall_summary(processor.engine())
            .await
            .unwrap();
        assert_eq!(summary.total_trips, 3);
        assert_eq!(summary.total_revenue, 45.5);
        assert_eq!(summary.avg_distance, 3.0);
        assert_eq!(summary.avg_duration_minutes, 12.0);
    }

    #[tokio::test]
    async fn test_hourly_fares_grouping_and_order() {
        let records = vec![
            record("2016-03-01 09:00:00", 20.0, 1),
            record("2016-03-01 08:00:00", 10.0, 1),
            record("2016-03-01 08:30:00", 14.0, 2),
        ];
        let processor = loaded_processor(&records).await;

        let rows = AggregationEngine::hourly_fares(processor.engine())
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].pickup_hour, 8);
        assert_eq!(rows[0].num_trips, 2);
        assert_eq!(rows[0].avg_total, 12.0);
        assert_eq!(rows[1].pickup_hour, 9);
        assert_eq!(rows[1].num_trips, 1);
    }

    #[tokio::test]
    async fn test_popular_locations_single_location() {
        let records = vec![
            record("2016-03-01 08:00:00", 10.0, 1),
            record("2016-03-01 09:00:00", 20.0, 1),
        ];
        let processor = loaded_processor(&records).await;

        let rows = AggregationEngine::popular_locations(processor.engine())
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].num_pickups, 2);
        assert_eq!(rows[0].avg_duration, 720.0);
    }

    #[tokio::test]
    async fn test_payment_distribution_percentages() {
        let records = vec![
            record("2016-03-01 08:00:00", 10.0, 1),
            record("2016-03-01 09:00:00", 20.0, 1),
            record("2016-03-01 10:00:00", 15.0, 1),
            record("2016-03-01 11:00:00", 12.0, 2),
        ];
        let processor = loaded_processor(&records).await;

        let rows = AggregationEngine::payment_distribution(processor.engine())
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].payment_name, "Credit Card");
        assert_eq!(rows[0].trip_count, 3);
        assert_eq!(rows[0].percentage, 75.0);
        assert_eq!(rows[1].payment_name, "Cash");
        assert_eq!(rows[1].percentage, 25.0);
    }

    #[tokio::test]
    async fn test_daily_stats_chronological() {
        let records = vec![
            record("2016-03-02 08:00:00", 20.0, 1),
            record("2016-03-01 08:00:00", 10.0, 1),
        ];
        let processor = loaded_processor(&records).await;

        let rows = AggregationEngine::daily_stats(processor.engine())
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].pickup_day, 1);
        assert_eq!(rows[1].pickup_day, 2);
        assert_eq!(rows[1].total_revenue, 20.0);
    }

    #[tokio::test]
    async fn test_empty_batch_yields_empty_views() {
        let processor = loaded_processor(&[]).await;

        let views = AggregationEngine::compute_all(processor.engine())
            .await
            .unwrap();
        assert!(views.hourly_fares.is_empty());
        assert!(views.popular_locations.is_empty());
        assert!(views.payment_analysis.is_empty());
        assert!(views.daily_stats.is_empty());
        assert!(views.payment_distribution.is_empty());
        assert_eq!(views.summary.total_trips, 0);
        assert_eq!(views.summary.total_revenue, 0.0);
    }
}
