use crate::views::{self, AnalyticalViews, PaymentShareRow, TripSummary};
use common::{Error, Result};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Writes the computed views out as CSV plus a JSON profile per view, and a
/// JSON summary report. This is the one stage where partial failure is
/// tolerated: a failing view artifact is logged and skipped so the
/// remaining views still export.
pub struct ViewExporter {
    out_dir: PathBuf,
}

/// Per-view statistics artifact: row count, columns, null counts, and
/// min/max/mean/median for the numeric columns.
#[derive(Debug, Serialize)]
pub struct ViewProfile {
    pub row_count: usize,
    pub columns: Vec<String>,
    pub null_counts: BTreeMap<String, u64>,
    pub numeric_columns: BTreeMap<String, NumericStats>,
}

#[derive(Debug, Serialize)]
pub struct NumericStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
}

#[derive(Debug, Serialize)]
struct SummaryReport<'a> {
    overall_stats: &'a TripSummary,
    payment_distribution: &'a [PaymentShareRow],
}

impl ViewExporter {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
        }
    }

    pub fn export_all(&self, computed: &AnalyticalViews) -> Result<()> {
        fs::create_dir_all(&self.out_dir)?;

        self.export_view(views::HOURLY_FARES, &computed.hourly_fares);
        self.export_view(views::POPULAR_LOCATIONS, &computed.popular_locations);
        self.export_view(views::PAYMENT_ANALYSIS, &computed.payment_analysis);
        self.export_view(views::DAILY_STATS, &computed.daily_stats);
        self.export_view(views::PAYMENT_DISTRIBUTION, &computed.payment_distribution);

        let report = SummaryReport {
            overall_stats: &computed.summary,
            payment_distribution: &computed.payment_distribution,
        };
        if let Err(e) = self.write_json("summary_report", &report) {
            warn!(error = %e, "Skipped summary report");
        }

        Ok(())
    }

    fn export_view<T: Serialize>(&self, name: &str, rows: &[T]) {
        if let Err(e) = self.try_export_view(name, rows) {
            warn!(view = name, error = %e, "Skipped view export");
        }
    }

    fn try_export_view<T: Serialize>(&self, name: &str, rows: &[T]) -> Result<()> {
        let csv_path = self.write_csv(name, rows)?;
        let profile = profile_rows(rows)?;
        self.write_json(&format!("{name}_stats"), &profile)?;
        info!(view = name, rows = rows.len(), path = %csv_path.display(), "Exported view");
        Ok(())
    }

    pub fn write_csv<T: Serialize>(&self, name: &str, rows: &[T]) -> Result<PathBuf> {
        let path = self.out_dir.join(format!("{name}.csv"));
        let mut writer = csv::Writer::from_path(&path)?;
        for row in rows {
            writer.serialize(row)?;
        }
        writer.flush()?;
        Ok(path)
    }

    fn write_json<T: Serialize>(&self, name: &str, value: &T) -> Result<PathBuf> {
        let path = self.out_dir.join(format!("{name}.json"));
        let payload = serde_json::to_vec_pretty(value)?;
        fs::write(&path, payload)?;
        Ok(path)
    }
}

/// Profiles serialized view rows. Works over the JSON representation so one
/// implementation covers every view shape.
pub fn profile_rows<T: Serialize>(rows: &[T]) -> Result<ViewProfile> {
    let mut columns: Vec<String> = Vec::new();
    let mut null_counts: BTreeMap<String, u64> = BTreeMap::new();
    let mut numeric_values: BTreeMap<String, Vec<f64>> = BTreeMap::new();

    for row in rows {
        let value = serde_json::to_value(row)?;
        let object = value
            .as_object()
            .ok_or_else(|| Error::Other("View row did not serialize to an object".to_string()))?;

        for (column, cell) in object {
            if !columns.contains(column) {
                columns.push(column.clone());
                null_counts.insert(column.clone(), 0);
            }
            match cell {
                Value::Null => {
                    *null_counts.entry(column.clone()).or_default() += 1;
                }
                Value::Number(number) => {
                    if let Some(v) = number.as_f64() {
                        numeric_values.entry(column.clone()).or_default().push(v);
                    }
                }
                _ => {}
            }
        }
    }

    let numeric_columns = numeric_values
        .into_iter()
        .filter(|(_, values)| !values.is_empty())
        .map(|(column, values)| (column, numeric_stats(&values)))
        .collect();

    Ok(ViewProfile {
        row_count: rows.len(),
        columns,
        null_counts,
        numeric_columns,
    })
}

fn numeric_stats(values: &[f64]) -> NumericStats {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let min = sorted[0];
    let max = sorted[sorted.len() - 1];
    let mean = sorted.iter().sum::<f64>() / sorted.len() as f64;
    let mid = sorted.len() / 2;
    let median = if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    };

    NumericStats {
        min,
        max,
        mean,
        median,
    }
}
