pub mod export;
pub mod ingest;
pub mod models;
pub mod processor;
pub mod schema;
pub mod storage;
pub mod utils;
pub mod views;

use common::Result;
use common::config::Settings;
use export::ViewExporter;
use ingest::CsvIngestor;
use processor::WarehouseProcessor;
use std::path::Path;
use storage::StorageEngine;
use tracing::info;
use views::AggregationEngine;

/// Runs the complete warehouse batch pipeline: ingest, dimension build,
/// fact resolution, consistency gate, parquet persistence, analytical views
/// and artifact export. Any failed stage aborts the run.
pub async fn run_warehouse_pipeline(config_path: &str) -> Result<()> {
    let config = Settings::new(config_path)?;

    let records = CsvIngestor::load(Path::new(&config.input.path))?;

    let processor = WarehouseProcessor::new(StorageEngine::new());
    processor.load_batch(&records).await?;
    processor.validate().await?;

    let out_dir = Path::new(&config.output.dir);
    processor.persist_tables(&out_dir.join("tables")).await?;

    let computed = AggregationEngine::compute_all(processor.engine()).await?;
    ViewExporter::new(out_dir.join("views")).export_all(&computed)?;

    info!(
        trips = computed.summary.total_trips,
        revenue = computed.summary.total_revenue,
        "Warehouse pipeline completed"
    );
    Ok(())
}
