use arrow::array::{Array, Int64Array};
use arrow::record_batch::RecordBatch;
use common::{Error, Result};
use datafusion::dataframe::{DataFrame, DataFrameWriteOptions};
use datafusion::datasource::MemTable;
use datafusion::execution::context::SessionContext;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Explicit handle on the embedded analytical engine. One instance owns the
/// whole run; every stage receives it by reference instead of opening its
/// own ambient connection.
pub struct StorageEngine {
    ctx: SessionContext,
}

impl Default for StorageEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl StorageEngine {
    pub fn new() -> Self {
        Self {
            ctx: SessionContext::new(),
        }
    }

    pub fn session_context(&self) -> &SessionContext {
        &self.ctx
    }

    /// Full table replacement. The replacement table is staged completely in
    /// memory before the previous registration is dropped, so a failure while
    /// building it leaves the published table untouched.
    pub fn publish_table(&self, name: &str, batch: RecordBatch) -> Result<()> {
        let rows = batch.num_rows();
        let staged = MemTable::try_new(batch.schema(), vec![vec![batch]])?;

        let _ = self.ctx.deregister_table(name)?;
        self.ctx.register_table(name, Arc::new(staged))?;

        info!(table = name, rows, "Published table");
        Ok(())
    }

    /// Executes a declarative set-based query against the engine.
    pub async fn sql(&self, query: &str) -> Result<DataFrame> {
        self.ctx.sql(query).await.map_err(Into::into)
    }

    /// Runs a query expected to yield exactly one Int64 cell (COUNT shapes).
    pub async fn count(&self, query: &str) -> Result<i64> {
        let batches = self.sql(query).await?.collect().await?;
        let batch = batches
            .iter()
            .find(|b| b.num_rows() > 0)
            .ok_or_else(|| Error::Storage(format!("Count query returned no rows: {query}")))?;

        let array = batch
            .column(0)
            .as_any()
            .downcast_ref::<Int64Array>()
            .ok_or_else(|| Error::Storage(format!("Count query did not yield Int64: {query}")))?;
        if array.is_null(0) {
            return Err(Error::Storage(format!("Count query yielded null: {query}")));
        }
        Ok(array.value(0))
    }

    /// Persists a published table as a single Parquet file under `dir`.
    pub async fn persist_parquet(&self, table: &str, dir: &Path) -> Result<()> {
        let target = dir.join(format!("{table}.parquet"));
        let target = target
            .to_str()
            .ok_or_else(|| Error::Storage(format!("Non-UTF8 output path for {table}")))?
            .to_string();

        let df = self.ctx.table(table).await?;
        df.write_parquet(&target, DataFrameWriteOptions::new(), None)
            .await?;

        info!(table, path = %target, "Persisted table to parquet");
        Ok(())
    }
}
