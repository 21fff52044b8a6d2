use crate::models::RawTripRecord;
use crate::schema;
use common::{Error, Result};
use std::path::Path;
use tracing::info;

/// Reads the raw trip file into memory. Thin wrapper: header validation via
/// the schema registry, then row deserialization; no transformation happens
/// here.
pub struct CsvIngestor;

impl CsvIngestor {
    pub fn load(path: &Path) -> Result<Vec<RawTripRecord>> {
        let mut reader = csv::Reader::from_path(path)?;

        let headers: Vec<String> = reader.headers()?.iter().map(String::from).collect();
        schema::validate_columns(&headers)?;

        let mut records = Vec::new();
        for (idx, row) in reader.deserialize().enumerate() {
            // Header is line 1, so the first data row is line 2.
            let record: RawTripRecord = row.map_err(|e| {
                Error::InvalidInput(format!("{}:{}: {}", path.display(), idx + 2, e))
            })?;
            records.push(record);
        }

        info!(path = %path.display(), records = records.len(), "Loaded raw trip file");
        Ok(records)
    }
}
