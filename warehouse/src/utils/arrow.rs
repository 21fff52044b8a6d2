use arrow::array::{Array, Float64Array, Int64Array, LargeStringArray, StringArray, StringViewArray};
use arrow::record_batch::RecordBatch;
use common::{Error, Result};

/// Reads a non-null Int64 cell out of a batch by column name.
pub fn i64_value(batch: &RecordBatch, column: &str, row: usize) -> Result<i64> {
    let idx = batch.schema().index_of(column)?;
    let array = batch
        .column(idx)
        .as_any()
        .downcast_ref::<Int64Array>()
        .ok_or_else(|| Error::Other(format!("Column {column} is not Int64")))?;
    if array.is_null(row) {
        return Err(Error::Other(format!("Unexpected null in column {column}")));
    }
    Ok(array.value(row))
}

/// Reads a non-null Float64 cell out of a batch by column name.
pub fn f64_value(batch: &RecordBatch, column: &str, row: usize) -> Result<f64> {
    f64_opt(batch, column, row)?
        .ok_or_else(|| Error::Other(format!("Unexpected null in column {column}")))
}

/// Reads a nullable Float64 cell; aggregate queries over empty tables yield
/// NULL sums and averages.
pub fn f64_opt(batch: &RecordBatch, column: &str, row: usize) -> Result<Option<f64>> {
    let idx = batch.schema().index_of(column)?;
    let array = batch
        .column(idx)
        .as_any()
        .downcast_ref::<Float64Array>()
        .ok_or_else(|| Error::Other(format!("Column {column} is not Float64")))?;
    if array.is_null(row) {
        Ok(None)
    } else {
        Ok(Some(array.value(row)))
    }
}

/// Reads a string cell, tolerating the Utf8 / LargeUtf8 / Utf8View encodings
/// the engine may hand back.
pub fn string_value(batch: &RecordBatch, column: &str, row: usize) -> Result<String> {
    let idx = batch.schema().index_of(column)?;
    let array = batch.column(idx);

    if let Some(utf8) = array.as_any().downcast_ref::<StringArray>() {
        Ok(utf8.value(row).to_string())
    } else if let Some(large) = array.as_any().downcast_ref::<LargeStringArray>() {
        Ok(large.value(row).to_string())
    } else if let Some(view) = array.as_any().downcast_ref::<StringViewArray>() {
        Ok(view.value(row).to_string())
    } else {
        Err(Error::Other(format!(
            "Column {column} is not a string type: {:?}",
            array.data_type()
        )))
    }
}

/// Rounds to 2 decimal places, the precision used for currency and duration
/// fields in exported summaries.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::datatypes::{DataType, Field, Schema};
    use std::sync::Arc;

    fn sample_batch() -> RecordBatch {
        let schema = Arc::new(Schema::new(vec![
            Field::new("id", DataType::Int64, false),
            Field::new("amount", DataType::Float64, true),
            Field::new("name", DataType::Utf8, false),
        ]));
        RecordBatch::try_new(
            schema,
            vec![
                Arc::new(Int64Array::from(vec![7])),
                Arc::new(Float64Array::from(vec![None::<f64>])),
                Arc::new(StringArray::from(vec!["Cash"])),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_scalar_extraction() {
        let batch = sample_batch();
        assert_eq!(i64_value(&batch, "id", 0).unwrap(), 7);
        assert_eq!(f64_opt(&batch, "amount", 0).unwrap(), None);
        assert!(f64_value(&batch, "amount", 0).is_err());
        assert_eq!(string_value(&batch, "name", 0).unwrap(), "Cash");
    }

    #[test]
    fn test_unknown_column_is_an_error() {
        let batch = sample_batch();
        assert!(i64_value(&batch, "missing", 0).is_err());
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(45.499999), 45.5);
        assert_eq!(round2(2.0 / 3.0), 0.67);
        assert_eq!(round2(-1.2345), -1.23);
    }
}
