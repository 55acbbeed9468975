use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer};

use super::error::ParseError;
use crate::models::{EquityBatch, EquityRecord};

/// Decode a delimited report with a header row, one record per data row.
///
/// `convert` receives the 1-based data row number alongside the decoded row.
/// The first failing row aborts the whole report.
pub(crate) fn decode_rows<T, F>(data: &[u8], report: &str, mut convert: F) -> Result<EquityBatch, ParseError>
where
    T: DeserializeOwned,
    F: FnMut(usize, T) -> Result<EquityRecord, ParseError>,
{
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(data);

    reader.headers().map_err(|source| ParseError::Header {
        report: report.to_string(),
        source,
    })?;

    let mut batch = Vec::new();
    for (index, row) in reader.deserialize::<T>().enumerate() {
        let row_number = index + 1;
        let row = row.map_err(|source| ParseError::Row {
            report: report.to_string(),
            row: row_number,
            source,
        })?;
        batch.push(convert(row_number, row)?);
    }

    Ok(batch)
}

/// Price column; blank cells read as zero
pub(crate) fn price<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(0.0);
    }
    raw.parse::<f64>()
        .map_err(|_| D::Error::custom(format!("invalid price: {:?}", raw)))
}
