//! Static reference table of companies listed on BSE.
//!
//! BSE reports identify securities by an internal numeric scrip code and, for
//! older dates, carry no ISIN at all. BSE's "List of Scrips" export maps those
//! codes to ticker symbols and ISIN codes. A short list ships with the binary;
//! point `BSE_LISTED_COMPANIES` at a full export to cover every scrip.

use serde::Deserialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use super::error::ReferenceDataError;

const BUNDLED: &str = include_str!("../../data/bse_listed_companies.csv");

#[derive(Debug, Clone, Deserialize)]
pub struct ListedCompany {
    #[serde(rename = "Security Code")]
    pub security_code: String,
    #[serde(rename = "Security Id")]
    pub security_id: String,
    #[serde(rename = "Security Name", default)]
    pub security_name: String,
    #[serde(rename = "Status", default)]
    pub status: String,
    #[serde(rename = "ISIN No", default)]
    pub isin: String,
}

/// Security code to company lookup; built once, read-only afterwards
#[derive(Debug, Default)]
pub struct ListedCompanies {
    by_code: HashMap<String, ListedCompany>,
}

impl ListedCompanies {
    /// Load the list shipped with the binary
    pub fn bundled() -> Result<Self, ReferenceDataError> {
        Self::from_reader(BUNDLED.as_bytes())
    }

    /// Load a "List of Scrips" CSV export downloaded from BSE
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ReferenceDataError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| ReferenceDataError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(BufReader::new(file))
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ReferenceDataError> {
        // exports end every line with a separator
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        reader.headers().map_err(ReferenceDataError::Header)?;

        let mut by_code = HashMap::new();
        for (index, row) in reader.deserialize::<ListedCompany>().enumerate() {
            let company = row.map_err(|source| ReferenceDataError::Row {
                row: index + 1,
                source,
            })?;
            by_code.insert(company.security_code.clone(), company);
        }

        if by_code.is_empty() {
            return Err(ReferenceDataError::Empty);
        }

        Ok(Self { by_code })
    }

    pub fn lookup(&self, security_code: &str) -> Option<&ListedCompany> {
        self.by_code.get(security_code)
    }

    pub fn len(&self) -> usize {
        self.by_code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_code.is_empty()
    }
}
