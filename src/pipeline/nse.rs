use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::Deserialize;
use std::fmt;

use super::archive::fetch_entry;
use super::error::{FetchError, ParseError};
use super::listed_companies::ListedCompanies;
use super::report::{decode_rows, price};
use super::{Parseable, Resource};
use crate::models::{EquityBatch, EquityRecord, Exchange};

const REFERER: &str = "https://www1.nseindia.com/products/content/equities/equities/archieve_eq.htm";

/// Format of the per-row `TIMESTAMP` column, e.g. `02-JAN-2023`
const ROW_DATE_FORMAT: &str = "%d-%b-%Y";

/// NSE's bhavcopy for one trading date
#[derive(Debug, Clone)]
pub struct NseEquityResource {
    date: NaiveDate,
    url: String,
}

impl NseEquityResource {
    pub fn new(base_url: &str, date: NaiveDate) -> Self {
        let url = format!(
            "{}/content/historical/EQUITIES/{}/{}/cm{}bhav.csv.zip",
            base_url.trim_end_matches('/'),
            date.format("%Y"),
            date.format("%b").to_string().to_uppercase(),
            stamp(date)
        );
        Self { date, url }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn entry_name(&self) -> String {
        format!("cm{}bhav.csv", stamp(self.date))
    }
}

/// `02JAN2023`
fn stamp(date: NaiveDate) -> String {
    date.format("%d%b%Y").to_string().to_uppercase()
}

impl fmt::Display for NseEquityResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}

#[async_trait]
impl Resource for NseEquityResource {
    type Payload = NseEquityData;

    fn exchange(&self) -> Exchange {
        Exchange::Nse
    }

    fn date(&self) -> NaiveDate {
        self.date
    }

    async fn fetch(&self, client: &Client) -> Result<NseEquityData, FetchError> {
        let data = fetch_entry(client, &self.url, Some(REFERER), &self.entry_name()).await?;
        Ok(NseEquityData { data, date: self.date })
    }
}

/// Downloaded NSE report; every row carries its own trading date
#[derive(Debug, Clone)]
pub struct NseEquityData {
    pub(crate) data: Vec<u8>,
    pub(crate) date: NaiveDate,
}

impl NseEquityData {
    pub fn new(data: Vec<u8>, date: NaiveDate) -> Self {
        Self { data, date }
    }
}

impl Parseable for NseEquityData {
    fn exchange(&self) -> Exchange {
        Exchange::Nse
    }

    fn date(&self) -> NaiveDate {
        self.date
    }

    fn parse(self, _companies: &ListedCompanies) -> Result<EquityBatch, ParseError> {
        let report = format!("cm{}bhav.csv", stamp(self.date));
        decode_rows(&self.data, &report, |row_number, row: NseRow| {
            let trading_date = NaiveDate::parse_from_str(&row.timestamp, ROW_DATE_FORMAT).map_err(|source| {
                ParseError::TradingDate {
                    report: report.clone(),
                    row: row_number,
                    value: row.timestamp.clone(),
                    source,
                }
            })?;

            Ok(EquityRecord {
                exchange: Exchange::Nse,
                trading_date,
                ticker: row.symbol,
                security_type: row.series,
                isin: row.isin,
                open: row.open,
                high: row.high,
                low: row.low,
                close: row.close,
                last: row.last,
                previous_close: row.previous_close,
            })
        })
    }
}

#[derive(Debug, Deserialize)]
struct NseRow {
    #[serde(rename = "SYMBOL")]
    symbol: String,
    #[serde(rename = "SERIES", default)]
    series: String,
    #[serde(rename = "TIMESTAMP")]
    timestamp: String,
    #[serde(rename = "ISIN", default)]
    isin: String,
    #[serde(rename = "OPEN", default, deserialize_with = "price")]
    open: f64,
    #[serde(rename = "HIGH", default, deserialize_with = "price")]
    high: f64,
    #[serde(rename = "LOW", default, deserialize_with = "price")]
    low: f64,
    #[serde(rename = "CLOSE", default, deserialize_with = "price")]
    close: f64,
    #[serde(rename = "LAST", default, deserialize_with = "price")]
    last: f64,
    #[serde(rename = "PREVCLOSE", default, deserialize_with = "price")]
    previous_close: f64,
}
