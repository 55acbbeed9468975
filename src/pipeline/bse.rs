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

/// BSE's bhavcopy for one trading date
#[derive(Debug, Clone)]
pub struct BseEquityResource {
    date: NaiveDate,
    url: String,
}

impl BseEquityResource {
    pub fn new(base_url: &str, date: NaiveDate) -> Self {
        let url = format!(
            "{}/download/BhavCopy/Equity/EQ{}_CSV.ZIP",
            base_url.trim_end_matches('/'),
            date.format("%d%m%y")
        );
        Self { date, url }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn entry_name(&self) -> String {
        format!("EQ{}.CSV", self.date.format("%d%m%y"))
    }
}

impl fmt::Display for BseEquityResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}

#[async_trait]
impl Resource for BseEquityResource {
    type Payload = BseEquityData;

    fn exchange(&self) -> Exchange {
        Exchange::Bse
    }

    fn date(&self) -> NaiveDate {
        self.date
    }

    async fn fetch(&self, client: &Client) -> Result<BseEquityData, FetchError> {
        let data = fetch_entry(client, &self.url, None, &self.entry_name()).await?;
        Ok(BseEquityData { data, date: self.date })
    }
}

/// Downloaded BSE report; rows carry no date so it travels with the payload
#[derive(Debug, Clone)]
pub struct BseEquityData {
    pub(crate) data: Vec<u8>,
    pub(crate) date: NaiveDate,
}

impl BseEquityData {
    pub fn new(data: Vec<u8>, date: NaiveDate) -> Self {
        Self { data, date }
    }
}

impl Parseable for BseEquityData {
    fn exchange(&self) -> Exchange {
        Exchange::Bse
    }

    fn date(&self) -> NaiveDate {
        self.date
    }

    fn parse(self, companies: &ListedCompanies) -> Result<EquityBatch, ParseError> {
        let report = format!("EQ{}.CSV", self.date.format("%d%m%y"));
        let date = self.date;
        decode_rows(&self.data, &report, |_, row: BseRow| {
            Ok(row.into_record(date, companies))
        })
    }
}

#[derive(Debug, Deserialize)]
struct BseRow {
    #[serde(rename = "SC_CODE")]
    code: String,
    #[serde(rename = "SC_TYPE", default)]
    scrip_type: String,
    // only present in reports from later years
    #[serde(rename = "ISIN_CODE", default)]
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

impl BseRow {
    fn into_record(self, date: NaiveDate, companies: &ListedCompanies) -> EquityRecord {
        let company = companies.lookup(&self.code);

        let ticker = company
            .map(|c| c.security_id.as_str())
            .filter(|id| !id.is_empty())
            .unwrap_or(self.code.as_str())
            .to_string();

        let isin = if self.isin.is_empty() {
            company.map(|c| c.isin.clone()).unwrap_or_default()
        } else {
            self.isin
        };

        EquityRecord {
            exchange: Exchange::Bse,
            trading_date: date,
            ticker,
            security_type: self.scrip_type,
            isin,
            open: self.open,
            high: self.high,
            low: self.low,
            close: self.close,
            last: self.last,
            previous_close: self.previous_close,
        }
    }
}
