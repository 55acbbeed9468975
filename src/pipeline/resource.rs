use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use std::fmt;

use super::bse::{BseEquityData, BseEquityResource};
use super::error::{FetchError, ParseError};
use super::listed_companies::ListedCompanies;
use super::nse::{NseEquityData, NseEquityResource};
use super::{Parseable, Resource};
use crate::models::{Config, EquityBatch, Exchange};

/// Equity report for any supported exchange
#[derive(Debug, Clone)]
pub enum EquityResource {
    Bse(BseEquityResource),
    Nse(NseEquityResource),
}

/// Downloaded equity report for any supported exchange
#[derive(Debug, Clone)]
pub enum EquityPayload {
    Bse(BseEquityData),
    Nse(NseEquityData),
}

impl fmt::Display for EquityResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EquityResource::Bse(r) => fmt::Display::fmt(r, f),
            EquityResource::Nse(r) => fmt::Display::fmt(r, f),
        }
    }
}

#[async_trait]
impl Resource for EquityResource {
    type Payload = EquityPayload;

    fn exchange(&self) -> Exchange {
        match self {
            EquityResource::Bse(r) => r.exchange(),
            EquityResource::Nse(r) => r.exchange(),
        }
    }

    fn date(&self) -> NaiveDate {
        match self {
            EquityResource::Bse(r) => r.date(),
            EquityResource::Nse(r) => r.date(),
        }
    }

    async fn fetch(&self, client: &Client) -> Result<EquityPayload, FetchError> {
        match self {
            EquityResource::Bse(r) => r.fetch(client).await.map(EquityPayload::Bse),
            EquityResource::Nse(r) => r.fetch(client).await.map(EquityPayload::Nse),
        }
    }
}

impl Parseable for EquityPayload {
    fn exchange(&self) -> Exchange {
        match self {
            EquityPayload::Bse(p) => p.exchange(),
            EquityPayload::Nse(p) => p.exchange(),
        }
    }

    fn date(&self) -> NaiveDate {
        match self {
            EquityPayload::Bse(p) => p.date(),
            EquityPayload::Nse(p) => p.date(),
        }
    }

    fn parse(self, companies: &ListedCompanies) -> Result<EquityBatch, ParseError> {
        match self {
            EquityPayload::Bse(p) => p.parse(companies),
            EquityPayload::Nse(p) => p.parse(companies),
        }
    }
}

/// Builds resources against configurable exchange hosts
#[derive(Debug, Clone)]
pub struct EquitySource {
    bse_base_url: String,
    nse_base_url: String,
}

impl EquitySource {
    pub fn new(bse_base_url: impl Into<String>, nse_base_url: impl Into<String>) -> Self {
        Self {
            bse_base_url: bse_base_url.into(),
            nse_base_url: nse_base_url.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.bse_base_url.clone(), config.nse_base_url.clone())
    }

    pub fn resource(&self, exchange: Exchange, date: NaiveDate) -> EquityResource {
        match exchange {
            Exchange::Bse => EquityResource::Bse(BseEquityResource::new(&self.bse_base_url, date)),
            Exchange::Nse => EquityResource::Nse(NseEquityResource::new(&self.nse_base_url, date)),
        }
    }
}
