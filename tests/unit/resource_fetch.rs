//! Fetching exchange archives over HTTP

use assert_matches::assert_matches;
use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use reqwest::Client;
use rust_bhav::models::Exchange;
use rust_bhav::pipeline::bse::BseEquityResource;
use rust_bhav::pipeline::nse::NseEquityResource;
use rust_bhav::pipeline::{ArchiveError, FetchError, ListedCompanies, Parseable, Resource};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common::fixtures::{nse_report, zip_with, BSE_REPORT};
use crate::common::logging::log_test_step;

fn jan_2() -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 1, 2).unwrap()
}

#[test_log::test(tokio::test)]
async fn test_bse_fetch_and_parse() {
    log_test_step("Fetching a BSE archive from a mock server");
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/download/BhavCopy/Equity/EQ020123_CSV.ZIP"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(zip_with(&[("EQ020123.CSV", BSE_REPORT.as_bytes())])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let resource = BseEquityResource::new(&server.uri(), jan_2());
    let payload = resource.fetch(&Client::new()).await.unwrap();
    assert_eq!(payload.exchange(), Exchange::Bse);
    assert_eq!(payload.date(), jan_2());

    let batch = payload.parse(&ListedCompanies::bundled().unwrap()).unwrap();
    assert_eq!(batch.len(), 3);
    assert_eq!(batch[0].ticker, "RELIANCE");
    assert_eq!(batch[0].isin, "INE002A01018");
    assert_eq!(batch[1].ticker, "TCS");
    assert_eq!(batch[2].isin, "");
}

#[test_log::test(tokio::test)]
async fn test_non_200_is_a_fetch_error_with_location() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let resource = BseEquityResource::new(&server.uri(), jan_2());
    let result = resource.fetch(&Client::new()).await;

    assert_matches!(result, Err(FetchError::Status { status: 503, url }) if url == resource.url());
}

#[test_log::test(tokio::test)]
async fn test_archive_without_expected_entry() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200).set_body_bytes(zip_with(&[("EQ030123.CSV", BSE_REPORT.as_bytes())])),
        )
        .mount(&server)
        .await;

    let result = BseEquityResource::new(&server.uri(), jan_2()).fetch(&Client::new()).await;
    assert_matches!(
        result,
        Err(FetchError::Archive(ArchiveError::MissingEntry { entry, .. })) if entry == "EQ020123.CSV"
    );
}

#[test_log::test(tokio::test)]
async fn test_html_error_page_is_an_archive_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>Site under maintenance</html>"))
        .mount(&server)
        .await;

    let result = BseEquityResource::new(&server.uri(), jan_2()).fetch(&Client::new()).await;
    assert_matches!(result, Err(FetchError::Archive(ArchiveError::Open { .. })));
}

#[test_log::test(tokio::test)]
async fn test_nse_fetch_sends_referer() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/content/historical/EQUITIES/2023/JAN/cm02JAN2023bhav.csv.zip"))
        .and(header(
            "referer",
            "https://www1.nseindia.com/products/content/equities/equities/archieve_eq.htm",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(zip_with(&[(
            "cm02JAN2023bhav.csv",
            nse_report("02-JAN-2023").as_bytes(),
        )])))
        .expect(1)
        .mount(&server)
        .await;

    let payload = NseEquityResource::new(&server.uri(), jan_2())
        .fetch(&Client::new())
        .await
        .unwrap();
    let batch = payload.parse(&ListedCompanies::default()).unwrap();

    assert_eq!(batch.len(), 2);
    assert_eq!(batch[0].ticker, "INFY");
    assert_eq!(batch[0].isin, "INE009A01021");
    assert!(batch.iter().all(|r| r.trading_date == jan_2()));
}

#[test_log::test(tokio::test)]
async fn test_unreachable_host_is_a_request_error() {
    // port 9 (discard) is not expected to accept connections
    let resource = BseEquityResource::new("http://127.0.0.1:9", jan_2());
    let result = resource.fetch(&Client::new()).await;
    assert_matches!(result, Err(FetchError::Request { .. }));
}
