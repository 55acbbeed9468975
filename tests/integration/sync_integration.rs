//! End-to-end sync against mock exchange servers and a real database file

use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use rust_bhav::data_collector::{DataCollector, SyncOptions};
use rust_bhav::database_sqlx::EquityStore;
use rust_bhav::models::{Config, Exchange};
use rust_bhav::pipeline::ListedCompanies;
use std::sync::Arc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common::database::init_fresh_test_database;
use crate::common::fixtures::{nse_report, zip_with, BSE_REPORT};
use crate::common::logging::{log_test_data, log_test_step};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn config_for(server: &MockServer, database_path: &str) -> Config {
    let uri = server.uri();
    let database_path = database_path.to_string();
    Config::from_lookup(move |key| match key {
        "DATABASE_PATH" => Some(database_path.clone()),
        "BSE_BASE_URL" | "NSE_BASE_URL" => Some(uri.clone()),
        "DOWNLOAD_WORKERS" => Some("3".to_string()),
        "PARSE_WORKERS" => Some("2".to_string()),
        "FETCH_TIMEOUT_SECS" => Some("5".to_string()),
        _ => None,
    })
    .unwrap()
}

async fn mount_archive(server: &MockServer, url_path: &str, entry: &str, contents: &[u8]) {
    Mock::given(method("GET"))
        .and(path(url_path))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(zip_with(&[(entry, contents)])))
        .mount(server)
        .await;
}

#[test_log::test(tokio::test)]
async fn test_sync_tolerates_failed_days_and_resumes() {
    let db = init_fresh_test_database().await.unwrap();
    let server = MockServer::start().await;

    log_test_step("Serving two good reports, one missing archive, one corrupt report");
    mount_archive(
        &server,
        "/download/BhavCopy/Equity/EQ020123_CSV.ZIP",
        "EQ020123.CSV",
        BSE_REPORT.as_bytes(),
    )
    .await;
    mount_archive(
        &server,
        "/content/historical/EQUITIES/2023/JAN/cm02JAN2023bhav.csv.zip",
        "cm02JAN2023bhav.csv",
        nse_report("02-JAN-2023").as_bytes(),
    )
    .await;
    mount_archive(
        &server,
        "/content/historical/EQUITIES/2023/JAN/cm03JAN2023bhav.csv.zip",
        "cm03JAN2023bhav.csv",
        nse_report("not-a-date").as_bytes(),
    )
    .await;

    let config = config_for(&server, &db.path);
    let store = Arc::new(db.manager.clone());
    let companies = Arc::new(ListedCompanies::bundled().unwrap());
    let collector = DataCollector::new(Arc::clone(&store), &config, Arc::clone(&companies)).unwrap();

    let options = SyncOptions {
        end: date(2023, 1, 3),
        from: Some(date(2023, 1, 2)),
        exchanges: Exchange::ALL.to_vec(),
    };
    let report = collector.run(&options).await.unwrap();
    log_test_data("first run", &report);

    assert_eq!(report.jobs_submitted, 4);
    assert_eq!(report.batches_written, 2);
    assert_eq!(report.records_written, 5);
    assert_eq!(report.batches_failed, 0);
    assert_eq!(store.last_trading_date(Exchange::Bse).await.unwrap(), Some(date(2023, 1, 2)));
    assert_eq!(store.last_trading_date(Exchange::Nse).await.unwrap(), Some(date(2023, 1, 2)));

    let bse = db.manager.records_on(Exchange::Bse, date(2023, 1, 2)).await.unwrap();
    let tickers: Vec<&str> = bse.iter().map(|r| r.ticker.as_str()).collect();
    assert_eq!(tickers, vec!["999001", "RELIANCE", "TCS"]);

    log_test_step("Publishing the missing BSE archive and syncing again");
    mount_archive(
        &server,
        "/download/BhavCopy/Equity/EQ030123_CSV.ZIP",
        "EQ030123.CSV",
        BSE_REPORT.as_bytes(),
    )
    .await;

    let report = collector.run(&SyncOptions { from: None, ..options }).await.unwrap();
    log_test_data("second run", &report);

    // both exchanges resume from the day after their last stored date
    assert_eq!(report.jobs_submitted, 2);
    assert_eq!(report.batches_written, 1);
    assert_eq!(store.last_trading_date(Exchange::Bse).await.unwrap(), Some(date(2023, 1, 3)));
    assert_eq!(store.last_trading_date(Exchange::Nse).await.unwrap(), Some(date(2023, 1, 2)));
    assert_eq!(db.manager.count_records(Exchange::Bse).await.unwrap(), 6);
}

#[test_log::test(tokio::test)]
async fn test_holidays_generate_no_requests() {
    let db = init_fresh_test_database().await.unwrap();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .expect(0)
        .mount(&server)
        .await;

    let config = config_for(&server, &db.path);
    let collector = DataCollector::new(
        Arc::new(db.manager.clone()),
        &config,
        Arc::new(ListedCompanies::default()),
    )
    .unwrap();

    // Republic Day 2023 fell on a Thursday
    let options = SyncOptions {
        end: date(2023, 1, 26),
        from: Some(date(2023, 1, 26)),
        exchanges: vec![Exchange::Bse],
    };
    let report = collector.run(&options).await.unwrap();

    assert_eq!(report.jobs_submitted, 0);
    assert_eq!(report.batches_written, 0);
}
