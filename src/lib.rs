//! Sync daily equity reports ("bhavcopy") from BSE and NSE into SQLite.

pub mod data_collector;
pub mod database_sqlx;
pub mod job_generator;
pub mod models;
pub mod pipeline;
pub mod resume;
pub mod utils;
