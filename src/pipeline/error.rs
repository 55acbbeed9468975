use std::error::Error as StdError;
use std::path::PathBuf;
use thiserror::Error;

/// Failure to retrieve a report for one exchange and date
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to fetch {url:?}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("server returned {status} for {url:?}")]
    Status { url: String, status: u16 },

    #[error("failed to read response from {url:?}")]
    Body {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error(transparent)]
    Archive(#[from] ArchiveError),

    #[error("archive extraction for {url:?} did not complete")]
    Extraction {
        url: String,
        #[source]
        source: tokio::task::JoinError,
    },
}

/// The downloaded bytes are not the archive we expected
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("failed to unzip response from {url:?}")]
    Open {
        url: String,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("failed to open file {entry} in archive from {url:?}")]
    MissingEntry {
        url: String,
        entry: String,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("{entry} in archive from {url:?} is larger than {limit} bytes")]
    TooLarge { url: String, entry: String, limit: u64 },

    #[error("failed to read {entry} from archive")]
    Read {
        entry: String,
        #[source]
        source: std::io::Error,
    },
}

/// A report could not be decoded into records
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to read header of {report}")]
    Header {
        report: String,
        #[source]
        source: csv::Error,
    },

    #[error("failed to decode row {row} of {report}")]
    Row {
        report: String,
        row: usize,
        #[source]
        source: csv::Error,
    },

    #[error("invalid trading date {value:?} in row {row} of {report}")]
    TradingDate {
        report: String,
        row: usize,
        value: String,
        #[source]
        source: chrono::ParseError,
    },
}

/// The security-code table could not be loaded
#[derive(Debug, Error)]
pub enum ReferenceDataError {
    #[error("failed to open list of listed companies {path:?}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read list of listed companies")]
    Header(#[source] csv::Error),

    #[error("failed to read row {row} from list of listed companies")]
    Row {
        row: usize,
        #[source]
        source: csv::Error,
    },

    #[error("list of listed companies is empty")]
    Empty,
}

/// Render an error and all of its sources on one line
pub fn error_chain(error: &dyn StdError) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
