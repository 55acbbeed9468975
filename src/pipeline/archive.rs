use reqwest::{header::REFERER, Client, StatusCode};
use std::io::{Cursor, Read};
use tracing::debug;
use zip::ZipArchive;

use super::error::{ArchiveError, FetchError};

/// Largest report accepted from an archive; real bhavcopies are a few MiB
const MAX_ENTRY_BYTES: u64 = 256 * 1024 * 1024;

/// Upper bound on the up-front buffer reservation for an entry
const PREALLOCATE_LIMIT: u64 = 16 * 1024 * 1024;

/// Download `url` and return the contents of `entry` inside the zip it serves
pub(crate) async fn fetch_entry(
    client: &Client,
    url: &str,
    referer: Option<&str>,
    entry: &str,
) -> Result<Vec<u8>, FetchError> {
    let body = download(client, url, referer).await?;
    debug!(url, bytes = body.len(), "downloaded archive");

    let (url_owned, entry_owned) = (url.to_string(), entry.to_string());
    tokio::task::spawn_blocking(move || extract_entry(body, &url_owned, &entry_owned))
        .await
        .map_err(|source| FetchError::Extraction {
            url: url.to_string(),
            source,
        })?
        .map_err(FetchError::from)
}

async fn download(client: &Client, url: &str, referer: Option<&str>) -> Result<Vec<u8>, FetchError> {
    let mut request = client.get(url);
    if let Some(referer) = referer {
        request = request.header(REFERER, referer);
    }

    let response = request.send().await.map_err(|source| FetchError::Request {
        url: url.to_string(),
        source,
    })?;

    let status = response.status();
    if status != StatusCode::OK {
        return Err(FetchError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    // zip needs random access; keep everything in memory
    let bytes = response.bytes().await.map_err(|source| FetchError::Body {
        url: url.to_string(),
        source,
    })?;

    Ok(bytes.to_vec())
}

/// Read a single named entry out of an in-memory zip archive
pub(crate) fn extract_entry(body: Vec<u8>, url: &str, entry: &str) -> Result<Vec<u8>, ArchiveError> {
    let mut archive = ZipArchive::new(Cursor::new(body)).map_err(|source| ArchiveError::Open {
        url: url.to_string(),
        source,
    })?;

    let mut file = archive
        .by_name(entry)
        .map_err(|source| ArchiveError::MissingEntry {
            url: url.to_string(),
            entry: entry.to_string(),
            source,
        })?;

    // sizes in the central directory are untrusted; never allocate on their word alone
    let mut data = Vec::with_capacity(file.size().min(PREALLOCATE_LIMIT) as usize);
    (&mut file)
        .take(MAX_ENTRY_BYTES + 1)
        .read_to_end(&mut data)
        .map_err(|source| ArchiveError::Read {
            entry: entry.to_string(),
            source,
        })?;

    if data.len() as u64 > MAX_ENTRY_BYTES {
        return Err(ArchiveError::TooLarge {
            url: url.to_string(),
            entry: entry.to_string(),
            limit: MAX_ENTRY_BYTES,
        });
    }

    Ok(data)
}
