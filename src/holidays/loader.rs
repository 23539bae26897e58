//! Fetching the holiday list and moving it on and off disk.
//!
//! The write side is all-or-nothing: the document is serialized in full
//! and swapped into place with a rename, so a failed run leaves the
//! previous file (or no file) behind.

use std::fs;
use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use super::record::{HolidayDocument, HolidayRecord};
use crate::error::{LoaderError, StartupError};
use crate::fs_util::write_atomic;

pub const NAGER_BASE_URL: &str = "https://date.nager.at/api/v3";
pub const DEFAULT_COUNTRY: &str = "US";

/// Client for the public-holiday API.
pub struct HolidaySource {
    base_url: String,
    client: reqwest::blocking::Client,
}

impl HolidaySource {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, LoaderError> {
        let base_url = base_url.into();
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|source| LoaderError::Http {
                url: base_url.clone(),
                source,
            })?;
        Ok(Self { base_url, client })
    }

    pub fn url(&self, year: i32, country: &str) -> String {
        format!(
            "{}/PublicHolidays/{}/{}",
            self.base_url.trim_end_matches('/'),
            year,
            country
        )
    }

    /// Fetch every public holiday for `country` in `year`.
    pub fn fetch(&self, year: i32, country: &str) -> Result<Vec<HolidayRecord>, LoaderError> {
        let url = self.url(year, country);
        debug!(url = %url, "fetching holidays");
        let http_err = |source| LoaderError::Http {
            url: url.clone(),
            source,
        };
        let response = self.client.get(&url).send().map_err(http_err)?;
        let status = response.status();
        if !status.is_success() {
            return Err(LoaderError::Status {
                url,
                status: status.as_u16(),
            });
        }
        let body = response.bytes().map_err(http_err)?;
        let records = parse_holidays(&body)?;
        info!(count = records.len(), year, country, "fetched holidays");
        Ok(records)
    }
}

/// Parse the API payload: a bare JSON array of holiday objects.
pub fn parse_holidays(body: &[u8]) -> Result<Vec<HolidayRecord>, LoaderError> {
    Ok(serde_json::from_slice(body)?)
}

/// Write `{ last_updated, events }` to `path`, enriching each record
/// first when `enrich` is set. Returns the number of events written.
pub fn save(
    path: &Path,
    records: Vec<HolidayRecord>,
    enrich: bool,
    now: DateTime<Utc>,
) -> Result<usize, LoaderError> {
    let count = records.len();
    let json = if enrich {
        let events = records
            .into_iter()
            .map(HolidayRecord::enrich)
            .collect::<Result<Vec<_>, _>>()?;
        to_json(&HolidayDocument::new(events, now))?
    } else {
        to_json(&HolidayDocument::new(records, now))?
    };
    write_atomic(path, &json).map_err(|source| LoaderError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    info!(path = %path.display(), count, enrich, "wrote holiday file");
    Ok(count)
}

/// Fetch `country`'s holidays for `year` and save them to `path`.
///
/// Any fetch failure returns before `path` is touched.
pub fn scrape(
    source: &HolidaySource,
    year: i32,
    country: &str,
    path: &Path,
    enrich: bool,
    now: DateTime<Utc>,
) -> Result<usize, LoaderError> {
    let records = source.fetch(year, country)?;
    save(path, records, enrich, now)
}

fn to_json<T: Serialize>(doc: &HolidayDocument<T>) -> Result<Vec<u8>, LoaderError> {
    Ok(serde_json::to_vec_pretty(doc)?)
}

/// Read the holiday list the sprite resolver works from.
pub fn read_holidays(path: &Path) -> Result<Vec<HolidayRecord>, StartupError> {
    let content = fs::read(path).map_err(|source| StartupError::HolidaysIo {
        path: path.to_path_buf(),
        source,
    })?;
    let doc: HolidayDocument<HolidayRecord> =
        serde_json::from_slice(&content).map_err(|source| StartupError::HolidaysParse {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(doc.events)
}
