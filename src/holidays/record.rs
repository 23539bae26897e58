//! Holiday records and the JSON document that carries them.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::LoaderError;
use crate::sprites::SpriteKey;

/// One holiday as delivered by the public-holiday API.
///
/// Only `name`, `date` and `global` are interpreted and all three are
/// required; every other field the source sends is carried through
/// untouched in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HolidayRecord {
    pub name: String,
    pub date: String,
    pub global: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    Federal,
    Regional,
}

/// A record with the app-specific fields added.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedHoliday {
    #[serde(flatten)]
    pub record: HolidayRecord,
    pub icon: String,
    pub category: Category,
    pub year: i32,
}

const ENRICHED_FIELDS: [&str; 3] = ["icon", "category", "year"];

impl HolidayRecord {
    /// Parse `date` as `YYYY-MM-DD`.
    pub fn parsed_date(&self) -> Result<NaiveDate, LoaderError> {
        NaiveDate::parse_from_str(&self.date, "%Y-%m-%d").map_err(|_| LoaderError::Date {
            name: self.name.clone(),
            date: self.date.clone(),
        })
    }

    /// Add `icon`, `category` and `year`.
    ///
    /// Derived purely from the record itself. Stale copies of the derived
    /// fields in `extra` are replaced rather than duplicated.
    pub fn enrich(mut self) -> Result<EnrichedHoliday, LoaderError> {
        let year = self.parsed_date()?.year();
        for field in ENRICHED_FIELDS {
            self.extra.remove(field);
        }
        let icon = format!("/sprites/{}", SpriteKey::normalize(&self.name).file_name());
        let category = if self.global {
            Category::Federal
        } else {
            Category::Regional
        };
        Ok(EnrichedHoliday {
            record: self,
            icon,
            category,
            year,
        })
    }
}

/// `{ last_updated, events }` as written by the loader.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HolidayDocument<T> {
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
    pub events: Vec<T>,
}

impl<T> HolidayDocument<T> {
    pub fn new(events: Vec<T>, now: DateTime<Utc>) -> Self {
        Self {
            last_updated: Some(now),
            events,
        }
    }
}
