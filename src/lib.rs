//! Holiday list scraping and pixel sprite resolution.
//!
//! Two loosely coupled halves:
//!
//! - [`holidays`] fetches public holidays into `{ last_updated, events }`
//!   JSON, optionally enriched with icon path, category and year.
//! - [`sprites`] turns each holiday name into a 32×32 icon, preferring a
//!   hand-made custom sprite, then a cached download, then the configured
//!   remote sources in order, and finally a shared fallback image.

pub mod config;
pub mod error;
pub mod holidays;
pub mod logging;
pub mod sprites;

mod fs_util;
#[cfg(test)]
mod test_server;

pub use config::SpriteConfig;
pub use error::{FailureReason, LoaderError, SourceFailure, SpriteError, StartupError};
pub use holidays::{HolidayRecord, read_holidays};
pub use sprites::{Resolution, Resolver, SpriteKey, Tier};
