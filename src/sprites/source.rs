//! Remote icon sources.
//!
//! A source is plain data: a name, a URL template and an optional
//! key → code table. The template may reference `{key}` (the normalized
//! sprite key) and `{code}` (the looked-up code). Sources whose table has
//! no entry for a key are skipped for that key.
//!
//! Fetching goes through the [`IconFetcher`] trait so the resolver never
//! talks to the network directly.

use std::collections::BTreeMap;
use std::io::{self, Read};
use std::time::Duration;

use tracing::trace;

use crate::error::{FailureReason, StartupError};
use crate::sprites::SpriteKey;

/// Name of the built-in emoji code table usable from config files.
pub const EMOJI_TABLE: &str = "emoji";

/// Holiday keys mapped to Twemoji codepoint file stems.
const EMOJI_CODES: &[(&str, &str)] = &[
    ("new_years_day", "1f389"),
    ("new_years_eve", "1f386"),
    ("martin_luther_king,_jr._day", "270a"),
    ("martin_luther_king_jr_day", "270a"),
    ("lincolns_birthday", "1f3a9"),
    ("valentines_day", "1f498"),
    ("washingtons_birthday", "1f1fa-1f1f8"),
    ("presidents_day", "1f1fa-1f1f8"),
    ("st_patricks_day", "2618"),
    ("good_friday", "271d"),
    ("easter_sunday", "1f430"),
    ("easter_monday", "1f95a"),
    ("mothers_day", "1f490"),
    ("memorial_day", "1f396"),
    ("juneteenth", "270a-1f3ff"),
    ("fathers_day", "1f454"),
    ("independence_day", "1f386"),
    ("labour_day", "1f477"),
    ("labor_day", "1f477"),
    ("columbus_day", "26f5"),
    ("indigenous_peoples_day", "1fab6"),
    ("halloween", "1f383"),
    ("veterans_day", "1f396"),
    ("thanksgiving_day", "1f983"),
    ("christmas_eve", "1f31f"),
    ("christmas_day", "1f384"),
    ("truman_day", "1f3db"),
];

/// Return the built-in emoji table.
pub fn emoji_table() -> BTreeMap<String, String> {
    EMOJI_CODES
        .iter()
        .map(|(key, code)| (key.to_string(), code.to_string()))
        .collect()
}

/// One entry in the ordered list of remote icon sources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDescriptor {
    pub name: String,
    /// URL template containing `{key}` and/or `{code}`.
    pub url: String,
    /// Optional key → opaque code mapping.
    pub lookup: Option<BTreeMap<String, String>>,
}

impl SourceDescriptor {
    /// A source addressed directly by sprite key.
    pub fn keyed(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            lookup: None,
        }
    }

    /// A source addressed by a code looked up from the key.
    pub fn coded(
        name: impl Into<String>,
        url: impl Into<String>,
        lookup: BTreeMap<String, String>,
    ) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            lookup: Some(lookup),
        }
    }

    /// Check the template refers to something this source can fill in.
    pub fn validate(&self) -> Result<(), StartupError> {
        let invalid = |message: &str| StartupError::InvalidSource {
            name: self.name.clone(),
            message: message.to_string(),
        };
        let has_key = self.url.contains("{key}");
        let has_code = self.url.contains("{code}");
        if !has_key && !has_code {
            return Err(invalid("url template must contain {key} or {code}"));
        }
        if has_code && self.lookup.is_none() {
            return Err(invalid("{code} used without a lookup table"));
        }
        Ok(())
    }

    /// Expand the template for `key`.
    ///
    /// Returns `None` when this source has a lookup table without an entry
    /// for the key.
    pub fn url_for(&self, key: &SpriteKey) -> Option<String> {
        let mut url = self.url.replace("{key}", key.as_str());
        if let Some(table) = &self.lookup {
            let code = table.get(key.as_str())?;
            url = url.replace("{code}", code);
        }
        Some(url)
    }
}

/// The default source list, in priority order.
pub fn default_sources() -> Vec<SourceDescriptor> {
    vec![
        SourceDescriptor::keyed("pixelarticons", "https://api.pixelarticons.com/icons/{key}"),
        SourceDescriptor::coded(
            "twemoji",
            "https://cdn.jsdelivr.net/gh/twitter/twemoji@14.0.2/assets/72x72/{code}.png",
            emoji_table(),
        ),
    ]
}

/// Fetches the body of an icon URL.
///
/// Implementations make exactly one attempt per call; retrying is the
/// resolver's job (and it doesn't).
pub trait IconFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FailureReason>;
}

/// Icons are tiny; anything bigger than this is not one.
pub const DEFAULT_MAX_BODY_BYTES: u64 = 4 * 1024 * 1024;

/// Blocking HTTP fetcher with a per-request timeout and a body size cap.
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
    max_body: u64,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self, StartupError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            max_body: DEFAULT_MAX_BODY_BYTES,
        })
    }

    pub fn with_max_body(mut self, bytes: u64) -> Self {
        self.max_body = bytes;
        self
    }
}

impl IconFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FailureReason> {
        trace!(url, "GET");
        let response = self.client.get(url).send().map_err(classify)?;
        let status = response.status();
        if !status.is_success() {
            return Err(FailureReason::Status(status.as_u16()));
        }
        let too_large = || FailureReason::TooLarge(format!("body exceeds {} bytes", self.max_body));
        if response.content_length().is_some_and(|len| len > self.max_body) {
            return Err(too_large());
        }

        let mut body = Vec::new();
        response
            .take(self.max_body + 1)
            .read_to_end(&mut body)
            .map_err(classify_io)?;
        if body.len() as u64 > self.max_body {
            return Err(too_large());
        }
        Ok(body)
    }
}

fn classify(e: reqwest::Error) -> FailureReason {
    if e.is_timeout() {
        FailureReason::Timeout
    } else {
        FailureReason::Network(e.to_string())
    }
}

fn classify_io(e: io::Error) -> FailureReason {
    let inner_timeout = e
        .get_ref()
        .and_then(|inner| inner.downcast_ref::<reqwest::Error>())
        .is_some_and(reqwest::Error::is_timeout);
    if e.kind() == io::ErrorKind::TimedOut || inner_timeout {
        FailureReason::Timeout
    } else {
        FailureReason::Network(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_server;

    #[test]
    fn test_keyed_url() {
        let source = SourceDescriptor::keyed("a", "https://icons.test/{key}.png");
        let key = SpriteKey::normalize("Labor Day");
        assert_eq!(source.url_for(&key).as_deref(), Some("https://icons.test/labor_day.png"));
    }

    #[test]
    fn test_coded_url_and_missing_code() {
        let source = SourceDescriptor::coded("e", "https://e.test/{code}.png", emoji_table());
        let hit = SpriteKey::normalize("Thanksgiving Day");
        assert_eq!(source.url_for(&hit).as_deref(), Some("https://e.test/1f983.png"));

        let miss = SpriteKey::normalize("Some Unknown Day");
        assert_eq!(source.url_for(&miss), None);
    }

    #[test]
    fn test_validate_templates() {
        assert!(SourceDescriptor::keyed("a", "https://a.test/{key}").validate().is_ok());
        assert!(SourceDescriptor::keyed("b", "https://b.test/static.png").validate().is_err());
        assert!(SourceDescriptor::keyed("c", "https://c.test/{code}").validate().is_err());
        assert!(
            SourceDescriptor::coded("d", "https://d.test/{code}", BTreeMap::new())
                .validate()
                .is_ok()
        );
    }

    #[test]
    fn test_emoji_table_covers_scenario_keys() {
        let table = emoji_table();
        assert!(table.contains_key("new_years_day"));
        assert!(table.contains_key("thanksgiving_day"));
        assert!(table.contains_key("christmas_day"));
    }

    #[test]
    fn test_default_sources_are_valid() {
        for source in default_sources() {
            source.validate().unwrap();
        }
    }

    #[test]
    fn test_http_stalled_server_times_out() {
        let addr = test_server::serve_once(None, Duration::from_secs(3));
        let fetcher = HttpFetcher::new(Duration::from_millis(300)).unwrap();
        let result = fetcher.fetch(&format!("http://{}/icon.png", addr));
        assert_eq!(result, Err(FailureReason::Timeout));
    }

    #[test]
    fn test_http_not_found_maps_to_status() {
        let addr = test_server::serve_once(Some(test_server::not_found()), Duration::ZERO);
        let fetcher = HttpFetcher::new(Duration::from_secs(5)).unwrap();
        let result = fetcher.fetch(&format!("http://{}/icon.png", addr));
        assert_eq!(result, Err(FailureReason::Status(404)));
    }

    #[test]
    fn test_http_success_returns_body() {
        let addr = test_server::serve_once(Some(test_server::ok(b"icon-bytes")), Duration::ZERO);
        let fetcher = HttpFetcher::new(Duration::from_secs(5)).unwrap();
        let body = fetcher.fetch(&format!("http://{}/icon.png", addr)).unwrap();
        assert_eq!(body, b"icon-bytes");
    }

    #[test]
    fn test_http_oversized_body_rejected() {
        let addr = test_server::serve_once(Some(test_server::ok(&[7u8; 100])), Duration::ZERO);
        let fetcher = HttpFetcher::new(Duration::from_secs(5)).unwrap().with_max_body(16);
        let result = fetcher.fetch(&format!("http://{}/icon.png", addr));
        assert!(matches!(result, Err(FailureReason::TooLarge(_))), "got {:?}", result);
    }
}
