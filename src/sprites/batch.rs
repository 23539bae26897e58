//! Resolve every sprite in a holiday list.
//!
//! A key that cannot be resolved is recorded and the batch moves on; the
//! caller decides what the failures mean for the exit status.

use std::collections::{BTreeMap, HashSet};

use tracing::info;

use crate::error::SpriteError;
use crate::holidays::HolidayRecord;
use crate::sprites::resolver::{Resolution, Resolver};
use crate::sprites::source::IconFetcher;
use crate::sprites::SpriteKey;

/// Distinct sprite keys for `events`, in first-seen order.
pub fn unique_keys(events: &[HolidayRecord]) -> Vec<SpriteKey> {
    let mut seen = HashSet::new();
    events
        .iter()
        .map(|event| SpriteKey::normalize(&event.name))
        .filter(|key| seen.insert(key.clone()))
        .collect()
}

/// Per-key outcomes of one batch run.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub resolved: Vec<Resolution>,
    pub failed: Vec<SpriteError>,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    /// Number of keys satisfied by each tier.
    pub fn tier_counts(&self) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        for res in &self.resolved {
            *counts.entry(res.tier.label()).or_insert(0) += 1;
        }
        counts
    }

    pub fn failed_keys(&self) -> Vec<&SpriteKey> {
        self.failed.iter().map(SpriteError::key).collect()
    }
}

/// Resolve `keys` one after another.
pub fn run<F: IconFetcher>(resolver: &Resolver<F>, keys: &[SpriteKey]) -> BatchReport {
    let mut report = BatchReport::default();
    for key in keys {
        match resolver.resolve(key) {
            Ok(res) => report.resolved.push(res),
            Err(e) => report.failed.push(e),
        }
    }
    info!(
        resolved = report.resolved.len(),
        failed = report.failed.len(),
        "sprite batch finished"
    );
    report
}

#[cfg(test)]
mod tests {
    use std::fs;

    use image::Rgba;

    use super::*;
    use crate::config::SpriteConfig;
    use crate::sprites::raster::png_bytes;
    use crate::sprites::resolver::testing::ScriptedFetcher;
    use crate::sprites::resolver::Tier;
    use crate::sprites::source::SourceDescriptor;

    fn holiday(name: &str) -> HolidayRecord {
        serde_json::from_value(serde_json::json!({
            "name": name,
            "date": "2024-01-01",
            "global": true,
        }))
        .unwrap()
    }

    #[test]
    fn test_unique_keys_dedupes_in_order() {
        let events = [
            holiday("Labor Day"),
            holiday("Christmas Day"),
            holiday("labor  day"),
            holiday("New Year's Day"),
        ];
        let keys: Vec<_> = unique_keys(&events).iter().map(|k| k.to_string()).collect();
        assert_eq!(keys, ["labor_day", "christmas_day", "new_years_day"]);
    }

    #[test]
    fn test_batch_continues_past_failures() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = SpriteConfig::rooted(dir.path());
        config.sources = vec![SourceDescriptor::keyed("only", "https://x.test/{key}")];
        fs::create_dir_all(&config.custom_dir).unwrap();
        fs::write(config.custom_path("halloween.png"), b"mine").unwrap();

        let fetcher = ScriptedFetcher::default()
            .respond("https://x.test/labor_day", Ok(png_bytes(32, 32, Rgba([1, 2, 3, 255]))));
        let resolver = Resolver::new(config, fetcher);
        resolver.prepare().unwrap();

        let keys = unique_keys(&[holiday("Labor Day"), holiday("Memorial Day"), holiday("Halloween")]);
        let report = run(&resolver, &keys);

        assert!(!report.is_success());
        assert_eq!(report.resolved.len(), 2);
        assert_eq!(report.resolved[1].tier, Tier::Custom);
        assert_eq!(report.failed_keys(), [&SpriteKey::normalize("Memorial Day")]);
        let counts = report.tier_counts();
        assert_eq!(counts.get("downloaded"), Some(&1));
        assert_eq!(counts.get("custom"), Some(&1));
    }
}
