//! Sprite resolver configuration.
//!
//! Configuration is an explicit value handed to the resolver, loaded from
//! an optional TOML file. Every field has a default, so an empty file (or
//! no file) gives the stock setup. Relative paths resolve against the
//! directory containing the config file.
//!
//! # Example sprites.toml
//!
//! ```toml
//! custom_dir = "sprites/custom"
//! auto_dir = "sprites/auto"
//! fallback = "sprites/fallback.png"
//! timeout_secs = 15
//!
//! [[sources]]
//! name = "pixelarticons"
//! url = "https://api.pixelarticons.com/icons/{key}"
//!
//! [[sources]]
//! name = "twemoji"
//! url = "https://cdn.jsdelivr.net/gh/twitter/twemoji@14.0.2/assets/72x72/{code}.png"
//! lookup = "emoji"
//!
//! [[sources]]
//! name = "house-icons"
//! url = "https://icons.example.org/{code}.png"
//! lookup = { thanksgiving_day = "turkey", halloween = "pumpkin" }
//! ```
//!
//! Sources are tried in the order they appear.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::StartupError;
use crate::sprites::source::{self, SourceDescriptor};

pub const DEFAULT_SIZE: u32 = 32;
pub const DEFAULT_MIN_DIMENSION: u32 = 10;
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// `lookup` is either the name of a built-in table or an inline table.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LookupToml {
    Builtin(String),
    Inline(BTreeMap<String, String>),
}

#[derive(Debug, Deserialize)]
struct SourceToml {
    name: String,
    url: String,
    #[serde(default)]
    lookup: Option<LookupToml>,
}

/// Raw TOML structure.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct SpriteToml {
    custom_dir: Option<PathBuf>,
    auto_dir: Option<PathBuf>,
    fallback: Option<PathBuf>,
    size: Option<u32>,
    min_dimension: Option<u32>,
    timeout_secs: Option<u64>,
    clean: Option<bool>,
    sources: Option<Vec<SourceToml>>,
}

/// Loaded resolver configuration.
#[derive(Debug, Clone)]
pub struct SpriteConfig {
    /// Human-curated overrides. Never written.
    pub custom_dir: PathBuf,
    /// Download cache, also receives fallback copies.
    pub auto_dir: PathBuf,
    /// Placeholder copied verbatim when every source fails.
    pub fallback: PathBuf,
    /// Edge length of the output sprites.
    pub size: u32,
    /// Downloaded images narrower or shorter than this are rejected.
    pub min_dimension: u32,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Empty the auto tier before resolving. Destroys the download cache.
    pub clean: bool,
    /// Remote sources in priority order.
    pub sources: Vec<SourceDescriptor>,
}

impl Default for SpriteConfig {
    fn default() -> Self {
        Self::rooted(Path::new("sprites"))
    }
}

impl SpriteConfig {
    /// Default configuration with all tiers under `root`.
    pub fn rooted(root: &Path) -> Self {
        Self {
            custom_dir: root.join("custom"),
            auto_dir: root.join("auto"),
            fallback: root.join("fallback.png"),
            size: DEFAULT_SIZE,
            min_dimension: DEFAULT_MIN_DIMENSION,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            clean: false,
            sources: source::default_sources(),
        }
    }

    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, StartupError> {
        let content = fs::read_to_string(path).map_err(|source| StartupError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        let base_path = path.parent().unwrap_or(Path::new("."));
        Self::from_toml_str(&content, base_path).map_err(|e| match e {
            ConfigParse::Toml(source) => StartupError::ConfigParse {
                path: path.to_path_buf(),
                source,
            },
            ConfigParse::Invalid(e) => e,
        })
    }

    /// Parse configuration text, resolving relative paths against `base_path`.
    fn from_toml_str(content: &str, base_path: &Path) -> Result<Self, ConfigParse> {
        let toml: SpriteToml = toml::from_str(content).map_err(ConfigParse::Toml)?;
        let defaults = Self::default();
        let resolve = |p: Option<PathBuf>, default: PathBuf| base_path.join(p.unwrap_or(default));

        let sources = match toml.sources {
            Some(list) => list
                .into_iter()
                .map(into_descriptor)
                .collect::<Result<Vec<_>, _>>()
                .map_err(ConfigParse::Invalid)?,
            None => defaults.sources,
        };

        let config = Self {
            custom_dir: resolve(toml.custom_dir, defaults.custom_dir),
            auto_dir: resolve(toml.auto_dir, defaults.auto_dir),
            fallback: resolve(toml.fallback, defaults.fallback),
            size: toml.size.unwrap_or(defaults.size),
            min_dimension: toml.min_dimension.unwrap_or(defaults.min_dimension),
            timeout: toml.timeout_secs.map(Duration::from_secs).unwrap_or(defaults.timeout),
            clean: toml.clean.unwrap_or(defaults.clean),
            sources,
        };
        config.validate().map_err(ConfigParse::Invalid)?;
        Ok(config)
    }

    /// Reject settings the resolver cannot honour.
    ///
    /// Sizes must be non-zero. The auto tier must be disjoint from the
    /// custom tier (neither equal to, inside, nor containing it) and must
    /// not hold the fallback asset, since clean mode deletes the auto tier
    /// wholesale.
    pub fn validate(&self) -> Result<(), StartupError> {
        if self.size == 0 {
            return Err(StartupError::InvalidConfig("size must be at least 1".into()));
        }
        if self.min_dimension == 0 {
            return Err(StartupError::InvalidConfig("min_dimension must be at least 1".into()));
        }

        let auto = lexical_absolute(&self.auto_dir);
        let custom = lexical_absolute(&self.custom_dir);
        if auto.starts_with(&custom) || custom.starts_with(&auto) {
            return Err(StartupError::InvalidConfig(format!(
                "auto_dir {:?} overlaps custom_dir {:?}",
                self.auto_dir, self.custom_dir
            )));
        }
        if lexical_absolute(&self.fallback).starts_with(&auto) {
            return Err(StartupError::InvalidConfig(format!(
                "fallback {:?} lies inside auto_dir {:?}",
                self.fallback, self.auto_dir
            )));
        }
        Ok(())
    }

    /// Path of `file_name` inside the custom tier.
    pub fn custom_path(&self, file_name: &str) -> PathBuf {
        self.custom_dir.join(file_name)
    }

    /// Path of `file_name` inside the auto tier.
    pub fn auto_path(&self, file_name: &str) -> PathBuf {
        self.auto_dir.join(file_name)
    }
}

/// Absolute form of `path` with `.` and `..` folded away, without touching
/// the filesystem.
fn lexical_absolute(path: &Path) -> PathBuf {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    let mut out = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

enum ConfigParse {
    Toml(toml::de::Error),
    Invalid(StartupError),
}

fn into_descriptor(raw: SourceToml) -> Result<SourceDescriptor, StartupError> {
    let lookup = match raw.lookup {
        None => None,
        Some(LookupToml::Inline(table)) => Some(table),
        Some(LookupToml::Builtin(name)) if name == source::EMOJI_TABLE => Some(source::emoji_table()),
        Some(LookupToml::Builtin(name)) => {
            return Err(StartupError::InvalidSource {
                name: raw.name,
                message: format!("unknown lookup table '{}'", name),
            });
        }
    };
    let descriptor = SourceDescriptor {
        name: raw.name,
        url: raw.url,
        lookup,
    };
    descriptor.validate()?;
    Ok(descriptor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = SpriteConfig::from_toml_str("", Path::new("/srv")).ok().unwrap();
        assert_eq!(config.custom_dir, PathBuf::from("/srv/sprites/custom"));
        assert_eq!(config.auto_dir, PathBuf::from("/srv/sprites/auto"));
        assert_eq!(config.fallback, PathBuf::from("/srv/sprites/fallback.png"));
        assert_eq!(config.size, 32);
        assert_eq!(config.min_dimension, 10);
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert!(!config.clean);
        assert_eq!(config.sources, source::default_sources());
    }

    #[test]
    fn test_sources_keep_file_order() {
        let text = r#"
            timeout_secs = 15
            clean = true

            [[sources]]
            name = "second"
            url = "https://b.test/{key}.png"

            [[sources]]
            name = "first"
            url = "https://a.test/{code}.png"
            lookup = { labor_day = "hammer" }

            [[sources]]
            name = "emoji"
            url = "https://e.test/{code}.png"
            lookup = "emoji"
        "#;
        let config = SpriteConfig::from_toml_str(text, Path::new(".")).ok().unwrap();
        let names: Vec<_> = config.sources.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["second", "first", "emoji"]);
        assert_eq!(config.timeout, Duration::from_secs(15));
        assert!(config.clean);
        assert_eq!(
            config.sources[1].lookup.as_ref().unwrap().get("labor_day").map(String::as_str),
            Some("hammer")
        );
        assert_eq!(config.sources[2].lookup, Some(source::emoji_table()));
    }

    #[test]
    fn test_unknown_lookup_table_rejected() {
        let text = r#"
            [[sources]]
            name = "bad"
            url = "https://x.test/{code}"
            lookup = "klingon"
        "#;
        let result = SpriteConfig::from_toml_str(text, Path::new("."));
        assert!(matches!(
            result,
            Err(ConfigParse::Invalid(StartupError::InvalidSource { .. }))
        ));
    }

    #[test]
    fn test_zero_size_rejected() {
        let result = SpriteConfig::from_toml_str("size = 0", Path::new("."));
        assert!(matches!(result, Err(ConfigParse::Invalid(StartupError::InvalidConfig(_)))));
    }

    #[test]
    fn test_zero_min_dimension_rejected() {
        let result = SpriteConfig::from_toml_str("min_dimension = 0", Path::new("."));
        assert!(matches!(result, Err(ConfigParse::Invalid(StartupError::InvalidConfig(_)))));
    }

    #[test]
    fn test_overlapping_tiers_rejected() {
        let cases = [
            "auto_dir = \"sprites\"",
            "auto_dir = \"sprites/custom\"",
            "auto_dir = \"sprites/custom/auto\"",
            "auto_dir = \"sprites/auto/../custom\"",
            "custom_dir = \"sprites/auto/mine\"",
            "fallback = \"sprites/auto/fallback.png\"",
        ];
        for text in cases {
            let result = SpriteConfig::from_toml_str(text, Path::new("/srv"));
            assert!(
                matches!(result, Err(ConfigParse::Invalid(StartupError::InvalidConfig(_)))),
                "accepted {}",
                text
            );
        }
    }

    #[test]
    fn test_sibling_tiers_accepted() {
        let text = "custom_dir = \"art/custom\"\nauto_dir = \"art/custom-auto\"\nfallback = \"art/fallback.png\"";
        assert!(SpriteConfig::from_toml_str(text, Path::new("/srv")).is_ok());
        assert!(SpriteConfig::default().validate().is_ok());
    }

    #[test]
    fn test_malformed_toml_rejected() {
        let result = SpriteConfig::from_toml_str("size = \"big\"", Path::new("."));
        assert!(matches!(result, Err(ConfigParse::Toml(_))));
    }

    #[test]
    fn test_load_resolves_relative_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sprites.toml");
        fs::write(&path, "auto_dir = \"cache\"\n").unwrap();
        let config = SpriteConfig::load(&path).unwrap();
        assert_eq!(config.auto_dir, dir.path().join("cache"));
    }

    #[test]
    fn test_load_missing_file() {
        let err = SpriteConfig::load(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, StartupError::ConfigIo { .. }));
    }
}
