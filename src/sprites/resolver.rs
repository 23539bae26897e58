//! Tiered sprite resolution.
//!
//! For one [`SpriteKey`] the resolver checks, in order:
//!
//! 1. `custom/{key}.png`: used as-is, nothing is fetched or written.
//! 2. `auto/{key}.png`: a previous download (or fallback copy); treated as
//!    resolved, nothing is fetched.
//! 3. each configured source, in priority order, until one returns a
//!    decodable image at least `min_dimension` on each side. The image is
//!    padded to `size`×`size` and written to the auto tier.
//! 4. the fallback asset, copied byte-for-byte into the auto tier.
//!
//! If step 4 has no fallback to copy, the key fails with
//! [`SpriteError::FallbackMissing`] and nothing is written.

use std::fmt;
use std::fs;
use std::path::PathBuf;

use image::RgbaImage;
use tracing::{debug, error, info, warn};

use crate::config::SpriteConfig;
use crate::error::{FailureReason, SourceFailure, SpriteError, StartupError};
use crate::fs_util::write_atomic;
use crate::sprites::raster;
use crate::sprites::source::{HttpFetcher, IconFetcher, SourceDescriptor};
use crate::sprites::SpriteKey;

/// Which tier satisfied a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tier {
    Custom,
    Cached,
    Downloaded { source: String },
    /// Every source failed; `attempts` lists why, in order.
    Fallback { attempts: Vec<SourceFailure> },
}

impl Tier {
    pub fn label(&self) -> &'static str {
        match self {
            Tier::Custom => "custom",
            Tier::Cached => "cached",
            Tier::Downloaded { .. } => "downloaded",
            Tier::Fallback { .. } => "fallback",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tier::Downloaded { source } => write!(f, "downloaded from {}", source),
            other => f.write_str(other.label()),
        }
    }
}

/// Outcome of a successful resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub key: SpriteKey,
    pub tier: Tier,
    /// The sprite file that now represents the key.
    pub path: PathBuf,
}

/// Applies the tier policy for one key at a time.
pub struct Resolver<F> {
    config: SpriteConfig,
    fetcher: F,
}

impl Resolver<HttpFetcher> {
    /// Resolver backed by a blocking HTTP client using the configured timeout.
    pub fn http(config: SpriteConfig) -> Result<Self, StartupError> {
        let fetcher = HttpFetcher::new(config.timeout)?;
        Ok(Self::new(config, fetcher))
    }
}

impl<F: IconFetcher> Resolver<F> {
    pub fn new(config: SpriteConfig, fetcher: F) -> Self {
        Self { config, fetcher }
    }

    pub fn config(&self) -> &SpriteConfig {
        &self.config
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Validate the configuration, then create the auto tier, emptying it
    /// first when `clean` is set.
    ///
    /// Must be called once before the first [`resolve`](Self::resolve).
    pub fn prepare(&self) -> Result<(), StartupError> {
        self.config.validate()?;
        let dir = &self.config.auto_dir;
        let fail = |source| StartupError::Directory {
            path: dir.clone(),
            source,
        };
        if self.config.clean && dir.exists() {
            warn!(dir = %dir.display(), "clean mode: discarding downloaded sprites");
            fs::remove_dir_all(dir).map_err(fail)?;
        }
        fs::create_dir_all(dir).map_err(fail)?;
        Ok(())
    }

    /// Resolve one key to a sprite file.
    pub fn resolve(&self, key: &SpriteKey) -> Result<Resolution, SpriteError> {
        let result = self.resolve_inner(key);
        match &result {
            Ok(res) => match &res.tier {
                Tier::Downloaded { source } => {
                    info!(key = %key, tier = res.tier.label(), source = %source, "sprite resolved")
                }
                Tier::Fallback { attempts } => info!(
                    key = %key,
                    tier = res.tier.label(),
                    failed_sources = attempts.len(),
                    "sprite resolved"
                ),
                _ => info!(key = %key, tier = res.tier.label(), "sprite resolved"),
            },
            Err(e) => error!(key = %key, error = %e, "sprite unresolved"),
        }
        result
    }

    fn resolve_inner(&self, key: &SpriteKey) -> Result<Resolution, SpriteError> {
        if key.is_empty() {
            return Err(SpriteError::EmptyKey { key: key.clone() });
        }
        let file_name = key.file_name();

        let custom = self.config.custom_path(&file_name);
        if custom.is_file() {
            return Ok(Resolution {
                key: key.clone(),
                tier: Tier::Custom,
                path: custom,
            });
        }

        let target = self.config.auto_path(&file_name);
        if target.is_file() {
            return Ok(Resolution {
                key: key.clone(),
                tier: Tier::Cached,
                path: target,
            });
        }

        let mut attempts = Vec::new();
        for source in &self.config.sources {
            match self.try_source(source, key) {
                Ok(sprite) => {
                    let png = raster::encode_png(&sprite).map_err(|e| SpriteError::Encode {
                        key: key.clone(),
                        source: e,
                    })?;
                    write_atomic(&target, &png).map_err(|e| SpriteError::Io {
                        key: key.clone(),
                        path: target.clone(),
                        source: e,
                    })?;
                    return Ok(Resolution {
                        key: key.clone(),
                        tier: Tier::Downloaded {
                            source: source.name.clone(),
                        },
                        path: target,
                    });
                }
                Err(reason) => {
                    debug!(key = %key, source = %source.name, reason = %reason, "source failed");
                    attempts.push(SourceFailure {
                        source: source.name.clone(),
                        reason,
                    });
                }
            }
        }

        self.copy_fallback(key, target, attempts)
    }

    /// One attempt against one source, producing the padded sprite.
    fn try_source(&self, source: &SourceDescriptor, key: &SpriteKey) -> Result<RgbaImage, FailureReason> {
        let url = source.url_for(key).ok_or(FailureReason::NoCode)?;
        let body = self.fetcher.fetch(&url)?;
        let img = raster::decode(&body)?;
        raster::validate(&img, self.config.min_dimension)?;
        Ok(raster::fit_padded(&img, self.config.size))
    }

    fn copy_fallback(
        &self,
        key: &SpriteKey,
        target: PathBuf,
        attempts: Vec<SourceFailure>,
    ) -> Result<Resolution, SpriteError> {
        let fallback = &self.config.fallback;
        if !fallback.is_file() {
            return Err(SpriteError::FallbackMissing {
                key: key.clone(),
                path: fallback.clone(),
                attempts,
            });
        }
        let io_err = |path: &PathBuf, source| SpriteError::Io {
            key: key.clone(),
            path: path.clone(),
            source,
        };
        let bytes = fs::read(fallback).map_err(|e| io_err(fallback, e))?;
        write_atomic(&target, &bytes).map_err(|e| io_err(&target, e))?;
        Ok(Resolution {
            key: key.clone(),
            tier: Tier::Fallback { attempts },
            path: target,
        })
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::cell::RefCell;
    use std::collections::HashMap;

    use super::*;

    /// Fetcher answering from a fixed table; unknown URLs get a 404.
    #[derive(Default)]
    pub struct ScriptedFetcher {
        responses: HashMap<String, Result<Vec<u8>, FailureReason>>,
        calls: RefCell<Vec<String>>,
    }

    impl ScriptedFetcher {
        pub fn respond(mut self, url: &str, response: Result<Vec<u8>, FailureReason>) -> Self {
            self.responses.insert(url.to_string(), response);
            self
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.borrow().clone()
        }
    }

    impl IconFetcher for ScriptedFetcher {
        fn fetch(&self, url: &str) -> Result<Vec<u8>, FailureReason> {
            self.calls.borrow_mut().push(url.to_string());
            self.responses
                .get(url)
                .cloned()
                .unwrap_or(Err(FailureReason::Status(404)))
        }
    }
}
