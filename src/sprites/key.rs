//! Sprite key normalization.
//!
//! A [`SpriteKey`] is the filename stem shared by all three sprite tiers.
//! `"New Year's Day"` becomes `new_years_day`.

use std::fmt;

/// Normalized, filename-safe identifier derived from a holiday name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SpriteKey(String);

impl SpriteKey {
    /// Normalize a holiday display name.
    ///
    /// Lower-cases, drops apostrophes, and joins whitespace-separated words
    /// with a single underscore. Anything outside `[a-z0-9_,.-]` (path
    /// separators included) becomes `_`, and leading dots are removed, so
    /// the key is always a single plain path segment. Applying it to its
    /// own output is a no-op.
    pub fn normalize(name: &str) -> Self {
        let cleaned: String = name
            .chars()
            .filter(|c| *c != '\'' && *c != '\u{2019}')
            .flat_map(char::to_lowercase)
            .collect();
        let joined: String = cleaned
            .split_whitespace()
            .collect::<Vec<_>>()
            .join("_")
            .chars()
            .map(|c| if is_key_char(c) { c } else { '_' })
            .collect();
        SpriteKey(joined.trim_start_matches('.').to_string())
    }

    /// A name with nothing usable in it normalizes to the empty key.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `{key}.png`
    pub fn file_name(&self) -> String {
        format!("{}.png", self.0)
    }
}

fn is_key_char(c: char) -> bool {
    matches!(c, 'a'..='z' | '0'..='9' | '_' | ',' | '.' | '-')
}

impl fmt::Display for SpriteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SpriteKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
