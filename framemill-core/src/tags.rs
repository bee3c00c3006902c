//! Tag-map configuration wire contract.
//!
//! Sessions are configured from a mapping of named fields to lists of
//! string values; every value arrives stringly-typed and defaulted, which
//! keeps the contract stable across embeddings. [`TagMap`] is that mapping
//! plus the defaulting accessors the rest of the engine builds on.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A configuration tag map: named fields, each holding one or more string
/// values. Single-valued fields are the norm; accessors read the first
/// value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagMap(BTreeMap<String, Vec<String>>);

impl TagMap {
    /// Create an empty tag map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a value to a field.
    pub fn insert(&mut self, key: impl Into<String>, value: impl ToString) -> &mut Self {
        self.0.entry(key.into()).or_default().push(value.to_string());
        self
    }

    /// The first value of a field, if present.
    pub fn first(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|v| v.first()).map(String::as_str)
    }

    /// String value of a field, falling back to a default.
    pub fn str_value(&self, key: &str, dflt: &str) -> String {
        self.first(key).unwrap_or(dflt).to_string()
    }

    /// Numeric value of a field, falling back to a default when the field
    /// is absent or does not parse.
    pub fn num_value(&self, key: &str, dflt: u32) -> u32 {
        self.first(key)
            .and_then(|v| v.parse().ok())
            .unwrap_or(dflt)
    }

    /// Boolean value of a field; accepts "1"/"true" and "0"/"false".
    pub fn bool_value(&self, key: &str, dflt: bool) -> bool {
        match self.first(key) {
            Some("1") | Some("true") => true,
            Some("0") | Some("false") => false,
            _ => dflt,
        }
    }
}

/// Convenience constructor used throughout the test suites.
impl<K: Into<String>, V: ToString> FromIterator<(K, V)> for TagMap {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut tags = TagMap::new();
        for (k, v) in iter {
            tags.insert(k, v);
        }
        tags
    }
}

/// Codec parameters for an encoder session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodeParams {
    /// Target bitrate in bits per second.
    pub bitrate: u32,
    /// Group-of-pictures length in frames.
    pub gop_frames: u32,
}

impl Default for EncodeParams {
    fn default() -> Self {
        Self {
            bitrate: 5_000_000,
            gop_frames: 90,
        }
    }
}

impl EncodeParams {
    /// Read encode parameters from a tag map, defaulting missing fields.
    pub fn from_tags(tags: &TagMap) -> Self {
        let dflt = Self::default();
        Self {
            bitrate: tags.num_value("bitrate", dflt.bitrate),
            gop_frames: tags.num_value("gopFrames", dflt.gop_frames),
        }
    }
}

impl std::fmt::Display for EncodeParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "bitrate {}, GOP frames {}",
            self.bitrate, self.gop_frames
        )
    }
}
