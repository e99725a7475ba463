use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::error::TilesetError;

/// Ordered `key = value` store.
///
/// Text format: one entry per line, surrounding whitespace is trimmed. A line
/// whose first non-blank character is `#` is a comment; after a value, `#`
/// preceded by whitespace starts a trailing comment. A value may itself begin
/// with `#` (`tint = #ff00ff`) but cannot contain ` #`. Lines without `=` are
/// skipped with a warning.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    entries: BTreeMap<String, String>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parse(text: &str) -> Self {
        let mut entries = BTreeMap::new();
        for (n, line) in text.lines().enumerate() {
            let line = strip_comment(line).trim();
            if line.is_empty() {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                log::warn!("config line {}: key without value", n + 1);
                continue;
            };
            let key = key.trim();
            if key.is_empty() {
                log::warn!("config line {}: empty key", n + 1);
                continue;
            }
            entries.insert(key.to_string(), value.trim().to_string());
        }
        Self { entries }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, TilesetError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| TilesetError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::parse(&text))
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), TilesetError> {
        let path = path.as_ref();
        std::fs::write(path, self.to_string()).map_err(|source| TilesetError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Typed lookup; a missing or unparsable value yields `fallback`.
    pub fn get<T: FromStr>(&self, key: &str, fallback: T) -> T {
        let Some(raw) = self.entries.get(key) else {
            return fallback;
        };
        raw.parse().unwrap_or_else(|_| {
            log::warn!("config key `{key}`: cannot parse {raw:?}, using fallback");
            fallback
        })
    }

    #[inline]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl ToString) {
        self.entries.insert(key.into(), value.to_string());
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.entries.remove(key)
    }

    #[inline]
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, value) in &self.entries {
            writeln!(f, "{key} = {value}")?;
        }
        Ok(())
    }
}

fn strip_comment(line: &str) -> &str {
    if line.trim_start().starts_with('#') {
        return "";
    }
    let Some((key, value)) = line.split_once('=') else {
        return line;
    };
    let value_start = key.len() + 1 + (value.len() - value.trim_start().len());
    let bytes = line.as_bytes();
    line.match_indices('#')
        .find(|&(i, _)| i > value_start && bytes[i - 1].is_ascii_whitespace())
        .map_or(line, |(i, _)| &line[..i])
}
