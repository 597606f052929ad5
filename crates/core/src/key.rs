//! Metric key validation
//!
//! A metric key is a lowercase ASCII string matching `[A-Za-z0-9_\-\.]+`.
//! It is used as the partitioning identifier in every storage backend.

use crate::error::CoreError;
use std::fmt;

/// A validated, lowercased metric key.
///
/// Construction is the only place the `[A-Za-z0-9_\-\.]+` regex is
/// enforced; once built, a `Key` is guaranteed valid.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Key(String);

impl Key {
    /// Validate and lowercase a raw key string.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidKey`] if `raw` (case-insensitively)
    /// does not match `[A-Za-z0-9_\-\.]+`.
    pub fn new(raw: &str) -> Result<Self, CoreError> {
        if raw.is_empty() || !raw.chars().all(is_key_char) {
            return Err(CoreError::InvalidKey(raw.to_string()));
        }
        Ok(Key(raw.to_ascii_lowercase()))
    }

    /// Borrow the validated, lowercased key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn is_key_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.'
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Key {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
