//! Client-generated cart session identifier.

use core::fmt;

use chrono::Utc;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};

/// Alphabet for the random suffix (lowercase base-36).
const CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Length of the random suffix.
const SUFFIX_LEN: usize = 9;

/// Opaque token keying cart state on the backend.
///
/// A fresh identifier is generated for every page load and never persisted.
/// Uniqueness is not guaranteed: two loads in the same millisecond can draw
/// the same suffix, and the backend will then share one cart between them.
///
/// # Example
///
/// ```
/// use agrimap_core::SessionId;
///
/// let id = SessionId::generate();
/// assert!(id.as_str().starts_with("session_"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Generate a new identifier of the form `session_<unix-millis>_<suffix>`.
    #[must_use]
    pub fn generate() -> Self {
        let mut rng = rand::rng();
        let suffix: String = (0..SUFFIX_LEN)
            .map(|_| CHARSET.choose(&mut rng).copied().map_or('0', char::from))
            .collect();

        Self(format!("session_{}_{suffix}", Utc::now().timestamp_millis()))
    }

    /// Wrap an identifier obtained elsewhere (e.g. passed on the command line).
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SessionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
