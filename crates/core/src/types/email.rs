//! Email address type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// An email address as reported by the auth backend.
///
/// The backend owns sign-up and validation, so deserialization takes the
/// value as-is.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    /// Returns the email address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_trusts_backend() {
        let email: Email = serde_json::from_str("\"not-validated\"").unwrap();
        assert_eq!(email.as_str(), "not-validated");
        assert_eq!(email.to_string(), "not-validated");
    }
}
