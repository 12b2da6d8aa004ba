//! Authenticated user record.

use serde::{Deserialize, Serialize};

use crate::types::{Email, UserId};

/// A signed-in user, as returned by the auth endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: Email,
    #[serde(default)]
    pub picture: Option<String>,
}
