//! Session state
//!
//! The observable half of the session: who is signed in, whether an
//! operation is running, and the last error to show.

use super::error::AuthError;
use crate::client::Identity;
use serde::Serialize;
use std::fmt;

/// The signed-in account
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    id: String,
    display_name: String,
    email: String,
}

impl User {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    /// First letter of the display name, for avatars
    pub fn initial(&self) -> char {
        self.display_name
            .chars()
            .next()
            .map(|c| c.to_ascii_uppercase())
            .unwrap_or('U')
    }
}

impl User {
    pub(crate) fn from_identity(identity: Identity) -> Self {
        Self {
            id: identity.id,
            display_name: identity.username,
            email: identity.email,
        }
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <{}>", self.display_name, self.email)
    }
}

/// Snapshot of authentication state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    /// Signed-in account; `None` means logged out
    pub user: Option<User>,
    /// True during startup validation and in-flight login/registration
    pub loading: bool,
    /// Most recent error, cleared automatically after a short delay
    pub last_error: Option<AuthError>,
}

impl SessionState {
    /// State at process start, before the persisted token is checked
    pub fn starting() -> Self {
        Self {
            user: None,
            loading: true,
            last_error: None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }
}

/// Where the caller should navigate next (replacing the current entry)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigation {
    pub path: String,
}

impl Navigation {
    pub fn to(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

impl fmt::Display for Navigation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}
