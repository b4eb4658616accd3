//! Fitness API Client
//!
//! Talks to the remote fitness service for everything that needs a server:
//! credential exchange, registration, token validation and revocation.
//!
//! ## Endpoints
//!
//! - `POST /api/login/` - exchange credentials for a token
//! - `POST /api/register/` - create an account
//! - `GET /api/me/` - identity behind a token
//! - `POST /api/logout/` - revoke a token
//!
//! The session manager only sees the [`AuthBackend`] trait, so tests and
//! alternative transports can stand in for [`HttpAuthClient`].

mod dto;
mod http;

pub use dto::{error_message, AuthGrant, Credentials, Identity, Registration, RegistrationResponse};
pub use http::HttpAuthClient;

use crate::session::AuthError;
use async_trait::async_trait;

/// Remote authority for accounts and tokens
#[async_trait]
pub trait AuthBackend: Send + Sync {
    /// Exchange credentials for a token and identity
    async fn login(&self, credentials: &Credentials) -> Result<AuthGrant, AuthError>;

    /// Create an account and return a token for it
    async fn register(&self, registration: &Registration) -> Result<AuthGrant, AuthError>;

    /// Look up the identity a token belongs to
    async fn current_user(&self, token: &str) -> Result<Identity, AuthError>;

    /// Invalidate a token server-side
    async fn revoke(&self, token: &str) -> Result<(), AuthError>;
}
