//! # Stride
//!
//! Client core for a personal fitness tracker: who is signed in, which pages
//! they may see, and their logged activities.
//!
//! ## Features
//!
//! - **Session management**: login, registration, logout and startup token validation
//! - **Durable sign-in**: the session token survives restarts
//! - **Route guards**: private pages wait for the session before deciding
//! - **Activities**: typed workout, meal and step records over the fitness API
//!
//! ## Modules
//!
//! - [`session`]: Session manager, state and token stores
//! - [`client`]: HTTP client for the fitness API's auth endpoints
//! - [`guard`]: Private/public route checks
//! - [`activities`]: Activity records and their API client
//! - [`config`]: TOML and environment configuration
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use stride::{FileTokenStore, HttpAuthClient, SessionManager, SessionOptions};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let backend = Arc::new(HttpAuthClient::new("http://localhost:8000", None)?);
//!     let store = Arc::new(FileTokenStore::new(FileTokenStore::default_path()));
//!
//!     let session = SessionManager::new(backend, store, SessionOptions::default());
//!
//!     // Wait for the persisted token (if any) to be checked
//!     let state = session.ready().await;
//!     if state.user.is_none() {
//!         let next = session.login("ana@example.com", "secret").await?;
//!         println!("Signed in, continue to {}", next);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod activities;
pub mod client;
pub mod config;
pub mod guard;
pub mod session;

pub use session::{
    AuthError, AuthResult, FileTokenStore, MemoryTokenStore, Navigation, SessionManager,
    SessionOptions, SessionState, StoreError, TokenStore, User,
};

pub use client::{AuthBackend, AuthGrant, Credentials, HttpAuthClient, Identity, Registration};

pub use guard::{Access, RouteGuard};

pub use activities::{
    ActivitiesClient, Activity, ActivityError, ActivityStatus, ActivityType, NewActivity,
};

pub use config::{ApiConfig, Config, ConfigError, LoggingConfig, SessionConfig};
