//! Session Management
//!
//! Owns the answer to "who is signed in" for the whole application.
//!
//! ## Architecture
//!
//! - **SessionManager**: login, registration, logout and startup validation
//! - **SessionState**: observable snapshot (`user`, `loading`, `last_error`)
//! - **TokenStore**: durable slot for the session token
//!
//! ## Lifecycle
//!
//! 1. On creation the persisted token (if any) is checked against the server
//! 2. Login and registration persist a fresh token and publish the user
//! 3. Logout removes the token and the user
//! 4. A rejected token at startup is discarded

mod error;
mod manager;
mod state;
mod store;

#[cfg(test)]
pub(crate) mod mock;

pub use error::{AuthError, AuthResult};
pub use manager::{SessionManager, SessionOptions};
pub use state::{Navigation, SessionState, User};
pub use store::{FileTokenStore, MemoryTokenStore, StoreError, TokenStore, TOKEN_KEY};
