//! Scripted [`AuthBackend`] for unit tests

use crate::client::{AuthBackend, AuthGrant, Credentials, Identity, Registration};
use crate::session::AuthError;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

pub(crate) fn identity() -> Identity {
    Identity {
        id: "1".to_string(),
        username: "ana".to_string(),
        email: "ana@example.com".to_string(),
    }
}

pub(crate) fn grant() -> AuthGrant {
    AuthGrant {
        token: "tok-1".to_string(),
        user: identity(),
    }
}

#[derive(Default)]
pub(crate) struct MockBackend {
    login_error: Mutex<Option<AuthError>>,
    register_error: Mutex<Option<AuthError>>,
    token_error: Mutex<Option<AuthError>>,
    login_calls: AtomicUsize,
    register_calls: AtomicUsize,
    me_calls: AtomicUsize,
    revoke_calls: AtomicUsize,
    last_token: Mutex<Option<String>>,
    gate: Option<Arc<Notify>>,
}

impl MockBackend {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Every call waits for a permit from `gate` before answering
    pub(crate) fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub(crate) fn reject_login(&self, message: &str) {
        *self.login_error.lock().unwrap() = Some(AuthError::Authentication(message.to_string()));
    }

    pub(crate) fn reject_register(&self, message: &str) {
        *self.register_error.lock().unwrap() =
            Some(AuthError::Authentication(message.to_string()));
    }

    pub(crate) fn reject_token(&self, message: &str) {
        *self.token_error.lock().unwrap() = Some(AuthError::Authentication(message.to_string()));
    }

    pub(crate) fn login_calls(&self) -> usize {
        self.login_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn register_calls(&self) -> usize {
        self.register_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn me_calls(&self) -> usize {
        self.me_calls.load(Ordering::SeqCst)
    }

    /// Total requests of any kind
    pub(crate) fn calls(&self) -> usize {
        self.login_calls()
            + self.register_calls()
            + self.me_calls()
            + self.revoke_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn last_token(&self) -> Option<String> {
        self.last_token.lock().unwrap().clone()
    }

    async fn wait_for_gate(&self) {
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
    }
}

#[async_trait]
impl AuthBackend for MockBackend {
    async fn login(&self, _credentials: &Credentials) -> Result<AuthGrant, AuthError> {
        self.login_calls.fetch_add(1, Ordering::SeqCst);
        self.wait_for_gate().await;
        match self.login_error.lock().unwrap().clone() {
            Some(e) => Err(e),
            None => Ok(grant()),
        }
    }

    async fn register(&self, _registration: &Registration) -> Result<AuthGrant, AuthError> {
        self.register_calls.fetch_add(1, Ordering::SeqCst);
        self.wait_for_gate().await;
        match self.register_error.lock().unwrap().clone() {
            Some(e) => Err(e),
            None => Ok(grant()),
        }
    }

    async fn current_user(&self, token: &str) -> Result<Identity, AuthError> {
        self.me_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_token.lock().unwrap() = Some(token.to_string());
        self.wait_for_gate().await;
        match self.token_error.lock().unwrap().clone() {
            Some(e) => Err(e),
            None => Ok(identity()),
        }
    }

    async fn revoke(&self, _token: &str) -> Result<(), AuthError> {
        self.revoke_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
