//! Session Manager
//!
//! Single authority over who is signed in. Consumers read state through
//! [`SessionManager::state`] or a [`watch::Receiver`] and trigger changes
//! through `login`, `register`, `logout` and `clear_error`.

use super::error::{AuthError, AuthResult};
use super::state::{Navigation, SessionState, User};
use super::store::TokenStore;
use crate::client::{AuthBackend, Credentials, Registration};
use crate::config::SessionConfig;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;
use tokio::sync::{watch, OwnedMutexGuard};
use tokio::task::JoinHandle;

/// Behavioral settings for a session
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Where to go after signing in when no destination was recorded
    pub landing_path: String,
    /// Where to go after signing out
    pub login_path: String,
    /// How long an error stays visible before clearing itself
    pub error_display: Duration,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            landing_path: "/dashboard".to_string(),
            login_path: "/login".to_string(),
            error_display: Duration::from_secs(5),
        }
    }
}

impl From<&SessionConfig> for SessionOptions {
    fn from(config: &SessionConfig) -> Self {
        Self {
            landing_path: config.landing_path.clone(),
            login_path: config.login_path.clone(),
            error_display: Duration::from_secs(config.error_display_secs),
        }
    }
}

/// Owns authentication state for the lifetime of the application
pub struct SessionManager {
    inner: Arc<Inner>,
}

struct Inner {
    backend: Arc<dyn AuthBackend>,
    store: Arc<dyn TokenStore>,
    options: SessionOptions,
    state: watch::Sender<SessionState>,
    /// Held for the duration of startup validation, login or registration
    in_flight: Arc<tokio::sync::Mutex<()>>,
    /// Bumped whenever `last_error` is replaced or cleared
    error_generation: AtomicU64,
    error_timer: Mutex<Option<JoinHandle<()>>>,
    /// Page the user tried to open before being sent to sign in
    destination: Mutex<Option<String>>,
    /// Bumped by every logout. Operations that started under an older epoch
    /// must not publish their result; held while committing a sign-in.
    epoch: Mutex<u64>,
}

impl SessionManager {
    /// Create the session and start validating any persisted token.
    ///
    /// Must be called from within a Tokio runtime: validation runs on a
    /// spawned task. Without a persisted token the session is ready
    /// immediately and no request is made.
    pub fn new(
        backend: Arc<dyn AuthBackend>,
        store: Arc<dyn TokenStore>,
        options: SessionOptions,
    ) -> Self {
        let (state, _) = watch::channel(SessionState::starting());
        let inner = Arc::new(Inner {
            backend,
            store,
            options,
            state,
            in_flight: Arc::new(tokio::sync::Mutex::new(())),
            error_generation: AtomicU64::new(0),
            error_timer: Mutex::new(None),
            destination: Mutex::new(None),
            epoch: Mutex::new(0),
        });

        let token = match inner.store.load() {
            Ok(token) => token,
            Err(e) => {
                tracing::warn!("Failed to read persisted session token: {}", e);
                inner.discard_token();
                None
            }
        };

        match token {
            None => {
                tracing::debug!("No persisted session token");
                inner.state.send_modify(|s| s.loading = false);
            }
            Some(token) => {
                // A fresh mutex is always free
                match Arc::clone(&inner.in_flight).try_lock_owned() {
                    Ok(guard) => {
                        tokio::spawn(Inner::validate(Arc::clone(&inner), token, 0, guard));
                    }
                    Err(_) => inner.state.send_modify(|s| s.loading = false),
                }
            }
        }

        Self { inner }
    }

    /// Current state snapshot
    pub fn state(&self) -> SessionState {
        self.inner.state.borrow().clone()
    }

    /// Receiver that observes every state change
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.inner.state.subscribe()
    }

    pub fn user(&self) -> Option<User> {
        self.inner.state.borrow().user.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.inner.state.borrow().loading
    }

    pub fn last_error(&self) -> Option<AuthError> {
        self.inner.state.borrow().last_error.clone()
    }

    pub fn options(&self) -> &SessionOptions {
        &self.inner.options
    }

    /// The persisted token, for authorizing other API calls
    pub fn token(&self) -> Option<String> {
        match self.inner.store.load() {
            Ok(token) => token,
            Err(e) => {
                tracing::warn!("Failed to read session token: {}", e);
                None
            }
        }
    }

    /// Wait until no authentication operation is running and return the
    /// settled state. Route decisions must not be made before this.
    pub async fn ready(&self) -> SessionState {
        let mut rx = self.inner.state.subscribe();
        let settled = match rx.wait_for(|s| !s.loading).await {
            Ok(state) => state.clone(),
            Err(_) => self.state(),
        };
        settled
    }

    /// Record the page to return to after the next successful login
    pub fn remember_destination(&self, path: impl Into<String>) {
        *lock(&self.inner.destination) = Some(path.into());
    }

    /// Take the recorded destination, leaving the slot empty
    pub fn take_destination(&self) -> Option<String> {
        lock(&self.inner.destination).take()
    }

    /// Peek at the recorded destination without consuming it
    pub fn destination(&self) -> Option<String> {
        lock(&self.inner.destination).clone()
    }

    /// Sign in with email and password.
    ///
    /// On success the token is persisted and the returned navigation points
    /// at the recorded destination, or the landing page if none was recorded.
    pub async fn login(&self, email: &str, password: &str) -> AuthResult<Navigation> {
        if email.trim().is_empty() || password.is_empty() {
            let err = AuthError::Validation("Email and password are required".into());
            return Err(self.inner.fail(err, false));
        }

        let (_guard, epoch) = self.begin()?;
        tracing::info!("Signing in as {}", email.trim());

        let credentials = Credentials::new(email.trim(), password);
        match self.inner.backend.login(&credentials).await {
            Ok(grant) => {
                let user = self.inner.establish(&grant.token, grant.user, epoch)?;
                tracing::info!("Signed in as {} (id {})", user.display_name(), user.id());

                let path = self
                    .take_destination()
                    .unwrap_or_else(|| self.inner.options.landing_path.clone());
                Ok(Navigation::to(path))
            }
            Err(e) => {
                tracing::warn!("Sign-in failed ({}): {}", e.kind(), e);
                Err(self.inner.fail(e, true))
            }
        }
    }

    /// Create an account and sign in to it immediately.
    ///
    /// The account's username is the email address, so the published user's
    /// display name is the email; `name` is only checked for presence.
    pub async fn register(&self, name: &str, email: &str, password: &str) -> AuthResult<Navigation> {
        if name.trim().is_empty() || email.trim().is_empty() || password.is_empty() {
            let err = AuthError::Validation("Please fill in all fields".into());
            return Err(self.inner.fail(err, false));
        }

        let (_guard, epoch) = self.begin()?;
        tracing::info!("Registering account for {}", email.trim());

        let registration = Registration::new(name.trim(), email.trim(), password);
        match self.inner.backend.register(&registration).await {
            Ok(grant) => {
                let user = self.inner.establish(&grant.token, grant.user, epoch)?;
                tracing::info!("Registered and signed in as {}", user.display_name());

                self.take_destination();
                Ok(Navigation::to(self.inner.options.landing_path.clone()))
            }
            Err(e) => {
                tracing::warn!("Registration failed ({}): {}", e.kind(), e);
                Err(self.inner.fail(e, true))
            }
        }
    }

    /// Sign out locally. Never fails; storage problems are only logged.
    ///
    /// A startup validation, login or registration still running will not
    /// sign the user back in when it completes.
    pub fn logout(&self) -> Navigation {
        {
            let mut epoch = lock(&self.inner.epoch);
            *epoch += 1;
            self.inner.discard_token();
            self.inner.state.send_modify(|s| s.user = None);
        }
        self.take_destination();
        tracing::info!("Signed out");

        Navigation::to(self.inner.options.login_path.clone())
    }

    /// Clear the visible error and cancel its pending auto-clear
    pub fn clear_error(&self) {
        self.inner.clear_error();
    }

    /// Claim the in-flight slot and enter the loading state
    fn begin(&self) -> AuthResult<(OwnedMutexGuard<()>, u64)> {
        let guard = Arc::clone(&self.inner.in_flight)
            .try_lock_owned()
            .map_err(|_| AuthError::InProgress)?;

        let epoch = *lock(&self.inner.epoch);
        self.inner.clear_error();
        self.inner.state.send_modify(|s| s.loading = true);
        Ok((guard, epoch))
    }
}

impl Inner {
    /// Re-derive the signed-in user from a persisted token
    async fn validate(
        inner: Arc<Inner>,
        token: String,
        started: u64,
        _guard: OwnedMutexGuard<()>,
    ) {
        let result = inner.backend.current_user(&token).await;

        let epoch = lock(&inner.epoch);
        if *epoch != started {
            tracing::debug!("Signed out during startup validation; dropping result");
            inner.state.send_modify(|s| s.loading = false);
            return;
        }

        match result {
            Ok(identity) => {
                let user = User::from_identity(identity);
                tracing::info!("Restored session for {}", user.display_name());
                inner.state.send_modify(|s| {
                    s.user = Some(user);
                    s.loading = false;
                });
            }
            Err(e) => {
                tracing::warn!("Persisted session is no longer valid ({}): {}", e.kind(), e);
                inner.discard_token();
                inner.state.send_modify(|s| {
                    s.user = None;
                    s.loading = false;
                });
            }
        }
    }

    /// Persist the token and publish the signed-in user, unless a logout
    /// happened since the operation began.
    fn establish(
        &self,
        token: &str,
        identity: crate::client::Identity,
        started: u64,
    ) -> AuthResult<User> {
        let epoch = lock(&self.epoch);
        if *epoch != started {
            tracing::debug!("Signed out while signing in; dropping token");
            self.state.send_modify(|s| s.loading = false);
            return Err(AuthError::Cancelled);
        }

        if let Err(e) = self.store.save(token) {
            tracing::warn!("Failed to persist session token: {}", e);
        }

        let user = User::from_identity(identity);
        let published = user.clone();
        self.state.send_modify(|s| {
            s.user = Some(published);
            s.loading = false;
        });
        Ok(user)
    }

    /// Publish an error and arm its auto-clear. `settle` also ends the
    /// loading state of the operation that produced it.
    fn fail(self: &Arc<Self>, err: AuthError, settle: bool) -> AuthError {
        let generation = self.state_error(Some(err.clone()), settle);
        self.arm_error_timer(generation);
        err
    }

    fn clear_error(&self) {
        if let Some(timer) = lock(&self.error_timer).take() {
            timer.abort();
        }
        self.state_error(None, false);
    }

    /// Replace `last_error` and return the new generation
    fn state_error(&self, error: Option<AuthError>, settle: bool) -> u64 {
        let mut generation = 0;
        self.state.send_modify(|s| {
            generation = self.error_generation.fetch_add(1, Ordering::SeqCst) + 1;
            if settle {
                s.loading = false;
            }
            s.last_error = error;
        });
        generation
    }

    fn arm_error_timer(self: &Arc<Self>, generation: u64) {
        let weak: Weak<Inner> = Arc::downgrade(self);
        let delay = self.options.error_display;

        let timer = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(inner) = weak.upgrade() {
                inner.state.send_if_modified(|s| {
                    // A newer error or an explicit clear owns the slot now
                    if inner.error_generation.load(Ordering::SeqCst) != generation
                        || s.last_error.is_none()
                    {
                        return false;
                    }
                    s.last_error = None;
                    true
                });
            }
        });

        if let Some(previous) = lock(&self.error_timer).replace(timer) {
            previous.abort();
        }
    }

    fn discard_token(&self) {
        if let Err(e) = self.store.clear() {
            tracing::warn!("Failed to remove session token: {}", e);
        }
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        if let Some(timer) = lock(&self.error_timer).take() {
            timer.abort();
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}
