//! Route Guards
//!
//! Decide whether a page may be shown given the current session.
//! Private pages need a signed-in user; public pages (login, sign-up)
//! bounce signed-in users back into the app.

use crate::session::{Navigation, SessionManager};

/// Outcome of a guard check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    /// Show the requested page
    Allow,
    /// Go somewhere else instead
    Redirect(Navigation),
}

impl Access {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Access::Allow)
    }
}

/// Guard bound to one session
pub struct RouteGuard<'a> {
    session: &'a SessionManager,
}

impl<'a> RouteGuard<'a> {
    pub fn new(session: &'a SessionManager) -> Self {
        Self { session }
    }

    /// Check a page that requires a signed-in user.
    ///
    /// Waits for any running authentication operation first. When access is
    /// refused, `location` is remembered so login can return to it.
    pub async fn private(&self, location: &str) -> Access {
        let state = self.session.ready().await;

        if state.is_authenticated() {
            return Access::Allow;
        }

        tracing::debug!("Redirecting {} to sign-in", location);
        self.session.remember_destination(location);
        Access::Redirect(Navigation::to(self.session.options().login_path.clone()))
    }

    /// Check a page meant for signed-out users
    pub fn public(&self) -> Access {
        if self.session.user().is_none() {
            return Access::Allow;
        }

        let path = self
            .session
            .destination()
            .unwrap_or_else(|| self.session.options().landing_path.clone());
        Access::Redirect(Navigation::to(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::mock::MockBackend;
    use crate::session::{MemoryTokenStore, SessionOptions};
    use std::sync::Arc;
    use tokio::sync::Notify;

    #[tokio::test]
    async fn test_private_redirects_and_remembers() {
        let session = SessionManager::new(
            Arc::new(MockBackend::new()),
            Arc::new(MemoryTokenStore::new()),
            SessionOptions::default(),
        );
        let guard = RouteGuard::new(&session);

        let access = guard.private("/activities").await;
        assert_eq!(access, Access::Redirect(Navigation::to("/login")));
        assert_eq!(guard.public(), Access::Allow);

        let nav = session.login("ana@example.com", "secret").await.unwrap();
        assert_eq!(nav.path, "/activities");
        assert!(guard.private("/activities").await.is_allowed());
    }

    #[tokio::test]
    async fn test_private_waits_for_startup_validation() {
        let gate = Arc::new(Notify::new());
        let session = SessionManager::new(
            Arc::new(MockBackend::new().gated(Arc::clone(&gate))),
            Arc::new(MemoryTokenStore::with_token("tok-1")),
            SessionOptions::default(),
        );
        let guard = RouteGuard::new(&session);

        let release = async {
            tokio::task::yield_now().await;
            assert!(session.is_loading());
            gate.notify_one();
        };
        let (access, _) = tokio::join!(guard.private("/dashboard"), release);

        // Without waiting this would have been a redirect
        assert_eq!(access, Access::Allow);
    }

    #[tokio::test]
    async fn test_public_redirects_signed_in_user() {
        let session = SessionManager::new(
            Arc::new(MockBackend::new()),
            Arc::new(MemoryTokenStore::new()),
            SessionOptions::default(),
        );
        session.login("ana@example.com", "secret").await.unwrap();
        let guard = RouteGuard::new(&session);

        assert_eq!(guard.public(), Access::Redirect(Navigation::to("/dashboard")));
    }
}
