//! Auth state shared across the application.
//!
//! `AuthContext` owns the current session and publishes the signed-in user
//! on a watch channel. Commands that need an account call
//! [`AuthContext::ensure_fresh`], which renews a session close to expiry
//! before handing out the user.

use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::watch;

use tripcast_core::AuthError;

use crate::provider::AuthProvider;
use crate::session::{Session, SessionStorage, User};

pub struct AuthContext {
    provider: Arc<dyn AuthProvider>,
    storage: SessionStorage,
    session: RwLock<Option<Session>>,
    state: watch::Sender<Option<User>>,
}

impl AuthContext {
    pub fn new(provider: Arc<dyn AuthProvider>, storage: SessionStorage) -> Self {
        let (state, _) = watch::channel(None);
        Self {
            provider,
            storage,
            session: RwLock::new(None),
            state,
        }
    }

    /// Restore the stored session. Unreadable sessions, and expired ones
    /// without a refresh token, are discarded and leave the context signed
    /// out. An expired session that can still be refreshed is kept for
    /// [`AuthContext::ensure_fresh`].
    pub fn init(&self) {
        let restored = match self.storage.retrieve() {
            Ok(Some(session)) if session.is_expired() && session.refresh_token.is_none() => {
                tracing::info!("Stored session for {} has expired", session.user.email);
                if let Err(e) = self.storage.delete() {
                    tracing::warn!("Failed to remove expired session: {}", e);
                }
                None
            }
            Ok(session) => session,
            Err(e) => {
                tracing::warn!("Ignoring unreadable session: {:#}", e);
                None
            }
        };

        self.apply(restored);
    }

    /// Watch the signed-in user. The receiver sees `None` while signed out.
    pub fn subscribe(&self) -> watch::Receiver<Option<User>> {
        self.state.subscribe()
    }

    pub fn current_user(&self) -> Option<User> {
        self.session.read().as_ref().map(|s| s.user.clone())
    }

    pub fn is_authenticated(&self) -> bool {
        self.session
            .read()
            .as_ref()
            .map(|s| !s.is_expired())
            .unwrap_or(false)
    }

    /// The signed-in user, refreshing the session first when it is close to
    /// expiry. A failed refresh of an already expired session signs out.
    pub async fn ensure_fresh(&self) -> Result<User, AuthError> {
        let current = self.session.read().clone();
        let Some(session) = current else {
            return Err(AuthError::NotAuthenticated);
        };
        if !session.needs_refresh() {
            return Ok(session.user);
        }

        match self.provider.refresh(&session).await {
            Ok(renewed) => self.persist(renewed),
            Err(e) if session.is_expired() => {
                tracing::warn!("Session for {} could not be renewed: {}", session.user.email, e);
                if let Err(e) = self.storage.delete() {
                    tracing::warn!("Failed to remove expired session: {}", e);
                }
                self.apply(None);
                Err(AuthError::SessionExpired)
            }
            Err(e) => {
                tracing::warn!("Early session refresh failed, token still valid: {}", e);
                Ok(session.user)
            }
        }
    }

    pub async fn register(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<User, AuthError> {
        let session = self.provider.register(email, password, display_name).await?;
        self.persist(session)
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let session = self.provider.sign_in(email, password).await?;
        self.persist(session)
    }

    pub fn sign_out(&self) -> Result<(), AuthError> {
        self.storage
            .delete()
            .map_err(|e| AuthError::StorageError(e.to_string()))?;
        self.apply(None);
        tracing::info!("Signed out of {}", self.provider.provider_id());
        Ok(())
    }

    /// Teardown: subscribers see a signed-out state, the stored session stays on disk.
    pub fn shutdown(&self) {
        self.state.send_replace(None);
        tracing::debug!("Auth context shut down");
    }

    fn persist(&self, session: Session) -> Result<User, AuthError> {
        self.storage
            .store(&session)
            .map_err(|e| AuthError::StorageError(e.to_string()))?;
        let user = session.user.clone();
        self.apply(Some(session));
        Ok(user)
    }

    fn apply(&self, session: Option<Session>) {
        let user = session.as_ref().map(|s| s.user.clone());
        *self.session.write() = session;
        self.state.send_replace(user);
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::tempdir;

    struct StubProvider {
        accept_password: &'static str,
        refreshes: AtomicUsize,
    }

    fn stub_session(email: &str, display_name: Option<&str>) -> Session {
        Session {
            user: User {
                uid: format!("uid-{}", email),
                email: email.to_string(),
                display_name: display_name.map(str::to_string),
            },
            id_token: "token".to_string(),
            refresh_token: None,
            expires_at: chrono::Utc::now().timestamp() + 3600,
        }
    }

    #[async_trait]
    impl AuthProvider for StubProvider {
        fn provider_id(&self) -> &str {
            "stub"
        }

        async fn register(
            &self,
            email: &str,
            _password: &str,
            display_name: &str,
        ) -> Result<Session, AuthError> {
            Ok(stub_session(email, Some(display_name)))
        }

        async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
            if password == self.accept_password {
                Ok(stub_session(email, None))
            } else {
                Err(AuthError::InvalidCredentials)
            }
        }

        async fn refresh(&self, session: &Session) -> Result<Session, AuthError> {
            self.refreshes.fetch_add(1, Ordering::SeqCst);
            match session.refresh_token.as_deref() {
                Some("valid") => Ok(Session {
                    id_token: "renewed".to_string(),
                    expires_at: chrono::Utc::now().timestamp() + 3600,
                    ..session.clone()
                }),
                _ => Err(AuthError::SessionExpired),
            }
        }
    }

    fn context(dir: &std::path::Path) -> AuthContext {
        context_with(dir, Arc::new(stub()))
    }

    fn stub() -> StubProvider {
        StubProvider {
            accept_password: "secret",
            refreshes: AtomicUsize::new(0),
        }
    }

    fn context_with(dir: &std::path::Path, provider: Arc<StubProvider>) -> AuthContext {
        AuthContext::new(provider, SessionStorage::new(&dir.join("session.json")))
    }

    fn store_session(dir: &std::path::Path, expires_in: i64, refresh_token: Option<&str>) {
        let mut session = stub_session("ada@example.com", Some("Ada"));
        session.expires_at = chrono::Utc::now().timestamp() + expires_in;
        session.refresh_token = refresh_token.map(str::to_string);
        SessionStorage::new(&dir.join("session.json"))
            .store(&session)
            .unwrap();
    }

    #[tokio::test]
    async fn test_sign_in_publishes_user() {
        let dir = tempdir().unwrap();
        let ctx = context(dir.path());
        ctx.init();

        let mut rx = ctx.subscribe();
        assert!(rx.borrow().is_none());
        assert!(matches!(ctx.ensure_fresh().await, Err(AuthError::NotAuthenticated)));

        ctx.sign_in("ada@example.com", "secret").await.unwrap();

        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().as_ref().unwrap().email, "ada@example.com");
        assert!(ctx.is_authenticated());
    }

    #[tokio::test]
    async fn test_failed_sign_in_stays_signed_out() {
        let dir = tempdir().unwrap();
        let ctx = context(dir.path());
        ctx.init();

        let err = ctx.sign_in("ada@example.com", "nope").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
        assert!(ctx.current_user().is_none());
    }

    #[tokio::test]
    async fn test_session_restored_after_restart() {
        let dir = tempdir().unwrap();
        {
            let ctx = context(dir.path());
            ctx.register("grace@example.com", "pw", "Grace").await.unwrap();
        }

        let ctx = context(dir.path());
        ctx.init();
        let user = ctx.ensure_fresh().await.unwrap();
        assert_eq!(user.display_name.as_deref(), Some("Grace"));
    }

    #[tokio::test]
    async fn test_expired_session_discarded() {
        let dir = tempdir().unwrap();
        let storage = SessionStorage::new(&dir.path().join("session.json"));
        let mut session = stub_session("old@example.com", None);
        session.expires_at = 0;
        storage.store(&session).unwrap();

        let ctx = context(dir.path());
        ctx.init();
        assert!(ctx.current_user().is_none());
        assert!(storage.retrieve().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_sign_out() {
        let dir = tempdir().unwrap();
        let ctx = context(dir.path());
        ctx.sign_in("ada@example.com", "secret").await.unwrap();

        ctx.sign_out().unwrap();
        assert!(ctx.current_user().is_none());
        assert!(!dir.path().join("session.json").exists());
    }

    #[tokio::test]
    async fn test_expired_session_is_renewed_on_restore() {
        let dir = tempdir().unwrap();
        store_session(dir.path(), -60, Some("valid"));

        let provider = Arc::new(stub());
        let ctx = context_with(dir.path(), provider.clone());
        ctx.init();
        assert!(!ctx.is_authenticated());

        let user = ctx.ensure_fresh().await.unwrap();
        assert_eq!(user.email, "ada@example.com");
        assert_eq!(provider.refreshes.load(Ordering::SeqCst), 1);
        assert!(ctx.is_authenticated());

        let stored = SessionStorage::new(&dir.path().join("session.json"))
            .retrieve()
            .unwrap()
            .unwrap();
        assert_eq!(stored.id_token, "renewed");
        assert!(!stored.needs_refresh());
    }

    #[tokio::test]
    async fn test_fresh_session_is_not_refreshed() {
        let dir = tempdir().unwrap();
        store_session(dir.path(), 3600, Some("valid"));

        let provider = Arc::new(stub());
        let ctx = context_with(dir.path(), provider.clone());
        ctx.init();
        ctx.ensure_fresh().await.unwrap();
        assert_eq!(provider.refreshes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_revoked_refresh_token_signs_out() {
        let dir = tempdir().unwrap();
        store_session(dir.path(), -60, Some("revoked"));

        let ctx = context(dir.path());
        ctx.init();
        let err = ctx.ensure_fresh().await.unwrap_err();
        assert!(matches!(err, AuthError::SessionExpired));
        assert!(ctx.current_user().is_none());
        assert!(!dir.path().join("session.json").exists());
    }

    #[tokio::test]
    async fn test_failed_early_refresh_keeps_valid_session() {
        let dir = tempdir().unwrap();
        store_session(dir.path(), 120, Some("revoked"));

        let ctx = context(dir.path());
        ctx.init();
        let user = ctx.ensure_fresh().await.unwrap();
        assert_eq!(user.uid, "uid-ada@example.com");
        assert!(ctx.is_authenticated());
    }
}
