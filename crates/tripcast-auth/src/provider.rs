use async_trait::async_trait;

use tripcast_core::AuthError;

use crate::session::Session;

/// Email/password account provider
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Get the provider identifier, used in logs
    fn provider_id(&self) -> &str;

    /// Create an account and attach its display name
    async fn register(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<Session, AuthError>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError>;

    /// Exchange the session's refresh token for fresh tokens.
    /// A session without a refresh token is `SessionExpired`.
    async fn refresh(&self, session: &Session) -> Result<Session, AuthError>;
}
