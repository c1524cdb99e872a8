//! Identity-Toolkit style REST account provider.
//!
//! Accounts are created with `accounts:signUp`, named with
//! `accounts:update` and signed in with `accounts:signInWithPassword`.
//! Expiring id tokens are renewed at the token service's `/token` endpoint
//! with a `refresh_token` grant. The project's web API key travels as the
//! `key` query parameter on every call.

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use tripcast_core::{AuthConfig, AuthError};

use crate::provider::AuthProvider;
use crate::session::{Session, User};

const REQUEST_TIMEOUT_SECS: u64 = 15;
const DEFAULT_EXPIRES_IN: i64 = 3600;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CredentialsRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateProfileRequest<'a> {
    id_token: &'a str,
    display_name: &'a str,
    return_secure_token: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountResponse {
    local_id: String,
    email: String,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    id_token: Option<String>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<String>,
}

/// Token service reply; unlike the account endpoints it is snake_case
#[derive(Debug, Deserialize)]
struct TokenResponse {
    id_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<String>,
    #[serde(default)]
    user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Map a provider error code such as `EMAIL_EXISTS` or
/// `WEAK_PASSWORD : Password should be at least 6 characters`.
fn map_error_code(message: &str) -> AuthError {
    let code = message.split(' ').next().unwrap_or_default();
    match code {
        "EMAIL_EXISTS" => AuthError::EmailInUse,
        "WEAK_PASSWORD" => AuthError::WeakPassword,
        "INVALID_PASSWORD" | "EMAIL_NOT_FOUND" | "INVALID_LOGIN_CREDENTIALS" | "INVALID_EMAIL"
        | "USER_DISABLED" => AuthError::InvalidCredentials,
        "TOKEN_EXPIRED" | "INVALID_ID_TOKEN" | "INVALID_REFRESH_TOKEN" | "USER_NOT_FOUND" => {
            AuthError::SessionExpired
        }
        _ => AuthError::ProviderFailed(message.to_string()),
    }
}

pub struct IdentityToolkitAuth {
    client: Client,
    base_url: String,
    token_url: String,
    api_key: String,
}

impl IdentityToolkitAuth {
    pub fn new(config: &AuthConfig) -> Result<Self, AuthError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| AuthError::ProviderFailed(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token_url: config.token_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    /// Point both endpoints at another host (used against mock servers)
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self.token_url = self.base_url.clone();
        self
    }

    async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        method: &str,
        body: &B,
    ) -> Result<T, AuthError> {
        let request = self
            .client
            .post(format!("{}/accounts:{}", self.base_url, method))
            .json(body);
        self.send(&format!("accounts:{}", method), request).await
    }

    /// Trade a refresh token for a new id token
    #[tracing::instrument(skip(self, refresh_token), level = "info")]
    async fn refresh_token(&self, refresh_token: &str) -> Result<TokenResponse, AuthError> {
        let request = self
            .client
            .post(format!("{}/token", self.token_url))
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
            ]);
        self.send("token", request).await
    }

    async fn send<T: DeserializeOwned>(
        &self,
        label: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<T, AuthError> {
        if self.api_key.trim().is_empty() {
            return Err(AuthError::ProviderFailed("auth api key is not configured".into()));
        }

        let response = request
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| AuthError::ProviderFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            tracing::debug!("{} returned {}: {}", label, status, text);
            return Err(match serde_json::from_str::<ErrorEnvelope>(&text) {
                Ok(envelope) => map_error_code(&envelope.error.message),
                Err(_) => AuthError::ProviderFailed(format!("{}: {}", status, text)),
            });
        }

        response
            .json()
            .await
            .map_err(|e| AuthError::ProviderFailed(format!("Invalid response: {}", e)))
    }

    fn expires_at(expires_in: Option<String>) -> i64 {
        let seconds = expires_in
            .and_then(|s| s.parse::<i64>().ok())
            .unwrap_or(DEFAULT_EXPIRES_IN);
        chrono::Utc::now().timestamp() + seconds
    }

    fn session_from(account: AccountResponse) -> Result<Session, AuthError> {
        let id_token = account
            .id_token
            .ok_or_else(|| AuthError::ProviderFailed("response has no idToken".into()))?;

        Ok(Session {
            user: User {
                uid: account.local_id,
                email: account.email,
                display_name: account.display_name.filter(|n| !n.is_empty()),
            },
            id_token,
            refresh_token: account.refresh_token,
            expires_at: Self::expires_at(account.expires_in),
        })
    }
}

#[async_trait]
impl AuthProvider for IdentityToolkitAuth {
    fn provider_id(&self) -> &str {
        "identitytoolkit"
    }

    async fn register(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<Session, AuthError> {
        let account: AccountResponse = self
            .post(
                "signUp",
                &CredentialsRequest {
                    email,
                    password,
                    return_secure_token: true,
                },
            )
            .await?;
        let mut session = Self::session_from(account)?;

        let profile: AccountResponse = self
            .post(
                "update",
                &UpdateProfileRequest {
                    id_token: &session.id_token,
                    display_name,
                    return_secure_token: true,
                },
            )
            .await?;

        session.user.display_name = profile.display_name.filter(|n| !n.is_empty());
        if let Some(token) = profile.id_token {
            session.id_token = token;
        }
        if profile.refresh_token.is_some() {
            session.refresh_token = profile.refresh_token;
        }

        tracing::info!("Registered account {}", session.user.email);
        Ok(session)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let account: AccountResponse = self
            .post(
                "signInWithPassword",
                &CredentialsRequest {
                    email,
                    password,
                    return_secure_token: true,
                },
            )
            .await?;

        let session = Self::session_from(account)?;
        tracing::info!("Signed in as {}", session.user.email);
        Ok(session)
    }

    async fn refresh(&self, session: &Session) -> Result<Session, AuthError> {
        let current = session
            .refresh_token
            .as_deref()
            .ok_or(AuthError::SessionExpired)?;
        let tokens = self.refresh_token(current).await?;

        if let Some(uid) = &tokens.user_id {
            if uid != &session.user.uid {
                return Err(AuthError::ProviderFailed(
                    "refreshed token belongs to another account".into(),
                ));
            }
        }

        tracing::info!("Refreshed session for {}", session.user.email);
        Ok(Session {
            user: session.user.clone(),
            id_token: tokens.id_token,
            refresh_token: tokens.refresh_token.or_else(|| session.refresh_token.clone()),
            expires_at: Self::expires_at(tokens.expires_in),
        })
    }
}
