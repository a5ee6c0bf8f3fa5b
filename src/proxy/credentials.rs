//! Credential resolvers used by the request proxy.
//!
//! The proxy never owns credentials; it asks one of two resolvers per call:
//!
//! - [`ClientCredentials`]: app-level token shared by every client-mode
//!   request. [`ClientCredentialsExchange`] implements it against the
//!   upstream token endpoint and caches the token until shortly before it
//!   expires.
//! - [`UserCredentials`]: per-caller token previously issued by the
//!   identity collaborator. [`SessionTokens`] reads it from the
//!   [`CallerContext`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, error};

use crate::{Result, TuneError};

/// Default client-credentials token endpoint.
pub const DEFAULT_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";

/// Tokens are treated as expired this long before the upstream says so.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// Lifetime assumed when the token response omits `expires_in`.
const DEFAULT_TOKEN_LIFETIME: Duration = Duration::from_secs(3600);

/// Identity of the caller a user-mode request is made for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallerContext {
    pub user_id: Option<String>,
    /// Access token previously issued to this user, if any.
    pub access_token: Option<String>,
}

impl CallerContext {
    /// A caller with no session.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// A caller carrying an access token.
    pub fn with_token(access_token: impl Into<String>) -> Self {
        Self {
            user_id: None,
            access_token: Some(access_token.into()),
        }
    }

    pub fn user_id(mut self, id: impl Into<String>) -> Self {
        self.user_id = Some(id.into());
        self
    }
}

/// Resolver for app-level (client) tokens.
#[async_trait]
pub trait ClientCredentials: Send + Sync {
    /// A client token, possibly cached.
    async fn access_token(&self) -> Result<String>;

    /// A freshly exchanged client token, bypassing any cache.
    ///
    /// Called by the proxy after the upstream rejected a client token.
    async fn refresh_access_token(&self) -> Result<String> {
        self.access_token().await
    }
}

/// Resolver for per-user tokens.
#[async_trait]
pub trait UserCredentials: Send + Sync {
    /// Token for `caller`, or [`TuneError::Unauthenticated`].
    async fn user_token(&self, caller: &CallerContext) -> Result<String>;
}

/// Reads the user token straight from the [`CallerContext`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionTokens;

#[async_trait]
impl UserCredentials for SessionTokens {
    async fn user_token(&self, caller: &CallerContext) -> Result<String> {
        caller
            .access_token
            .as_deref()
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .ok_or(TuneError::Unauthenticated)
    }
}

/// Client resolver for setups without client credentials.
///
/// Every client-mode request fails with a configuration error.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoClientCredentials;

#[async_trait]
impl ClientCredentials for NoClientCredentials {
    async fn access_token(&self) -> Result<String> {
        Err(TuneError::Configuration(
            "client credentials are not configured".to_string(),
        ))
    }
}

struct CachedToken {
    access_token: String,
    refresh_at: Instant,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

/// Client-credentials exchange against the upstream token endpoint.
///
/// Authenticates with HTTP Basic (`client_id:client_secret`) and requests
/// the default `client_credentials` grant. The token is cached until
/// [`EXPIRY_MARGIN`] before its advertised expiry; concurrent callers wait
/// on a single exchange instead of each starting their own.
pub struct ClientCredentialsExchange {
    client_id: String,
    client_secret: String,
    token_url: String,
    http: Client,
    cached: Mutex<Option<CachedToken>>,
}

impl ClientCredentialsExchange {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self::with_http_client(client_id, client_secret, DEFAULT_TOKEN_URL, Client::new())
    }

    /// Use a custom token endpoint and HTTP client (for testing with wiremock).
    pub fn with_http_client(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        token_url: impl Into<String>,
        http: Client,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            token_url: token_url.into(),
            http,
            cached: Mutex::new(None),
        }
    }

    async fn exchange(&self) -> Result<CachedToken> {
        debug!(url = %self.token_url, "exchanging client credentials");
        let response = self
            .http
            .post(&self.token_url)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = status.as_u16(), body = %body, "client token exchange failed");
            return Err(TuneError::TokenExchange {
                status: status.as_u16(),
                body,
            });
        }

        let token: TokenResponse = serde_json::from_str(&response.text().await?)?;
        let lifetime = token
            .expires_in
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TOKEN_LIFETIME);

        Ok(CachedToken {
            access_token: token.access_token,
            refresh_at: Instant::now() + lifetime.saturating_sub(EXPIRY_MARGIN),
        })
    }
}

#[async_trait]
impl ClientCredentials for ClientCredentialsExchange {
    async fn access_token(&self) -> Result<String> {
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref() {
            if Instant::now() < token.refresh_at {
                return Ok(token.access_token.clone());
            }
        }
        let fresh = self.exchange().await?;
        let access_token = fresh.access_token.clone();
        *cached = Some(fresh);
        Ok(access_token)
    }

    async fn refresh_access_token(&self) -> Result<String> {
        let mut cached = self.cached.lock().await;
        let fresh = self.exchange().await?;
        let access_token = fresh.access_token.clone();
        *cached = Some(fresh);
        Ok(access_token)
    }
}
