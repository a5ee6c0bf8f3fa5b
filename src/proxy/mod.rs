//! Credential-resolving request proxy.
//!
//! [`RequestProxy`] issues authenticated requests against the upstream API.
//! Each call resolves its own bearer token:
//!
//! 1. an explicit [`RequestOptions::token`] is used verbatim;
//! 2. [`TokenKind::Client`] asks the [`ClientCredentials`] resolver;
//! 3. otherwise the [`UserCredentials`] resolver reads the caller's token.
//!
//! # Auth failure handling
//!
//! ```text
//!   send ──► 2xx ──────────────────────────────► parsed JSON
//!     │
//!     └──► 401/403 ──► client token? ──► refresh_access_token()
//!                         │                   │
//!                         │                   ▼
//!                         │               send once more ──► 2xx ► JSON
//!                         │                   │
//!                         │                   └──► non-2xx ► Upstream
//!                         │
//!                         └──► user token ──► ExpiredUserSession
//! ```
//!
//! There is at most one retry and no backoff; callers wanting broader retry
//! policies wrap the proxy themselves. User tokens are never refreshed here:
//! that belongs to the identity collaborator that issued them.

pub mod credentials;

use std::fmt;
use std::sync::Arc;

use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{error, info, warn};

pub use credentials::{
    CallerContext, ClientCredentials, ClientCredentialsExchange, NoClientCredentials,
    SessionTokens, UserCredentials,
};

use crate::telemetry;
use crate::{Result, TuneError};

/// Which resolver supplies the token for a request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TokenKind {
    /// App-level token from the client-credentials exchange.
    Client,
    /// Per-caller token from the identity collaborator.
    #[default]
    User,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Client => "client",
            TokenKind::User => "user",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-request options for [`RequestProxy::request`].
///
/// ```rust
/// # use tunemetrics::proxy::{RequestOptions, TokenKind};
/// let options = RequestOptions::client().header_str("accept-language", "en");
/// assert_eq!(options.token_kind, TokenKind::Client);
/// ```
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// HTTP method. Default: GET.
    pub method: Method,
    pub headers: HeaderMap,
    pub body: Option<String>,
    /// Default: [`TokenKind::User`].
    pub token_kind: TokenKind,
    /// Explicit bearer token, bypassing both resolvers.
    pub token: Option<String>,
    /// Caller identity handed to the user resolver.
    pub caller: Option<CallerContext>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Options for an app-level request.
    pub fn client() -> Self {
        Self::default().token_kind(TokenKind::Client)
    }

    /// Options for a request on behalf of `caller`.
    pub fn user(caller: CallerContext) -> Self {
        Self {
            caller: Some(caller),
            ..Self::default()
        }
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn token_kind(mut self, kind: TokenKind) -> Self {
        self.token_kind = kind;
        self
    }

    /// Use `token` verbatim instead of resolving one.
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn caller(mut self, caller: CallerContext) -> Self {
        self.caller = Some(caller);
        self
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Add a header from strings, silently skipping invalid names or values.
    pub fn header_str(self, name: &str, value: &str) -> Self {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => self.header(name, value),
            _ => self,
        }
    }

    /// Send `body` as JSON.
    pub fn json_body(mut self, body: &Value) -> Self {
        self.body = Some(body.to_string());
        self.headers
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        self
    }
}

/// How the catalog fetcher authenticates its upstream calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credentials {
    /// App-level client token.
    Client,
    /// The token carried by a caller context.
    User(CallerContext),
    /// An explicit per-user token (expiry is reported, not recovered).
    Token(String),
}

impl Credentials {
    /// Translate into [`RequestOptions`] for the proxy.
    pub fn request_options(&self) -> RequestOptions {
        match self {
            Credentials::Client => RequestOptions::client(),
            Credentials::User(caller) => RequestOptions::user(caller.clone()),
            Credentials::Token(token) => RequestOptions::new().token(token.clone()),
        }
    }
}

/// Authenticated HTTP front for the upstream API.
pub struct RequestProxy {
    http: Client,
    client_credentials: Arc<dyn ClientCredentials>,
    user_credentials: Arc<dyn UserCredentials>,
}

impl RequestProxy {
    pub fn new(
        client_credentials: Arc<dyn ClientCredentials>,
        user_credentials: Arc<dyn UserCredentials>,
    ) -> Self {
        Self::with_http_client(Client::new(), client_credentials, user_credentials)
    }

    /// Share an existing HTTP client (timeouts, connection pool).
    pub fn with_http_client(
        http: Client,
        client_credentials: Arc<dyn ClientCredentials>,
        user_credentials: Arc<dyn UserCredentials>,
    ) -> Self {
        Self {
            http,
            client_credentials,
            user_credentials,
        }
    }

    /// Issue an authenticated request and parse the JSON response.
    ///
    /// Empty 2xx bodies parse as [`Value::Null`].
    pub async fn request(&self, url: &str, options: &RequestOptions) -> Result<Value> {
        let token = self.resolve_token(options).await?;
        info!(method = %options.method, url, token_kind = %options.token_kind, "upstream request");

        let mut response = self.send(url, options, &token).await?;

        if is_auth_rejection(response.status()) {
            let status = response.status().as_u16();
            match options.token_kind {
                TokenKind::Client => {
                    warn!(status, url, "client token rejected, refreshing and retrying once");
                    metrics::counter!(telemetry::AUTH_RETRIES_TOTAL, "token_kind" => "client")
                        .increment(1);
                    let fresh = self.client_credentials.refresh_access_token().await?;
                    response = self.send(url, options, &fresh).await?;
                }
                TokenKind::User => {
                    warn!(status, url, "user token rejected");
                    return Err(TuneError::ExpiredUserSession { status });
                }
            }
        }

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = status.as_u16(), url, body = %body, "upstream error");
            return Err(TuneError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&body)?)
    }

    /// [`request`](Self::request), deserialized into `T`.
    pub async fn request_json<T: DeserializeOwned>(
        &self,
        url: &str,
        options: &RequestOptions,
    ) -> Result<T> {
        let value = self.request(url, options).await?;
        Ok(serde_json::from_value(value)?)
    }

    async fn resolve_token(&self, options: &RequestOptions) -> Result<String> {
        if let Some(token) = &options.token {
            return Ok(token.clone());
        }
        match options.token_kind {
            TokenKind::Client => self.client_credentials.access_token().await,
            TokenKind::User => {
                let anonymous = CallerContext::anonymous();
                let caller = options.caller.as_ref().unwrap_or(&anonymous);
                self.user_credentials.user_token(caller).await
            }
        }
    }

    async fn send(&self, url: &str, options: &RequestOptions, token: &str) -> Result<Response> {
        let mut request = self
            .http
            .request(options.method.clone(), url)
            .headers(options.headers.clone())
            .bearer_auth(token);
        if let Some(body) = &options.body {
            request = request.body(body.clone());
        }

        match request.send().await {
            Ok(response) => {
                metrics::counter!(telemetry::UPSTREAM_REQUESTS_TOTAL,
                    "method" => options.method.to_string(),
                    "status" => response.status().as_u16().to_string(),
                )
                .increment(1);
                Ok(response)
            }
            Err(e) => {
                metrics::counter!(telemetry::UPSTREAM_REQUESTS_TOTAL,
                    "method" => options.method.to_string(),
                    "status" => "transport",
                )
                .increment(1);
                error!(url, error = %e, "upstream request failed");
                Err(e.into())
            }
        }
    }
}

fn is_auth_rejection(status: StatusCode) -> bool {
    status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options_are_user_get() {
        let options = RequestOptions::default();
        assert_eq!(options.method, Method::GET);
        assert_eq!(options.token_kind, TokenKind::User);
        assert!(options.token.is_none());
    }

    #[test]
    fn json_body_sets_content_type() {
        let options = RequestOptions::new().json_body(&serde_json::json!({"a": 1}));
        assert_eq!(options.body.as_deref(), Some(r#"{"a":1}"#));
        assert_eq!(options.headers[CONTENT_TYPE], "application/json");
    }

    #[test]
    fn invalid_header_is_skipped() {
        let options = RequestOptions::new().header_str("bad header", "x");
        assert!(options.headers.is_empty());
    }

    #[test]
    fn credentials_map_to_token_kinds() {
        assert_eq!(
            Credentials::Client.request_options().token_kind,
            TokenKind::Client
        );
        let explicit = Credentials::Token("t".into()).request_options();
        assert_eq!(explicit.token_kind, TokenKind::User);
        assert_eq!(explicit.token.as_deref(), Some("t"));
    }
}
