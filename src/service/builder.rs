//! Builder for configuring service instances

use std::sync::Arc;
use std::time::Duration;

use super::GameService;
use crate::cache::CacheConfig;
use crate::catalog::{CatalogConfig, CatalogFetcher};
use crate::config::{Config, Secrets};
use crate::proxy::credentials::DEFAULT_TOKEN_URL;
use crate::proxy::{
    ClientCredentials, ClientCredentialsExchange, NoClientCredentials, RequestProxy,
    SessionTokens, UserCredentials,
};
use crate::round::{RoundBuilder, RoundOptions};
use crate::{Result, TuneError};

/// Main entry point for creating service instances.
pub struct TuneMetrics;

impl TuneMetrics {
    /// Create a new builder for configuring the service.
    pub fn builder() -> TuneMetricsBuilder {
        TuneMetricsBuilder::new()
    }
}

/// Builder for configuring service instances.
pub struct TuneMetricsBuilder {
    client_keys: Option<(String, String)>,
    client_credentials: Option<Arc<dyn ClientCredentials>>,
    user_credentials: Option<Arc<dyn UserCredentials>>,
    token_url: Option<String>,
    default_timeout_secs: Option<u64>,
    catalog: CatalogConfig,
    cache: CacheConfig,
    round: RoundOptions,
}

impl TuneMetricsBuilder {
    pub fn new() -> Self {
        Self {
            client_keys: None,
            client_credentials: None,
            user_credentials: None,
            token_url: None,
            default_timeout_secs: None,
            catalog: CatalogConfig::default(),
            cache: CacheConfig::default(),
            round: RoundOptions::default(),
        }
    }

    /// Start from a loaded config file plus secrets.
    pub fn from_config(config: &Config, secrets: &Secrets) -> Self {
        let mut builder = Self::new()
            .token_url(config.upstream.token_url.clone())
            .timeout(config.upstream.timeout_secs)
            .catalog_config(config.catalog_config())
            .cache_config(config.cache_config())
            .round_options(config.round_options());
        if let Some((id, secret)) = secrets.client_credentials() {
            builder = builder.client_credentials(id, secret);
        }
        builder
    }

    /// Exchange these client credentials for app-level tokens.
    pub fn client_credentials(
        mut self,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        self.client_keys = Some((client_id.into(), client_secret.into()));
        self
    }

    /// Use a custom client token resolver instead of the built-in exchange.
    pub fn client_credentials_provider(mut self, provider: Arc<dyn ClientCredentials>) -> Self {
        self.client_credentials = Some(provider);
        self
    }

    /// Use a custom user token resolver (default: [`SessionTokens`]).
    pub fn user_credentials(mut self, provider: Arc<dyn UserCredentials>) -> Self {
        self.user_credentials = Some(provider);
        self
    }

    pub fn api_base(mut self, url: impl Into<String>) -> Self {
        self.catalog = self.catalog.api_base(url);
        self
    }

    pub fn token_url(mut self, url: impl Into<String>) -> Self {
        self.token_url = Some(url.into());
        self
    }

    pub fn market(mut self, market: impl Into<String>) -> Self {
        self.catalog = self.catalog.market(market);
        self
    }

    pub fn page_size(mut self, n: u32) -> Self {
        self.catalog = self.catalog.page_size(n);
        self
    }

    pub fn catalog_config(mut self, config: CatalogConfig) -> Self {
        self.catalog = config;
        self
    }

    /// Set the timeout for all upstream requests (seconds).
    pub fn timeout(mut self, secs: u64) -> Self {
        self.default_timeout_secs = Some(secs);
        self
    }

    pub fn cache_config(mut self, config: CacheConfig) -> Self {
        self.cache = config;
        self
    }

    pub fn round_options(mut self, options: RoundOptions) -> Self {
        self.round = options;
        self
    }

    /// Build the service.
    pub fn build(self) -> Result<GameService> {
        let timeout_secs = self.default_timeout_secs.unwrap_or(30);
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| TuneError::Configuration(format!("failed to build HTTP client: {e}")))?;

        let client_credentials: Arc<dyn ClientCredentials> =
            match (self.client_credentials, self.client_keys) {
                (Some(provider), _) => provider,
                (None, Some((id, secret))) => {
                    Arc::new(ClientCredentialsExchange::with_http_client(
                        id,
                        secret,
                        self.token_url.unwrap_or_else(|| DEFAULT_TOKEN_URL.to_string()),
                        http.clone(),
                    ))
                }
                (None, None) => Arc::new(NoClientCredentials),
            };
        let user_credentials: Arc<dyn UserCredentials> = match self.user_credentials {
            Some(provider) => provider,
            None => Arc::new(SessionTokens),
        };

        let proxy = Arc::new(RequestProxy::with_http_client(
            http,
            client_credentials,
            user_credentials,
        ));
        let fetcher = Arc::new(CatalogFetcher::with_config(Arc::clone(&proxy), self.catalog));
        let catalog_cache = RoundBuilder::memoized_catalog(Arc::clone(&fetcher), &self.cache);
        let rounds = RoundBuilder::new(catalog_cache, self.round);

        Ok(GameService::new(proxy, fetcher, rounds))
    }
}

impl Default for TuneMetricsBuilder {
    fn default() -> Self {
        Self::new()
    }
}
