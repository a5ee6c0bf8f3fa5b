//! Configuration loading.
//!
//! Configuration is loaded from TOML files with the following resolution order:
//! 1. `--config <path>` (CLI flag)
//! 2. `~/.tunemetrics/config.toml` (user)
//! 3. `/etc/tunemetrics/config.toml` (system)
//!
//! With no file anywhere, built-in defaults apply.
//!
//! Client credentials are loaded separately with mandatory permission checks:
//! 1. `~/.tunemetrics/secrets.toml` (user, must be 0600)
//! 2. `/etc/tunemetrics/secrets.toml` (system, must be 0600)
//!
//! and fall back to `SPOTIFY_CLIENT_ID` / `SPOTIFY_CLIENT_SECRET`.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cache::CacheConfig;
use crate::catalog::{CatalogConfig, DEFAULT_API_BASE, DEFAULT_PAGE_SIZE};
use crate::proxy::credentials::DEFAULT_TOKEN_URL;
use crate::round::{DEFAULT_MIN_PLAYABLE_MS, DEFAULT_OPTION_COUNT, RoundOptions};
use crate::{Result, TuneError};

const CONFIG_DIR: &str = ".tunemetrics";
const SYSTEM_DIR: &str = "/etc/tunemetrics";

/// Environment variable fallbacks for client credentials.
pub const CLIENT_ID_ENV: &str = "SPOTIFY_CLIENT_ID";
pub const CLIENT_SECRET_ENV: &str = "SPOTIFY_CLIENT_SECRET";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub cache: CacheSection,
    #[serde(default)]
    pub round: RoundSection,
}

/// Upstream API settings.
#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamConfig {
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_token_url")]
    pub token_url: String,
    /// ISO country code restricting catalog availability.
    #[serde(default)]
    pub market: Option<String>,
    /// Albums per listing page (default: 50).
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    /// HTTP request timeout in seconds (default: 30).
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            token_url: default_token_url(),
            market: None,
            page_size: default_page_size(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

fn default_token_url() -> String {
    DEFAULT_TOKEN_URL.to_string()
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

fn default_timeout() -> u64 {
    30
}

/// Catalog memoization settings.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheSection {
    /// Cached artist catalogs (default: 10).
    #[serde(default = "default_max_entries")]
    pub max_entries: u64,
    /// Optional expiry for cached catalogs.
    #[serde(default)]
    pub ttl_secs: Option<u64>,
}

impl Default for CacheSection {
    fn default() -> Self {
        Self {
            max_entries: default_max_entries(),
            ttl_secs: None,
        }
    }
}

fn default_max_entries() -> u64 {
    crate::cache::memoize::DEFAULT_MAX_ENTRIES
}

/// Round assembly settings.
#[derive(Debug, Clone, Deserialize)]
pub struct RoundSection {
    /// Options per round including the answer (default: 4).
    #[serde(default = "default_option_count")]
    pub option_count: usize,
    /// Tracks must be longer than this to be played (default: 5000).
    #[serde(default = "default_min_playable")]
    pub min_playable_ms: u64,
}

impl Default for RoundSection {
    fn default() -> Self {
        Self {
            option_count: default_option_count(),
            min_playable_ms: default_min_playable(),
        }
    }
}

fn default_option_count() -> usize {
    DEFAULT_OPTION_COUNT
}

fn default_min_playable() -> u64 {
    DEFAULT_MIN_PLAYABLE_MS
}

impl Config {
    /// Load configuration from the standard locations.
    ///
    /// An explicit path must exist. Without one, the first existing
    /// standard file wins, and defaults are used if there is none.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        match Self::resolve_config_path(explicit_path)? {
            Some(path) => Self::from_file(&path),
            None => Ok(Self::default()),
        }
    }

    /// Parse one config file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            TuneError::Configuration(format!("Failed to read config file {path:?}: {e}"))
        })?;
        toml::from_str(&content).map_err(|e| {
            TuneError::Configuration(format!("Failed to parse config file {path:?}: {e}"))
        })
    }

    fn resolve_config_path(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
        if let Some(path) = explicit {
            if path.exists() {
                return Ok(Some(path.to_path_buf()));
            }
            return Err(TuneError::Configuration(format!(
                "Config file not found: {path:?}"
            )));
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(CONFIG_DIR).join("config.toml");
            if user_config.exists() {
                return Ok(Some(user_config));
            }
        }

        let system_config = Path::new(SYSTEM_DIR).join("config.toml");
        if system_config.exists() {
            return Ok(Some(system_config));
        }

        Ok(None)
    }

    pub fn catalog_config(&self) -> CatalogConfig {
        let mut catalog = CatalogConfig::new()
            .api_base(self.upstream.api_base.clone())
            .page_size(self.upstream.page_size);
        if let Some(market) = &self.upstream.market {
            catalog = catalog.market(market.clone());
        }
        catalog
    }

    pub fn cache_config(&self) -> CacheConfig {
        let cache = CacheConfig::new().max_entries(self.cache.max_entries);
        match self.cache.ttl_secs {
            Some(secs) => cache.ttl(Duration::from_secs(secs)),
            None => cache,
        }
    }

    pub fn round_options(&self) -> RoundOptions {
        RoundOptions::new()
            .option_count(self.round.option_count)
            .min_playable_ms(self.round.min_playable_ms)
    }
}

/// Client credentials for the token exchange.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Secrets {
    #[serde(default)]
    pub spotify: Option<ClientSecret>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClientSecret {
    pub client_id: String,
    pub client_secret: String,
}

impl Secrets {
    /// Load secrets from the standard locations with permission checks.
    ///
    /// Returns empty secrets if no file exists (credentials may come from
    /// the environment).
    pub fn load() -> Result<Self> {
        if let Some(home) = dirs::home_dir() {
            let user_secrets = home.join(CONFIG_DIR).join("secrets.toml");
            if user_secrets.exists() {
                return Self::from_file(&user_secrets);
            }
        }

        let system_secrets = Path::new(SYSTEM_DIR).join("secrets.toml");
        if system_secrets.exists() {
            return Self::from_file(&system_secrets);
        }

        Ok(Secrets::default())
    }

    /// Parse one secrets file after checking its permissions.
    pub fn from_file(path: &Path) -> Result<Self> {
        Self::check_permissions(path)?;
        let content = fs::read_to_string(path).map_err(|e| {
            TuneError::Configuration(format!("Failed to read secrets file {path:?}: {e}"))
        })?;
        toml::from_str(&content).map_err(|e| {
            TuneError::Configuration(format!("Failed to parse secrets file {path:?}: {e}"))
        })
    }

    /// Check that the secrets file has secure permissions (0600 or 0400).
    #[cfg(unix)]
    fn check_permissions(path: &Path) -> Result<()> {
        use std::os::unix::fs::PermissionsExt;

        let metadata = fs::metadata(path).map_err(|e| {
            TuneError::Configuration(format!("Failed to stat secrets file {path:?}: {e}"))
        })?;

        let mode = metadata.permissions().mode();
        if mode & 0o077 != 0 {
            return Err(TuneError::Configuration(format!(
                "Secrets file {path:?} has insecure permissions {:o}. Must be 0600 or 0400.",
                mode & 0o777
            )));
        }

        Ok(())
    }

    #[cfg(not(unix))]
    fn check_permissions(_path: &Path) -> Result<()> {
        Ok(())
    }

    /// Client id and secret, falling back to the environment.
    pub fn client_credentials(&self) -> Option<(String, String)> {
        self.client_credentials_with(|name| std::env::var(name).ok())
    }

    /// Like [`client_credentials`](Self::client_credentials) with a custom
    /// environment lookup.
    pub fn client_credentials_with(
        &self,
        env: impl Fn(&str) -> Option<String>,
    ) -> Option<(String, String)> {
        if let Some(secret) = &self.spotify {
            return Some((secret.client_id.clone(), secret.client_secret.clone()));
        }
        let id = env(CLIENT_ID_ENV).filter(|v| !v.is_empty())?;
        let secret = env(CLIENT_SECRET_ENV).filter(|v| !v.is_empty())?;
        Some((id, secret))
    }
}
