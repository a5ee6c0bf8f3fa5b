//! tunemetrics error types

/// tunemetrics error types
#[derive(Debug, thiserror::Error)]
pub enum TuneError {
    // Credential errors
    /// No usable per-user token was available for a user-mode request.
    #[error("user not authenticated")]
    Unauthenticated,

    /// The upstream rejected a user token. Refreshing it is the identity
    /// collaborator's job, so this is surfaced without a retry.
    #[error("user session expired or invalid (upstream status {status})")]
    ExpiredUserSession { status: u16 },

    #[error("client credentials exchange failed ({status}): {body}")]
    TokenExchange { status: u16, body: String },

    // Upstream/network errors
    #[error("upstream API error ({status}): {body}")]
    Upstream { status: u16, body: String },

    #[error("HTTP error: {0}")]
    Http(String),

    // Data errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    // Configuration errors
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl TuneError {
    /// Whether this error means the caller has to (re-)authenticate.
    ///
    /// Auth-class errors always propagate to the top.
    pub fn is_auth_failure(&self) -> bool {
        match self {
            TuneError::Unauthenticated | TuneError::ExpiredUserSession { .. } => true,
            TuneError::TokenExchange { status, .. } => matches!(status, 400 | 401 | 403),
            TuneError::Upstream { status, .. } => matches!(status, 401 | 403),
            _ => false,
        }
    }

    /// Whether this error only spoils the request that produced it.
    ///
    /// Non-auth upstream statuses, transport failures and malformed bodies
    /// are recoverable: catalog pagination logs them and keeps what it has.
    /// Credential, configuration and input errors are not.
    pub fn is_recoverable(&self) -> bool {
        match self {
            TuneError::Upstream { .. } => !self.is_auth_failure(),
            TuneError::Http(_) | TuneError::Json(_) => true,
            _ => false,
        }
    }

    /// HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            TuneError::ExpiredUserSession { status }
            | TuneError::TokenExchange { status, .. }
            | TuneError::Upstream { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for TuneError {
    fn from(err: reqwest::Error) -> Self {
        TuneError::Http(err.to_string())
    }
}

/// Result type alias for tunemetrics operations
pub type Result<T> = std::result::Result<T, TuneError>;
