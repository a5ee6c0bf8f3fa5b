use tunemetrics::{Result, TuneError};

#[test]
fn test_error_display() {
    let err = TuneError::Upstream {
        status: 404,
        body: "no such artist".to_string(),
    };
    assert!(err.to_string().contains("404"));
    assert!(err.to_string().contains("no such artist"));
}

#[test]
fn test_result_alias() {
    fn returns_error() -> Result<()> {
        Err(TuneError::Unauthenticated)
    }
    assert!(returns_error().is_err());
}

#[test]
fn test_json_error_conversion() {
    fn parse() -> Result<serde_json::Value> {
        Ok(serde_json::from_str("{oops")?)
    }
    assert!(matches!(parse(), Err(TuneError::Json(_))));
}

// ============================================================================
// Auth failure classification
// ============================================================================

#[test]
fn auth_failures() {
    assert!(TuneError::Unauthenticated.is_auth_failure());
    assert!(TuneError::ExpiredUserSession { status: 401 }.is_auth_failure());
    assert!(
        TuneError::Upstream {
            status: 401,
            body: String::new()
        }
        .is_auth_failure()
    );
    assert!(
        TuneError::Upstream {
            status: 403,
            body: String::new()
        }
        .is_auth_failure()
    );
    assert!(
        TuneError::TokenExchange {
            status: 400,
            body: "invalid_client".into()
        }
        .is_auth_failure()
    );
}

#[test]
fn non_auth_failures() {
    assert!(
        !TuneError::Upstream {
            status: 500,
            body: String::new()
        }
        .is_auth_failure()
    );
    assert!(
        !TuneError::Upstream {
            status: 429,
            body: String::new()
        }
        .is_auth_failure()
    );
    assert!(
        !TuneError::TokenExchange {
            status: 503,
            body: String::new()
        }
        .is_auth_failure()
    );
    assert!(!TuneError::Http("connection reset".into()).is_auth_failure());
    assert!(!TuneError::InvalidInput("empty".into()).is_auth_failure());
    assert!(!TuneError::Configuration("missing".into()).is_auth_failure());
}

#[test]
fn status_is_exposed_for_http_errors() {
    assert_eq!(TuneError::ExpiredUserSession { status: 403 }.status(), Some(403));
    assert_eq!(
        TuneError::Upstream {
            status: 502,
            body: String::new()
        }
        .status(),
        Some(502)
    );
    assert_eq!(TuneError::Unauthenticated.status(), None);
    assert_eq!(TuneError::Http("timeout".into()).status(), None);
}

#[test]
fn recoverable_errors() {
    assert!(
        TuneError::Upstream {
            status: 500,
            body: String::new()
        }
        .is_recoverable()
    );
    assert!(TuneError::Http("connection reset".into()).is_recoverable());
    assert!(
        !TuneError::Upstream {
            status: 401,
            body: String::new()
        }
        .is_recoverable()
    );
    assert!(!TuneError::ExpiredUserSession { status: 401 }.is_recoverable());
    assert!(!TuneError::Configuration("no client credentials".into()).is_recoverable());
    assert!(!TuneError::InvalidInput("empty".into()).is_recoverable());
}
