use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Credential storage error: {0}")]
    Storage(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("API error: {0}")]
    Api(#[from] zon_api::ZonApiError),

    #[error("callback listener error: {0}")]
    Listener(String),

    #[error("timed out waiting for the authorization callback")]
    Timeout,

    #[error("callback state does not match this login attempt")]
    CsrfMismatch,

    #[error("authorization denied by the provider: {0}")]
    AuthorizationDenied(String),

    #[error("token exchange failed: {0}")]
    TokenExchangeFailed(String),

    /// The stored credential survives this failure; the caller decides
    /// whether to force a fresh interactive login.
    #[error("token refresh failed: {0}")]
    RefreshFailed(String),

    #[error("not logged in; run `zoncli login` first")]
    AuthRequired,

    #[error("access token expired; refresh it or log in again")]
    AuthExpired,
}

impl From<config::ConfigError> for AuthError {
    fn from(err: config::ConfigError) -> Self {
        AuthError::Configuration(err.to_string())
    }
}
