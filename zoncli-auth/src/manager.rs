use chrono::{Duration as ChronoDuration, Utc};
use oauth2::basic::{BasicClient, BasicErrorResponseType, BasicTokenResponse, BasicTokenType};
use oauth2::{
    AsyncHttpClient, AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, HttpRequest,
    HttpResponse, RedirectUrl, RefreshToken, RequestTokenError, Scope, TokenResponse, TokenUrl,
};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use zon_api::ZonApiError;

use crate::credential::Credential;
use crate::error::AuthError;
use crate::listener::{redirect_uri, CallbackListener, CallbackOutcome};
use crate::settings::Settings;
use crate::state::generate_state;
use crate::storage::CredentialStore;

/// Owns the credential over its whole lifecycle: interactive login, silent
/// refresh, validation before domain calls, and logout.
///
/// Token-endpoint traffic goes through the shared rate-limited client, so
/// exchange and refresh requests observe the same spacing, identity rotation,
/// and anti-bot classification as every other storefront call.
pub struct TokenManager {
    api: Arc<zon_api::Client>,
    settings: Settings,
    store: CredentialStore,
    credential: RwLock<Option<Credential>>,
}

impl TokenManager {
    /// Build a manager, loading any previously persisted credential.
    pub fn new(
        api: Arc<zon_api::Client>,
        settings: Settings,
        store: CredentialStore,
    ) -> Result<Self, AuthError> {
        let credential = store.load()?;
        if credential.is_some() {
            debug!("loaded persisted credential");
        }
        Ok(Self {
            api,
            settings,
            store,
            credential: RwLock::new(credential),
        })
    }

    /// Assemble the authorization endpoint URL for one login attempt.
    /// Deterministic for a given state; no side effects.
    pub fn authorization_url(&self, state: &str) -> Result<String, AuthError> {
        let csrf = CsrfToken::new(state.to_string());
        let (url, _) = self
            .oauth_client()?
            .authorize_url(|| csrf)
            .add_scopes(self.settings.scopes.iter().cloned().map(Scope::new))
            .url();
        Ok(url.to_string())
    }

    /// Run the interactive authorization-code flow.
    ///
    /// Exactly one outcome is produced: a stored credential, a CSRF
    /// mismatch, a provider denial, or a timeout. The callback listener is
    /// torn down in every case.
    pub async fn login(&self, timeout: Duration) -> Result<Credential, AuthError> {
        let state = generate_state();
        let url = self.authorization_url(&state)?;
        let listener = CallbackListener::bind(self.settings.callback_port, state).await?;

        info!(port = listener.port(), "waiting for authorization callback");
        println!("Complete the sign-in in your browser:\n\n  {url}\n");
        if let Err(e) = open::that(&url) {
            warn!(error = %e, "could not open a browser; use the printed URL");
        }

        match listener.wait(timeout).await? {
            CallbackOutcome::Granted { code } => self.exchange_code(&code).await,
            CallbackOutcome::StateMismatch => Err(AuthError::CsrfMismatch),
            CallbackOutcome::Denied { error } => Err(AuthError::AuthorizationDenied(error)),
        }
    }

    /// Exchange an authorization code for the initial credential.
    pub async fn exchange_code(&self, code: &str) -> Result<Credential, AuthError> {
        let result = self
            .oauth_client()?
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .request_async(&ApiHttpClient(self.api.as_ref()))
            .await;

        match result {
            Ok(token) => {
                let credential = credential_from(token, None)?;
                info!(expires_at = %credential.expires_at, "authorized");
                self.install(credential).await
            }
            Err(RequestTokenError::Request(e)) => Err(AuthError::Api(e)),
            Err(e) => Err(AuthError::TokenExchangeFailed(e.to_string())),
        }
    }

    /// Hand back a live credential, refreshing first if it expires within
    /// the refresh buffer. The not-due fast path makes no network call, so
    /// command handlers call this before every authenticated request.
    pub async fn refresh_if_needed(&self) -> Result<Credential, AuthError> {
        let refresh_token = {
            let guard = self.credential.read().await;
            match guard.as_ref() {
                None => return Err(AuthError::AuthRequired),
                Some(c) if !c.should_refresh() => return Ok(c.clone()),
                Some(c) => c.refresh_token.clone(),
            }
        };
        if refresh_token.is_empty() {
            return Err(AuthError::AuthRequired);
        }

        debug!("access token near expiry, refreshing");
        let result = self
            .oauth_client()?
            .exchange_refresh_token(&RefreshToken::new(refresh_token.clone()))
            .request_async(&ApiHttpClient(self.api.as_ref()))
            .await;

        match result {
            Ok(token) => {
                // The server may or may not rotate the refresh token; keep
                // the old one unless a new one was issued.
                let credential = credential_from(token, Some(refresh_token))?;
                info!(expires_at = %credential.expires_at, "token refreshed");
                self.install(credential).await
            }
            Err(RequestTokenError::ServerResponse(response))
                if *response.error() == BasicErrorResponseType::InvalidGrant =>
            {
                // The refresh token itself was revoked; the credential is
                // useless, so drop it and make the caller log in again.
                warn!("refresh token rejected with invalid_grant, clearing credential");
                {
                    let mut guard = self.credential.write().await;
                    *guard = None;
                }
                self.store.delete()?;
                Err(AuthError::RefreshFailed(
                    "refresh token no longer valid (invalid_grant)".to_string(),
                ))
            }
            Err(RequestTokenError::Request(e)) => Err(AuthError::Api(e)),
            Err(e) => Err(AuthError::RefreshFailed(e.to_string())),
        }
    }

    /// Last-mile guard before a domain request: the credential must exist,
    /// carry both tokens, and not be expired even with a zero buffer.
    pub async fn validate(&self) -> Result<Credential, AuthError> {
        let guard = self.credential.read().await;
        let credential = guard.as_ref().ok_or(AuthError::AuthRequired)?;
        if credential.access_token.is_empty() || credential.refresh_token.is_empty() {
            return Err(AuthError::AuthRequired);
        }
        if credential.is_expired(ChronoDuration::zero()) {
            return Err(AuthError::AuthExpired);
        }
        Ok(credential.clone())
    }

    /// Current credential, if any, without validity checks.
    pub async fn current(&self) -> Option<Credential> {
        self.credential.read().await.clone()
    }

    /// Drop the in-memory credential and its persisted copy.
    pub async fn logout(&self) -> Result<(), AuthError> {
        {
            let mut guard = self.credential.write().await;
            *guard = None;
        }
        self.store.delete()?;
        info!("logged out");
        Ok(())
    }

    /// Atomically replace the credential and persist it.
    async fn install(&self, credential: Credential) -> Result<Credential, AuthError> {
        {
            let mut guard = self.credential.write().await;
            *guard = Some(credential.clone());
        }
        self.store.save(&credential)?;
        Ok(credential)
    }

    fn oauth_client(
        &self,
    ) -> Result<
        BasicClient<
            oauth2::EndpointSet,
            oauth2::EndpointNotSet,
            oauth2::EndpointNotSet,
            oauth2::EndpointNotSet,
            oauth2::EndpointSet,
        >,
        AuthError,
    > {
        let auth_url = AuthUrl::new(self.settings.auth_url.clone())
            .map_err(|e| AuthError::Configuration(format!("invalid auth URL: {e}")))?;
        let token_url = TokenUrl::new(self.settings.token_url.clone())
            .map_err(|e| AuthError::Configuration(format!("invalid token URL: {e}")))?;
        let redirect_url = RedirectUrl::new(redirect_uri(self.settings.callback_port))
            .map_err(|e| AuthError::Configuration(format!("invalid redirect URI: {e}")))?;

        Ok(BasicClient::new(ClientId::new(self.settings.client_id.clone()))
            .set_client_secret(ClientSecret::new(self.settings.client_secret.clone()))
            .set_auth_uri(auth_url)
            .set_token_uri(token_url)
            .set_redirect_uri(redirect_url))
    }
}

/// Build a credential from a token response. `fallback_refresh` carries the
/// previous refresh token for refresh flows where the server does not rotate
/// it; exchanges pass `None` and require the server to issue one.
fn credential_from(
    token: BasicTokenResponse,
    fallback_refresh: Option<String>,
) -> Result<Credential, AuthError> {
    let refresh_token = token
        .refresh_token()
        .map(|r| r.secret().clone())
        .or(fallback_refresh)
        .ok_or_else(|| AuthError::TokenExchangeFailed("no refresh token in response".to_string()))?;

    let expires_in = token.expires_in().ok_or_else(|| {
        AuthError::TokenExchangeFailed("no expiration time in response".to_string())
    })?;

    let token_type = match token.token_type() {
        BasicTokenType::Bearer => "bearer".to_string(),
        BasicTokenType::Mac => "mac".to_string(),
        BasicTokenType::Extension(other) => other.clone(),
        _ => "bearer".to_string(),
    };

    Ok(Credential {
        access_token: token.access_token().secret().clone(),
        refresh_token,
        token_type,
        expires_at: Utc::now() + expires_in,
    })
}

/// Routes the oauth2 crate's token requests through the rate-limited client
/// instead of a bare HTTP client, so even token-endpoint calls are spaced,
/// retried, and classified.
struct ApiHttpClient<'a>(&'a zon_api::Client);

impl<'c, 'a> AsyncHttpClient<'c> for ApiHttpClient<'a>
where
    'a: 'c,
{
    type Error = ZonApiError;
    type Future = Pin<Box<dyn Future<Output = Result<HttpResponse, Self::Error>> + Send + 'c>>;

    fn call(&'c self, request: HttpRequest) -> Self::Future {
        let api = self.0;
        Box::pin(async move {
            let (parts, body) = request.into_parts();
            let mut builder = api.request(parts.method, parts.uri.to_string());
            for (name, value) in parts.headers.iter() {
                builder = builder.header(name, value);
            }

            let response = api.execute(builder.body(body)).await?;

            let mut out = HttpResponse::new(response.body().to_vec());
            *out.status_mut() = response.status();
            *out.headers_mut() = response.headers().clone();
            Ok(out)
        })
    }
}
