//! Typed client for the Zon storefront.
//!
//! The storefront has no stable public API and actively detects automation,
//! so every request flows through a rate-limited, retrying transport
//! ([`Client`]) whose responses are vetted by an anti-bot classifier
//! ([`classify`]) before any parsing happens.

mod backoff;
mod client;
pub mod endpoints;
mod error;
mod macros;
mod response;

pub use backoff::{RateLimitPolicy, SPACING_JITTER_MAX};
pub use client::{ApiResponse, Client};
pub use error::ZonApiError;
pub use reqwest::StatusCode;
pub use response::{classify, BlockDiagnostic, ResponseVerdict};

use endpoints::Request;
use reqwest::header::CONTENT_TYPE;

impl Client {
    /// Issue a typed endpoint request against the storefront.
    ///
    /// Throttling statuses that survive the retry budget surface as
    /// [`ZonApiError::RateLimited`]; other non-2xx statuses become
    /// [`ZonApiError::Status`]. Anti-bot interstitials have already been
    /// rejected by [`Client::execute`] before parsing is attempted.
    pub async fn send<R>(
        &self,
        request: R,
        access_token: Option<&str>,
    ) -> Result<R::Response, ZonApiError>
    where
        R: Request,
    {
        let url = format!("{}{}", self.base_url(), request.path());
        let mut builder = self.request(R::METHOD, &url);

        let query = request.query();
        if !query.is_empty() {
            builder = builder.query(&query);
        }
        if let Some(form) = request.form() {
            let body = url::form_urlencoded::Serializer::new(String::new())
                .extend_pairs(form)
                .finish();
            builder = builder
                .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(body);
        }
        if let Some(token) = access_token {
            builder = builder.bearer_auth(token);
        }

        let response = self.execute(builder).await?;

        if response.is_throttled() {
            return Err(ZonApiError::RateLimited(response.status()));
        }
        if !response.status().is_success() {
            let detail: String = response.text().chars().take(200).collect();
            return Err(ZonApiError::Status(response.status(), detail));
        }

        response.json()
    }
}
