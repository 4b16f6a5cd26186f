use reqwest::StatusCode;
use thiserror::Error;

use crate::response::{BlockDiagnostic, ResponseVerdict};

#[derive(Error, Debug)]
pub enum ZonApiError {
    /// Transport-level failure (DNS, connect, timeout). Never retried here;
    /// throttling retries are reserved for 429/503 responses.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The HTTP layer succeeded but the payload is an anti-bot interstitial.
    #[error("{verdict}: {diagnostic}")]
    Blocked {
        verdict: ResponseVerdict,
        diagnostic: BlockDiagnostic,
    },

    /// Still throttled after the retry budget was spent.
    #[error("rate limited by the storefront (HTTP {0}) after exhausting retries")]
    RateLimited(StatusCode),

    /// Unexpected status on an endpoint call.
    #[error("storefront returned HTTP {0}: {1}")]
    Status(StatusCode, String),

    /// Request bodies must be buffered so each attempt can replay them.
    #[error("request cannot be cloned for retry; stream bodies are not supported")]
    BodyNotReplayable,

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ZonApiError {
    /// The classifier verdict behind this error, if it is a block.
    pub fn verdict(&self) -> Option<ResponseVerdict> {
        match self {
            ZonApiError::Blocked { verdict, .. } => Some(*verdict),
            _ => None,
        }
    }
}
