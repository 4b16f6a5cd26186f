use bytes::Bytes;
use reqwest::header::{HeaderMap, CONTENT_TYPE, USER_AGENT};
use reqwest::{Client as ReqwestClient, Method, RequestBuilder, StatusCode};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::backoff::{self, RateLimitPolicy};
use crate::error::ZonApiError;
use crate::response::{classify, BlockDiagnostic};

const BASE_URL: &str = "https://www.zon.com/api";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Browser fingerprints rotated across attempts. The storefront profiles
/// repeated identical clients, so no two consecutive requests present the
/// same identity.
const IDENTITY_POOL: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/130.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.6 Safari/605.1.15",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:132.0) Gecko/20100101 Firefox/132.0",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/129.0.0.0 Safari/537.36",
    "Mozilla/5.0 (iPhone; CPU iPhone OS 17_6 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.6 Mobile/15E148 Safari/604.1",
];

/// A fully buffered response. The body is read exactly once off the wire and
/// kept as [`Bytes`] so it can be inspected repeatedly downstream.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    status: StatusCode,
    url: String,
    headers: HeaderMap,
    body: Bytes,
}

impl ApiResponse {
    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn content_type(&self) -> &str {
        self.headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, ZonApiError> {
        serde_json::from_slice(&self.body).map_err(ZonApiError::from)
    }

    /// True for the throttling statuses the client retries on.
    pub fn is_throttled(&self) -> bool {
        self.status == StatusCode::TOO_MANY_REQUESTS
            || self.status == StatusCode::SERVICE_UNAVAILABLE
    }
}

/// Rate-limited, retrying HTTP client shared by every command and by the
/// token manager.
///
/// All requests serialize through a single spacing gate so concurrent
/// callers still observe the configured minimum gap between sends. The gate
/// mutex is held only to reserve the next send instant, never across I/O.
pub struct Client {
    http: ReqwestClient,
    policy: RateLimitPolicy,
    base_url: String,
    next_slot: Mutex<Option<Instant>>,
    identity: AtomicUsize,
}

impl Client {
    pub fn new(policy: RateLimitPolicy) -> Result<Self, ZonApiError> {
        Self::with_base_url(policy, BASE_URL)
    }

    /// Point the client at a different storefront root (used by tests).
    pub fn with_base_url(
        policy: RateLimitPolicy,
        base_url: impl Into<String>,
    ) -> Result<Self, ZonApiError> {
        let http = ReqwestClient::builder()
            .timeout(REQUEST_TIMEOUT)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            policy,
            base_url: base_url.into(),
            next_slot: Mutex::new(None),
            identity: AtomicUsize::new(0),
        })
    }

    pub fn policy(&self) -> &RateLimitPolicy {
        &self.policy
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Create a request builder on the underlying reqwest client.
    pub fn request<U>(&self, method: Method, url: U) -> RequestBuilder
    where
        U: reqwest::IntoUrl,
    {
        self.http.request(method, url)
    }

    /// Execute a request with spacing, identity rotation, throttling retries,
    /// and payload classification.
    ///
    /// Transport failures are returned immediately; only 429/503 responses
    /// are retried, up to `policy.max_retries` additional attempts. A final
    /// 429/503 is returned as a plain response so the caller keeps the status
    /// code; any other response is classified and a non-clean verdict becomes
    /// [`ZonApiError::Blocked`].
    pub async fn execute(&self, builder: RequestBuilder) -> Result<ApiResponse, ZonApiError> {
        self.pace().await;

        let mut attempt: u32 = 0;
        loop {
            let request = builder
                .try_clone()
                .ok_or(ZonApiError::BodyNotReplayable)?
                .header(USER_AGENT, self.next_identity())
                .build()?;

            let method = request.method().clone();
            let url = request.url().to_string();
            debug!(attempt = attempt + 1, %method, %url, "sending request");

            let response = self.http.execute(request).await?;
            let status = response.status();
            debug!(attempt = attempt + 1, %url, %status, "received response");

            let throttled = status == StatusCode::TOO_MANY_REQUESTS
                || status == StatusCode::SERVICE_UNAVAILABLE;

            if throttled && attempt < self.policy.max_retries {
                attempt += 1;
                let delay = self.policy.retry_delay(attempt);
                warn!(
                    %url,
                    %status,
                    retry = attempt,
                    max_retries = self.policy.max_retries,
                    delay_ms = delay.as_millis() as u64,
                    "throttled, backing off before retry"
                );
                tokio::time::sleep(delay).await;
                continue;
            }

            let headers = response.headers().clone();
            let body = response.bytes().await?;
            let response = ApiResponse {
                status,
                url,
                headers,
                body,
            };

            // Exhausted throttling keeps its status code for the caller;
            // classification only applies to responses that claim success.
            if throttled {
                return Ok(response);
            }

            let verdict = classify(response.content_type(), &response.text());
            if !verdict.is_clean() {
                let diagnostic = BlockDiagnostic::new(
                    response.url(),
                    response.status(),
                    response.content_type(),
                    &response.text(),
                );
                warn!(%verdict, %diagnostic, "response rejected by classifier");
                return Err(ZonApiError::Blocked {
                    verdict,
                    diagnostic,
                });
            }

            return Ok(response);
        }
    }

    /// Reserve this request's send slot behind the previous one and wait for
    /// it. Holding the lock only while computing the slot keeps the gate fair
    /// without serializing the actual network I/O.
    async fn pace(&self) {
        let spacing = self
            .policy
            .spacing_delay(backoff::sample_spacing_jitter());

        let target = {
            let mut slot = self.next_slot.lock().expect("spacing gate poisoned");
            let now = Instant::now();
            let base = slot.map_or(now, |prev| prev.max(now));
            let target = base + spacing;
            *slot = Some(target);
            target
        };

        tokio::time::sleep_until(target.into()).await;
    }

    fn next_identity(&self) -> &'static str {
        let index = self.identity.fetch_add(1, Ordering::Relaxed);
        IDENTITY_POOL[index % IDENTITY_POOL.len()]
    }
}
