use axum::extract::{Query, State};
use axum::response::Html;
use axum::routing::get;
use axum::Router;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, Mutex};
use tower_http::trace::TraceLayer;
use tracing::{debug, warn};

use crate::error::AuthError;

pub const DEFAULT_CALLBACK_PORT: u16 = 8495;
pub const CALLBACK_PATH: &str = "/callback";

/// How long the listener gets to drain in-flight connections on shutdown.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(3);

/// The local redirect URI registered with the authorization server.
pub fn redirect_uri(port: u16) -> String {
    format!("http://localhost:{port}{CALLBACK_PATH}")
}

/// Query parameters the provider appends to the redirect.
#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// What the single accepted callback turned out to be.
#[derive(Debug, PartialEq, Eq)]
pub enum CallbackOutcome {
    /// Authorization code with a state matching this login attempt.
    Granted { code: String },
    /// The echoed state did not match; the code is discarded unread.
    StateMismatch,
    /// The provider reported an error (user denied, invalid request, ...).
    Denied { error: String },
}

#[derive(Clone)]
struct ListenerState {
    expected_state: Arc<String>,
    result: Arc<Mutex<Option<oneshot::Sender<CallbackOutcome>>>>,
}

/// One-shot local HTTP endpoint for the OAuth redirect.
///
/// Lives exactly as long as one `login` call: it delivers at most one
/// [`CallbackOutcome`] over a single-slot channel and is torn down by
/// [`CallbackListener::wait`] whether a callback arrived or not.
pub struct CallbackListener {
    result_rx: oneshot::Receiver<CallbackOutcome>,
    shutdown_tx: oneshot::Sender<()>,
    handle: tokio::task::JoinHandle<()>,
    port: u16,
}

impl CallbackListener {
    /// Bind the fixed local port and start serving the callback route.
    pub async fn bind(port: u16, expected_state: String) -> Result<Self, AuthError> {
        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
            .await
            .map_err(|e| {
                AuthError::Listener(format!(
                    "failed to bind callback port {port}: {e}; is another login running?"
                ))
            })?;

        let (result_tx, result_rx) = oneshot::channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let state = ListenerState {
            expected_state: Arc::new(expected_state),
            result: Arc::new(Mutex::new(Some(result_tx))),
        };

        let app = Router::new()
            .route(CALLBACK_PATH, get(handle_callback))
            .layer(TraceLayer::new_for_http())
            .with_state(state);

        let handle = tokio::spawn(async move {
            let server = axum::serve(listener, app).with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            });
            if let Err(e) = server.await {
                warn!(error = %e, "callback listener terminated abnormally");
            }
        });

        debug!(port, "callback listener started");
        Ok(Self {
            result_rx,
            shutdown_tx,
            handle,
            port,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Block until the callback arrives or `timeout` elapses, then shut the
    /// listener down. Exactly one of the four login outcomes is produced.
    pub async fn wait(mut self, timeout: Duration) -> Result<CallbackOutcome, AuthError> {
        let outcome = tokio::time::timeout(timeout, &mut self.result_rx).await;

        // Tear down regardless of how the wait ended; graceful shutdown still
        // lets the acknowledgment page finish rendering in the browser.
        let _ = self.shutdown_tx.send(());
        if tokio::time::timeout(SHUTDOWN_GRACE, self.handle).await.is_err() {
            warn!("callback listener did not shut down within grace period");
        }

        match outcome {
            Ok(Ok(result)) => Ok(result),
            Ok(Err(_)) => Err(AuthError::Listener(
                "callback listener closed before delivering a result".to_string(),
            )),
            Err(_) => Err(AuthError::Timeout),
        }
    }
}

async fn handle_callback(
    State(state): State<ListenerState>,
    Query(params): Query<CallbackParams>,
) -> Html<String> {
    let (outcome, page) = if let Some(error) = params.error {
        debug!(%error, "provider reported an authorization error");
        let page = error_page(&error);
        (CallbackOutcome::Denied { error }, page)
    } else if params.state.as_deref() != Some(state.expected_state.as_str()) {
        warn!("callback state mismatch; discarding authorization code");
        (CallbackOutcome::StateMismatch, mismatch_page())
    } else if let Some(code) = params.code {
        (CallbackOutcome::Granted { code }, success_page())
    } else {
        (
            CallbackOutcome::Denied {
                error: "missing authorization code".to_string(),
            },
            error_page("missing authorization code"),
        )
    };

    match state.result.lock().await.take() {
        Some(tx) => {
            let _ = tx.send(outcome);
            Html(page)
        }
        // The slot is already consumed; never deliver a second result.
        None => Html(already_done_page()),
    }
}

fn success_page() -> String {
    page(
        "ok",
        "&#10003;",
        "Sign-in complete",
        "<p>zoncli is authorized. You can close this tab and return to your terminal.</p>",
    )
}

fn mismatch_page() -> String {
    page(
        "bad",
        "&#10007;",
        "Sign-in rejected",
        "<p>This callback does not belong to the login attempt running in your \
         terminal, so it was ignored. Close this tab and run the login again.</p>",
    )
}

fn error_page(reason: &str) -> String {
    let reason = reason
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;");
    page(
        "bad",
        "&#10007;",
        "Sign-in failed",
        &format!(
            "<p>The authorization server reported an error.</p>\
             <div class=\"reason\">{reason}</div>\
             <p>Close this tab and try again from your terminal.</p>"
        ),
    )
}

fn already_done_page() -> String {
    page(
        "bad",
        "&#10007;",
        "Already handled",
        "<p>This login attempt has already finished. Close this tab.</p>",
    )
}

fn page(badge: &str, glyph: &str, title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>zoncli</title>
    <style>{PAGE_STYLE}</style>
</head>
<body>
    <div class="card">
        <div class="badge {badge}">{glyph}</div>
        <h1>{title}</h1>
        {body}
    </div>
</body>
</html>"#
    )
}

const PAGE_STYLE: &str = r#"
        body {
            margin: 0;
            font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, sans-serif;
            background: #f3f4f6;
            display: flex;
            justify-content: center;
            align-items: center;
            height: 100vh;
        }
        .card {
            background: white;
            border-radius: 12px;
            padding: 40px 48px;
            box-shadow: 0 8px 32px rgba(0, 0, 0, 0.08);
            text-align: center;
            max-width: 420px;
        }
        .badge {
            width: 56px;
            height: 56px;
            border-radius: 50%;
            color: white;
            display: inline-flex;
            align-items: center;
            justify-content: center;
            font-size: 28px;
            margin-bottom: 20px;
        }
        .ok { background: #10B981; }
        .bad { background: #EF4444; }
        h1 { color: #1F2937; margin: 0 0 10px 0; font-size: 22px; }
        p { color: #6B7280; margin: 0; line-height: 1.5; }
        .reason {
            background: #FEE2E2;
            border-radius: 8px;
            padding: 12px;
            color: #991B1B;
            font-family: monospace;
            font-size: 13px;
            margin-top: 16px;
        }
"#;
