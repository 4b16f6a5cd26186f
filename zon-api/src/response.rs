use reqwest::StatusCode;
use std::fmt;

/// Phrases that identify a CAPTCHA interstitial. Checked before the login
/// markers because blocked pages frequently embed both.
const CAPTCHA_MARKERS: &[&str] = &[
    "captcha",
    "robot check",
    "automated access",
    "solve this puzzle",
    "verify you're not a robot",
    "security check",
    "sorry, we just need to make sure you're not a robot",
];

/// Phrases that identify a forced sign-in page.
const LOGIN_MARKERS: &[&str] = &[
    "ap_signin",
    "sign in",
    "sign-in",
    "authentication required",
    "ap_email",
    "ap_password",
];

/// Maximum number of characters kept from a blocked response body.
const SNIPPET_MAX_CHARS: usize = 500;

/// What a response body turned out to be once inspected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseVerdict {
    /// Usable payload; non-HTML responses are always considered clean.
    Clean,
    /// An anti-automation challenge page.
    CaptchaChallenge,
    /// A page demanding re-authentication instead of the requested content.
    LoginWall,
    /// HTML was served but matched no known marker; still not parseable.
    UnknownInterstitial,
}

impl ResponseVerdict {
    pub fn is_clean(&self) -> bool {
        matches!(self, ResponseVerdict::Clean)
    }
}

impl fmt::Display for ResponseVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseVerdict::Clean => write!(f, "clean response"),
            ResponseVerdict::CaptchaChallenge => write!(f, "CAPTCHA challenge"),
            ResponseVerdict::LoginWall => write!(f, "login wall"),
            ResponseVerdict::UnknownInterstitial => write!(f, "unrecognized interstitial page"),
        }
    }
}

/// Decide whether a payload is usable or an anti-bot interstitial.
///
/// Non-HTML content types (JSON and friends) pass through untouched. HTML
/// bodies are lowercased and matched against the marker sets, CAPTCHA first.
/// HTML that matches nothing is still rejected as [`ResponseVerdict::UnknownInterstitial`]
/// so callers never parse adversarial markup as data.
pub fn classify(content_type: &str, body: &str) -> ResponseVerdict {
    if !content_type.to_ascii_lowercase().contains("text/html") {
        return ResponseVerdict::Clean;
    }

    let body = body.to_lowercase();

    if CAPTCHA_MARKERS.iter().any(|m| body.contains(m)) {
        return ResponseVerdict::CaptchaChallenge;
    }
    if LOGIN_MARKERS.iter().any(|m| body.contains(m)) {
        return ResponseVerdict::LoginWall;
    }

    ResponseVerdict::UnknownInterstitial
}

/// Diagnostic captured for any non-clean response.
///
/// Carries a bounded body snippet and nothing from the request side, so the
/// log artifact can never leak credentials.
#[derive(Debug, Clone)]
pub struct BlockDiagnostic {
    pub url: String,
    pub status: StatusCode,
    pub content_type: String,
    pub snippet: String,
}

impl BlockDiagnostic {
    pub fn new(url: &str, status: StatusCode, content_type: &str, body: &str) -> Self {
        Self {
            url: url.to_string(),
            status,
            content_type: content_type.to_string(),
            snippet: snippet(body),
        }
    }
}

impl fmt::Display for BlockDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} ({}): {}",
            self.status, self.url, self.content_type, self.snippet
        )
    }
}

/// Truncate a body to [`SNIPPET_MAX_CHARS`] characters, marking the cut.
fn snippet(body: &str) -> String {
    let mut out: String = body.chars().take(SNIPPET_MAX_CHARS).collect();
    if body.chars().nth(SNIPPET_MAX_CHARS).is_some() {
        out.push_str("...");
    }
    out
}
