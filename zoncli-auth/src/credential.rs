use chrono::{serde::ts_seconds, DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Lead time before expiry at which the access token is proactively renewed.
pub const REFRESH_BUFFER: Duration = Duration::minutes(5);

/// OAuth credential for the storefront account.
///
/// Only the token manager mutates this, and only as a whole: a successful
/// exchange or refresh replaces the value, a failed one leaves it untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credential {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    #[serde(with = "ts_seconds")]
    pub expires_at: DateTime<Utc>,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

impl Credential {
    /// True when the access token is unusable within `buffer` of now.
    pub fn is_expired(&self, buffer: Duration) -> bool {
        self.access_token.is_empty() || self.expires_at <= Utc::now() + buffer
    }

    /// Whether a proactive refresh is due.
    pub fn should_refresh(&self) -> bool {
        self.is_expired(REFRESH_BUFFER)
    }
}

/// Expiry check over a possibly absent credential: no credential is expired.
pub fn is_expired(credential: Option<&Credential>, buffer: Duration) -> bool {
    credential.is_none_or(|c| c.is_expired(buffer))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credential_expiring_in(minutes: i64) -> Credential {
        Credential {
            access_token: "at_test".to_string(),
            refresh_token: "rt_test".to_string(),
            token_type: "bearer".to_string(),
            expires_at: Utc::now() + Duration::minutes(minutes),
        }
    }

    #[test]
    fn absent_credential_is_expired() {
        assert!(is_expired(None, Duration::zero()));
        assert!(is_expired(None, Duration::minutes(5)));
    }

    #[test]
    fn empty_access_token_is_expired() {
        let mut credential = credential_expiring_in(60);
        credential.access_token.clear();
        assert!(credential.is_expired(Duration::zero()));
    }

    #[test]
    fn buffer_expires_tokens_early() {
        let credential = credential_expiring_in(3);
        assert!(credential.is_expired(Duration::minutes(5)));
        assert!(credential.should_refresh());
    }

    #[test]
    fn fresh_tokens_are_not_expired() {
        let credential = credential_expiring_in(10);
        assert!(!credential.is_expired(Duration::minutes(5)));
        assert!(!credential.should_refresh());
    }

    #[test]
    fn round_trips_through_json() {
        let credential = credential_expiring_in(30);
        let json = serde_json::to_string(&credential).unwrap();
        let back: Credential = serde_json::from_str(&json).unwrap();
        assert_eq!(back.access_token, credential.access_token);
        assert_eq!(
            back.expires_at.timestamp(),
            credential.expires_at.timestamp()
        );
    }

    #[test]
    fn token_type_defaults_to_bearer() {
        let json = r#"{"access_token":"a","refresh_token":"r","expires_at":1900000000}"#;
        let credential: Credential = serde_json::from_str(json).unwrap();
        assert_eq!(credential.token_type, "bearer");
    }
}
