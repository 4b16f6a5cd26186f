use config::{Config, ConfigError, File};
use serde::Deserialize;
use std::time::Duration;
use zon_api::RateLimitPolicy;

use crate::listener::DEFAULT_CALLBACK_PORT;

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
    #[serde(default = "default_scopes")]
    pub scopes: Vec<String>,
    #[serde(default = "default_auth_url")]
    pub auth_url: String,
    #[serde(default = "default_token_url")]
    pub token_url: String,
    #[serde(default = "default_callback_port")]
    pub callback_port: u16,
    #[serde(default)]
    pub rate_limit: RateLimitSettings,
}

fn default_scopes() -> Vec<String> {
    vec![
        "profile".to_string(),
        "orders:read".to_string(),
        "cart:manage".to_string(),
        "subscriptions:read".to_string(),
    ]
}

fn default_auth_url() -> String {
    "https://www.zon.com/ap/oa/authorize".to_string()
}

fn default_token_url() -> String {
    "https://api.zon.com/auth/o2/token".to_string()
}

fn default_callback_port() -> u16 {
    DEFAULT_CALLBACK_PORT
}

#[derive(Debug, Deserialize, Clone)]
pub struct RateLimitSettings {
    #[serde(default = "default_min_delay_ms")]
    pub min_delay_ms: u64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_min_delay_ms() -> u64 {
    1000
}

fn default_max_delay_ms() -> u64 {
    60_000
}

fn default_max_retries() -> u32 {
    3
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            min_delay_ms: default_min_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            max_retries: default_max_retries(),
        }
    }
}

impl RateLimitSettings {
    pub fn policy(&self) -> RateLimitPolicy {
        RateLimitPolicy {
            min_delay: Duration::from_millis(self.min_delay_ms),
            max_delay: Duration::from_millis(self.max_delay_ms),
            max_retries: self.max_retries,
        }
    }
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let config_path =
            std::env::var("ZONCLI_CONFIG").unwrap_or_else(|_| "config.toml".to_string());

        let settings = Config::builder()
            .add_source(File::with_name(&config_path).required(false))
            .add_source(config::Environment::with_prefix("ZONCLI").separator("__"))
            .build()?;

        settings.try_deserialize()
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.client_id.is_empty() {
            return Err("client_id is required".to_string());
        }
        for (name, url) in [("auth_url", &self.auth_url), ("token_url", &self.token_url)] {
            if !url.starts_with("http") {
                return Err(format!("{name} must be a valid HTTP(S) URL"));
            }
        }
        if self.scopes.is_empty() {
            return Err("at least one OAuth scope is required".to_string());
        }
        self.rate_limit.policy().validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> Settings {
        Settings {
            client_id: "client-123".to_string(),
            client_secret: "secret".to_string(),
            scopes: default_scopes(),
            auth_url: default_auth_url(),
            token_url: default_token_url(),
            callback_port: default_callback_port(),
            rate_limit: RateLimitSettings::default(),
        }
    }

    #[test]
    fn default_settings_validate() {
        assert!(settings().validate().is_ok());
    }

    #[test]
    fn missing_client_id_is_rejected() {
        let mut s = settings();
        s.client_id.clear();
        assert!(s.validate().is_err());
    }

    #[test]
    fn inverted_rate_limit_is_rejected() {
        let mut s = settings();
        s.rate_limit.min_delay_ms = 120_000;
        assert!(s.validate().is_err());
    }

    #[test]
    fn rate_limit_settings_become_a_policy() {
        let policy = RateLimitSettings::default().policy();
        assert_eq!(policy.min_delay, Duration::from_millis(1000));
        assert_eq!(policy.max_delay, Duration::from_secs(60));
        assert_eq!(policy.max_retries, 3);
    }
}
