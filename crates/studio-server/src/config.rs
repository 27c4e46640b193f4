//! Server Configuration
//!
//! Read once at startup and handed to [`crate::state::AppState`].

use std::net::SocketAddr;

use studio_payments::SupabaseConfig;
use thiserror::Error;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} not set")]
    Missing(&'static str),

    #[error("{name} is not a valid URL: {source}")]
    InvalidUrl {
        name: &'static str,
        source: url::ParseError,
    },

    #[error("BIND_ADDR is not a socket address: {0}")]
    InvalidBindAddr(String),
}

#[derive(Clone, Debug)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub stripe_secret_key: String,
    /// Webhooks are disabled without it
    pub stripe_webhook_secret: Option<String>,
    pub supabase: SupabaseConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let require = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

        let bind_addr = get("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr: SocketAddr = bind_addr
            .parse()
            .map_err(|_| ConfigError::InvalidBindAddr(bind_addr))?;

        let supabase_url = require("SUPABASE_URL")?;
        url::Url::parse(&supabase_url).map_err(|source| ConfigError::InvalidUrl {
            name: "SUPABASE_URL",
            source,
        })?;

        Ok(Config {
            bind_addr,
            stripe_secret_key: require("STRIPE_SECRET_KEY")?,
            stripe_webhook_secret: get("STRIPE_WEBHOOK_SECRET"),
            supabase: SupabaseConfig::new(supabase_url, require("SUPABASE_ANON_KEY")?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    const REQUIRED: [(&str, &str); 3] = [
        ("STRIPE_SECRET_KEY", "sk_test_xxx"),
        ("SUPABASE_URL", "https://xyz.supabase.co"),
        ("SUPABASE_ANON_KEY", "anon-key"),
    ];

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&REQUIRED)).unwrap();
        assert_eq!(config.bind_addr.port(), 3000);
        assert!(config.stripe_webhook_secret.is_none());
        assert_eq!(config.supabase.api_key, "anon-key");
    }

    #[test]
    fn test_missing_stripe_key() {
        let err = Config::from_lookup(lookup(&REQUIRED[1..])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("STRIPE_SECRET_KEY")));
    }

    #[test]
    fn test_empty_value_counts_as_missing() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("STRIPE_WEBHOOK_SECRET", ""));
        pairs[2] = ("SUPABASE_ANON_KEY", "  ");

        let err = Config::from_lookup(lookup(&pairs)).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("SUPABASE_ANON_KEY")));
    }

    #[test]
    fn test_invalid_url_and_bind_addr() {
        let mut pairs = REQUIRED.to_vec();
        pairs[1] = ("SUPABASE_URL", "not a url");
        assert!(matches!(
            Config::from_lookup(lookup(&pairs)),
            Err(ConfigError::InvalidUrl { .. })
        ));

        let mut pairs = REQUIRED.to_vec();
        pairs.push(("BIND_ADDR", "localhost"));
        assert!(matches!(
            Config::from_lookup(lookup(&pairs)),
            Err(ConfigError::InvalidBindAddr(_))
        ));
    }

    #[test]
    fn test_webhook_secret() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("STRIPE_WEBHOOK_SECRET", "whsec_abc"));
        let config = Config::from_lookup(lookup(&pairs)).unwrap();
        assert_eq!(config.stripe_webhook_secret.as_deref(), Some("whsec_abc"));
    }
}
