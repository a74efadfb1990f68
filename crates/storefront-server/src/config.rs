//! Server Configuration
//!
//! Read from the environment (optionally seeded from `.env`).

use std::path::PathBuf;

use thiserror::Error;

use storefront_payments::{parse_currency, DEFAULT_CURRENCY};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{var} is invalid: {reason}")]
    Invalid { var: &'static str, reason: String },
}

/// Which payment processor backs the endpoint
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProcessorKind {
    /// Stripe, when `STRIPE_SECRET_KEY` is set
    Stripe,
    /// In-process mock for local development
    Mock,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Address to listen on
    pub bind_addr: String,

    /// Payment processor selection
    pub processor: ProcessorKind,

    /// Stripe secret key (None = payments disabled unless mocked)
    pub stripe_secret_key: Option<String>,

    /// Stripe webhook signing secret (None = webhooks rejected)
    pub stripe_webhook_secret: Option<String>,

    /// Lowercase ISO currency code for all intents
    pub currency: String,

    /// Trusted product catalog (None = client prices are trusted)
    pub catalog_path: Option<PathBuf>,

    /// Directory holding the compiled frontend
    pub static_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".into(),
            processor: ProcessorKind::Stripe,
            stripe_secret_key: None,
            stripe_webhook_secret: None,
            currency: DEFAULT_CURRENCY.into(),
            catalog_path: None,
            static_dir: PathBuf::from("static"),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any variable lookup; empty values count as unset
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let processor = match get("PAYMENT_PROCESSOR").as_deref().map(str::to_lowercase).as_deref() {
            None | Some("stripe") => ProcessorKind::Stripe,
            Some("mock") => ProcessorKind::Mock,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    var: "PAYMENT_PROCESSOR",
                    reason: format!("expected 'stripe' or 'mock', got '{other}'"),
                });
            }
        };

        let currency = get("STORE_CURRENCY").unwrap_or(defaults.currency).to_lowercase();
        parse_currency(&currency).map_err(|e| ConfigError::Invalid {
            var: "STORE_CURRENCY",
            reason: e.to_string(),
        })?;

        Ok(Self {
            bind_addr: get("BIND_ADDR").unwrap_or(defaults.bind_addr),
            processor,
            stripe_secret_key: get("STRIPE_SECRET_KEY"),
            stripe_webhook_secret: get("STRIPE_WEBHOOK_SECRET"),
            currency,
            catalog_path: get("CATALOG_PATH").map(PathBuf::from),
            static_dir: get("STATIC_DIR").map_or(defaults.static_dir, PathBuf::from),
        })
    }
}
