//! Payment Processors
//!
//! `PaymentProcessor` is the seam to the processor that creates payment
//! intents. `StripeProcessor` talks to Stripe; `MockProcessor` is for tests
//! and local development.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use stripe::{
    Client, CreatePaymentIntent, CreatePaymentIntentAutomaticPaymentMethods, Currency,
    PaymentIntent, StripeError,
};

use crate::error::{PaymentError, Result};

/// Parameters for a new payment intent
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IntentParams {
    /// Amount in minor currency units
    pub amount: i64,

    /// Lowercase ISO currency code, e.g. `usd`
    pub currency: String,

    /// Opaque key-value metadata stored on the intent
    pub metadata: HashMap<String, String>,
}

/// A created payment intent
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreatedIntent {
    pub id: String,
    pub client_secret: String,
}

/// Payment processor trait (Strategy pattern)
#[async_trait]
pub trait PaymentProcessor: Send + Sync {
    /// Create a payment intent with automatic payment methods enabled
    async fn create_intent(&self, params: IntentParams) -> Result<CreatedIntent>;

    /// Processor name
    fn name(&self) -> &str;
}

/// Stripe-backed processor
pub struct StripeProcessor {
    client: Client,
}

impl StripeProcessor {
    pub fn new(secret_key: &str) -> Self {
        Self {
            client: Client::new(secret_key),
        }
    }

    /// Create from `STRIPE_SECRET_KEY`
    pub fn from_env() -> Result<Self> {
        let secret_key = std::env::var("STRIPE_SECRET_KEY")
            .map_err(|_| PaymentError::Config("STRIPE_SECRET_KEY not set".into()))?;
        Ok(Self::new(&secret_key))
    }

    /// Get the underlying Stripe client
    pub fn inner(&self) -> &Client {
        &self.client
    }
}

/// Parse a lowercase currency code into Stripe's enum
pub fn parse_currency(code: &str) -> Result<Currency> {
    serde_json::from_value(serde_json::Value::String(code.to_lowercase()))
        .map_err(|_| PaymentError::Config(format!("Unsupported currency '{code}'")))
}

/// Prefer the message Stripe wrote for humans over the transport detail
fn stripe_message(err: StripeError) -> String {
    match err {
        StripeError::Stripe(request_error) => request_error
            .message
            .clone()
            .unwrap_or_else(|| request_error.to_string()),
        other => other.to_string(),
    }
}

#[async_trait]
impl PaymentProcessor for StripeProcessor {
    async fn create_intent(&self, params: IntentParams) -> Result<CreatedIntent> {
        let currency = parse_currency(&params.currency)?;

        let mut create = CreatePaymentIntent::new(params.amount, currency);
        create.automatic_payment_methods = Some(CreatePaymentIntentAutomaticPaymentMethods {
            enabled: true,
            allow_redirects: None,
        });
        create.metadata = Some(params.metadata);

        let intent = PaymentIntent::create(&self.client, create)
            .await
            .map_err(|e| PaymentError::Stripe(stripe_message(e)))?;

        let client_secret = intent
            .client_secret
            .ok_or_else(|| PaymentError::Stripe("No client secret returned".into()))?;

        Ok(CreatedIntent {
            id: intent.id.to_string(),
            client_secret,
        })
    }

    fn name(&self) -> &str {
        "Stripe"
    }
}

/// In-process processor that records calls and returns canned results
pub struct MockProcessor {
    failure: Option<String>,
    calls: Mutex<Vec<IntentParams>>,
}

impl Default for MockProcessor {
    fn default() -> Self {
        Self::succeeding()
    }
}

impl MockProcessor {
    /// Every call succeeds with a fresh intent
    pub fn succeeding() -> Self {
        Self {
            failure: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Every call fails with `message`
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Parameters of every call so far
    pub fn calls(&self) -> Vec<IntentParams> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl PaymentProcessor for MockProcessor {
    async fn create_intent(&self, params: IntentParams) -> Result<CreatedIntent> {
        let seq = match self.calls.lock() {
            Ok(mut calls) => {
                calls.push(params);
                calls.len()
            }
            Err(_) => return Err(PaymentError::Storage("mock call log poisoned".into())),
        };

        if let Some(message) = &self.failure {
            return Err(PaymentError::Stripe(message.clone()));
        }

        let id = format!("pi_mock_{seq}");
        Ok(CreatedIntent {
            client_secret: format!("{id}_secret_{}", uuid::Uuid::new_v4().simple()),
            id,
        })
    }

    fn name(&self) -> &str {
        "MockProcessor"
    }
}
