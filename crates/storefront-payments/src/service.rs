//! Payment Intent Service
//!
//! The endpoint's behavior, independent of the HTTP framework: validate the
//! body, price the items, compute the amount and ask the processor for an
//! intent. Holds no per-request state.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use storefront_core::{Catalog, PaymentIntentCreated};

use crate::error::{PaymentError, Result};
use crate::intent::{apply_catalog_prices, compute_amount, parse_request};
use crate::processor::{IntentParams, PaymentProcessor};

/// Metadata key holding the submitted item list
pub const ITEMS_METADATA_KEY: &str = "items";

/// Currency used when none is configured
pub const DEFAULT_CURRENCY: &str = "usd";

/// Creates payment intents for cart checkouts
#[derive(Clone)]
pub struct PaymentIntentService {
    processor: Arc<dyn PaymentProcessor>,
    catalog: Option<Arc<Catalog>>,
    currency: String,
}

impl PaymentIntentService {
    pub fn new(processor: Arc<dyn PaymentProcessor>) -> Self {
        Self {
            processor,
            catalog: None,
            currency: DEFAULT_CURRENCY.into(),
        }
    }

    /// Price items from this catalog instead of trusting the client
    pub fn with_catalog(mut self, catalog: Arc<Catalog>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into().to_lowercase();
        self
    }

    pub fn processor_name(&self) -> &str {
        self.processor.name()
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    /// Handle one `POST /api/create-payment-intent` body
    pub async fn create(&self, body: &Value) -> Result<PaymentIntentCreated> {
        let request = parse_request(body)?;

        let items = match &self.catalog {
            Some(catalog) => apply_catalog_prices(&request.items, catalog)?,
            None => {
                tracing::warn!("No catalog configured; charging client-supplied prices");
                request.items
            }
        };
        let amount = compute_amount(&items)?;

        // The submitted list travels verbatim as opaque metadata.
        let raw_items = body.get(ITEMS_METADATA_KEY).cloned().unwrap_or(Value::Null);
        let metadata = HashMap::from([(ITEMS_METADATA_KEY.to_string(), raw_items.to_string())]);

        let params = IntentParams {
            amount,
            currency: self.currency.clone(),
            metadata,
        };

        tracing::info!(
            amount,
            currency = %self.currency,
            items = items.len(),
            processor = self.processor.name(),
            "Creating payment intent"
        );

        let created = self.processor.create_intent(params).await.map_err(|e| {
            tracing::error!(error = %e, "Payment intent creation failed");
            match e {
                PaymentError::InvalidInput(_) | PaymentError::Stripe(_) => e,
                other => PaymentError::Stripe(other.user_message()),
            }
        })?;

        Ok(PaymentIntentCreated {
            client_secret: created.client_secret,
            payment_intent_id: created.id,
        })
    }
}
