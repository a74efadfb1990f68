//! # storefront-payments
//!
//! Server side of checkout: payment intent creation and order recording.
//!
//! ## Flow
//!
//! ```text
//! ┌─────────────┐  items   ┌──────────────────────┐  amount   ┌──────────┐
//! │  Checkout   │─────────▶│ PaymentIntentService │──────────▶│  Stripe  │
//! │   modal     │◀─────────│ (validate + price)   │◀──────────│          │
//! └─────────────┘  secret  └──────────────────────┘  intent   └──────────┘
//!                                                                   │
//!                          ┌──────────────────────┐  webhook        │
//!                          │   WebhookHandler     │◀────────────────┘
//!                          │   ──▶ OrderStore     │
//!                          └──────────────────────┘
//! ```
//!
//! Amounts are `round(sum(price * quantity * 100))` in minor units. When a
//! `Catalog` is configured, prices come from it rather than the request.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use storefront_payments::{PaymentIntentService, StripeProcessor};
//!
//! let service = PaymentIntentService::new(Arc::new(StripeProcessor::new("sk_test_xxx")))
//!     .with_catalog(Arc::new(catalog));
//!
//! let created = service.create(&body).await?;
//! // Hand created.client_secret to Stripe.js
//! ```

mod error;
mod intent;
mod orders;
mod processor;
mod service;
mod webhook;

pub use error::{PaymentError, Result};
pub use intent::{apply_catalog_prices, compute_amount, from_minor_units, parse_request};
pub use orders::{MemoryOrderStore, OrderStore};
pub use processor::{parse_currency, CreatedIntent, IntentParams, MockProcessor, PaymentProcessor, StripeProcessor};
pub use service::{PaymentIntentService, DEFAULT_CURRENCY, ITEMS_METADATA_KEY};
pub use webhook::{WebhookEvent, WebhookHandler};
