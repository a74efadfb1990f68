//! Application State

use std::sync::Arc;

use storefront_core::Catalog;
use storefront_payments::{MemoryOrderStore, PaymentIntentService};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Payment intent creation (None if no processor is configured)
    pub payments: Option<PaymentIntentService>,

    /// Product catalog served to the frontend and used for pricing
    pub catalog: Arc<Catalog>,

    /// Orders recorded from webhooks
    pub order_store: Arc<MemoryOrderStore>,

    /// Stripe webhook signing secret (None - webhooks rejected)
    pub webhook_secret: Option<String>,
}
