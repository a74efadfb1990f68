//! Order Records
//!
//! What gets written to the order sink once a payment succeeds.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::intent::IntentItem;

/// A paid order
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Order ID
    pub id: Uuid,

    /// Processor-side payment intent this order was paid through
    pub payment_intent_id: String,

    /// Purchased items
    pub items: Vec<IntentItem>,

    /// Order total in major currency units
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,

    /// When the order was recorded
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Create an order; the total is derived from the items
    pub fn new(payment_intent_id: impl Into<String>, items: Vec<IntentItem>) -> Self {
        let total = items.iter().map(IntentItem::subtotal).sum();
        Self {
            id: Uuid::new_v4(),
            payment_intent_id: payment_intent_id.into(),
            items,
            total,
            created_at: Utc::now(),
        }
    }

    /// Override the derived total with the amount actually charged
    pub fn with_total(mut self, total: Decimal) -> Self {
        self.total = total;
        self
    }
}
