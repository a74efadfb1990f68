//! Payment Intent Wire Contract
//!
//! Shapes exchanged with `POST /api/create-payment-intent`. The request is
//! a projection of the cart, not the authoritative cart.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::cart::{CartLine, CheckoutSnapshot};

/// Path of the payment intent endpoint
pub const CREATE_PAYMENT_INTENT_PATH: &str = "/api/create-payment-intent";

/// One item as sent to the endpoint
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IntentItem {
    /// Product ID, used for server-side catalog pricing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Display name; the amount never depends on it
    #[serde(default)]
    pub name: String,

    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,

    pub quantity: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
}

impl IntentItem {
    pub fn subtotal(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

impl From<&CartLine> for IntentItem {
    fn from(line: &CartLine) -> Self {
        Self {
            id: Some(line.id.clone()),
            name: line.name.clone(),
            price: line.price,
            quantity: line.quantity,
            size: line.size.clone(),
        }
    }
}

/// Body of `POST /api/create-payment-intent`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PaymentIntentRequest {
    pub items: Vec<IntentItem>,
}

impl From<&CheckoutSnapshot> for PaymentIntentRequest {
    fn from(snapshot: &CheckoutSnapshot) -> Self {
        Self {
            items: snapshot.items.iter().map(IntentItem::from).collect(),
        }
    }
}

/// Successful endpoint response
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntentCreated {
    pub client_secret: String,
    pub payment_intent_id: String,
}

/// Any endpoint response
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PaymentIntentResponse {
    Created(PaymentIntentCreated),
    Failed { error: String },
}
