//! Stripe Webhook Handling
//!
//! Records an order when Stripe reports a payment intent as succeeded.

use std::sync::Arc;

use storefront_core::{IntentItem, Order};
use stripe::{Event, EventObject, EventType, Webhook};

use crate::error::{PaymentError, Result};
use crate::intent::from_minor_units;
use crate::orders::OrderStore;
use crate::service::ITEMS_METADATA_KEY;

/// Parsed webhook event
#[derive(Clone, Debug, PartialEq)]
pub enum WebhookEvent {
    /// Payment captured - record the order
    PaymentSucceeded {
        payment_intent_id: String,
        amount: i64,
        items: Vec<IntentItem>,
    },

    /// Payment attempt failed
    PaymentFailed { payment_intent_id: String },

    /// Unhandled event type
    Other { event_type: String },
}

/// Webhook handler
pub struct WebhookHandler<S: OrderStore> {
    order_store: Arc<S>,
}

impl<S: OrderStore> WebhookHandler<S> {
    pub fn new(order_store: Arc<S>) -> Self {
        Self { order_store }
    }

    /// Verify webhook signature and parse event
    pub fn parse_event(&self, payload: &str, signature: &str, secret: &str) -> Result<Event> {
        Webhook::construct_event(payload, signature, secret)
            .map_err(|e| PaymentError::WebhookSignature(e.to_string()))
    }

    /// Process a verified event
    pub fn handle(&self, event: &Event) -> Result<WebhookEvent> {
        tracing::info!(event_type = ?event.type_, "Processing Stripe webhook");

        let parsed = Self::parse_webhook_event(event)?;

        match &parsed {
            WebhookEvent::PaymentSucceeded {
                payment_intent_id,
                amount,
                items,
            } => {
                self.record_payment(payment_intent_id, *amount, items.clone())?;
            }

            WebhookEvent::PaymentFailed { payment_intent_id } => {
                tracing::warn!(payment_intent_id = %payment_intent_id, "Payment failed");
            }

            WebhookEvent::Other { event_type } => {
                tracing::debug!(event_type = %event_type, "Unhandled webhook event");
            }
        }

        Ok(parsed)
    }

    /// Store the order for a succeeded intent. Stripe redelivers events, so
    /// an intent that already has an order is left untouched.
    pub fn record_payment(&self, payment_intent_id: &str, amount: i64, items: Vec<IntentItem>) -> Result<Option<Order>> {
        let order = Order::new(payment_intent_id, items).with_total(from_minor_units(amount));
        if !self.order_store.insert_if_absent(&order)? {
            tracing::debug!(payment_intent_id = %payment_intent_id, "Order already recorded");
            return Ok(None);
        }

        tracing::info!(
            order_id = %order.id,
            payment_intent_id = %payment_intent_id,
            total = %order.total,
            "Recorded order"
        );

        Ok(Some(order))
    }

    /// Parse Stripe event into our event type
    fn parse_webhook_event(event: &Event) -> Result<WebhookEvent> {
        match event.type_ {
            EventType::PaymentIntentSucceeded => {
                if let EventObject::PaymentIntent(intent) = &event.data.object {
                    let items = intent
                        .metadata
                        .get(ITEMS_METADATA_KEY)
                        .map(|raw| items_from_metadata(raw))
                        .unwrap_or_default();

                    Ok(WebhookEvent::PaymentSucceeded {
                        payment_intent_id: intent.id.to_string(),
                        amount: intent.amount,
                        items,
                    })
                } else {
                    Err(PaymentError::WebhookParse("Invalid payment intent data".into()))
                }
            }

            EventType::PaymentIntentPaymentFailed => {
                if let EventObject::PaymentIntent(intent) = &event.data.object {
                    Ok(WebhookEvent::PaymentFailed {
                        payment_intent_id: intent.id.to_string(),
                    })
                } else {
                    Err(PaymentError::WebhookParse("Invalid payment intent data".into()))
                }
            }

            _ => Ok(WebhookEvent::Other {
                event_type: format!("{:?}", event.type_),
            }),
        }
    }
}

/// Items as stored in intent metadata; unreadable metadata yields no items
/// rather than losing the order.
fn items_from_metadata(raw: &str) -> Vec<IntentItem> {
    serde_json::from_str(raw).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Unreadable items metadata");
        Vec::new()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orders::MemoryOrderStore;
    use rust_decimal_macros::dec;

    #[test]
    fn test_record_payment_is_idempotent() {
        let store = Arc::new(MemoryOrderStore::new());
        let handler = WebhookHandler::new(store.clone());
        let items = items_from_metadata(r#"[{"name":"Tee","price":10,"quantity":2,"size":"M"}]"#);

        let order = handler.record_payment("pi_1", 2000, items.clone()).unwrap().unwrap();
        assert_eq!(order.total, dec!(20.00));
        assert_eq!(order.items, items);

        assert!(handler.record_payment("pi_1", 2000, items).unwrap().is_none());
        assert_eq!(store.list(10).unwrap().len(), 1);
    }

    #[test]
    fn test_redelivery_keeps_first_order() {
        let store = Arc::new(MemoryOrderStore::new());
        let handler = WebhookHandler::new(store.clone());

        let first = handler.record_payment("pi_1", 500, Vec::new()).unwrap().unwrap();
        assert!(handler.record_payment("pi_1", 500, Vec::new()).unwrap().is_none());
        assert_eq!(store.get_by_payment_intent("pi_1").unwrap().unwrap().id, first.id);
    }

    #[test]
    fn test_metadata_items_without_names() {
        let items = items_from_metadata(r#"[{"price":10,"quantity":2},{"price":5.5,"quantity":1}]"#);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].quantity, 2);
        assert!(items[1].name.is_empty());
    }

    #[test]
    fn test_bad_metadata_keeps_order() {
        assert!(items_from_metadata("not json").is_empty());
    }

    #[test]
    fn test_rejects_bad_signature() {
        let handler = WebhookHandler::new(Arc::new(MemoryOrderStore::new()));
        let result = handler.parse_event("{}", "t=1,v1=deadbeef", "whsec_test");
        assert!(matches!(result, Err(PaymentError::WebhookSignature(_))));
    }
}
