//! Order Storage
//!
//! Sink for paid orders. The in-memory store is for development; a
//! document store implements the same trait in production.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::RwLock;

use storefront_core::Order;

use crate::error::{PaymentError, Result};

/// Order storage trait
pub trait OrderStore: Send + Sync {
    /// Save or replace an order
    fn save(&self, order: &Order) -> Result<()>;

    /// Save an order unless its payment intent already has one.
    /// Returns whether the order was stored.
    fn insert_if_absent(&self, order: &Order) -> Result<bool>;

    /// Get the order paid through a payment intent
    fn get_by_payment_intent(&self, payment_intent_id: &str) -> Result<Option<Order>>;

    /// Most recent orders first
    fn list(&self, limit: usize) -> Result<Vec<Order>>;
}

/// In-memory order store (for development)
#[derive(Default)]
pub struct MemoryOrderStore {
    orders: RwLock<HashMap<String, Order>>,
}

impl MemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned() -> PaymentError {
    PaymentError::Storage("order store lock poisoned".into())
}

impl OrderStore for MemoryOrderStore {
    fn save(&self, order: &Order) -> Result<()> {
        let mut orders = self.orders.write().map_err(|_| poisoned())?;
        orders.insert(order.payment_intent_id.clone(), order.clone());
        Ok(())
    }

    fn insert_if_absent(&self, order: &Order) -> Result<bool> {
        let mut orders = self.orders.write().map_err(|_| poisoned())?;
        match orders.entry(order.payment_intent_id.clone()) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                slot.insert(order.clone());
                Ok(true)
            }
        }
    }

    fn get_by_payment_intent(&self, payment_intent_id: &str) -> Result<Option<Order>> {
        let orders = self.orders.read().map_err(|_| poisoned())?;
        Ok(orders.get(payment_intent_id).cloned())
    }

    fn list(&self, limit: usize) -> Result<Vec<Order>> {
        let orders = self.orders.read().map_err(|_| poisoned())?;
        let mut result: Vec<_> = orders.values().cloned().collect();

        result.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        result.truncate(limit);

        Ok(result)
    }
}
