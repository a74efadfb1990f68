//! Cart Store
//!
//! Owns the cart state and all mutation logic. State lives in a
//! `tokio::sync::watch` channel so UI layers can subscribe to changes
//! instead of polling; every mutation is persisted (best-effort) before
//! subscribers are notified.

use rust_decimal::Decimal;
use tokio::sync::watch;

use crate::cart::{CartState, CheckoutSnapshot, LineKey, NewLine};
use crate::storage::CartPersistence;

/// Capability interface handed to presentation code
///
/// Consumers only see this trait, so the backing store (in-memory,
/// `localStorage`, a file...) can change without touching them. Reads are
/// always computed from the current state.
pub trait CartFacade: Send + Sync {
    /// Add an item, merging with an existing line of the same identity key
    fn add_item(&self, item: NewLine);

    /// Remove a line; absent keys are a no-op
    fn remove_item(&self, key: &LineKey);

    /// Set a line's quantity; non-finite or non-positive values remove it
    fn update_quantity(&self, key: &LineKey, quantity: f64);

    /// Empty the cart
    fn clear_cart(&self);

    /// Sum of `price * quantity`
    fn total(&self) -> Decimal;

    /// Sum of quantities
    fn count(&self) -> u64;

    /// Read-only copy of the current state
    fn snapshot(&self) -> CartState;

    /// Receiver that observes every subsequent mutation
    fn subscribe(&self) -> watch::Receiver<CartState>;
}

/// The single owner of a cart's state
pub struct CartStore {
    state: watch::Sender<CartState>,
    persistence: Option<CartPersistence>,
}

impl Default for CartStore {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl CartStore {
    /// Store without durable backing
    pub fn in_memory() -> Self {
        Self {
            state: watch::Sender::new(CartState::new()),
            persistence: None,
        }
    }

    /// Store seeded from, and saved to, a storage slot
    pub fn persistent(persistence: CartPersistence) -> Self {
        let initial = persistence.load();
        tracing::debug!(key = %persistence.key(), lines = initial.len(), "Loaded cart");
        Self {
            state: watch::Sender::new(initial),
            persistence: Some(persistence),
        }
    }

    /// Re-read the storage slot, e.g. after another tab wrote to it
    pub fn reload(&self) {
        if let Some(persistence) = &self.persistence {
            let fresh = persistence.load();
            self.state.send_if_modified(|state| {
                if *state == fresh {
                    return false;
                }
                *state = fresh;
                true
            });
        }
    }

    /// Apply a mutation; persists and notifies only when it reports a change
    fn mutate(&self, f: impl FnOnce(&mut CartState) -> bool) {
        let mut persisted = None;
        let changed = self.state.send_if_modified(|state| {
            let changed = f(state);
            if changed {
                persisted = Some(state.clone());
            }
            changed
        });

        if let (true, Some(state), Some(persistence)) = (changed, persisted, &self.persistence) {
            persistence.save(&state);
        }
    }
}

impl CartFacade for CartStore {
    fn add_item(&self, item: NewLine) {
        tracing::debug!(key = %item.key(), "Adding item to cart");
        self.mutate(|state| {
            state.add(item);
            true
        });
    }

    fn remove_item(&self, key: &LineKey) {
        self.mutate(|state| state.remove(key));
    }

    fn update_quantity(&self, key: &LineKey, quantity: f64) {
        self.mutate(|state| state.set_quantity(key, quantity));
    }

    fn clear_cart(&self) {
        self.mutate(|state| {
            let had_lines = !state.is_empty();
            state.clear();
            had_lines
        });
    }

    fn total(&self) -> Decimal {
        self.state.borrow().total()
    }

    fn count(&self) -> u64 {
        self.state.borrow().count()
    }

    fn snapshot(&self) -> CartState {
        self.state.borrow().clone()
    }

    fn subscribe(&self) -> watch::Receiver<CartState> {
        self.state.subscribe()
    }
}

impl CartStore {
    /// Snapshot for the checkout flow
    pub fn checkout_snapshot(&self) -> CheckoutSnapshot {
        self.state.borrow().snapshot()
    }
}
