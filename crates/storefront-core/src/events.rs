//! UI Signals
//!
//! Open/close cart and open checkout are broadcast on an explicit bus
//! owned by the root composition, so any number of components can react
//! without polling or global window events.

use std::sync::Arc;

use tokio::sync::broadcast;

use crate::cart::CheckoutSnapshot;
use crate::store::CartFacade;

/// Default number of buffered signals per subscriber
const DEFAULT_CAPACITY: usize = 16;

/// Cross-component signal
#[derive(Clone, Debug, PartialEq)]
pub enum StorefrontEvent {
    /// Show the cart panel
    OpenCart,

    /// Hide the cart panel
    CloseCart,

    /// Start checkout with this snapshot of the cart
    OpenCheckout(CheckoutSnapshot),
}

/// Broadcast bus for `StorefrontEvent`s
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<StorefrontEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publish a signal. Returns how many subscribers received it.
    pub fn emit(&self, event: StorefrontEvent) -> usize {
        // A send with no listeners is not an error for UI signals.
        self.sender.send(event).unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StorefrontEvent> {
        self.sender.subscribe()
    }
}

/// Root composition: one cart and one signal bus
#[derive(Clone)]
pub struct Storefront {
    cart: Arc<dyn CartFacade>,
    events: EventBus,
}

impl Storefront {
    pub fn new(cart: Arc<dyn CartFacade>, events: EventBus) -> Self {
        Self { cart, events }
    }

    pub fn cart(&self) -> &Arc<dyn CartFacade> {
        &self.cart
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn open_cart(&self) {
        self.events.emit(StorefrontEvent::OpenCart);
    }

    pub fn close_cart(&self) {
        self.events.emit(StorefrontEvent::CloseCart);
    }

    /// Snapshot the cart, close the panel and announce checkout.
    /// An empty cart emits nothing and returns `None`.
    pub fn open_checkout(&self) -> Option<CheckoutSnapshot> {
        let snapshot = self.cart.snapshot().snapshot();
        if snapshot.is_empty() {
            tracing::debug!("Ignoring checkout request for empty cart");
            return None;
        }

        tracing::info!(
            lines = snapshot.items.len(),
            total = %snapshot.total,
            "Opening checkout"
        );
        self.events.emit(StorefrontEvent::CloseCart);
        self.events.emit(StorefrontEvent::OpenCheckout(snapshot.clone()));
        Some(snapshot)
    }
}
