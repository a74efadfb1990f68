//! # storefront-core
//!
//! Client-side cart state engine and checkout flow for the storefront.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        Storefront                             │
//! │  ┌─────────────┐   ┌─────────────┐   ┌────────────────────┐  │
//! │  │ CartFacade  │──▶│  CartStore  │──▶│  CartPersistence   │  │
//! │  │  (trait)    │   │  (watch)    │   │  (CartStorage)     │  │
//! │  └─────────────┘   └─────────────┘   └────────────────────┘  │
//! │  ┌─────────────┐   ┌──────────────────────────────────────┐  │
//! │  │  EventBus   │   │ CheckoutRequester ──▶ IntentClient    │  │
//! │  └─────────────┘   └──────────────────────────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Presentation code only ever holds an `Arc<dyn CartFacade>`, so the
//! storage mechanism can be swapped without touching components.

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod error;
pub mod events;
pub mod intent;
pub mod order;
pub mod storage;
pub mod store;

pub use cart::{CartLine, CartState, CheckoutSnapshot, LineKey, NewLine};
pub use catalog::{Catalog, Product};
pub use checkout::{CheckoutError, CheckoutRequester, CheckoutState, HttpIntentClient, IntentClient};
pub use error::{Result, StorefrontError};
pub use events::{EventBus, Storefront, StorefrontEvent};
pub use intent::{IntentItem, PaymentIntentCreated, PaymentIntentRequest, PaymentIntentResponse};
pub use order::Order;
pub use storage::{CartPersistence, CartStorage, FileStorage, MemoryStorage};
pub use store::{CartFacade, CartStore};
