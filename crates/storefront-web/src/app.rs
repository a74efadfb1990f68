//! Main App Component

use std::sync::Arc;

use leptos::prelude::*;
use leptos_router::{components::*, path};
use tokio::sync::broadcast::error::RecvError;

use storefront_core::{
    CartFacade, CartPersistence, CartState, CartStore, CheckoutRequester, CheckoutSnapshot,
    CheckoutState, EventBus, HttpIntentClient, Storefront, StorefrontEvent,
};

use crate::api;
use crate::components::{CartSidebar, CheckoutModal};
use crate::pages::{CatalogPage, SuccessPage};
use crate::storage::LocalStorage;

/// Shared storefront handles plus the signals the views render from
#[derive(Clone)]
pub struct Shop {
    pub storefront: Storefront,
    pub checkout: Arc<CheckoutRequester>,
    pub cart: RwSignal<CartState>,
    pub cart_open: RwSignal<bool>,
    pub checkout_open: RwSignal<bool>,
    pub checkout_state: RwSignal<CheckoutState>,
}

impl Shop {
    /// Request a payment intent for the snapshot taken when checkout opened
    pub fn begin_checkout(&self, snapshot: CheckoutSnapshot) {
        let checkout = self.checkout.clone();
        leptos::task::spawn_local(async move {
            if let Err(e) = checkout.begin(snapshot).await {
                tracing::warn!("Checkout request failed: {}", e);
            }
        });
    }

    pub fn retry_checkout(&self) {
        let checkout = self.checkout.clone();
        leptos::task::spawn_local(async move {
            if let Err(e) = checkout.retry().await {
                tracing::warn!("Checkout retry failed: {}", e);
            }
        });
    }

    pub fn close_checkout(&self) {
        self.checkout.reset();
        self.checkout_open.set(false);
    }
}

fn build_shop() -> (Shop, Arc<CartStore>) {
    let store = Arc::new(CartStore::persistent(CartPersistence::with_default_key(Arc::new(
        LocalStorage,
    ))));
    let facade: Arc<dyn CartFacade> = store.clone();
    let storefront = Storefront::new(facade, EventBus::default());
    let client = HttpIntentClient::new(&api::origin());
    let checkout = Arc::new(CheckoutRequester::new(Arc::new(client)));

    let shop = Shop {
        cart: RwSignal::new(store.snapshot()),
        checkout_state: RwSignal::new(checkout.state()),
        cart_open: RwSignal::new(false),
        checkout_open: RwSignal::new(false),
        storefront,
        checkout,
    };
    (shop, store)
}

/// Mirror the channels into signals
fn connect(shop: &Shop) {
    let cart = shop.cart;
    let mut cart_rx = shop.storefront.cart().subscribe();
    leptos::task::spawn_local(async move {
        while cart_rx.changed().await.is_ok() {
            let state = cart_rx.borrow_and_update().clone();
            cart.set(state);
        }
    });

    let checkout_state = shop.checkout_state;
    let mut state_rx = shop.checkout.subscribe();
    leptos::task::spawn_local(async move {
        while state_rx.changed().await.is_ok() {
            let state = state_rx.borrow_and_update().clone();
            checkout_state.set(state);
        }
    });

    let listener = shop.clone();
    let mut events = shop.storefront.events().subscribe();
    leptos::task::spawn_local(async move {
        loop {
            match events.recv().await {
                Ok(StorefrontEvent::OpenCart) => listener.cart_open.set(true),
                Ok(StorefrontEvent::CloseCart) => listener.cart_open.set(false),
                Ok(StorefrontEvent::OpenCheckout(snapshot)) => {
                    listener.checkout_open.set(true);
                    listener.begin_checkout(snapshot);
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!("Dropped {} storefront events", skipped);
                }
                Err(RecvError::Closed) => break,
            }
        }
    });
}

/// Root application component
#[component]
pub fn App() -> impl IntoView {
    let (shop, store) = build_shop();
    connect(&shop);
    provide_context(shop);

    // Another tab wrote the cart
    let _ = window_event_listener(leptos::ev::storage, move |_| store.reload());

    view! {
        <Router>
            <main class="app">
                <CartSidebar />
                <CheckoutModal />
                <Routes fallback=|| view! { <p>"Page not found"</p> }>
                    <Route path=path!("/") view=CatalogPage />
                    <Route path=path!("/success") view=SuccessPage />
                </Routes>
            </main>
        </Router>
    }
}
