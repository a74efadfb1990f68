//! UI Components

use leptos::prelude::*;
use rust_decimal::Decimal;

use storefront_core::{CartLine, CheckoutState, LineKey};

use crate::api;
use crate::app::Shop;

/// Custom DOM event the payment element glue fires once the processor
/// confirms the payment.
pub const PAYMENT_CONFIRMED_EVENT: &str = "storefront:payment-confirmed";

pub fn format_price(amount: Decimal) -> String {
    format!("${:.2}", amount.round_dp(2))
}

/// One cart row with quantity controls
#[component]
pub fn CartLineRow(line: CartLine) -> impl IntoView {
    let shop = expect_context::<Shop>();
    let key: LineKey = line.key();
    let quantity = line.quantity;

    let decrement = {
        let (shop, key) = (shop.clone(), key.clone());
        move |_| {
            shop.storefront
                .cart()
                .update_quantity(&key, f64::from(quantity.saturating_sub(1).max(1)));
        }
    };
    let increment = {
        let (shop, key) = (shop.clone(), key.clone());
        move |_| {
            shop.storefront
                .cart()
                .update_quantity(&key, f64::from(quantity.saturating_add(1)));
        }
    };
    let edit = {
        let (shop, key) = (shop.clone(), key.clone());
        move |ev| {
            // Anything unparsable removes the line
            let value = event_target_value(&ev).trim().parse::<f64>().unwrap_or(0.0);
            shop.storefront.cart().update_quantity(&key, value);
        }
    };
    let remove = move |_| shop.storefront.cart().remove_item(&key);

    view! {
        <li class="cart-line">
            {line.image.clone().map(|src| view! { <img class="thumb" src=src alt="" /> })}
            <div class="details">
                <span class="name">{line.name.clone()}</span>
                {line.size.clone().map(|size| view! { <span class="size">{format!("Size: {size}")}</span> })}
                <span class="price">{format_price(line.price)}</span>
            </div>
            <div class="quantity">
                <button on:click=decrement>"−"</button>
                <input type="number" min="1" prop:value=quantity.to_string() on:change=edit />
                <button on:click=increment>"+"</button>
            </div>
            <span class="subtotal">{format_price(line.subtotal())}</span>
            <button class="remove" on:click=remove>"Remove"</button>
        </li>
    }
}

/// Slide-over cart driven by the open/close events
#[component]
pub fn CartSidebar() -> impl IntoView {
    let shop = expect_context::<Shop>();
    let cart = shop.cart;
    let open = shop.cart_open;

    let close = {
        let shop = shop.clone();
        move |_| shop.storefront.close_cart()
    };
    let clear = {
        let shop = shop.clone();
        move |_| shop.storefront.cart().clear_cart()
    };
    let checkout = move |_| {
        if shop.storefront.open_checkout().is_none() {
            tracing::debug!("Checkout requested with an empty cart");
        }
    };

    view! {
        <Show when=move || open.get()>
            <aside class="cart-sidebar">
                <header>
                    <h2>{move || format!("Your Cart ({})", cart.with(|c| c.count()))}</h2>
                    <button class="close" on:click=close.clone()>"×"</button>
                </header>

                {
                    let checkout = checkout.clone();
                    let clear = clear.clone();
                    view! {
                <Show
                    when=move || !cart.with(|c| c.is_empty())
                    fallback=|| view! { <p class="empty">"Your cart is empty"</p> }
                >
                    <ul class="cart-lines">
                        <For
                            each=move || cart.get().into_lines()
                            key=|line| (line.key(), line.quantity)
                            children=move |line| view! { <CartLineRow line=line /> }
                        />
                    </ul>
                    <footer>
                        <div class="total">
                            <span>"Total"</span>
                            <span>{move || format_price(cart.with(|c| c.total()))}</span>
                        </div>
                        <button class="btn btn-primary" on:click=checkout.clone()>"Proceed to Checkout"</button>
                        <button class="btn" on:click=clear.clone()>"Clear Cart"</button>
                    </footer>
                </Show>
                    }
                }
            </aside>
        </Show>
    }
}

/// Checkout dialog: order summary plus the payment element mount point
#[component]
pub fn CheckoutModal() -> impl IntoView {
    let shop = expect_context::<Shop>();
    let open = shop.checkout_open;
    let state = shop.checkout_state;

    // Fired by the payment element glue after a successful confirmation
    let confirmed = shop.clone();
    let _ = window_event_listener_untyped(PAYMENT_CONFIRMED_EVENT, move |_| {
        match confirmed.checkout.confirm_paid(confirmed.storefront.cart().as_ref()) {
            Ok(order) => {
                tracing::info!("Payment confirmed for {}", order.payment_intent_id);
                confirmed.checkout_open.set(false);
                confirmed.checkout.reset();
                api::navigate(&format!("/success?payment_intent={}", order.payment_intent_id));
            }
            Err(e) => tracing::warn!("Ignoring payment confirmation: {}", e),
        }
    });

    let summary = {
        let shop = shop.clone();
        move || {
            // Re-read when the requester state moves
            state.track();
            shop.checkout.snapshot()
        }
    };

    let close = {
        let shop = shop.clone();
        move |_| shop.close_checkout()
    };

    view! {
        <Show when=move || open.get()>
            <div class="modal-backdrop">
                <div class="checkout-modal">
                    <header>
                        <h2>"Checkout"</h2>
                        <button class="close" on:click=close.clone()>"×"</button>
                    </header>

                    {let summary = summary.clone(); move || summary().map(|snapshot| view! {
                        <ul class="summary">
                            {snapshot.items.iter().map(|line| view! {
                                <li>
                                    <span>{format!("{} × {}", line.name, line.quantity)}</span>
                                    <span>{format_price(line.subtotal())}</span>
                                </li>
                            }).collect_view()}
                        </ul>
                        <div class="total">
                            <span>"Total"</span>
                            <span>{format_price(snapshot.total)}</span>
                        </div>
                    })}

                    <CheckoutStatus state=state />
                </div>
            </div>
        </Show>
    }
}

#[component]
fn CheckoutStatus(state: RwSignal<CheckoutState>) -> impl IntoView {
    let shop = expect_context::<Shop>();

    move || match state.get() {
        CheckoutState::Idle => ().into_any(),
        CheckoutState::Requesting => view! { <p class="loading">"Preparing payment..."</p> }.into_any(),
        CheckoutState::Ready { client_secret, .. } => view! {
            <div id="payment-element" data-client-secret=client_secret></div>
        }
        .into_any(),
        CheckoutState::Failed { message, retryable } => {
            let shop = shop.clone();
            let retry = retryable.then(|| {
                view! { <button class="btn" on:click=move |_| shop.retry_checkout()>"Try Again"</button> }
            });
            view! {
                <div class="error">
                    <p>{message}</p>
                    {retry}
                </div>
            }
            .into_any()
        }
    }
}
