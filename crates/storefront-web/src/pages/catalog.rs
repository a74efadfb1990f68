//! Catalog Page

use leptos::prelude::*;

use storefront_core::Product;

use crate::api;
use crate::app::Shop;
use crate::components::format_price;

#[component]
pub fn CatalogPage() -> impl IntoView {
    let shop = expect_context::<Shop>();
    let (products, set_products) = signal(Vec::<Product>::new());
    let (error, set_error) = signal(None::<String>);
    let cart = shop.cart;

    leptos::task::spawn_local(async move {
        match api::fetch_products().await {
            Ok(list) => set_products.set(list),
            Err(e) => set_error.set(Some(e)),
        }
    });

    let open_cart = move |_| shop.storefront.open_cart();

    view! {
        <div class="catalog">
            <header class="hero">
                <h1>"Rooted Smile"</h1>
                <button class="btn cart-button" on:click=open_cart>
                    {move || format!("Cart ({})", cart.with(|c| c.count()))}
                </button>
            </header>

            <Show when=move || error.get().is_some()>
                <p class="error">{move || error.get().unwrap_or_default()}</p>
            </Show>

            <section class="products">
                <For
                    each=move || products.get()
                    key=|product| product.id.clone()
                    children=move |product| view! { <ProductCard product=product /> }
                />
            </section>
        </div>
    }
}

#[component]
fn ProductCard(product: Product) -> impl IntoView {
    let shop = expect_context::<Shop>();
    let (size, set_size) = signal(None::<String>);
    let needs_size = !product.sizes.is_empty();

    let sizes = product.sizes.clone();
    let price = format_price(product.price);
    let (name, description, image) = (
        product.name.clone(),
        product.description.clone(),
        product.image.clone(),
    );

    let add = move |_| {
        let chosen = size.get();
        if !product.offers_size(chosen.as_deref()) {
            return;
        }
        shop.storefront.cart().add_item(product.to_line(chosen.as_deref()));
        shop.storefront.open_cart();
    };

    view! {
        <article class="product">
            {image.map(|src| view! { <img src=src alt="" /> })}
            <h3>{name}</h3>
            {description.map(|text| view! { <p class="description">{text}</p> })}
            <span class="price">{price}</span>
            {needs_size.then(|| view! {
                <select on:change=move |ev| {
                    let value = event_target_value(&ev);
                    set_size.set((!value.is_empty()).then_some(value));
                }>
                    <option value="">"Select size"</option>
                    {sizes.into_iter().map(|s| view! { <option value=s.clone()>{s.clone()}</option> }).collect_view()}
                </select>
            })}
            <button
                class="btn btn-primary"
                disabled=move || needs_size && size.get().is_none()
                on:click=add
            >
                "Add to Cart"
            </button>
        </article>
    }
}
