//! Storefront Web Frontend
//!
//! Leptos-based WASM frontend: catalog, cart sidebar and checkout modal
//! over the `storefront-core` cart engine.

mod app;
mod pages;
mod components;
mod api;
mod storage;

pub use app::{App, Shop};
pub use storage::LocalStorage;

use wasm_bindgen::prelude::*;

/// WASM entry point
#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    leptos::mount::mount_to_body(App);
}
