//! API Client

use storefront_core::Product;

/// Origin of the page, used as the API base URL
pub fn origin() -> String {
    web_sys::window()
        .and_then(|w| w.location().origin().ok())
        .unwrap_or_else(|| "http://localhost:3000".into())
}

/// Fetch the product catalog from the backend
pub async fn fetch_products() -> Result<Vec<Product>, String> {
    let response = reqwest::Client::new()
        .get(format!("{}/api/products", origin()))
        .send()
        .await
        .map_err(|e| e.to_string())?;

    if response.status().is_success() {
        response.json().await.map_err(|e| e.to_string())
    } else {
        Err("Failed to load products".into())
    }
}

/// Full-page navigation
pub fn navigate(path: &str) {
    if let Some(window) = web_sys::window() {
        let _ = window.location().set_href(path);
    }
}
