//! Storefront HTTP Server
//!
//! Axum-based server providing the payment intent endpoint, the product
//! catalog, Stripe webhooks and the static WASM frontend.

mod app;
mod config;
mod handlers;
mod state;

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use storefront_core::Catalog;
use storefront_payments::{
    MemoryOrderStore, MockProcessor, PaymentIntentService, PaymentProcessor, StripeProcessor,
};

use crate::app::build_router;
use crate::config::{ProcessorKind, ServerConfig};
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env()?;

    // Catalog
    let catalog = match &config.catalog_path {
        Some(path) => {
            let catalog = Catalog::from_path(path)?;
            tracing::info!("✓ Loaded {} products from {}", catalog.len(), path.display());
            Some(Arc::new(catalog))
        }
        None => {
            tracing::warn!("⚠ No CATALOG_PATH - payment amounts will trust client prices");
            None
        }
    };

    // Payment processor
    let processor: Option<Arc<dyn PaymentProcessor>> = match (&config.processor, &config.stripe_secret_key) {
        (ProcessorKind::Mock, _) => {
            tracing::warn!("⚠ Using mock payment processor - no real charges");
            Some(Arc::new(MockProcessor::succeeding()))
        }
        (ProcessorKind::Stripe, Some(key)) => {
            tracing::info!("✓ Stripe configured");
            Some(Arc::new(StripeProcessor::new(key)))
        }
        (ProcessorKind::Stripe, None) => {
            tracing::warn!("⚠ Stripe not configured - payments disabled");
            tracing::warn!("  Set STRIPE_SECRET_KEY in .env");
            None
        }
    };

    if config.stripe_webhook_secret.is_none() {
        tracing::warn!("⚠ STRIPE_WEBHOOK_SECRET not set - orders will not be recorded");
    }

    let payments = processor.map(|processor| {
        let service = PaymentIntentService::new(processor).with_currency(config.currency.clone());
        match &catalog {
            Some(catalog) => service.with_catalog(catalog.clone()),
            None => service,
        }
    });

    // Build application state
    let state = AppState {
        payments,
        catalog: catalog.unwrap_or_default(),
        order_store: Arc::new(MemoryOrderStore::new()),
        webhook_secret: config.stripe_webhook_secret.clone(),
    };

    let app = build_router(state, &config.static_dir);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;

    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("🛒 storefront server running on http://{}", config.bind_addr);
    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("");
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /health                     - Health check");
    tracing::info!("  GET  /api/products               - Product catalog");
    tracing::info!("  POST /api/create-payment-intent  - Create payment intent");
    tracing::info!("  GET  /api/orders/{{id}}            - Order by payment intent");
    tracing::info!("  POST /webhook/stripe             - Stripe webhooks");
    tracing::info!("");

    axum::serve(listener, app).await?;

    Ok(())
}
