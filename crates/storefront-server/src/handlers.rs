//! HTTP Handlers

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::Serialize;
use serde_json::Value;

use storefront_core::{Catalog, Order, PaymentIntentCreated};
use storefront_payments::{OrderStore, PaymentError, WebhookHandler};

use crate::state::AppState;

// ============================================================================
// Response Types
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub payments_configured: bool,
    pub processor: Option<String>,
    pub catalog_products: usize,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, error: impl Into<String>, code: &str) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
            code: code.into(),
        }),
    )
}

fn payment_error(err: &PaymentError) -> ApiError {
    match err {
        PaymentError::InvalidInput(_) => {
            api_error(StatusCode::BAD_REQUEST, err.user_message(), "INVALID_INPUT")
        }
        PaymentError::Config(_) => {
            api_error(StatusCode::SERVICE_UNAVAILABLE, err.user_message(), "PAYMENTS_MISCONFIGURED")
        }
        _ => api_error(StatusCode::INTERNAL_SERVER_ERROR, err.user_message(), "UPSTREAM_ERROR"),
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        payments_configured: state.payments.is_some(),
        processor: state.payments.as_ref().map(|p| p.processor_name().to_string()),
        catalog_products: state.catalog.len(),
    })
}

/// Product catalog
pub async fn list_products(State(state): State<AppState>) -> Json<Catalog> {
    Json(state.catalog.as_ref().clone())
}

/// Create a payment intent for the submitted items
pub async fn create_payment_intent(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<PaymentIntentCreated>, ApiError> {
    let payments = state.payments.as_ref().ok_or_else(|| {
        api_error(StatusCode::SERVICE_UNAVAILABLE, "Payments not configured", "PAYMENTS_DISABLED")
    })?;

    let body: Value = serde_json::from_slice(&body).map_err(|e| {
        tracing::debug!(error = %e, "Rejecting malformed payment intent body");
        api_error(StatusCode::BAD_REQUEST, "Invalid JSON body", "INVALID_INPUT")
    })?;

    let created = payments.create(&body).await.map_err(|e| {
        if matches!(e, PaymentError::InvalidInput(_)) {
            tracing::debug!(error = %e, "Rejected payment intent request");
        } else {
            tracing::error!("Payment intent error: {}", e);
        }
        payment_error(&e)
    })?;

    Ok(Json(created))
}

/// Order recorded for a payment intent
pub async fn get_order(
    State(state): State<AppState>,
    Path(payment_intent_id): Path<String>,
) -> Result<Json<Order>, ApiError> {
    match state.order_store.get_by_payment_intent(&payment_intent_id) {
        Ok(Some(order)) => Ok(Json(order)),
        Ok(None) => Err(api_error(StatusCode::NOT_FOUND, "Order not found", "ORDER_NOT_FOUND")),
        Err(e) => {
            tracing::error!("Order lookup error: {}", e);
            Err(payment_error(&e))
        }
    }
}

/// Stripe webhook handler
pub async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Result<StatusCode, ApiError> {
    let secret = state.webhook_secret.as_deref().ok_or_else(|| {
        api_error(StatusCode::SERVICE_UNAVAILABLE, "Webhooks not configured", "WEBHOOKS_DISABLED")
    })?;

    let signature = headers
        .get("stripe-signature")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| api_error(StatusCode::BAD_REQUEST, "Missing Stripe signature", "MISSING_SIGNATURE"))?;

    let handler = WebhookHandler::new(state.order_store.clone());

    let event = handler.parse_event(&body, signature, secret).map_err(|e| {
        tracing::warn!("Webhook signature failed: {}", e);
        api_error(StatusCode::BAD_REQUEST, "Invalid signature", "INVALID_SIGNATURE")
    })?;

    handler.handle(&event).map_err(|e| {
        tracing::error!("Webhook processing error: {}", e);
        api_error(StatusCode::INTERNAL_SERVER_ERROR, "Webhook processing failed", "WEBHOOK_ERROR")
    })?;

    Ok(StatusCode::OK)
}
