//! Router Construction

use std::path::Path;

use axum::{
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::handlers::{create_payment_intent, get_order, health_check, list_products, stripe_webhook};
use crate::state::AppState;

/// API routes plus the static frontend as fallback
pub fn build_router(state: AppState, static_dir: &Path) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health & info
        .route("/health", get(health_check))
        .route("/api/products", get(list_products))

        // Checkout
        .route("/api/create-payment-intent", post(create_payment_intent))
        .route("/api/orders/{payment_intent_id}", get(get_order))

        // Payments
        .route("/webhook/stripe", post(stripe_webhook))

        // Static files (WASM frontend)
        .fallback_service(ServeDir::new(static_dir))

        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(cors))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
        response::Response,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use storefront_core::{Catalog, Order};
    use storefront_payments::{MemoryOrderStore, MockProcessor, OrderStore, PaymentIntentService};

    fn state_with(processor: Option<Arc<MockProcessor>>) -> AppState {
        AppState {
            payments: processor.map(|p| PaymentIntentService::new(p)),
            catalog: Arc::new(
                Catalog::from_json(r#"[{"id":"tee","name":"Rooted Tee","price":25,"sizes":["S","M"]}]"#).unwrap(),
            ),
            order_store: Arc::new(MemoryOrderStore::new()),
            webhook_secret: Some("whsec_test".into()),
        }
    }

    fn router(state: AppState) -> Router {
        build_router(state, Path::new("static"))
    }

    async fn post_json(app: Router, uri: &str, body: &str) -> Response {
        app.oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap()
    }

    async fn get(app: Router, uri: &str) -> Response {
        app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_create_payment_intent_amount() {
        let processor = Arc::new(MockProcessor::succeeding());
        let app = router(state_with(Some(processor.clone())));

        let body = json!({"items": [{"name": "Tee", "price": 10, "quantity": 2}, {"name": "Mug", "price": 5.5, "quantity": 1}]});
        let response = post_json(app, "/api/create-payment-intent", &body.to_string()).await;

        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["paymentIntentId"], "pi_mock_1");
        assert!(json["clientSecret"].as_str().unwrap().starts_with("pi_mock_1_secret_"));
        assert_eq!(processor.calls()[0].amount, 2550);
    }

    #[tokio::test]
    async fn test_items_need_only_price_and_quantity() {
        let processor = Arc::new(MockProcessor::succeeding());
        let app = router(state_with(Some(processor.clone())));

        let body = r#"{"items":[{"price":10,"quantity":2},{"price":5.5,"quantity":1}]}"#;
        let response = post_json(app, "/api/create-payment-intent", body).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(processor.calls()[0].amount, 2550);
    }

    #[tokio::test]
    async fn test_empty_items_is_bad_request() {
        let processor = Arc::new(MockProcessor::succeeding());
        let app = router(state_with(Some(processor.clone())));

        let response = post_json(app, "/api/create-payment-intent", r#"{"items":[]}"#).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = json_body(response).await;
        assert_eq!(json["error"], "Invalid items");
        assert_eq!(json["code"], "INVALID_INPUT");
        assert!(processor.calls().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request() {
        let app = router(state_with(Some(Arc::new(MockProcessor::succeeding()))));
        let response = post_json(app, "/api/create-payment-intent", "{items:").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_processor_failure_is_500_with_message() {
        let app = router(state_with(Some(Arc::new(MockProcessor::failing("Invalid API Key provided")))));

        let body = json!({"items": [{"name": "Tee", "price": 10, "quantity": 1}]});
        let response = post_json(app, "/api/create-payment-intent", &body.to_string()).await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = json_body(response).await;
        assert_eq!(json["error"], "Invalid API Key provided");
    }

    #[tokio::test]
    async fn test_payments_disabled() {
        let app = router(state_with(None));
        let body = json!({"items": [{"name": "Tee", "price": 10, "quantity": 1}]});
        let response = post_json(app, "/api/create-payment-intent", &body.to_string()).await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_health_and_products() {
        let state = state_with(Some(Arc::new(MockProcessor::succeeding())));

        let health = json_body(get(router(state.clone()), "/health").await).await;
        assert_eq!(health["status"], "healthy");
        assert_eq!(health["processor"], "MockProcessor");
        assert_eq!(health["catalog_products"], 1);

        let products = json_body(get(router(state), "/api/products").await).await;
        assert_eq!(products[0]["id"], "tee");
        assert_eq!(products[0]["price"], 25.0);
    }

    #[tokio::test]
    async fn test_order_lookup() {
        let state = state_with(None);
        state.order_store.save(&Order::new("pi_42", Vec::new())).unwrap();

        let found = get(router(state.clone()), "/api/orders/pi_42").await;
        assert_eq!(found.status(), StatusCode::OK);
        assert_eq!(json_body(found).await["payment_intent_id"], "pi_42");

        let missing = get(router(state), "/api/orders/pi_0").await;
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_webhook_requires_valid_signature() {
        let state = state_with(None);

        let unsigned = post_json(router(state.clone()), "/webhook/stripe", "{}").await;
        assert_eq!(unsigned.status(), StatusCode::BAD_REQUEST);

        let forged = router(state)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/webhook/stripe")
                    .header("stripe-signature", "t=1,v1=deadbeef")
                    .body(Body::from("{}"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(forged.status(), StatusCode::BAD_REQUEST);
    }
}
