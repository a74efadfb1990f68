//! Checkout Intent Requester
//!
//! Turns a cart snapshot into a payment intent client secret.
//!
//! ```text
//!   idle ──begin──▶ requesting ──▶ ready ──confirm_paid──▶ idle
//!                       │  ▲
//!                       ▼  │ retry
//!                      failed
//! ```
//!
//! While a request is outstanding every further `begin`/`retry` is
//! rejected, so repeated clicks never create duplicate intents.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::watch;

use crate::cart::CheckoutSnapshot;
use crate::error::{Result, StorefrontError};
use crate::intent::{
    PaymentIntentCreated, PaymentIntentRequest, PaymentIntentResponse, CREATE_PAYMENT_INTENT_PATH,
};
use crate::order::Order;
use crate::store::CartFacade;

/// Anything that can ask the server for a payment intent
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait IntentClient: Send + Sync {
    async fn create_intent(&self, request: &PaymentIntentRequest) -> Result<PaymentIntentCreated>;
}

/// `IntentClient` talking to the storefront server over HTTP
pub struct HttpIntentClient {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpIntentClient {
    /// `base_url` is the server origin, e.g. `https://shop.example.com`
    pub fn new(base_url: &str) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            endpoint: format!("{}{}", base_url.trim_end_matches('/'), CREATE_PAYMENT_INTENT_PATH),
        }
    }

    /// Client that gives up after `timeout` instead of waiting forever
    #[cfg(not(target_arch = "wasm32"))]
    pub fn with_timeout(base_url: &str, timeout: std::time::Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StorefrontError::Config(e.to_string()))?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl IntentClient for HttpIntentClient {
    async fn create_intent(&self, request: &PaymentIntentRequest) -> Result<PaymentIntentCreated> {
        let response = self.client.post(&self.endpoint).json(request).send().await?;
        let status = response.status();
        let body = response.text().await?;
        read_response(status, &body)
    }
}

/// Map an endpoint reply to a result. A 4xx means the request itself was
/// rejected, so re-sending it cannot help.
fn read_response(status: reqwest::StatusCode, body: &str) -> Result<PaymentIntentCreated> {
    match serde_json::from_str::<PaymentIntentResponse>(body) {
        Ok(PaymentIntentResponse::Created(created)) => Ok(created),
        Ok(PaymentIntentResponse::Failed { error }) if status.is_client_error() => {
            Err(StorefrontError::InvalidInput(error))
        }
        Ok(PaymentIntentResponse::Failed { error }) => Err(StorefrontError::Upstream(error)),
        Err(_) if status.is_client_error() => {
            tracing::warn!(status = %status, "Payment intent request rejected");
            Err(StorefrontError::InvalidInput(status.to_string()))
        }
        Err(_) => {
            tracing::warn!(status = %status, "Unexpected payment intent response");
            Err(StorefrontError::Upstream(String::new()))
        }
    }
}

/// Where the checkout currently is
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum CheckoutState {
    #[default]
    Idle,

    /// A payment intent request is outstanding
    Requesting,

    /// The payment UI can be driven with this secret
    Ready {
        client_secret: String,
        payment_intent_id: String,
    },

    /// The last request failed; `retry` re-issues it
    Failed { message: String, retryable: bool },
}

impl CheckoutState {
    pub fn is_requesting(&self) -> bool {
        matches!(self, CheckoutState::Requesting)
    }
}

/// Why a checkout call was refused or failed
#[derive(Error, Debug)]
pub enum CheckoutError {
    #[error("Cart is empty")]
    EmptyCart,

    #[error("A payment intent request is already in flight")]
    InFlight,

    #[error("No failed request to retry")]
    NothingToRetry,

    #[error("Checkout is not ready for payment")]
    NotReady,

    #[error(transparent)]
    Request(#[from] StorefrontError),
}

/// Drives one open checkout
pub struct CheckoutRequester {
    client: Arc<dyn IntentClient>,
    state: watch::Sender<CheckoutState>,
    snapshot: Mutex<Option<CheckoutSnapshot>>,
    /// Bumped on reset so late responses for an abandoned checkout are dropped
    generation: AtomicU64,
}

impl CheckoutRequester {
    pub fn new(client: Arc<dyn IntentClient>) -> Self {
        Self {
            client,
            state: watch::Sender::new(CheckoutState::Idle),
            snapshot: Mutex::new(None),
            generation: AtomicU64::new(0),
        }
    }

    pub fn state(&self) -> CheckoutState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<CheckoutState> {
        self.state.subscribe()
    }

    /// Snapshot the current checkout was opened with
    pub fn snapshot(&self) -> Option<CheckoutSnapshot> {
        self.snapshot.lock().ok().and_then(|s| s.clone())
    }

    /// Request a payment intent for `snapshot`
    pub async fn begin(&self, snapshot: CheckoutSnapshot) -> std::result::Result<PaymentIntentCreated, CheckoutError> {
        if snapshot.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        if !self.try_start(|_| true) {
            tracing::debug!("Suppressed duplicate payment intent request");
            return Err(CheckoutError::InFlight);
        }

        if let Ok(mut slot) = self.snapshot.lock() {
            *slot = Some(snapshot.clone());
        }

        self.issue(&snapshot).await
    }

    /// Re-issue the last failed request with the same snapshot
    pub async fn retry(&self) -> std::result::Result<PaymentIntentCreated, CheckoutError> {
        let snapshot = self.snapshot().ok_or(CheckoutError::NothingToRetry)?;

        if !self.try_start(|s| matches!(s, CheckoutState::Failed { .. })) {
            return Err(if self.state.borrow().is_requesting() {
                CheckoutError::InFlight
            } else {
                CheckoutError::NothingToRetry
            });
        }

        self.issue(&snapshot).await
    }

    /// Payment was confirmed client-side: build the order record, empty the
    /// cart and close the checkout.
    pub fn confirm_paid(&self, cart: &dyn CartFacade) -> std::result::Result<Order, CheckoutError> {
        let payment_intent_id = match &*self.state.borrow() {
            CheckoutState::Ready { payment_intent_id, .. } => payment_intent_id.clone(),
            _ => return Err(CheckoutError::NotReady),
        };
        let snapshot = self.snapshot().ok_or(CheckoutError::NotReady)?;

        let request = PaymentIntentRequest::from(&snapshot);
        let order = Order::new(payment_intent_id, request.items).with_total(snapshot.total);

        tracing::info!(order_id = %order.id, total = %order.total, "Payment confirmed");
        cart.clear_cart();
        self.reset();
        Ok(order)
    }

    /// Close the checkout; any response still in flight is discarded
    pub fn reset(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut slot) = self.snapshot.lock() {
            *slot = None;
        }
        self.state.send_replace(CheckoutState::Idle);
    }

    /// Atomically move to `Requesting` if not already there and `allowed`
    fn try_start(&self, allowed: impl FnOnce(&CheckoutState) -> bool) -> bool {
        self.state.send_if_modified(|state| {
            if state.is_requesting() || !allowed(state) {
                return false;
            }
            *state = CheckoutState::Requesting;
            true
        })
    }

    async fn issue(&self, snapshot: &CheckoutSnapshot) -> std::result::Result<PaymentIntentCreated, CheckoutError> {
        let generation = self.generation.load(Ordering::SeqCst);
        let request = PaymentIntentRequest::from(snapshot);

        let result = self.client.create_intent(&request).await;

        if self.generation.load(Ordering::SeqCst) != generation {
            tracing::debug!("Dropping payment intent response for a closed checkout");
            return result.map_err(CheckoutError::from);
        }

        match result {
            Ok(created) => {
                tracing::info!(payment_intent_id = %created.payment_intent_id, "Payment intent ready");
                self.state.send_replace(CheckoutState::Ready {
                    client_secret: created.client_secret.clone(),
                    payment_intent_id: created.payment_intent_id.clone(),
                });
                Ok(created)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Payment intent request failed");
                self.state.send_replace(CheckoutState::Failed {
                    message: e.user_message(),
                    retryable: e.is_retryable(),
                });
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::{CartState, NewLine};
    use crate::store::CartStore;
    use rust_decimal_macros::dec;
    use std::collections::VecDeque;
    use std::sync::atomic::AtomicUsize;
    use tokio::sync::Notify;

    /// Replays canned results, optionally holding each call until released
    struct ScriptedClient {
        results: Mutex<VecDeque<Result<PaymentIntentCreated>>>,
        calls: AtomicUsize,
        gate: Option<Notify>,
        last_request: Mutex<Option<PaymentIntentRequest>>,
    }

    impl ScriptedClient {
        fn new(results: Vec<Result<PaymentIntentCreated>>) -> Self {
            Self {
                results: Mutex::new(results.into()),
                calls: AtomicUsize::new(0),
                gate: None,
                last_request: Mutex::new(None),
            }
        }

        fn gated(results: Vec<Result<PaymentIntentCreated>>) -> Self {
            Self {
                gate: Some(Notify::new()),
                ..Self::new(results)
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl IntentClient for ScriptedClient {
        async fn create_intent(&self, request: &PaymentIntentRequest) -> Result<PaymentIntentCreated> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_request.lock().unwrap() = Some(request.clone());
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            self.results
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(StorefrontError::Upstream("no scripted result".into())))
        }
    }

    fn created() -> PaymentIntentCreated {
        PaymentIntentCreated {
            client_secret: "pi_1_secret_abc".into(),
            payment_intent_id: "pi_1".into(),
        }
    }

    fn snapshot() -> CheckoutSnapshot {
        let mut cart = CartState::new();
        cart.add(NewLine::new("tee", "Rooted Tee", dec!(25)).size("M").quantity(2));
        cart.snapshot()
    }

    #[tokio::test]
    async fn test_empty_cart_never_requests() {
        let client = Arc::new(ScriptedClient::new(vec![Ok(created())]));
        let requester = CheckoutRequester::new(client.clone());

        let result = requester.begin(CheckoutSnapshot::default()).await;
        assert!(matches!(result, Err(CheckoutError::EmptyCart)));
        assert_eq!(client.calls(), 0);
        assert_eq!(requester.state(), CheckoutState::Idle);
    }

    #[tokio::test]
    async fn test_success_transitions_to_ready() {
        let client = Arc::new(ScriptedClient::new(vec![Ok(created())]));
        let requester = CheckoutRequester::new(client.clone());

        requester.begin(snapshot()).await.unwrap();

        assert_eq!(
            requester.state(),
            CheckoutState::Ready {
                client_secret: "pi_1_secret_abc".into(),
                payment_intent_id: "pi_1".into(),
            }
        );
        let sent = client.last_request.lock().unwrap().clone().unwrap();
        assert_eq!(sent.items[0].quantity, 2);
        assert_eq!(sent.items[0].size.as_deref(), Some("M"));
    }

    #[tokio::test]
    async fn test_failure_then_retry_with_same_snapshot() {
        let client = Arc::new(ScriptedClient::new(vec![
            Err(StorefrontError::Network("connection refused".into())),
            Ok(created()),
        ]));
        let requester = CheckoutRequester::new(client.clone());

        assert!(requester.begin(snapshot()).await.is_err());
        assert_eq!(
            requester.state(),
            CheckoutState::Failed {
                message: "Network error. Please check your connection.".into(),
                retryable: true,
            }
        );
        let first = client.last_request.lock().unwrap().clone();

        requester.retry().await.unwrap();
        assert!(matches!(requester.state(), CheckoutState::Ready { .. }));
        assert_eq!(*client.last_request.lock().unwrap(), first);
        assert_eq!(client.calls(), 2);
    }

    #[tokio::test]
    async fn test_upstream_message_reaches_state() {
        let client = Arc::new(ScriptedClient::new(vec![Err(StorefrontError::Upstream(
            "Your card was declined.".into(),
        ))]));
        let requester = CheckoutRequester::new(client);

        let _ = requester.begin(snapshot()).await;
        match requester.state() {
            CheckoutState::Failed { message, .. } => assert_eq!(message, "Your card was declined."),
            other => panic!("unexpected state {other:?}"),
        }
    }

    #[test]
    fn test_read_response_by_status() {
        use reqwest::StatusCode;

        let ok = read_response(StatusCode::OK, r#"{"clientSecret":"pi_1_secret_abc","paymentIntentId":"pi_1"}"#);
        assert_eq!(ok.unwrap(), created());

        let rejected = read_response(StatusCode::BAD_REQUEST, r#"{"error":"Invalid items","code":"INVALID_INPUT"}"#);
        assert!(matches!(rejected, Err(StorefrontError::InvalidInput(ref m)) if m == "Invalid items"));

        let upstream = read_response(StatusCode::INTERNAL_SERVER_ERROR, r#"{"error":"Your card was declined."}"#);
        assert!(matches!(upstream, Err(StorefrontError::Upstream(ref m)) if m == "Your card was declined."));

        let garbled = read_response(StatusCode::BAD_GATEWAY, "<html>");
        assert!(matches!(garbled, Err(StorefrontError::Upstream(ref m)) if m.is_empty()));
    }

    #[tokio::test]
    async fn test_rejected_request_is_not_retryable() {
        let rejection = read_response(reqwest::StatusCode::BAD_REQUEST, r#"{"error":"Invalid items"}"#);
        let client = Arc::new(ScriptedClient::new(vec![rejection.map(|_| created())]));
        let requester = CheckoutRequester::new(client);

        assert!(requester.begin(snapshot()).await.is_err());
        match requester.state() {
            CheckoutState::Failed { retryable, .. } => assert!(!retryable),
            other => panic!("unexpected state {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_retry_requires_failure() {
        let client = Arc::new(ScriptedClient::new(vec![Ok(created())]));
        let requester = CheckoutRequester::new(client.clone());

        assert!(matches!(requester.retry().await, Err(CheckoutError::NothingToRetry)));
        requester.begin(snapshot()).await.unwrap();
        assert!(matches!(requester.retry().await, Err(CheckoutError::NothingToRetry)));
        assert_eq!(client.calls(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_requests_are_suppressed() {
        let client = Arc::new(ScriptedClient::gated(vec![Ok(created())]));
        let requester = Arc::new(CheckoutRequester::new(client.clone()));

        let background = requester.clone();
        let first = tokio::spawn(async move { background.begin(snapshot()).await });

        let mut rx = requester.subscribe();
        rx.wait_for(CheckoutState::is_requesting).await.unwrap();

        assert!(matches!(requester.begin(snapshot()).await, Err(CheckoutError::InFlight)));
        assert!(matches!(requester.retry().await, Err(CheckoutError::InFlight)));

        client.gate.as_ref().unwrap().notify_one();
        first.await.unwrap().unwrap();

        assert_eq!(client.calls(), 1);
        assert!(matches!(requester.state(), CheckoutState::Ready { .. }));
    }

    #[tokio::test]
    async fn test_reset_discards_late_response() {
        let client = Arc::new(ScriptedClient::gated(vec![Ok(created())]));
        let requester = Arc::new(CheckoutRequester::new(client.clone()));

        let background = requester.clone();
        let first = tokio::spawn(async move { background.begin(snapshot()).await });
        requester.subscribe().wait_for(CheckoutState::is_requesting).await.unwrap();

        requester.reset();
        client.gate.as_ref().unwrap().notify_one();
        let _ = first.await.unwrap();

        assert_eq!(requester.state(), CheckoutState::Idle);
    }

    #[tokio::test]
    async fn test_confirm_paid_clears_cart() {
        let client = Arc::new(ScriptedClient::new(vec![Ok(created())]));
        let requester = CheckoutRequester::new(client);
        let cart = CartStore::in_memory();
        cart.add_item(NewLine::new("tee", "Rooted Tee", dec!(25)).size("M").quantity(2));

        assert!(matches!(requester.confirm_paid(&cart), Err(CheckoutError::NotReady)));

        requester.begin(cart.checkout_snapshot()).await.unwrap();
        let order = requester.confirm_paid(&cart).unwrap();

        assert_eq!(order.payment_intent_id, "pi_1");
        assert_eq!(order.total, dec!(50));
        assert!(cart.snapshot().is_empty());
        assert_eq!(requester.state(), CheckoutState::Idle);
    }
}
