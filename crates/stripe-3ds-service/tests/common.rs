//! Common test utilities for relay integration tests.

#![allow(dead_code)] // Some utilities are used by different test files

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::http::{HeaderName, HeaderValue};
use axum::Router;
use axum_test::TestServer;

use stripe_3ds_core::{CreateIntentParams, IntentStatus, PaymentIntent, RelayError};
use stripe_3ds_service::webhook::sign_payload;
use stripe_3ds_service::{
    create_router, AppState, HandlerError, IntentAccessor, PaymentEventHandler, ServiceConfig,
};

/// Webhook secret configured on the test server.
pub const WEBHOOK_SECRET: &str = "whsec_integration_test";

/// Build a payment intent the way Stripe would return it.
pub fn intent(id: &str, status: &str) -> PaymentIntent {
    serde_json::from_value(serde_json::json!({
        "id": id,
        "object": "payment_intent",
        "amount": 500,
        "currency": "usd",
        "status": status,
        "client_secret": format!("{id}_secret_x"),
        "created": 1_700_000_000,
        "metadata": {}
    }))
    .expect("valid payment intent fixture")
}

/// In-memory stand-in for Stripe that counts every call.
#[derive(Default)]
pub struct StubAccessor {
    intents: Mutex<HashMap<String, PaymentIntent>>,
    next_created: Mutex<Option<PaymentIntent>>,
    confirm_to: Mutex<Option<IntentStatus>>,
    next_error: Mutex<Option<RelayError>>,
    last_params: Mutex<Option<CreateIntentParams>>,
    pub create_calls: AtomicUsize,
    pub retrieve_calls: AtomicUsize,
    pub confirm_calls: AtomicUsize,
}

impl StubAccessor {
    /// Seed an intent the stub "knows".
    pub fn with_intent(self, pi: PaymentIntent) -> Self {
        self.intents.lock().unwrap().insert(pi.id.clone(), pi);
        self
    }

    /// What the next `create` returns.
    pub fn creating(self, pi: PaymentIntent) -> Self {
        *self.next_created.lock().unwrap() = Some(pi);
        self
    }

    /// Status an unconfirmed intent moves to when confirmed.
    pub fn confirming_to(self, status: IntentStatus) -> Self {
        *self.confirm_to.lock().unwrap() = Some(status);
        self
    }

    /// Fail the next call with `err`.
    pub fn failing_with(self, err: RelayError) -> Self {
        *self.next_error.lock().unwrap() = Some(err);
        self
    }

    /// Parameters of the last `create` call.
    pub fn last_params(&self) -> Option<CreateIntentParams> {
        self.last_params.lock().unwrap().clone()
    }

    pub fn total_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
            + self.retrieve_calls.load(Ordering::SeqCst)
            + self.confirm_calls.load(Ordering::SeqCst)
    }

    fn take_error(&self) -> Result<(), RelayError> {
        match self.next_error.lock().unwrap().take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn lookup(&self, id: &str) -> Result<PaymentIntent, RelayError> {
        self.intents
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| RelayError::NotFound { id: id.to_string() })
    }
}

#[async_trait]
impl IntentAccessor for StubAccessor {
    async fn create(&self, params: &CreateIntentParams) -> Result<PaymentIntent, RelayError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_params.lock().unwrap() = Some(params.clone());
        self.take_error()?;

        let pi = self
            .next_created
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| intent("pi_test_1", "requires_payment_method"));
        self.intents
            .lock()
            .unwrap()
            .insert(pi.id.clone(), pi.clone());
        Ok(pi)
    }

    async fn retrieve(&self, id: &str) -> Result<PaymentIntent, RelayError> {
        self.retrieve_calls.fetch_add(1, Ordering::SeqCst);
        self.take_error()?;
        self.lookup(id)
    }

    async fn confirm(&self, id: &str) -> Result<PaymentIntent, RelayError> {
        self.confirm_calls.fetch_add(1, Ordering::SeqCst);
        self.take_error()?;

        let mut pi = self.lookup(id)?;
        if !pi.status.is_confirmed() {
            if let Some(status) = self.confirm_to.lock().unwrap().clone() {
                pi.status = status;
                self.intents
                    .lock()
                    .unwrap()
                    .insert(pi.id.clone(), pi.clone());
            }
        }
        Ok(pi)
    }
}

/// Event handler that records which hook ran for which intent.
#[derive(Default)]
pub struct RecordingHandler {
    pub calls: Mutex<Vec<(String, String)>>,
    pub fail: bool,
}

impl RecordingHandler {
    fn record(&self, hook: &str, intent: &PaymentIntent) -> Result<(), HandlerError> {
        self.calls
            .lock()
            .unwrap()
            .push((hook.to_string(), intent.id.clone()));
        if self.fail {
            Err("order database unavailable".into())
        } else {
            Ok(())
        }
    }

    pub fn hooks(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PaymentEventHandler for RecordingHandler {
    async fn on_succeeded(&self, intent: &PaymentIntent) -> Result<(), HandlerError> {
        self.record("succeeded", intent)
    }

    async fn on_failed(&self, intent: &PaymentIntent) -> Result<(), HandlerError> {
        self.record("failed", intent)
    }

    async fn on_requires_action(&self, intent: &PaymentIntent) -> Result<(), HandlerError> {
        self.record("requires_action", intent)
    }
}

/// Test harness containing everything needed for integration tests.
pub struct TestHarness {
    /// The test server for making HTTP requests.
    pub server: TestServer,
    /// The stub behind the relay.
    pub accessor: Arc<StubAccessor>,
    /// The handler behind the dispatcher.
    pub handler: Arc<RecordingHandler>,
}

impl TestHarness {
    /// Harness with an empty stub.
    pub fn new() -> Self {
        Self::with(StubAccessor::default(), RecordingHandler::default())
    }

    /// Harness with a prepared stub.
    pub fn with_accessor(accessor: StubAccessor) -> Self {
        Self::with(accessor, RecordingHandler::default())
    }

    /// Harness with a prepared stub and handler.
    pub fn with(accessor: StubAccessor, handler: RecordingHandler) -> Self {
        let config = ServiceConfig {
            listen_addr: "127.0.0.1:0".into(),
            stripe_secret_key: Some("sk_test_harness".into()),
            stripe_publishable_key: Some("pk_test_harness".into()),
            stripe_webhook_secret: Some(WEBHOOK_SECRET.into()),
            ..ServiceConfig::default()
        };

        let accessor = Arc::new(accessor);
        let handler = Arc::new(handler);
        let state = AppState::with_components(config, accessor.clone(), handler.clone());
        let router: Router = create_router(state);

        let server = TestServer::new(router).expect("Failed to create test server");

        Self {
            server,
            accessor,
            handler,
        }
    }

    /// Signature header for `payload`, signed now with the configured secret.
    pub fn sign(payload: &[u8]) -> (HeaderName, HeaderValue) {
        Self::sign_with(WEBHOOK_SECRET, payload)
    }

    /// Signature header for `payload` signed with an arbitrary secret.
    pub fn sign_with(secret: &str, payload: &[u8]) -> (HeaderName, HeaderValue) {
        let header = sign_payload(secret, chrono::Utc::now().timestamp(), payload);
        (
            HeaderName::from_static("stripe-signature"),
            HeaderValue::from_str(&header).expect("valid header value"),
        )
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// A webhook event envelope around a payment intent.
pub fn event_payload(kind: &str, pi: &PaymentIntent) -> Vec<u8> {
    serde_json::to_vec(&serde_json::json!({
        "id": "evt_test_1",
        "object": "event",
        "type": kind,
        "created": 1_700_000_000,
        "data": { "object": pi }
    }))
    .expect("serializable event")
}
