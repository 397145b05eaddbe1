//! Shared fixtures for the integration tests: a migrated in-memory
//! database, a scripted payment gateway and a notifier that records what
//! it was asked to send.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tokio::sync::mpsc;
use tower::ServiceExt;

use stayhub::application::ports::{
    metadata_keys, CheckoutRequest, CheckoutSession, CreatedCheckout, GatewayError, Notification,
    NotificationError, Notifier, PaymentGateway,
};
use stayhub::domain::{Listing, NewListing, User, UserRole};
use stayhub::infrastructure::crypto::{create_token, JwtConfig};
use stayhub::{
    create_api_router, create_event_bus, init_database, run_migrations, AppConfig, AppState,
    DatabaseConfig,
};

pub const WEBHOOK_SECRET: &str = "whsec_test";

// ── Payment gateway ─────────────────────────────────────────────

#[derive(Default)]
struct GatewayScript {
    sessions: HashMap<String, CheckoutSession>,
    failures: VecDeque<GatewayError>,
    checkouts: Vec<CheckoutRequest>,
}

/// Serves sessions registered with [`FakeGateway::paid_session`] and fails
/// the next calls with whatever was queued via [`FakeGateway::fail_next`].
#[derive(Default)]
pub struct FakeGateway {
    script: Mutex<GatewayScript>,
    retrievals: AtomicUsize,
}

impl FakeGateway {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn add_session(&self, session: CheckoutSession) {
        let mut script = self.script.lock().unwrap();
        script.sessions.insert(session.id.clone(), session);
    }

    /// Register a paid session for the given stay, total in minor units.
    pub fn paid_session(
        &self,
        session_id: &str,
        listing_id: &str,
        user_id: &str,
        start: &str,
        end: &str,
        total: i64,
    ) {
        self.add_session(session(session_id, "paid", listing_id, user_id, start, end, total));
    }

    pub fn fail_next(&self, error: GatewayError) {
        self.script.lock().unwrap().failures.push_back(error);
    }

    pub fn retrievals(&self) -> usize {
        self.retrievals.load(Ordering::SeqCst)
    }

    pub fn checkouts(&self) -> Vec<CheckoutRequest> {
        self.script.lock().unwrap().checkouts.clone()
    }
}

pub fn session(
    session_id: &str,
    payment_status: &str,
    listing_id: &str,
    user_id: &str,
    start: &str,
    end: &str,
    total: i64,
) -> CheckoutSession {
    let metadata = [
        (metadata_keys::LISTING_ID, listing_id.to_string()),
        (metadata_keys::USER_ID, user_id.to_string()),
        (metadata_keys::START_DATE, start.to_string()),
        (metadata_keys::END_DATE, end.to_string()),
        (metadata_keys::TOTAL_PRICE, total.to_string()),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect();

    CheckoutSession {
        id: session_id.to_string(),
        payment_status: payment_status.to_string(),
        metadata,
        amount_total: Some(total),
        currency: Some("usd".into()),
        transaction_id: Some(format!("pi_{}", session_id)),
        payment_method: Some("card".into()),
    }
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn retrieve_session(&self, session_id: &str) -> Result<CheckoutSession, GatewayError> {
        self.retrievals.fetch_add(1, Ordering::SeqCst);
        let mut script = self.script.lock().unwrap();
        if let Some(error) = script.failures.pop_front() {
            return Err(error);
        }
        script
            .sessions
            .get(session_id)
            .cloned()
            .ok_or_else(|| GatewayError::SessionNotFound(session_id.to_string()))
    }

    async fn create_checkout_session(
        &self,
        request: &CheckoutRequest,
    ) -> Result<CreatedCheckout, GatewayError> {
        let mut script = self.script.lock().unwrap();
        if let Some(error) = script.failures.pop_front() {
            return Err(error);
        }
        script.checkouts.push(request.clone());
        let session_id = format!("cs_test_{}", script.checkouts.len());
        Ok(CreatedCheckout {
            url: Some(format!("https://checkout.test/{}", session_id)),
            session_id,
        })
    }
}

// ── Notifier ────────────────────────────────────────────────────

/// Forwards every notification it is asked to deliver.
pub struct RecordingNotifier {
    tx: mpsc::UnboundedSender<Notification>,
}

impl RecordingNotifier {
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Arc::new(Self { tx }), rx)
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), NotificationError> {
        let _ = self.tx.send(notification.clone());
        Ok(())
    }
}

/// Fails every delivery.
pub struct BrokenNotifier;

#[async_trait]
impl Notifier for BrokenNotifier {
    async fn send(&self, _notification: &Notification) -> Result<(), NotificationError> {
        Err(NotificationError::Transport("connection refused".into()))
    }
}

/// Collect notification kinds until `count` have arrived (or a second passes).
pub async fn received_kinds(
    rx: &mut mpsc::UnboundedReceiver<Notification>,
    count: usize,
) -> Vec<&'static str> {
    let mut kinds = Vec::new();
    while kinds.len() < count {
        match tokio::time::timeout(Duration::from_secs(1), rx.recv()).await {
            Ok(Some(n)) => kinds.push(n.kind()),
            _ => break,
        }
    }
    kinds.sort_unstable();
    kinds
}

// ── Application ─────────────────────────────────────────────────

pub struct TestApp {
    pub state: AppState,
    pub gateway: Arc<FakeGateway>,
    pub notifications: mpsc::UnboundedReceiver<Notification>,
    pub config: AppConfig,
    /// Keeps a file-backed database alive for the lifetime of the app.
    _db_dir: Option<tempfile::TempDir>,
}

pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.security.jwt_secret = "integration-secret".into();
    config.security.jwt_issuer = "stayhub-test".into();
    config.payments.webhook_secret = WEBHOOK_SECRET.into();
    config.payments.retry_attempts = 3;
    config.notifications.delivery_timeout_secs = 2;
    config
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_config(test_config()).await
    }

    pub async fn with_config(config: AppConfig) -> Self {
        let (notifier, notifications) = RecordingNotifier::new();
        Self::build(config, DatabaseConfig::in_memory(), notifier, notifications, None).await
    }

    pub async fn with_notifier(notifier: Arc<dyn Notifier>) -> Self {
        let (_, notifications) = RecordingNotifier::new();
        Self::build(test_config(), DatabaseConfig::in_memory(), notifier, notifications, None).await
    }

    /// SQLite file in a temp dir behind a pool of several connections, so
    /// concurrent writers really contend for the database lock.
    pub async fn file_backed() -> Self {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("stayhub.db");
        let mut database = DatabaseConfig::sqlite(&path.display().to_string());
        database.max_connections = 8;
        let (notifier, notifications) = RecordingNotifier::new();
        Self::build(test_config(), database, notifier, notifications, Some(dir)).await
    }

    async fn build(
        config: AppConfig,
        database: DatabaseConfig,
        notifier: Arc<dyn Notifier>,
        notifications: mpsc::UnboundedReceiver<Notification>,
        db_dir: Option<tempfile::TempDir>,
    ) -> Self {
        let db = init_database(&database).await.expect("database");
        run_migrations(&db).await.expect("migrations");
        let gateway = FakeGateway::new();
        let state = AppState::new(db, gateway.clone(), notifier, create_event_bus(), &config);
        Self {
            state,
            gateway,
            notifications,
            config,
            _db_dir: db_dir,
        }
    }

    pub fn router(&self) -> Router {
        create_api_router(self.state.clone(), &self.config.server, None)
    }

    pub fn jwt(&self) -> &JwtConfig {
        &self.state.jwt_config
    }

    pub fn token_for(&self, user: &User) -> String {
        create_token(&user.id, &user.email, user.role, self.jwt()).expect("token")
    }

    pub async fn user(&self, id: &str, role: UserRole) -> User {
        let mut user = User::new(capitalize(id), format!("{}@example.com", id), role);
        user.id = id.to_string();
        self.state.repos.users().save(user.clone()).await.expect("save user");
        user
    }

    /// A listing at 100.00 per night.
    pub async fn listing(&self, owner: &User) -> Listing {
        let listing = Listing::new(
            &owner.id,
            NewListing {
                title: "Lake cabin".into(),
                description: "Wood stove, private jetty".into(),
                location: "Annecy".into(),
                category: "cabin".into(),
                price_per_night: 10_000,
                guest_count: 4,
                room_count: 2,
                bathroom_count: 1,
            },
        );
        self.state
            .repos
            .listings()
            .save(listing.clone())
            .await
            .expect("save listing");
        listing
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = self.router().oneshot(request).await.unwrap();
        read_json(response).await
    }
}

pub async fn read_json(response: axum::response::Response) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
