//! Shared handler state
//!
//! Built once at startup around the database connection and the two
//! outbound adapters (payment provider, notifier). Tests build it the same
//! way with fakes.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::FromRef;
use sea_orm::DatabaseConnection;

use crate::application::booking::{
    AvailabilityChecker, CancellationService, CashApproval, CheckoutService, Reconciler,
    ReservationQueries,
};
use crate::application::events::SharedEventBus;
use crate::application::ports::{Notifier, PaymentGateway};
use crate::application::{HostRequestService, ListingService, NotificationDispatcher, UserService};
use crate::config::AppConfig;
use crate::domain::RepositoryProvider;
use crate::infrastructure::crypto::JwtConfig;
use crate::infrastructure::payments::WebhookVerifier;
use crate::infrastructure::SeaOrmRepositoryProvider;
use crate::interfaces::http::middleware::AuthState;
use crate::interfaces::ws::NotificationState;
use crate::shared::RetryPolicy;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub repos: Arc<dyn RepositoryProvider>,
    pub reconciler: Arc<Reconciler>,
    pub cash_approval: Arc<CashApproval>,
    pub cancellation: Arc<CancellationService>,
    pub checkout: Arc<CheckoutService>,
    pub queries: Arc<ReservationQueries>,
    pub availability: Arc<AvailabilityChecker>,
    pub listings: Arc<ListingService>,
    pub host_requests: Arc<HostRequestService>,
    pub users: Arc<UserService>,
    pub webhook: Arc<WebhookVerifier>,
    pub event_bus: SharedEventBus,
    pub jwt_config: JwtConfig,
    pub currency: String,
    pub started_at: Arc<Instant>,
}

impl AppState {
    pub fn new(
        db: DatabaseConnection,
        gateway: Arc<dyn PaymentGateway>,
        notifier: Arc<dyn Notifier>,
        event_bus: SharedEventBus,
        config: &AppConfig,
    ) -> Self {
        let repos: Arc<dyn RepositoryProvider> = Arc::new(SeaOrmRepositoryProvider::new(db.clone()));
        let dispatcher = NotificationDispatcher::new(
            notifier,
            Duration::from_secs(config.notifications.delivery_timeout_secs),
        );
        let currency = config.payments.currency.to_lowercase();
        let retry = RetryPolicy::with_attempts(config.payments.retry_attempts);

        Self {
            reconciler: Arc::new(Reconciler::new(
                repos.clone(),
                gateway.clone(),
                dispatcher.clone(),
                event_bus.clone(),
                retry,
                currency.clone(),
            )),
            cash_approval: Arc::new(CashApproval::new(
                repos.clone(),
                dispatcher.clone(),
                event_bus.clone(),
            )),
            cancellation: Arc::new(CancellationService::new(
                repos.clone(),
                dispatcher.clone(),
                event_bus.clone(),
            )),
            checkout: Arc::new(CheckoutService::new(repos.clone(), gateway, currency.clone())),
            queries: Arc::new(ReservationQueries::new(repos.clone())),
            availability: Arc::new(AvailabilityChecker::new(repos.clone())),
            listings: Arc::new(ListingService::new(repos.clone())),
            host_requests: Arc::new(HostRequestService::new(
                repos.clone(),
                dispatcher,
                event_bus.clone(),
            )),
            users: Arc::new(UserService::new(repos.clone())),
            webhook: Arc::new(WebhookVerifier::new(
                config.payments.webhook_secret.clone(),
                config.payments.webhook_tolerance_secs,
            )),
            jwt_config: JwtConfig::new(
                config.security.jwt_secret.clone(),
                config.security.jwt_issuer.clone(),
            ),
            db,
            repos,
            event_bus,
            currency,
            started_at: Arc::new(Instant::now()),
        }
    }
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        AuthState {
            jwt_config: state.jwt_config.clone(),
        }
    }
}

impl FromRef<AppState> for NotificationState {
    fn from_ref(state: &AppState) -> Self {
        NotificationState {
            event_bus: state.event_bus.clone(),
            jwt_config: state.jwt_config.clone(),
        }
    }
}
