//! API router with Swagger UI

use std::time::Duration;

use axum::{
    extract::FromRef,
    http::HeaderValue,
    middleware,
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::config::ServerConfig;
use crate::interfaces::http::middleware::{auth_middleware, AuthState};
use crate::interfaces::http::modules::metrics::{
    http_metrics_middleware, prometheus_metrics, MetricsState,
};
use crate::interfaces::http::modules::{
    health, host_requests, listings, reservations, users, webhooks,
};
use crate::interfaces::http::state::AppState;
use crate::interfaces::ws::ws_notifications_handler;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Token issued by the identity provider"))
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        // Reservations
        reservations::start_checkout,
        reservations::confirm_payment,
        reservations::create_cash_reservation,
        reservations::accept_cash,
        reservations::reject_cash,
        reservations::cancel_reservation,
        reservations::get_reservation,
        reservations::list_trips,
        // Listings
        listings::create_listing,
        listings::get_listing,
        listings::check_availability,
        listings::list_listing_reservations,
        // Host requests
        host_requests::submit_host_request,
        host_requests::list_host_requests,
        host_requests::approve_host_request,
        host_requests::reject_host_request,
        // Users
        users::ensure_profile,
        users::get_profile,
        // Webhooks
        webhooks::stripe_webhook,
    ),
    components(
        schemas(
            health::HealthResponse,
            health::ComponentHealth,
            reservations::CheckoutRequest,
            reservations::CheckoutResponse,
            reservations::ConfirmPaymentRequest,
            reservations::CashReservationBody,
            reservations::ReconcileResponse,
            reservations::AcceptCashRequest,
            reservations::AcceptCashResponse,
            reservations::RejectCashRequest,
            reservations::PaymentDto,
            reservations::ReservationDto,
            reservations::ReservationResponse,
            reservations::ReservationListResponse,
            listings::CreateListingRequest,
            listings::ListingDto,
            listings::ListingResponse,
            listings::AvailabilityResponse,
            host_requests::SubmitHostRequest,
            host_requests::RejectHostRequest,
            host_requests::HostRequestDto,
            host_requests::HostRequestResponse,
            host_requests::HostRequestListResponse,
            users::EnsureProfileRequest,
            users::UserDto,
            users::UserResponse,
            webhooks::WebhookAck,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Liveness and database reachability"),
        (name = "Reservations", description = "Checkout, confirmation, cash approval, cancellation and trips"),
        (name = "Listings", description = "Listing publication and availability"),
        (name = "Host Requests", description = "Applications to become a host and their review"),
        (name = "Users", description = "The caller's local profile"),
        (name = "Webhooks", description = "Signed payment provider events"),
    ),
    info(
        title = "StayHub Booking API",
        version = "1.0.0",
        description = "Reservations, payments and cash approval for the StayHub rental marketplace"
    )
)]
pub struct ApiDoc;

/// Build the full HTTP surface. `metrics` is `None` when no Prometheus
/// recorder is installed (e.g. in tests).
pub fn create_api_router(
    state: AppState,
    server: &ServerConfig,
    metrics: Option<PrometheusHandle>,
) -> Router {
    let auth_state = AuthState::from_ref(&state);

    let protected = Router::new()
        .route("/api/v1/reservations", get(reservations::list_trips))
        .route("/api/v1/reservations/checkout", post(reservations::start_checkout))
        .route("/api/v1/reservations/confirm", post(reservations::confirm_payment))
        .route("/api/v1/reservations/cash", post(reservations::create_cash_reservation))
        .route("/api/v1/reservations/accept-cash", post(reservations::accept_cash))
        .route("/api/v1/reservations/reject-cash", post(reservations::reject_cash))
        .route(
            "/api/v1/reservations/{id}",
            get(reservations::get_reservation).delete(reservations::cancel_reservation),
        )
        .route("/api/v1/listings", post(listings::create_listing))
        .route(
            "/api/v1/listings/{id}/reservations",
            get(listings::list_listing_reservations),
        )
        .route(
            "/api/v1/host-requests",
            get(host_requests::list_host_requests).post(host_requests::submit_host_request),
        )
        .route(
            "/api/v1/host-requests/{id}/approve",
            post(host_requests::approve_host_request),
        )
        .route(
            "/api/v1/host-requests/{id}/reject",
            post(host_requests::reject_host_request),
        )
        .route(
            "/api/v1/users/me",
            get(users::get_profile).post(users::ensure_profile),
        )
        .route_layer(middleware::from_fn_with_state(auth_state, auth_middleware));

    let public = Router::new()
        .route("/health", get(health::health_check))
        .route("/api/v1/listings/{id}", get(listings::get_listing))
        .route(
            "/api/v1/listings/{id}/availability",
            get(listings::check_availability),
        )
        .route("/api/v1/webhooks/stripe", post(webhooks::stripe_webhook))
        .route("/api/v1/notifications/ws", get(ws_notifications_handler));

    let mut router = Router::new()
        .merge(public)
        .merge(protected)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()));

    if let Some(handle) = metrics {
        router = router.merge(
            Router::new()
                .route("/metrics", get(prometheus_metrics))
                .with_state(MetricsState { handle }),
        );
    }

    router
        .layer(middleware::from_fn(http_metrics_middleware))
        .layer(TimeoutLayer::new(Duration::from_secs(server.request_timeout_secs)))
        .layer(cors_layer(&server.cors_origins))
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(allowed))
}
