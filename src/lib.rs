//! # StayHub booking service
//!
//! Reservation and payment core of a property-rental marketplace: keeps
//! listings from being double-booked, reconciles Stripe checkouts with
//! local reservations idempotently and runs the cash approval workflow.
//!
//! ## Architecture
//!
//! The project follows Clean Architecture principles:
//!
//! - **domain**: entities, invariants and repository contracts
//! - **application**: booking use cases, ports, events, notifications
//! - **infrastructure**: SeaORM persistence, Stripe, SMTP, JWT
//! - **interfaces**: REST API with Swagger documentation and WebSocket events
//! - **shared**: errors, money conversion, retry, shutdown

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;
pub mod server;
pub mod shared;

pub use config::{default_config_path, AppConfig, ConfigError};

pub use infrastructure::{init_database, run_migrations, DatabaseConfig, SeaOrmRepositoryProvider};

pub use interfaces::http::{create_api_router, AppState};

pub use application::events::{create_event_bus, Event, EventBus, SharedEventBus};
