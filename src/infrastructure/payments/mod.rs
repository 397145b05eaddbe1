//! Payment provider adapters

pub mod stripe;
pub mod webhook;

pub use stripe::{StripeConfig, StripeGateway};
pub use webhook::{StripeEvent, WebhookError, WebhookVerifier};
