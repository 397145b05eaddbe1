pub mod errors;
pub mod money;
pub mod retry;
pub mod shutdown;

pub use errors::DomainError;
pub use retry::{retry_with_backoff, RetryPolicy};
pub use shutdown::{ShutdownCoordinator, ShutdownSignal};
