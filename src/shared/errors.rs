use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Not found: {entity} with {field}={value}")]
    NotFound {
        entity: &'static str,
        field: &'static str,
        value: String,
    },

    #[error("Validation: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// A state machine was asked to leave a state it cannot leave.
    #[error("Invalid transition for {entity}: {from} -> {to}")]
    InvalidTransition {
        entity: &'static str,
        from: String,
        to: String,
    },

    /// The payment provider reports the checkout as not (yet) paid.
    #[error("Payment not completed: {0}")]
    PaymentNotCompleted(String),

    /// The payment provider could not be reached or answered with an error.
    #[error("Payment provider error: {message}")]
    PaymentProvider { message: String, transient: bool },

    #[error("Storage error: {0}")]
    Storage(String),

    /// The database stayed locked by other writers past the retry budget.
    #[error("Storage busy: {0}")]
    Busy(String),
}

impl DomainError {
    pub fn not_found(entity: &'static str, field: &'static str, value: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            field,
            value: value.into(),
        }
    }

    /// Whether this error is likely transient (e.g. provider timeout)
    /// and the operation may succeed if retried.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            DomainError::PaymentProvider {
                transient: true,
                ..
            }
        )
    }

    /// Lost a write-lock race; re-running the whole unit of work may succeed.
    pub fn is_busy(&self) -> bool {
        matches!(self, DomainError::Busy(_))
    }
}
