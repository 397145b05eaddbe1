//! Response envelope and error mapping shared by every HTTP module

pub mod validated_json;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::{error, warn};

use crate::domain::DomainError;

pub use validated_json::ValidatedJson;

/// Every body carries `success`; the payload's fields sit next to it and
/// failures add `error`:
///
/// ```json
/// {"success": true, "reservationId": "…", "paymentId": "…", "alreadyConfirmed": false}
/// {"success": false, "error": "Listing L1 is already booked between …"}
/// ```
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(flatten)]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

impl ApiResponse<()> {
    /// `{"success": true}`
    pub fn ok() -> Self {
        Self {
            success: true,
            data: None,
            error: None,
        }
    }
}

/// Handler error. Wraps a [`DomainError`] and renders it with the
/// matching status code.
#[derive(Debug)]
pub struct ApiError(pub DomainError);

pub type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        Self(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            DomainError::Validation(_) => StatusCode::BAD_REQUEST,
            DomainError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            DomainError::Forbidden(_) => StatusCode::FORBIDDEN,
            DomainError::NotFound { .. } => StatusCode::NOT_FOUND,
            DomainError::Conflict(_) | DomainError::InvalidTransition { .. } => {
                StatusCode::CONFLICT
            }
            DomainError::PaymentNotCompleted(_) => StatusCode::PAYMENT_REQUIRED,
            DomainError::PaymentProvider { .. } => StatusCode::BAD_GATEWAY,
            DomainError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            DomainError::Busy(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self.0 {
            DomainError::Storage(detail) => {
                error!(error = %detail, "Storage failure while handling request");
                "Internal server error".to_string()
            }
            DomainError::Busy(detail) => {
                warn!(error = %detail, "Database stayed locked while handling request");
                "Service busy, please retry".to_string()
            }
            other => other.to_string(),
        };
        (status, Json(ApiResponse::<()>::error(message))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Serialize)]
    #[serde(rename_all = "camelCase")]
    struct Outcome {
        reservation_id: String,
        already_confirmed: bool,
    }

    #[test]
    fn payload_fields_are_flattened_next_to_success() {
        let body = ApiResponse::success(Outcome {
            reservation_id: "R1".into(),
            already_confirmed: true,
        });
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({"success": true, "reservationId": "R1", "alreadyConfirmed": true})
        );
    }

    #[test]
    fn bare_success_and_error_shapes() {
        assert_eq!(serde_json::to_value(ApiResponse::ok()).unwrap(), json!({"success": true}));
        assert_eq!(
            serde_json::to_value(ApiResponse::<()>::error("nope")).unwrap(),
            json!({"success": false, "error": "nope"})
        );
    }

    #[test]
    fn domain_errors_map_to_statuses() {
        let cases = [
            (DomainError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (DomainError::Unauthorized("x".into()), StatusCode::UNAUTHORIZED),
            (DomainError::Forbidden("x".into()), StatusCode::FORBIDDEN),
            (DomainError::not_found("Listing", "id", "L1"), StatusCode::NOT_FOUND),
            (DomainError::Conflict("x".into()), StatusCode::CONFLICT),
            (
                DomainError::InvalidTransition {
                    entity: "Payment",
                    from: "SUCCESS".into(),
                    to: "SUCCESS".into(),
                },
                StatusCode::CONFLICT,
            ),
            (DomainError::PaymentNotCompleted("x".into()), StatusCode::PAYMENT_REQUIRED),
            (
                DomainError::PaymentProvider {
                    message: "x".into(),
                    transient: true,
                },
                StatusCode::BAD_GATEWAY,
            ),
            (DomainError::Storage("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (DomainError::Busy("x".into()), StatusCode::SERVICE_UNAVAILABLE),
        ];
        for (err, expected) in cases {
            assert_eq!(ApiError(err).status(), expected);
        }
    }

    #[test]
    fn storage_details_are_not_exposed() {
        let response = ApiError(DomainError::Storage("database is locked".into())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
