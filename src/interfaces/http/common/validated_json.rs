//! JSON body extractor that also runs `validator` rules.
//!
//! Unparseable bodies and rule violations both become a 400 carrying the
//! `{success: false, error}` envelope.

use axum::extract::{FromRequest, Request};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors};

use super::ApiResponse;

/// Request body of type `T` that has passed its `Validate` rules.
pub struct ValidatedJson<T>(pub T);

fn bad_request(message: String) -> Response {
    (StatusCode::BAD_REQUEST, Json(ApiResponse::<()>::error(message))).into_response()
}

/// Flattens field errors into `field: message` pairs, sorted for stable output.
fn describe(errors: &ValidationErrors) -> String {
    let mut parts: Vec<String> = Vec::new();
    for (field, failures) in errors.field_errors() {
        for failure in failures {
            let detail = match &failure.message {
                Some(message) => message.to_string(),
                None => failure.code.to_string(),
            };
            parts.push(format!("{field}: {detail}"));
        }
    }
    parts.sort();

    if parts.is_empty() {
        String::from("Validation failed")
    } else {
        parts.join("; ")
    }
}

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let body = match Json::<T>::from_request(req, state).await {
            Ok(Json(body)) => body,
            Err(rejection) => return Err(bad_request(format!("Invalid JSON: {rejection}"))),
        };

        if let Err(errors) = body.validate() {
            return Err(bad_request(describe(&errors)));
        }
        Ok(Self(body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::routing::post;
    use axum::Router;
    use serde::Deserialize;
    use tower::ServiceExt;

    #[derive(Debug, Deserialize, Validate)]
    struct StayBody {
        #[validate(length(min = 1, max = 10))]
        listing_id: String,
        #[validate(range(min = 1, max = 30))]
        nights: u32,
    }

    async fn accept(ValidatedJson(body): ValidatedJson<StayBody>) -> String {
        format!("{} x{}", body.listing_id, body.nights)
    }

    async fn post_raw(payload: impl Into<Body>) -> (StatusCode, serde_json::Value) {
        let request = axum::http::Request::post("/stay")
            .header("content-type", "application/json")
            .body(payload.into())
            .unwrap();
        let response = Router::new()
            .route("/stay", post(accept))
            .oneshot(request)
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn passes_through_a_valid_body() {
        let (status, _) = post_raw(r#"{"listing_id":"L1","nights":3}"#).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn garbage_is_a_bad_request() {
        let (status, body) = post_raw("not json").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().starts_with("Invalid JSON"));
    }

    #[tokio::test]
    async fn rule_violations_name_every_field() {
        let (status, body) = post_raw(r#"{"listing_id":"","nights":0}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        let error = body["error"].as_str().unwrap();
        assert!(error.contains("listing_id"));
        assert!(error.contains("nights"));
    }
}
