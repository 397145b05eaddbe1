//! Bearer authentication layer.
//!
//! Establishes who is calling and stores an [`AuthenticatedUser`] in the
//! request extensions. Authorisation is left to the services, which read
//! the stored user role.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use jsonwebtoken::errors::ErrorKind;
use thiserror::Error;

use crate::domain::UserRole;
use crate::infrastructure::crypto::{verify_token, JwtConfig, TokenClaims};
use crate::interfaces::http::common::ApiResponse;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("Missing authentication token")]
    MissingToken,
    #[error("Invalid authentication token")]
    InvalidToken,
    #[error("Token has expired")]
    ExpiredToken,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let body = ApiResponse::<()>::error(self.to_string());
        (StatusCode::UNAUTHORIZED, Json(body)).into_response()
    }
}

#[derive(Clone)]
pub struct AuthState {
    pub jwt_config: JwtConfig,
}

#[derive(Clone, Debug)]
pub struct AuthenticatedUser {
    pub user_id: String,
    pub email: String,
    /// Claimed role, consulted only when the profile is first created.
    pub role: UserRole,
}

impl From<TokenClaims> for AuthenticatedUser {
    fn from(claims: TokenClaims) -> Self {
        Self {
            role: claims.role(),
            user_id: claims.sub,
            email: claims.email,
        }
    }
}

fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingToken)?
        .to_str()
        .map_err(|_| AuthError::InvalidToken)?;

    match value.split_once(' ') {
        Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") && !token.trim().is_empty() => {
            Ok(token.trim())
        }
        _ => Err(AuthError::InvalidToken),
    }
}

fn authenticate(headers: &HeaderMap, config: &JwtConfig) -> Result<AuthenticatedUser, AuthError> {
    let token = bearer_token(headers)?;
    verify_token(token, config)
        .map(AuthenticatedUser::from)
        .map_err(|err| match err.kind() {
            ErrorKind::ExpiredSignature => AuthError::ExpiredToken,
            _ => {
                tracing::debug!(error = %err, "bearer token refused");
                AuthError::InvalidToken
            }
        })
}

pub async fn auth_middleware(
    State(auth): State<AuthState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let user = authenticate(request.headers(), &auth.jwt_config)?;
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}
