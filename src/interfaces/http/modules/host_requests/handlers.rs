//! Host request API handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};

use super::dto::{
    HostRequestDto, HostRequestListResponse, HostRequestResponse, ListHostRequestsParams,
    RejectHostRequest, SubmitHostRequest,
};
use crate::interfaces::http::common::{ApiError, ApiResponse, ApiResult, ValidatedJson};
use crate::interfaces::http::middleware::AuthenticatedUser;
use crate::interfaces::http::state::AppState;

#[utoipa::path(
    post,
    path = "/api/v1/host-requests",
    tag = "Host Requests",
    security(("bearer_auth" = [])),
    request_body = SubmitHostRequest,
    responses(
        (status = 201, description = "Request submitted", body = HostRequestResponse),
        (status = 404, description = "Caller has no profile"),
        (status = 409, description = "Already a host or a request is pending")
    )
)]
pub async fn submit_host_request(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    ValidatedJson(body): ValidatedJson<SubmitHostRequest>,
) -> Result<(StatusCode, Json<ApiResponse<HostRequestResponse>>), ApiError> {
    let request = state.host_requests.submit(&user.user_id, body.message).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(HostRequestResponse {
            host_request: request.into(),
        })),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/host-requests",
    tag = "Host Requests",
    security(("bearer_auth" = [])),
    params(ListHostRequestsParams),
    responses(
        (status = 200, description = "All requests for admins, own requests otherwise", body = HostRequestListResponse),
        (status = 400, description = "Unknown status filter")
    )
)]
pub async fn list_host_requests(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Query(params): Query<ListHostRequestsParams>,
) -> ApiResult<HostRequestListResponse> {
    let requests = state
        .host_requests
        .list(&user.user_id, params.status()?)
        .await?;
    Ok(Json(ApiResponse::success(HostRequestListResponse {
        host_requests: requests.into_iter().map(HostRequestDto::from).collect(),
    })))
}

#[utoipa::path(
    post,
    path = "/api/v1/host-requests/{id}/approve",
    tag = "Host Requests",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Host request ID")),
    responses(
        (status = 200, description = "Approved; the applicant is now a host", body = HostRequestResponse),
        (status = 403, description = "Caller is not an admin"),
        (status = 404, description = "Request not found"),
        (status = 409, description = "Request was already decided")
    )
)]
pub async fn approve_host_request(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
) -> ApiResult<HostRequestResponse> {
    let request = state.host_requests.approve(&user.user_id, &id).await?;
    Ok(Json(ApiResponse::success(HostRequestResponse {
        host_request: request.into(),
    })))
}

#[utoipa::path(
    post,
    path = "/api/v1/host-requests/{id}/reject",
    tag = "Host Requests",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Host request ID")),
    request_body = RejectHostRequest,
    responses(
        (status = 200, description = "Rejected", body = HostRequestResponse),
        (status = 403, description = "Caller is not an admin"),
        (status = 404, description = "Request not found"),
        (status = 409, description = "Request was already decided")
    )
)]
pub async fn reject_host_request(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
    ValidatedJson(body): ValidatedJson<RejectHostRequest>,
) -> ApiResult<HostRequestResponse> {
    let request = state
        .host_requests
        .reject(&user.user_id, &id, body.reason)
        .await?;
    Ok(Json(ApiResponse::success(HostRequestResponse {
        host_request: request.into(),
    })))
}
