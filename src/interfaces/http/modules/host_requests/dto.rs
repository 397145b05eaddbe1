//! Host request DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::domain::{DomainError, HostRequest, HostRequestStatus};

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct SubmitHostRequest {
    #[validate(length(max = 2000))]
    pub message: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct RejectHostRequest {
    #[validate(length(max = 2000))]
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListHostRequestsParams {
    /// PENDING, APPROVED or REJECTED
    pub status: Option<String>,
}

impl ListHostRequestsParams {
    pub fn status(&self) -> Result<Option<HostRequestStatus>, DomainError> {
        match self.status.as_deref().map(|s| s.trim().to_ascii_uppercase()) {
            None => Ok(None),
            Some(s) if s.is_empty() => Ok(None),
            Some(s) => match s.as_str() {
                "PENDING" | "APPROVED" | "REJECTED" => Ok(Some(HostRequestStatus::from_str(&s))),
                _ => Err(DomainError::Validation(format!("unknown status '{}'", s))),
            },
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HostRequestDto {
    pub id: String,
    pub user_id: String,
    pub message: Option<String>,
    pub status: String,
    pub reviewed_by: Option<String>,
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<HostRequest> for HostRequestDto {
    fn from(r: HostRequest) -> Self {
        Self {
            id: r.id,
            user_id: r.user_id,
            message: r.message,
            status: r.status.to_string(),
            reviewed_by: r.reviewed_by,
            rejection_reason: r.rejection_reason,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HostRequestResponse {
    pub host_request: HostRequestDto,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HostRequestListResponse {
    pub host_requests: Vec<HostRequestDto>,
}
