//! Host request domain entity

use chrono::{DateTime, Utc};

use crate::shared::errors::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostRequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl HostRequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "APPROVED" => Self::Approved,
            "REJECTED" => Self::Rejected,
            _ => Self::Pending,
        }
    }
}

impl std::fmt::Display for HostRequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct HostRequest {
    pub id: String,
    pub user_id: String,
    pub message: Option<String>,
    pub status: HostRequestStatus,
    pub reviewed_by: Option<String>,
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl HostRequest {
    pub fn new(user_id: impl Into<String>, message: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            message,
            status: HostRequestStatus::Pending,
            reviewed_by: None,
            rejection_reason: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn approve(&mut self, reviewer_id: &str) -> Result<(), DomainError> {
        self.decide(HostRequestStatus::Approved, reviewer_id)
    }

    pub fn reject(&mut self, reviewer_id: &str, reason: String) -> Result<(), DomainError> {
        self.decide(HostRequestStatus::Rejected, reviewer_id)?;
        self.rejection_reason = Some(reason);
        Ok(())
    }

    fn decide(&mut self, to: HostRequestStatus, reviewer_id: &str) -> Result<(), DomainError> {
        if self.status != HostRequestStatus::Pending {
            return Err(DomainError::InvalidTransition {
                entity: "HostRequest",
                from: self.status.to_string(),
                to: to.to_string(),
            });
        }
        self.status = to;
        self.reviewed_by = Some(reviewer_id.to_string());
        self.updated_at = Utc::now();
        Ok(())
    }
}
