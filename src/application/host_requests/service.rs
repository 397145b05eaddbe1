//! Host request workflow
//!
//! Guests ask to become hosts; administrators approve or reject. Like the
//! cash decision, only a `PENDING` request can be decided, and the stored
//! status is compared-and-set so two reviewers cannot both decide.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use crate::application::events::{Event, HostRequestReviewedEvent, SharedEventBus};
use crate::application::notifications::NotificationDispatcher;
use crate::application::ports::{HostRequestNotice, Notification};
use crate::domain::{
    DomainError, DomainResult, HostRequest, HostRequestStatus, RepositoryProvider, User,
};

const DEFAULT_REJECTION_REASON: &str = "No reason provided";

pub struct HostRequestService {
    repos: Arc<dyn RepositoryProvider>,
    dispatcher: NotificationDispatcher,
    events: SharedEventBus,
}

impl HostRequestService {
    pub fn new(
        repos: Arc<dyn RepositoryProvider>,
        dispatcher: NotificationDispatcher,
        events: SharedEventBus,
    ) -> Self {
        Self {
            repos,
            dispatcher,
            events,
        }
    }

    pub async fn submit(&self, caller_id: &str, message: Option<String>) -> DomainResult<HostRequest> {
        let user = self.user(caller_id).await?;
        if user.can_list_properties() {
            return Err(DomainError::Conflict(format!(
                "User {} can already publish listings",
                caller_id
            )));
        }
        if self
            .repos
            .host_requests()
            .find_pending_for_user(caller_id)
            .await?
            .is_some()
        {
            return Err(DomainError::Conflict(
                "A host request is already waiting for review".into(),
            ));
        }

        let message = message.map(|m| m.trim().to_string()).filter(|m| !m.is_empty());
        let request = HostRequest::new(caller_id, message);
        self.repos.host_requests().save(request.clone()).await?;

        info!(request_id = %request.id, user_id = caller_id, "Host request submitted");
        Ok(request)
    }

    pub async fn approve(&self, caller_id: &str, request_id: &str) -> DomainResult<HostRequest> {
        self.require_admin(caller_id).await?;
        let mut request = self.find(request_id).await?;
        request.approve(caller_id)?;
        self.record(request).await
    }

    pub async fn reject(
        &self,
        caller_id: &str,
        request_id: &str,
        reason: Option<String>,
    ) -> DomainResult<HostRequest> {
        self.require_admin(caller_id).await?;
        let reason = reason
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| DEFAULT_REJECTION_REASON.to_string());

        let mut request = self.find(request_id).await?;
        request.reject(caller_id, reason)?;
        self.record(request).await
    }

    /// Administrators see every request (optionally by status); everybody
    /// else sees their own.
    pub async fn list(
        &self,
        caller_id: &str,
        status: Option<HostRequestStatus>,
    ) -> DomainResult<Vec<HostRequest>> {
        let caller = self.user(caller_id).await?;
        let requests = self.repos.host_requests().find_all(status).await?;
        if caller.is_admin() {
            return Ok(requests);
        }
        Ok(requests
            .into_iter()
            .filter(|r| r.user_id == caller_id)
            .collect())
    }

    async fn record(&self, request: HostRequest) -> DomainResult<HostRequest> {
        self.repos.host_requests().record_decision(&request).await?;

        let reviewer = request.reviewed_by.clone().unwrap_or_default();
        info!(
            request_id = %request.id,
            user_id = %request.user_id,
            status = %request.status,
            reviewed_by = %reviewer,
            "Host request decided"
        );

        self.events
            .publish(Event::HostRequestReviewed(HostRequestReviewedEvent {
                request_id: request.id.clone(),
                user_id: request.user_id.clone(),
                status: request.status.to_string(),
                reviewed_by: reviewer,
                timestamp: Utc::now(),
            }));

        if let Some(applicant) = self.repos.users().find_by_id(&request.user_id).await? {
            let notice = HostRequestNotice::new(&request, &applicant);
            let notification = match request.status {
                HostRequestStatus::Approved => Notification::HostRequestApproved(notice),
                _ => Notification::HostRequestRejected {
                    notice,
                    reason: request.rejection_reason.clone().unwrap_or_default(),
                },
            };
            self.dispatcher.dispatch(notification);
        }

        Ok(request)
    }

    async fn find(&self, request_id: &str) -> DomainResult<HostRequest> {
        self.repos
            .host_requests()
            .find_by_id(request_id)
            .await?
            .ok_or_else(|| DomainError::not_found("HostRequest", "id", request_id))
    }

    async fn user(&self, user_id: &str) -> DomainResult<User> {
        self.repos
            .users()
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| DomainError::not_found("User", "id", user_id))
    }

    async fn require_admin(&self, caller_id: &str) -> DomainResult<()> {
        let caller = self
            .repos
            .users()
            .find_by_id(caller_id)
            .await?
            .ok_or_else(|| DomainError::Forbidden("Unknown reviewer".into()))?;
        if !caller.is_admin() {
            return Err(DomainError::Forbidden(
                "Only administrators can review host requests".into(),
            ));
        }
        Ok(())
    }
}
