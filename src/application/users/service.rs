//! Local user profiles
//!
//! Identity lives with the external provider. The first authenticated call
//! to the profile endpoint creates the local record booking flows need.

use std::sync::Arc;

use tracing::info;

use crate::domain::{DomainError, DomainResult, RepositoryProvider, User, UserRole};

pub struct UserService {
    repos: Arc<dyn RepositoryProvider>,
}

impl UserService {
    pub fn new(repos: Arc<dyn RepositoryProvider>) -> Self {
        Self { repos }
    }

    /// Return the caller's profile, creating it on first use. New profiles
    /// start as guests unless the token marks the caller as an admin.
    pub async fn ensure_profile(
        &self,
        user_id: &str,
        email: &str,
        name: &str,
        token_role: UserRole,
    ) -> DomainResult<User> {
        if let Some(user) = self.repos.users().find_by_id(user_id).await? {
            return Ok(user);
        }

        let name = name.trim();
        if name.is_empty() {
            return Err(DomainError::Validation("name is required".into()));
        }
        let role = if token_role == UserRole::Admin {
            UserRole::Admin
        } else {
            UserRole::Guest
        };

        let mut user = User::new(name, email, role);
        user.id = user_id.to_string();
        self.repos.users().save(user.clone()).await?;

        info!(user_id, role = %role, "User profile created");
        Ok(user)
    }

    pub async fn get(&self, user_id: &str) -> DomainResult<User> {
        self.repos
            .users()
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| DomainError::not_found("User", "id", user_id))
    }
}
