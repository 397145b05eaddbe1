//! SeaORM implementation of HostRequestRepository

use async_trait::async_trait;
use chrono::Utc;
use log::debug;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

use super::{begin_serializable, db_err};
use crate::domain::host_request::{HostRequest, HostRequestRepository, HostRequestStatus};
use crate::domain::user::UserRole;
use crate::domain::{DomainError, DomainResult};
use crate::infrastructure::database::entities::{host_request, user};

pub struct SeaOrmHostRequestRepository {
    db: DatabaseConnection,
}

impl SeaOrmHostRequestRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn model_to_domain(m: host_request::Model) -> HostRequest {
    HostRequest {
        id: m.id,
        user_id: m.user_id,
        message: m.message,
        status: HostRequestStatus::from_str(&m.status),
        reviewed_by: m.reviewed_by,
        rejection_reason: m.rejection_reason,
        created_at: m.created_at,
        updated_at: m.updated_at,
    }
}

#[async_trait]
impl HostRequestRepository for SeaOrmHostRequestRepository {
    async fn save(&self, r: HostRequest) -> DomainResult<()> {
        debug!("Saving host request {} for user {}", r.id, r.user_id);

        let model = host_request::ActiveModel {
            id: Set(r.id),
            user_id: Set(r.user_id),
            message: Set(r.message),
            status: Set(r.status.as_str().to_string()),
            reviewed_by: Set(r.reviewed_by),
            rejection_reason: Set(r.rejection_reason),
            created_at: Set(r.created_at),
            updated_at: Set(r.updated_at),
        };
        model.insert(&self.db).await.map_err(db_err)?;
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> DomainResult<Option<HostRequest>> {
        let model = host_request::Entity::find_by_id(id.to_string())
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model.map(model_to_domain))
    }

    async fn find_pending_for_user(&self, user_id: &str) -> DomainResult<Option<HostRequest>> {
        let model = host_request::Entity::find()
            .filter(host_request::Column::UserId.eq(user_id))
            .filter(host_request::Column::Status.eq(HostRequestStatus::Pending.as_str()))
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model.map(model_to_domain))
    }

    async fn find_all(&self, status: Option<HostRequestStatus>) -> DomainResult<Vec<HostRequest>> {
        let mut query = host_request::Entity::find();
        if let Some(status) = status {
            query = query.filter(host_request::Column::Status.eq(status.as_str()));
        }
        let models = query
            .order_by_desc(host_request::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(models.into_iter().map(model_to_domain).collect())
    }

    async fn record_decision(&self, r: &HostRequest) -> DomainResult<()> {
        debug!("Recording decision {} on host request {}", r.status, r.id);

        let txn = begin_serializable(&self.db).await?;

        let result = host_request::Entity::update_many()
            .col_expr(host_request::Column::Status, Expr::value(r.status.as_str()))
            .col_expr(
                host_request::Column::ReviewedBy,
                Expr::value(r.reviewed_by.clone()),
            )
            .col_expr(
                host_request::Column::RejectionReason,
                Expr::value(r.rejection_reason.clone()),
            )
            .col_expr(host_request::Column::UpdatedAt, Expr::value(r.updated_at))
            .filter(host_request::Column::Id.eq(r.id.as_str()))
            .filter(host_request::Column::Status.eq(HostRequestStatus::Pending.as_str()))
            .exec(&txn)
            .await
            .map_err(db_err)?;

        if result.rows_affected == 0 {
            let stored = host_request::Entity::find_by_id(r.id.clone())
                .one(&txn)
                .await
                .map_err(db_err)?
                .ok_or_else(|| DomainError::not_found("HostRequest", "id", r.id.as_str()))?;
            return Err(DomainError::InvalidTransition {
                entity: "HostRequest",
                from: stored.status,
                to: r.status.to_string(),
            });
        }

        if r.status == HostRequestStatus::Approved {
            user::Entity::update_many()
                .col_expr(user::Column::Role, Expr::value(UserRole::Host.as_str()))
                .col_expr(user::Column::UpdatedAt, Expr::value(Utc::now()))
                .filter(user::Column::Id.eq(r.user_id.as_str()))
                .exec(&txn)
                .await
                .map_err(db_err)?;
        }

        txn.commit().await.map_err(db_err)?;
        Ok(())
    }
}
