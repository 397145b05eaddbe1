//! Create host_requests table

use sea_orm_migration::prelude::*;

use super::m20240101_000001_create_users::Users;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(HostRequests::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(HostRequests::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(HostRequests::UserId).string().not_null())
                    .col(ColumnDef::new(HostRequests::Message).text())
                    .col(
                        ColumnDef::new(HostRequests::Status)
                            .string_len(20)
                            .not_null()
                            .default("PENDING"),
                    )
                    .col(ColumnDef::new(HostRequests::ReviewedBy).string())
                    .col(ColumnDef::new(HostRequests::RejectionReason).text())
                    .col(
                        ColumnDef::new(HostRequests::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(HostRequests::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_host_requests_user")
                            .from(HostRequests::Table, HostRequests::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_host_requests_status")
                    .table(HostRequests::Table)
                    .col(HostRequests::Status)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(HostRequests::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum HostRequests {
    Table,
    Id,
    UserId,
    Message,
    Status,
    ReviewedBy,
    RejectionReason,
    CreatedAt,
    UpdatedAt,
}
