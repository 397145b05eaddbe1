//! Database repository implementations
//!
//! Per-aggregate SeaORM repositories + unified RepositoryProvider.

pub mod host_request_repository;
pub mod listing_repository;
pub mod payment_repository;
pub mod repository_provider;
pub mod reservation_repository;
pub mod user_repository;

pub use repository_provider::SeaOrmRepositoryProvider;

use std::time::Duration;

use sea_orm::{
    AccessMode, ConnectionTrait, DatabaseConnection, DatabaseTransaction, DbBackend, DbErr,
    IsolationLevel, SqlErr, Statement, TransactionTrait,
};

use crate::domain::DomainError;
use crate::shared::retry::RetryPolicy;

/// SQLite result codes meaning another connection holds the write lock:
/// SQLITE_BUSY (5), SQLITE_LOCKED (6), SQLITE_BUSY_SNAPSHOT (517).
const SQLITE_CONTENTION_MARKERS: [&str; 4] = [
    "database is locked",
    "database table is locked",
    "(code: 5)",
    "(code: 517)",
];

/// Writers that lost the race for the SQLite write lock get a few more tries.
pub(crate) fn lock_retry_policy() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 5,
        initial_delay: Duration::from_millis(25),
        backoff_multiplier: 2.0,
        max_delay: Duration::from_millis(400),
    }
}

fn is_lock_contention(e: &DbErr) -> bool {
    let message = e.to_string();
    SQLITE_CONTENTION_MARKERS
        .iter()
        .any(|marker| message.contains(marker))
}

fn db_err(e: DbErr) -> DomainError {
    match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail)) => {
            DomainError::Conflict(format!("Duplicate record: {}", detail))
        }
        Some(SqlErr::ForeignKeyConstraintViolation(detail)) => {
            DomainError::Validation(format!("Referenced record does not exist: {}", detail))
        }
        _ if is_lock_contention(&e) => DomainError::Busy(e.to_string()),
        _ => DomainError::Storage(e.to_string()),
    }
}

/// Open a write transaction that reads and writes as one serial step.
///
/// SQLite has no isolation levels, and a plain `BEGIN` only takes the write
/// lock at the first write, after the overlap read. A no-op `UPDATE` as the
/// first statement takes the write lock up front (waiting on the busy
/// timeout), so concurrent writers queue instead of failing the upgrade.
async fn begin_serializable(db: &DatabaseConnection) -> Result<DatabaseTransaction, DomainError> {
    match db.get_database_backend() {
        DbBackend::Sqlite => {
            let txn = db.begin().await.map_err(db_err)?;
            txn.execute(Statement::from_string(
                DbBackend::Sqlite,
                "UPDATE reservations SET id = id WHERE 0",
            ))
            .await
            .map_err(db_err)?;
            Ok(txn)
        }
        _ => db
            .begin_with_config(
                Some(IsolationLevel::Serializable),
                Some(AccessMode::ReadWrite),
            )
            .await
            .map_err(db_err),
    }
}
