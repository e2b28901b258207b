//! Repository layer contracts and SQLite implementations.
//!
//! # Responsibility
//! - Define per-entity data access contracts used by services.
//! - Compose the shared [`Executor`](crate::db::Executor) primitives; no
//!   repository manages cursors or connections itself.
//!
//! # Invariants
//! - Single-row reads return `Ok(None)` when nothing matches.
//! - Storage unique-constraint failures surface as
//!   [`RepoError::UniqueViolation`]; every other failure is a persistence error.
//! - Timestamps are stored as Unix epoch milliseconds.

pub mod church_member_repo;
pub mod user_repo;

use crate::db::DbError;
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::Row;

pub type RepoResult<T> = Result<T, RepoError>;

/// Persistence failure reported by repositories.
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error(transparent)]
    Db(DbError),
    /// Authoritative duplicate signal when a racing writer passed the
    /// service-level uniqueness check.
    #[error("unique constraint violated: {constraint}")]
    UniqueViolation { constraint: String },
    #[error("invalid persisted data: {0}")]
    InvalidData(String),
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        if value.sqlite_extended_code() == Some(rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE) {
            let constraint = match &value {
                DbError::Sqlite(rusqlite::Error::SqliteFailure(_, Some(message))) => {
                    message.clone()
                }
                _ => "unique".to_string(),
            };
            return Self::UniqueViolation { constraint };
        }
        Self::Db(value)
    }
}

pub(crate) fn to_epoch_ms(value: DateTime<Utc>) -> i64 {
    value.timestamp_millis()
}

/// Reads an epoch-millisecond column as a UTC timestamp.
pub(crate) fn timestamp_column(row: &Row<'_>, column: &str) -> rusqlite::Result<DateTime<Utc>> {
    let millis: i64 = row.get(column)?;
    DateTime::from_timestamp_millis(millis).ok_or_else(|| {
        let index = row.as_ref().column_index(column).unwrap_or_default();
        rusqlite::Error::FromSqlConversionFailure(
            index,
            Type::Integer,
            format!("timestamp `{millis}` in column `{column}` is out of range").into(),
        )
    })
}
