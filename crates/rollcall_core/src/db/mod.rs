//! SQLite storage bootstrap, query execution and transaction scope.
//!
//! # Responsibility
//! - Open the process-wide connection pool and apply schema migrations.
//! - Provide entity-agnostic query primitives (`fetch_one`, `fetch_many`,
//!   `execute`) shared by every repository.
//! - Provide the unit-of-work transaction boundary.
//!
//! # Invariants
//! - Migration version is tracked via `PRAGMA user_version`.
//! - Core code must not read/write application data before migrations succeed.
//! - Every query honors the deadline carried by its [`QueryContext`].

pub mod context;
pub mod executor;
pub mod migrations;
mod open;
pub mod unit_of_work;

pub use context::QueryContext;
pub use executor::{Executor, OptionalRow, PoolExecutor, TxExecutor};
pub use open::{open_database, open_database_in_memory, Database, PoolConfig};
pub use unit_of_work::{UnitOfWork, UnitOfWorkState};

pub type DbResult<T> = Result<T, DbError>;

/// Storage-level failure raised below the repository layer.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("{0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("connection pool: {0}")]
    Pool(#[from] r2d2::Error),
    /// A single-row query matched nothing.
    #[error("query returned no rows")]
    NoRows,
    /// The caller's deadline expired before or during the statement.
    #[error("query deadline exceeded")]
    DeadlineExceeded,
    #[error(
        "database schema version {db_version} is newer than supported {latest_supported}"
    )]
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
    /// Unit-of-work state transition that is not allowed.
    #[error("transaction: {0}")]
    Transaction(&'static str),
}

impl DbError {
    /// Returns the SQLite extended result code when this wraps a SQLite failure.
    pub fn sqlite_extended_code(&self) -> Option<i32> {
        match self {
            Self::Sqlite(rusqlite::Error::SqliteFailure(err, _)) => Some(err.extended_code),
            _ => None,
        }
    }
}
