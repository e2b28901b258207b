//! Connection pool bootstrap for SQLite.
//!
//! # Responsibility
//! - Open file or in-memory databases behind a bounded `r2d2` pool.
//! - Configure connection pragmas required by core behavior.
//! - Trigger schema migrations before returning a usable handle.
//!
//! # Invariants
//! - Pooled connections have `foreign_keys=ON` and a busy timeout.
//! - File databases run in WAL mode so readers never block the writer.
//! - Returned handles have migrations fully applied.

use super::executor::PoolExecutor;
use super::migrations::apply_migrations;
use super::unit_of_work::UnitOfWork;
use super::{DbError, DbResult, QueryContext};
use log::{error, info};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use serde::Deserialize;
use std::fmt::{Debug, Formatter};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use uuid::Uuid;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

pub(crate) type PooledSqlite = PooledConnection<SqliteConnectionManager>;

/// Connection pool bounds.
///
/// Zero for `max_lifetime_secs` / `idle_timeout_secs` disables that limit.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct PoolConfig {
    /// Upper bound on open connections; callers queue beyond it.
    pub max_open: u32,
    /// Connections the pool keeps ready while idle.
    pub min_idle: u32,
    pub max_lifetime_secs: u64,
    pub idle_timeout_secs: u64,
    /// Longest wait for a free connection when the call has no deadline.
    pub acquire_timeout_ms: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_open: 25,
            min_idle: 5,
            max_lifetime_secs: 5 * 60,
            idle_timeout_secs: 10 * 60,
            acquire_timeout_ms: 30_000,
        }
    }
}

impl PoolConfig {
    fn in_memory() -> Self {
        Self {
            max_open: 4,
            min_idle: 1,
            max_lifetime_secs: 0,
            idle_timeout_secs: 0,
            ..Self::default()
        }
    }

    fn max_lifetime(&self) -> Option<Duration> {
        non_zero_secs(self.max_lifetime_secs)
    }

    fn idle_timeout(&self) -> Option<Duration> {
        non_zero_secs(self.idle_timeout_secs)
    }

    fn acquire_timeout(&self) -> Duration {
        Duration::from_millis(self.acquire_timeout_ms.max(1))
    }
}

/// Process-wide database handle.
///
/// Cheap to clone; every clone shares the same pool. Created once at startup
/// and passed explicitly into executors and repositories.
#[derive(Clone)]
pub struct Database {
    pool: Pool<SqliteConnectionManager>,
    acquire_timeout: Duration,
    // Shared-cache in-memory databases vanish with their last connection.
    // Never locked; the `Mutex` only makes the handle `Sync`.
    _anchor: Option<Arc<Mutex<Connection>>>,
}

impl Debug for Database {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("state", &self.pool.state())
            .field("max_size", &self.pool.max_size())
            .finish()
    }
}

impl Database {
    /// Auto-commit executor that checks out one connection per call.
    pub fn executor(&self) -> PoolExecutor {
        PoolExecutor::new(self.clone())
    }

    /// Fresh, idle unit of work bound to this pool.
    pub fn unit_of_work(&self) -> UnitOfWork {
        UnitOfWork::new(self.clone())
    }

    /// Current open/idle connection counts.
    pub fn state(&self) -> r2d2::State {
        self.pool.state()
    }

    pub fn max_size(&self) -> u32 {
        self.pool.max_size()
    }

    /// Checks out a connection, waiting no longer than the context allows.
    pub(crate) fn acquire(&self, ctx: &QueryContext) -> DbResult<PooledSqlite> {
        if ctx.is_expired() {
            return Err(DbError::DeadlineExceeded);
        }
        let wait = ctx
            .remaining()
            .map_or(self.acquire_timeout, |left| left.min(self.acquire_timeout));

        self.pool.get_timeout(wait).map_err(|err| {
            if ctx.is_expired() {
                DbError::DeadlineExceeded
            } else {
                DbError::Pool(err)
            }
        })
    }
}

/// Opens (or creates) a SQLite database file and applies all pending migrations.
///
/// # Side effects
/// - Establishes `min_idle` pooled connections up front.
/// - Emits `db_open` logging events with duration and status.
pub fn open_database(path: impl AsRef<Path>, config: &PoolConfig) -> DbResult<Database> {
    let manager = SqliteConnectionManager::file(path.as_ref()).with_init(|conn| {
        configure_connection(conn)?;
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| {
            row.get::<_, String>(0)
        })?;
        Ok(())
    });
    build_database("file", manager, config, None)
}

/// Opens a private in-memory database shared by all pooled connections.
///
/// Each call yields an independent database.
pub fn open_database_in_memory() -> DbResult<Database> {
    let uri = format!(
        "file:rollcall-{}?mode=memory&cache=shared",
        Uuid::new_v4().simple()
    );
    let anchor = match Connection::open(&uri) {
        Ok(conn) => conn,
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode=memory error_code=db_open_failed error={}",
                err
            );
            return Err(err.into());
        }
    };
    let manager = SqliteConnectionManager::file(&uri).with_init(configure_connection);
    build_database(
        "memory",
        manager,
        &PoolConfig::in_memory(),
        Some(Arc::new(Mutex::new(anchor))),
    )
}

fn build_database(
    mode: &'static str,
    manager: SqliteConnectionManager,
    config: &PoolConfig,
    anchor: Option<Arc<Mutex<Connection>>>,
) -> DbResult<Database> {
    let started_at = Instant::now();
    info!(
        "event=db_open module=db status=start mode={} max_open={} min_idle={}",
        mode, config.max_open, config.min_idle
    );

    let pool = match Pool::builder()
        .max_size(config.max_open)
        .min_idle(Some(config.min_idle.min(config.max_open)))
        .max_lifetime(config.max_lifetime())
        .idle_timeout(config.idle_timeout())
        .connection_timeout(config.acquire_timeout())
        .build(manager)
    {
        Ok(pool) => pool,
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={} duration_ms={} error_code=db_pool_failed error={}",
                mode,
                started_at.elapsed().as_millis(),
                err
            );
            return Err(err.into());
        }
    };

    match migrate(&pool) {
        Ok(()) => {
            info!(
                "event=db_open module=db status=ok mode={} duration_ms={}",
                mode,
                started_at.elapsed().as_millis()
            );
            Ok(Database {
                pool,
                acquire_timeout: config.acquire_timeout(),
                _anchor: anchor,
            })
        }
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={} duration_ms={} error_code=db_bootstrap_failed error={}",
                mode,
                started_at.elapsed().as_millis(),
                err
            );
            Err(err)
        }
    }
}

fn configure_connection(conn: &mut Connection) -> Result<(), rusqlite::Error> {
    conn.busy_timeout(BUSY_TIMEOUT)?;
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    Ok(())
}

fn migrate(pool: &Pool<SqliteConnectionManager>) -> DbResult<()> {
    let mut conn = pool.get()?;
    apply_migrations(&mut conn)
}

fn non_zero_secs(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}
