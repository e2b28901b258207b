//! Entity-agnostic query primitives.
//!
//! # Responsibility
//! - Run parameterized single-row, multi-row and mutation statements.
//! - Normalize "no rows" and deadline expiry into distinct [`DbError`] kinds.
//!
//! # Invariants
//! - Cursors and statements are released on every exit path, including a
//!   failing row consumer.
//! - A statement still running when the context deadline passes is
//!   interrupted and reported as [`DbError::DeadlineExceeded`].
//! - Executors hold no per-call mutable state and may be shared across threads.

use super::open::Database;
use super::{DbError, DbResult, QueryContext};
use rusqlite::{Connection, ErrorCode, Params, Row, Rows};
use std::time::Instant;

// VM instructions between deadline checks.
const PROGRESS_CHECK_INTERVAL: i32 = 1_000;

/// Query primitives shared by every repository.
pub trait Executor {
    /// Runs a query expected to return at most one row and maps that row.
    ///
    /// Returns [`DbError::NoRows`] when nothing matched.
    fn fetch_one<T, P, F>(
        &self,
        ctx: &QueryContext,
        sql: &str,
        params: P,
        map_row: F,
    ) -> DbResult<T>
    where
        P: Params,
        F: FnOnce(&Row<'_>) -> rusqlite::Result<T>;

    /// Runs a query and hands the open cursor to `consume_rows`, which must
    /// iterate it to completion.
    fn fetch_many<T, P, F>(
        &self,
        ctx: &QueryContext,
        sql: &str,
        params: P,
        consume_rows: F,
    ) -> DbResult<T>
    where
        P: Params,
        F: FnOnce(&mut Rows<'_>) -> DbResult<T>;

    /// Runs an insert/update/delete statement. Row counts are not interpreted.
    fn execute<P: Params>(&self, ctx: &QueryContext, sql: &str, params: P) -> DbResult<()>;
}

/// Converts the "no rows" condition of [`Executor::fetch_one`] into `None`.
pub trait OptionalRow<T> {
    fn optional(self) -> DbResult<Option<T>>;
}

impl<T> OptionalRow<T> for DbResult<T> {
    fn optional(self) -> DbResult<Option<T>> {
        match self {
            Ok(value) => Ok(Some(value)),
            Err(DbError::NoRows) => Ok(None),
            Err(err) => Err(err),
        }
    }
}

/// Auto-commit executor: every call checks out its own pooled connection.
#[derive(Debug, Clone)]
pub struct PoolExecutor {
    db: Database,
}

impl PoolExecutor {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

impl Executor for PoolExecutor {
    fn fetch_one<T, P, F>(
        &self,
        ctx: &QueryContext,
        sql: &str,
        params: P,
        map_row: F,
    ) -> DbResult<T>
    where
        P: Params,
        F: FnOnce(&Row<'_>) -> rusqlite::Result<T>,
    {
        let conn = self.db.acquire(ctx)?;
        fetch_one_on(&conn, ctx, sql, params, map_row)
    }

    fn fetch_many<T, P, F>(
        &self,
        ctx: &QueryContext,
        sql: &str,
        params: P,
        consume_rows: F,
    ) -> DbResult<T>
    where
        P: Params,
        F: FnOnce(&mut Rows<'_>) -> DbResult<T>,
    {
        let conn = self.db.acquire(ctx)?;
        fetch_many_on(&conn, ctx, sql, params, consume_rows)
    }

    fn execute<P: Params>(&self, ctx: &QueryContext, sql: &str, params: P) -> DbResult<()> {
        let conn = self.db.acquire(ctx)?;
        execute_on(&conn, ctx, sql, params)
    }
}

/// Executor bound to the connection of an active unit of work.
///
/// Statements issued through it commit or roll back together.
#[derive(Debug, Clone, Copy)]
pub struct TxExecutor<'uow> {
    conn: &'uow Connection,
}

impl<'uow> TxExecutor<'uow> {
    pub(crate) fn new(conn: &'uow Connection) -> Self {
        Self { conn }
    }
}

impl Executor for TxExecutor<'_> {
    fn fetch_one<T, P, F>(
        &self,
        ctx: &QueryContext,
        sql: &str,
        params: P,
        map_row: F,
    ) -> DbResult<T>
    where
        P: Params,
        F: FnOnce(&Row<'_>) -> rusqlite::Result<T>,
    {
        fetch_one_on(self.conn, ctx, sql, params, map_row)
    }

    fn fetch_many<T, P, F>(
        &self,
        ctx: &QueryContext,
        sql: &str,
        params: P,
        consume_rows: F,
    ) -> DbResult<T>
    where
        P: Params,
        F: FnOnce(&mut Rows<'_>) -> DbResult<T>,
    {
        fetch_many_on(self.conn, ctx, sql, params, consume_rows)
    }

    fn execute<P: Params>(&self, ctx: &QueryContext, sql: &str, params: P) -> DbResult<()> {
        execute_on(self.conn, ctx, sql, params)
    }
}

impl<E: Executor> Executor for &E {
    fn fetch_one<T, P, F>(
        &self,
        ctx: &QueryContext,
        sql: &str,
        params: P,
        map_row: F,
    ) -> DbResult<T>
    where
        P: Params,
        F: FnOnce(&Row<'_>) -> rusqlite::Result<T>,
    {
        (**self).fetch_one(ctx, sql, params, map_row)
    }

    fn fetch_many<T, P, F>(
        &self,
        ctx: &QueryContext,
        sql: &str,
        params: P,
        consume_rows: F,
    ) -> DbResult<T>
    where
        P: Params,
        F: FnOnce(&mut Rows<'_>) -> DbResult<T>,
    {
        (**self).fetch_many(ctx, sql, params, consume_rows)
    }

    fn execute<P: Params>(&self, ctx: &QueryContext, sql: &str, params: P) -> DbResult<()> {
        (**self).execute(ctx, sql, params)
    }
}

fn fetch_one_on<T, P, F>(
    conn: &Connection,
    ctx: &QueryContext,
    sql: &str,
    params: P,
    map_row: F,
) -> DbResult<T>
where
    P: Params,
    F: FnOnce(&Row<'_>) -> rusqlite::Result<T>,
{
    with_deadline(conn, ctx, |conn| {
        let mut stmt = conn.prepare_cached(sql)?;
        stmt.query_row(params, map_row).map_err(|err| match err {
            rusqlite::Error::QueryReturnedNoRows => DbError::NoRows,
            other => DbError::Sqlite(other),
        })
    })
}

fn fetch_many_on<T, P, F>(
    conn: &Connection,
    ctx: &QueryContext,
    sql: &str,
    params: P,
    consume_rows: F,
) -> DbResult<T>
where
    P: Params,
    F: FnOnce(&mut Rows<'_>) -> DbResult<T>,
{
    with_deadline(conn, ctx, |conn| {
        let mut stmt = conn.prepare_cached(sql)?;
        let mut rows = stmt.query(params)?;
        // `rows` resets the statement when dropped, whatever the consumer returned.
        consume_rows(&mut rows)
    })
}

fn execute_on<P: Params>(
    conn: &Connection,
    ctx: &QueryContext,
    sql: &str,
    params: P,
) -> DbResult<()> {
    with_deadline(conn, ctx, |conn| {
        conn.prepare_cached(sql)?.execute(params)?;
        Ok(())
    })
}

/// Runs `op` with a progress handler that interrupts it at the deadline.
pub(crate) fn with_deadline<T>(
    conn: &Connection,
    ctx: &QueryContext,
    op: impl FnOnce(&Connection) -> DbResult<T>,
) -> DbResult<T> {
    let Some(deadline) = ctx.deadline() else {
        return op(conn);
    };
    if Instant::now() >= deadline {
        return Err(DbError::DeadlineExceeded);
    }

    conn.progress_handler(
        PROGRESS_CHECK_INTERVAL,
        Some(move || Instant::now() >= deadline),
    );
    let result = op(conn);
    conn.progress_handler(0, None::<fn() -> bool>);

    result.map_err(|err| {
        if is_interrupted(&err) {
            DbError::DeadlineExceeded
        } else {
            err
        }
    })
}

fn is_interrupted(err: &DbError) -> bool {
    matches!(
        err,
        DbError::Sqlite(rusqlite::Error::SqliteFailure(failure, _))
            if failure.code == ErrorCode::OperationInterrupted
    )
}
