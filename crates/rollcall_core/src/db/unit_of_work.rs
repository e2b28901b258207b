//! Unit-of-work transaction boundary.
//!
//! # Responsibility
//! - Bound one atomic set of statements on a single pooled connection.
//! - Expose that connection as an [`Executor`](super::Executor) while active.
//!
//! # Invariants
//! - State moves `Idle -> Active -> (Committed | RolledBack)` and never back.
//! - `commit`/`rollback` outside `Active` finalize nothing and succeed.
//! - The connection returns to the pool only after the transaction ended;
//!   dropping an active unit of work rolls it back.

use super::executor::{with_deadline, TxExecutor};
use super::open::{Database, PooledSqlite};
use super::{DbError, DbResult, QueryContext};
use log::{debug, warn};

/// Observable lifecycle phase of a [`UnitOfWork`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitOfWorkState {
    Idle,
    Active,
    Committed,
    RolledBack,
}

enum Phase {
    Idle,
    Active(PooledSqlite),
    Committed,
    RolledBack,
}

/// One logical transaction scope over the shared pool.
pub struct UnitOfWork {
    db: Database,
    phase: Phase,
}

impl UnitOfWork {
    pub fn new(db: Database) -> Self {
        Self {
            db,
            phase: Phase::Idle,
        }
    }

    pub fn state(&self) -> UnitOfWorkState {
        match self.phase {
            Phase::Idle => UnitOfWorkState::Idle,
            Phase::Active(_) => UnitOfWorkState::Active,
            Phase::Committed => UnitOfWorkState::Committed,
            Phase::RolledBack => UnitOfWorkState::RolledBack,
        }
    }

    /// Acquires a connection and opens the transaction.
    ///
    /// Fails with [`DbError::Transaction`] unless the unit of work is idle.
    pub fn begin(&mut self, ctx: &QueryContext) -> DbResult<()> {
        if !matches!(self.phase, Phase::Idle) {
            return Err(DbError::Transaction("begin requires an idle unit of work"));
        }

        let conn = self.db.acquire(ctx)?;
        with_deadline(&conn, ctx, |conn| {
            conn.execute_batch("BEGIN IMMEDIATE;")?;
            Ok(())
        })?;
        debug!("event=uow_begin module=db status=ok");
        self.phase = Phase::Active(conn);
        Ok(())
    }

    /// Commits the active transaction. No-op when nothing is active.
    ///
    /// A failed commit is rolled back and the unit of work ends `RolledBack`.
    pub fn commit(&mut self) -> DbResult<()> {
        let conn = match self.take_active() {
            Some(conn) => conn,
            None => return Ok(()),
        };

        match conn.execute_batch("COMMIT;") {
            Ok(()) => {
                debug!("event=uow_commit module=db status=ok");
                self.phase = Phase::Committed;
                Ok(())
            }
            Err(err) => {
                warn!(
                    "event=uow_commit module=db status=error error={}",
                    err
                );
                if !conn.is_autocommit() {
                    let _ = conn.execute_batch("ROLLBACK;");
                }
                self.phase = Phase::RolledBack;
                Err(err.into())
            }
        }
    }

    /// Rolls the active transaction back. No-op when nothing is active.
    pub fn rollback(&mut self) -> DbResult<()> {
        let conn = match self.take_active() {
            Some(conn) => conn,
            None => return Ok(()),
        };

        self.phase = Phase::RolledBack;
        if conn.is_autocommit() {
            // SQLite already aborted the transaction (e.g. after an interrupt).
            return Ok(());
        }
        conn.execute_batch("ROLLBACK;")?;
        debug!("event=uow_rollback module=db status=ok");
        Ok(())
    }

    /// Executor over the active transaction, `None` unless `Active`.
    pub fn tx(&self) -> Option<TxExecutor<'_>> {
        match &self.phase {
            Phase::Active(conn) => Some(TxExecutor::new(conn)),
            _ => None,
        }
    }

    fn take_active(&mut self) -> Option<PooledSqlite> {
        match std::mem::replace(&mut self.phase, Phase::Idle) {
            Phase::Active(conn) => Some(conn),
            other => {
                self.phase = other;
                None
            }
        }
    }
}

impl Drop for UnitOfWork {
    fn drop(&mut self) {
        if let Phase::Active(conn) = &self.phase {
            warn!("event=uow_drop module=db status=rollback reason=not_finalized");
            if !conn.is_autocommit() {
                let _ = conn.execute_batch("ROLLBACK;");
            }
        }
    }
}
