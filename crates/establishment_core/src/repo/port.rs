//! Relational execution port.
//!
//! # Responsibility
//! - Narrow the backend to three capabilities: execute a statement, fetch at
//!   most one row, fetch all rows.
//! - Enforce the caller's deadline before every statement.
//! - Attach the logical step and statement phase to backend failures.
//!
//! # Invariants
//! - No statement starts after the deadline has passed.
//! - Statements already executed are never undone by this layer; rollback is
//!   the caller's transaction's job.

use crate::db::DbError;
use crate::repo::error::{RepoError, RepoResult, StatementPhase};
use log::debug;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, Row};
use std::time::{Duration, Instant};

/// Point in time after which no further statement may start.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Deadline {
    at: Option<Instant>,
}

impl Deadline {
    /// No deadline: statements always run.
    pub fn none() -> Self {
        Self { at: None }
    }

    pub fn at(instant: Instant) -> Self {
        Self { at: Some(instant) }
    }

    /// Deadline `timeout` from now. Overflowing timeouts mean "no deadline".
    pub fn after(timeout: Duration) -> Self {
        Self {
            at: Instant::now().checked_add(timeout),
        }
    }

    pub fn from_timeout(timeout: Option<Duration>) -> Self {
        timeout.map_or_else(Self::none, Self::after)
    }

    pub fn is_expired(&self) -> bool {
        self.at.is_some_and(|at| Instant::now() >= at)
    }

    /// Fails with `DeadlineExceeded` when the deadline has passed.
    pub fn check(&self, step: &'static str) -> RepoResult<()> {
        if self.is_expired() {
            return Err(RepoError::DeadlineExceeded { step });
        }
        Ok(())
    }
}

/// Minimal statement capability set consumed by the stores.
///
/// Binds are positional (`?1`, `?2`, ... or bare `?`) and `step` is a short
/// label such as `insert location` used in errors and logs.
pub trait StatementExecutor {
    /// Runs a statement and returns the number of affected rows.
    fn execute(&self, step: &'static str, sql: &str, binds: &[Value]) -> RepoResult<usize>;

    /// Runs a query and maps its first row, if any.
    fn query_one<T, F>(
        &self,
        step: &'static str,
        sql: &str,
        binds: &[Value],
        map: F,
    ) -> RepoResult<Option<T>>
    where
        F: FnMut(&Row<'_>) -> RepoResult<T>;

    /// Runs a query and maps every row in order.
    fn query_many<T, F>(
        &self,
        step: &'static str,
        sql: &str,
        binds: &[Value],
        map: F,
    ) -> RepoResult<Vec<T>>
    where
        F: FnMut(&Row<'_>) -> RepoResult<T>;
}

/// `StatementExecutor` over a borrowed SQLite connection.
///
/// Pass a `rusqlite::Transaction` (it derefs to `Connection`) to run the
/// statements inside that transaction.
pub struct SqliteExecutor<'conn> {
    conn: &'conn Connection,
    deadline: Deadline,
}

impl<'conn> SqliteExecutor<'conn> {
    pub fn new(conn: &'conn Connection, deadline: Deadline) -> Self {
        Self { conn, deadline }
    }
}

impl StatementExecutor for SqliteExecutor<'_> {
    fn execute(&self, step: &'static str, sql: &str, binds: &[Value]) -> RepoResult<usize> {
        self.deadline.check(step)?;
        debug!("event=statement module=repo kind=execute step={step}");

        let mut stmt = self
            .conn
            .prepare_cached(sql)
            .map_err(|err| RepoError::persistence(step, StatementPhase::Prepare, err))?;
        stmt.execute(params_from_iter(binds.iter()))
            .map_err(|err| RepoError::persistence(step, StatementPhase::Execute, err))
    }

    fn query_one<T, F>(
        &self,
        step: &'static str,
        sql: &str,
        binds: &[Value],
        mut map: F,
    ) -> RepoResult<Option<T>>
    where
        F: FnMut(&Row<'_>) -> RepoResult<T>,
    {
        self.deadline.check(step)?;
        debug!("event=statement module=repo kind=query_one step={step}");

        let mut stmt = self
            .conn
            .prepare_cached(sql)
            .map_err(|err| RepoError::persistence(step, StatementPhase::Prepare, err))?;
        let mut rows = stmt
            .query(params_from_iter(binds.iter()))
            .map_err(|err| RepoError::persistence(step, StatementPhase::Execute, err))?;

        match rows
            .next()
            .map_err(|err| RepoError::persistence(step, StatementPhase::Execute, err))?
        {
            Some(row) => map(row).map(Some).map_err(|err| as_scan_error(step, err)),
            None => Ok(None),
        }
    }

    fn query_many<T, F>(
        &self,
        step: &'static str,
        sql: &str,
        binds: &[Value],
        mut map: F,
    ) -> RepoResult<Vec<T>>
    where
        F: FnMut(&Row<'_>) -> RepoResult<T>,
    {
        self.deadline.check(step)?;
        debug!("event=statement module=repo kind=query_many step={step}");

        let mut stmt = self
            .conn
            .prepare_cached(sql)
            .map_err(|err| RepoError::persistence(step, StatementPhase::Prepare, err))?;
        let mut rows = stmt
            .query(params_from_iter(binds.iter()))
            .map_err(|err| RepoError::persistence(step, StatementPhase::Execute, err))?;

        let mut items = Vec::new();
        while let Some(row) = rows
            .next()
            .map_err(|err| RepoError::persistence(step, StatementPhase::Execute, err))?
        {
            items.push(map(row).map_err(|err| as_scan_error(step, err))?);
        }
        Ok(items)
    }
}

// Backend errors raised while reading columns become scan-phase failures.
fn as_scan_error(step: &'static str, err: RepoError) -> RepoError {
    match err {
        RepoError::Db(DbError::Sqlite(source)) => {
            RepoError::persistence(step, StatementPhase::Scan, source)
        }
        other => other,
    }
}
