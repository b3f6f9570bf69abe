use std::time::Instant;

use tracing::{debug, info, warn};

use crate::driver::DriverConnection;
use crate::error::FacadeError;
use crate::identifier::TableName;
use crate::query_builder::{self, Statement};
use crate::results::ResultSet;
use crate::translation::PlaceholderStyle;
use crate::types::RowValues;

/// One call's connection. Dropping the session closes the connection exactly
/// once, whether the call returned normally, failed, or unwound.
pub(crate) struct Session {
    conn: Option<Box<dyn DriverConnection>>,
    op: &'static str,
    started: Instant,
    show_query: bool,
}

impl Session {
    pub(crate) fn new(
        conn: Box<dyn DriverConnection>,
        op: &'static str,
        started: Instant,
        show_query: bool,
    ) -> Self {
        Self {
            conn: Some(conn),
            op,
            started,
            show_query,
        }
    }

    fn conn(&mut self) -> Result<&mut (dyn DriverConnection + 'static), FacadeError> {
        self.conn.as_deref_mut().ok_or_else(|| {
            FacadeError::ConnectionError(format!("{} connection already released", self.op))
        })
    }

    pub(crate) fn style(&self) -> PlaceholderStyle {
        self.conn
            .as_ref()
            .map_or(PlaceholderStyle::Postgres, |c| c.kind().placeholder_style())
    }

    fn log_statement(&self, stmt: &Statement) {
        if self.show_query {
            info!(op = self.op, sql = %stmt.sql, params = stmt.params.len(), "query");
        } else {
            debug!(op = self.op, sql = %stmt.sql, params = stmt.params.len(), "query");
        }
    }

    pub(crate) fn query(&mut self, stmt: &Statement) -> Result<ResultSet, FacadeError> {
        self.log_statement(stmt);
        self.conn()?.query(&stmt.sql, &stmt.params)
    }

    pub(crate) fn execute(&mut self, stmt: &Statement) -> Result<usize, FacadeError> {
        self.log_statement(stmt);
        self.conn()?.execute(&stmt.sql, &stmt.params)
    }

    /// Ask the catalog whether `table` exists.
    pub(crate) fn table_exists(&mut self, table: &TableName) -> Result<bool, FacadeError> {
        let stmt = query_builder::table_exists(table, self.style());
        debug!(op = self.op, sql = %stmt.sql, "existence check");
        let rs = self.conn()?.query(&stmt.sql, &stmt.params)?;
        match rs.scalar() {
            Some(RowValues::Int(n)) => Ok(*n > 0),
            Some(RowValues::Bool(b)) => Ok(*b),
            Some(RowValues::Text(t)) => t.trim().parse::<i64>().map(|n| n > 0).map_err(|e| {
                FacadeError::ExecutionError(format!("existence check returned `{t}`: {e}"))
            }),
            other => Err(FacadeError::ExecutionError(format!(
                "existence check returned {other:?}"
            ))),
        }
    }

    pub(crate) fn commit(&mut self) -> Result<(), FacadeError> {
        self.conn()?.commit()
    }

    /// Roll back after a failure; a failing rollback is logged, not returned,
    /// so the caller still sees the original error.
    pub(crate) fn rollback(&mut self) {
        let op = self.op;
        warn!(op, "rollback transaction");
        match self.conn() {
            Ok(conn) => {
                if let Err(e) = conn.rollback() {
                    warn!(op, error = %e, "rollback failed");
                }
            }
            Err(e) => warn!(op, error = %e, "nothing to roll back"),
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            if let Err(e) = conn.close() {
                warn!(op = self.op, error = %e, "error while closing connection");
            }
            let elapsed = self.started.elapsed();
            info!(
                op = self.op,
                elapsed_ms = elapsed.as_millis() as u64,
                "DB connection closed"
            );
        }
    }
}
