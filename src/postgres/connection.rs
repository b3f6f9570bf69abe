use tokio::runtime::{Builder, Runtime};
use tokio::task::JoinHandle;
use tokio_postgres::{Client, NoTls};
use tracing::warn;

use super::config::pg_config_from_profile;
use super::params::as_refs;
use super::query::build_result_set_from_rows;
use crate::config::ConnectionProfile;
use crate::driver::DriverConnection;
use crate::error::FacadeError;
use crate::results::ResultSet;
use crate::types::{DriverKind, RowValues};

/// A blocking Postgres connection.
///
/// `tokio-postgres` is async only, so each connection owns a current-thread
/// runtime that drives both the client calls and the background connection
/// task. Nothing runs between calls.
pub struct PostgresConnection {
    runtime: Runtime,
    client: Client,
    driver: JoinHandle<()>,
}

impl PostgresConnection {
    /// Connect and open a read-write transaction.
    ///
    /// # Errors
    /// Returns `FacadeError::ConfigError` for an unusable profile,
    /// `FacadeError::ConnectionError` if the runtime cannot start, or the
    /// driver error if the server refuses the connection.
    pub fn connect(profile: &ConnectionProfile) -> Result<Self, FacadeError> {
        let pg_config = pg_config_from_profile(profile)?;
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| {
                FacadeError::ConnectionError(format!("failed to start postgres runtime: {e}"))
            })?;

        let (client, connection) = runtime.block_on(pg_config.connect(NoTls))?;
        let driver = runtime.spawn(async move {
            if let Err(e) = connection.await {
                warn!(error = %e, "postgres connection closed with error");
            }
        });

        let conn = Self {
            runtime,
            client,
            driver,
        };
        conn.runtime
            .block_on(conn.client.batch_execute("BEGIN READ WRITE"))?;
        Ok(conn)
    }
}

impl DriverConnection for PostgresConnection {
    fn kind(&self) -> DriverKind {
        DriverKind::Postgres
    }

    fn query(&mut self, sql: &str, params: &[RowValues]) -> Result<ResultSet, FacadeError> {
        let refs = as_refs(params);
        let rows = self.runtime.block_on(self.client.query(sql, &refs))?;
        build_result_set_from_rows(&rows)
    }

    fn execute(&mut self, sql: &str, params: &[RowValues]) -> Result<usize, FacadeError> {
        let refs = as_refs(params);
        let rows = self.runtime.block_on(self.client.execute(sql, &refs))?;
        usize::try_from(rows).map_err(|e| {
            FacadeError::ExecutionError(format!("postgres affected rows conversion error: {e}"))
        })
    }

    fn commit(&mut self) -> Result<(), FacadeError> {
        self.runtime.block_on(self.client.batch_execute("COMMIT"))?;
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), FacadeError> {
        self.runtime.block_on(self.client.batch_execute("ROLLBACK"))?;
        Ok(())
    }

    fn close(self: Box<Self>) -> Result<(), FacadeError> {
        let PostgresConnection {
            runtime,
            client,
            driver,
        } = *self;
        // the connection task finishes once its last client handle is gone
        drop(client);
        runtime.block_on(driver).map_err(|e| {
            FacadeError::ConnectionError(format!("postgres connection task failed: {e}"))
        })
    }
}
