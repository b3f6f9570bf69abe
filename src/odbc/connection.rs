use std::sync::Arc;

use lazy_static::lazy_static;
use odbc_api::{Connection, ConnectionOptions, Cursor, Environment, ResultSetMetadata};
use tracing::debug;

use super::config::connection_string;
use super::params::{ColumnClass, to_parameters, value_from_text};
use crate::config::ConnectionProfile;
use crate::driver::DriverConnection;
use crate::error::FacadeError;
use crate::results::ResultSet;
use crate::types::{DriverKind, RowValues};

lazy_static! {
    // one driver-manager environment per process
    static ref ODBC_ENV: Result<Environment, String> =
        Environment::new().map_err(|e| e.to_string());
}

/// A blocking ODBC connection with autocommit switched off.
pub struct OdbcConnection {
    conn: Connection<'static>,
}

impl OdbcConnection {
    /// # Errors
    /// Returns `FacadeError::ConnectionError` if the driver manager cannot be
    /// initialised, or the ODBC error if the data source refuses the connection.
    pub fn connect(profile: &ConnectionProfile) -> Result<Self, FacadeError> {
        let env = ODBC_ENV.as_ref().map_err(|e| {
            FacadeError::ConnectionError(format!("failed to initialise ODBC environment: {e}"))
        })?;
        let conn = env
            .connect_with_connection_string(&connection_string(profile), ConnectionOptions::default())?;
        conn.set_autocommit(false)?;
        debug!("odbc connection opened with autocommit off");
        Ok(Self { conn })
    }
}

impl DriverConnection for OdbcConnection {
    fn kind(&self) -> DriverKind {
        DriverKind::Odbc
    }

    fn query(&mut self, sql: &str, params: &[RowValues]) -> Result<ResultSet, FacadeError> {
        let parameters = to_parameters(params);
        let mut stmt = self.conn.preallocate()?;
        let Some(mut cursor) = stmt.execute(sql, parameters.as_slice())? else {
            return Ok(ResultSet::default());
        };

        let names = cursor
            .column_names()?
            .collect::<Result<Vec<String>, _>>()?;
        let mut columns: Vec<(u16, ColumnClass)> = Vec::with_capacity(names.len());
        for col in 1..=names.len() {
            let col = u16::try_from(col).map_err(|e| {
                FacadeError::ExecutionError(format!("too many result columns: {e}"))
            })?;
            columns.push((col, ColumnClass::from(cursor.col_data_type(col)?)));
        }

        let mut result_set = ResultSet::default();
        result_set.set_column_names(Arc::new(names));
        let mut buf = Vec::new();
        while let Some(mut row) = cursor.next_row()? {
            let mut values = Vec::with_capacity(columns.len());
            for &(col, class) in &columns {
                buf.clear();
                let present = row.get_text(col, &mut buf)?;
                values.push(if present {
                    value_from_text(class, &String::from_utf8_lossy(&buf))
                } else {
                    RowValues::Null
                });
            }
            result_set.add_row_values(values);
        }
        Ok(result_set)
    }

    fn execute(&mut self, sql: &str, params: &[RowValues]) -> Result<usize, FacadeError> {
        let parameters = to_parameters(params);
        let mut stmt = self.conn.preallocate()?;
        // any cursor from a DML statement is dropped unread
        drop(stmt.execute(sql, parameters.as_slice())?);
        Ok(stmt.row_count()?.unwrap_or(0))
    }

    fn commit(&mut self) -> Result<(), FacadeError> {
        self.conn.commit()?;
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), FacadeError> {
        self.conn.rollback()?;
        Ok(())
    }

    fn close(self: Box<Self>) -> Result<(), FacadeError> {
        drop(self.conn);
        Ok(())
    }
}
