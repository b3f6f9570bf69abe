//! The driver capability the façade talks to, plus backend dispatch.
//!
//! Each backend module implements [`DriverConnection`]; [`DefaultConnector`]
//! opens the one a profile selects. Tests substitute their own [`Connector`].

use clap::ValueEnum;

use crate::config::{BACKEND_KEY, ConnectionProfile, HOST_KEY};
use crate::error::FacadeError;
use crate::results::ResultSet;
use crate::types::{DriverKind, RowValues};

/// Substring of `host` that routes a profile to the Postgres driver.
pub const POSTGRES_MARKER: &str = "postgres";

/// One open connection. A freshly opened connection is already inside a
/// transaction; nothing is visible to other sessions until [`commit`].
///
/// [`commit`]: DriverConnection::commit
pub trait DriverConnection {
    fn kind(&self) -> DriverKind;

    /// Run a statement that returns rows.
    ///
    /// # Errors
    /// Returns the driver's error if the statement fails or a value cannot be decoded.
    fn query(&mut self, sql: &str, params: &[RowValues]) -> Result<ResultSet, FacadeError>;

    /// Run a statement and return the affected-row count.
    ///
    /// # Errors
    /// Returns the driver's error if the statement fails.
    fn execute(&mut self, sql: &str, params: &[RowValues]) -> Result<usize, FacadeError>;

    /// # Errors
    /// Returns the driver's error if the commit is refused.
    fn commit(&mut self) -> Result<(), FacadeError>;

    /// # Errors
    /// Returns the driver's error if the rollback fails.
    fn rollback(&mut self) -> Result<(), FacadeError>;

    /// Release the connection and everything it holds.
    ///
    /// # Errors
    /// Returns the driver's error if shutdown reports one; the connection is gone either way.
    fn close(self: Box<Self>) -> Result<(), FacadeError>;
}

/// Opens connections for a resolved profile.
pub trait Connector {
    /// # Errors
    /// Returns `FacadeError` if the backend is unavailable or refuses the connection.
    fn connect(
        &self,
        kind: DriverKind,
        profile: &ConnectionProfile,
    ) -> Result<Box<dyn DriverConnection>, FacadeError>;
}

/// Connects through whichever backends were compiled in.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultConnector;

impl Connector for DefaultConnector {
    fn connect(
        &self,
        kind: DriverKind,
        profile: &ConnectionProfile,
    ) -> Result<Box<dyn DriverConnection>, FacadeError> {
        match kind {
            #[cfg(feature = "postgres")]
            DriverKind::Postgres => Ok(Box::new(crate::postgres::PostgresConnection::connect(
                profile,
            )?)),
            #[cfg(feature = "odbc")]
            DriverKind::Odbc => Ok(Box::new(crate::odbc::OdbcConnection::connect(profile)?)),
            #[allow(unreachable_patterns)]
            other => {
                let _ = profile;
                Err(FacadeError::Unimplemented(format!(
                    "the {other} backend is not enabled in the current build"
                )))
            }
        }
    }
}

/// Pick the backend for a profile.
///
/// An explicit `backend` entry wins and must name a known driver. Otherwise the
/// profile goes to Postgres when its `host` contains [`POSTGRES_MARKER`] and to
/// ODBC for anything else.
///
/// # Errors
/// Returns `FacadeError::ConfigError` for an unknown `backend` value or when the
/// profile has neither `backend` nor `host`.
pub fn select_driver(profile: &ConnectionProfile) -> Result<DriverKind, FacadeError> {
    if let Some(explicit) = profile.get(BACKEND_KEY) {
        return DriverKind::from_str(explicit.trim(), true).map_err(|_| {
            FacadeError::ConfigError(format!(
                "unknown backend `{explicit}`, expected postgres or odbc"
            ))
        });
    }

    let host = profile
        .get(HOST_KEY)
        .ok_or_else(|| FacadeError::ConfigError(format!("{HOST_KEY} is required")))?;
    if host.contains(POSTGRES_MARKER) {
        Ok(DriverKind::Postgres)
    } else {
        Ok(DriverKind::Odbc)
    }
}
