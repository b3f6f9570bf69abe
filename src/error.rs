use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FacadeError {
    #[cfg(feature = "postgres")]
    #[error(transparent)]
    PostgresError(#[from] tokio_postgres::Error),

    #[cfg(feature = "odbc")]
    #[error(transparent)]
    OdbcError(#[from] odbc_api::Error),

    #[error(transparent)]
    IniError(#[from] ini::Error),

    #[error("Section {section} not found in the {} file", path.display())]
    ConfigSectionNotFound { section: String, path: PathBuf },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Table {0} Doesn't Exist")]
    TableNotFound(String),

    #[error("Invalid identifier or fragment: {0}")]
    InvalidIdentifier(String),

    #[error("Parameter error: {0}")]
    ParameterError(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("SQL execution error: {0}")]
    ExecutionError(String),

    #[error("Unimplemented feature: {0}")]
    Unimplemented(String),
}

impl FacadeError {
    /// True for failures surfaced by a database driver while connecting,
    /// executing, committing or rolling back.
    #[must_use]
    pub fn is_driver_error(&self) -> bool {
        match self {
            #[cfg(feature = "postgres")]
            FacadeError::PostgresError(_) => true,
            #[cfg(feature = "odbc")]
            FacadeError::OdbcError(_) => true,
            FacadeError::ConnectionError(_) | FacadeError::ExecutionError(_) => true,
            _ => false,
        }
    }
}
