use std::time::Duration;

use tokio_postgres::Config as PgConfig;
use tracing::debug;

use crate::config::{BACKEND_KEY, ConnectionProfile};
use crate::error::FacadeError;

/// Translate a connection profile into a `tokio_postgres::Config`.
///
/// Recognised keys: `host`, `port`, `user`, `password`, `dbname` (or
/// `database`), `application_name`, `connect_timeout` (seconds). Anything else
/// is skipped.
///
/// # Errors
/// Returns `FacadeError::ConfigError` if `port` or `connect_timeout` is not a number
/// or if `host` or the database name is missing.
pub fn pg_config_from_profile(profile: &ConnectionProfile) -> Result<PgConfig, FacadeError> {
    let mut pg_config = PgConfig::new();
    let mut has_host = false;
    let mut has_db = false;

    for (key, value) in profile.iter() {
        match key {
            "host" => {
                pg_config.host(value);
                has_host = true;
            }
            "port" => {
                let port = value.trim().parse::<u16>().map_err(|e| {
                    FacadeError::ConfigError(format!("port `{value}` is not valid: {e}"))
                })?;
                pg_config.port(port);
            }
            "user" => {
                pg_config.user(value);
            }
            "password" => {
                pg_config.password(value);
            }
            "dbname" | "database" => {
                pg_config.dbname(value);
                has_db = true;
            }
            "application_name" => {
                pg_config.application_name(value);
            }
            "connect_timeout" => {
                let secs = value.trim().parse::<u64>().map_err(|e| {
                    FacadeError::ConfigError(format!(
                        "connect_timeout `{value}` is not valid: {e}"
                    ))
                })?;
                pg_config.connect_timeout(Duration::from_secs(secs));
            }
            BACKEND_KEY => {}
            other => debug!(key = other, "ignoring profile key not used by postgres"),
        }
    }

    if !has_host {
        return Err(FacadeError::ConfigError("host is required".to_string()));
    }
    if !has_db {
        return Err(FacadeError::ConfigError("dbname is required".to_string()));
    }
    Ok(pg_config)
}
