// ODBC driver:
// - config: profile -> connection string
// - params: RowValues -> boxed InputParameter, text cells -> RowValues
// - connection: the blocking DriverConnection over odbc-api

pub mod config;
pub mod connection;
pub mod params;

pub use config::connection_string;
pub use connection::OdbcConnection;
