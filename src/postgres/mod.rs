// PostgreSQL driver, split the same way as every backend:
// - config: profile -> tokio_postgres::Config
// - params: RowValues -> ToSql
// - query: row extraction into a ResultSet
// - connection: the blocking DriverConnection over tokio-postgres

pub mod config;
pub mod connection;
pub mod params;
pub mod query;

pub use config::pg_config_from_profile;
pub use connection::PostgresConnection;
pub use query::build_result_set_from_rows;
