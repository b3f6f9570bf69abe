//! Blocking CRUD helpers over PostgreSQL and ODBC, driven by one INI section.
//!
//! A [`QueryFacade`] names a config file and a section. Each operation reads
//! the section, picks a driver, opens a connection, checks the table, runs one
//! parameterized statement inside a transaction, commits or rolls back, and
//! closes the connection before returning.
//!
//! ```rust,no_run
//! use sql_facade::prelude::*;
//!
//! # fn demo() -> Result<(), FacadeError> {
//! let db = QueryFacade::new("dbconfig.conf", "warehouse");
//! db.create_table(
//!     &CreateTableRequest::new("people")
//!         .column("name", "varchar(40)")
//!         .column("age", "integer"),
//! )?;
//! db.insert(&InsertRequest::new("people").value("name", "Ann").value("age", 3))?;
//! for row in db.select(&SelectRequest::new("people").order_by("name"))? {
//!     println!("{}", row.to_json());
//! }
//! # Ok(())
//! # }
//! ```

pub mod prelude;

pub mod config;
pub mod driver;
pub mod error;
pub mod facade;
pub mod identifier;
pub mod query_builder;
pub mod requests;
pub mod results;
pub mod translation;
pub mod types;

#[cfg(feature = "odbc")]
pub mod odbc;
#[cfg(feature = "postgres")]
pub mod postgres;

pub use config::{ConnectionProfile, resolve_profile, resolve_profile_from_str};
pub use driver::{Connector, DefaultConnector, DriverConnection, select_driver};
pub use error::FacadeError;
pub use facade::{DEFAULT_CONFIG_FILE, DEFAULT_CONFIG_SECTION, Outcome, QueryFacade};
pub use query_builder::Statement;
pub use requests::{
    CreateOutcome, CreateTableRequest, DeleteRequest, DropOutcome, DropTableRequest, Filter,
    InsertRequest, Request, SelectRequest, UpdateRequest, WriteOutcome,
};
pub use results::{ResultRow, ResultSet};
pub use translation::PlaceholderStyle;
pub use types::{DriverKind, RowValues};
