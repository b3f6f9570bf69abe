//! Convenient imports for common functionality.
//!
//! `use sql_facade::prelude::*;` brings in the façade, the request builders,
//! their outcomes, and the value types rows are made of.

pub use crate::config::ConnectionProfile;
pub use crate::driver::{Connector, DriverConnection};
pub use crate::error::FacadeError;
pub use crate::facade::{Outcome, QueryFacade};
pub use crate::requests::{
    CreateOutcome, CreateTableRequest, DeleteRequest, DropOutcome, DropTableRequest, Filter,
    InsertRequest, Request, SelectRequest, UpdateRequest, WriteOutcome,
};
pub use crate::results::{ResultRow, ResultSet};
pub use crate::types::{DriverKind, RowValues};
