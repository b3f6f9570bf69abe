//! The query façade: one blocking call per operation, each on its own
//! connection.
//!
//! Every operation runs the same skeleton: resolve the profile, pick the
//! driver, assemble and validate the statement, connect, check the table
//! exists, run, commit. Any failure after connecting rolls back. The
//! connection is closed exactly once on every path.
//!
//! What a missing table means differs per operation and is kept on purpose:
//!
//! | operation      | table missing                                   |
//! |----------------|-------------------------------------------------|
//! | `select`       | `Err(TableNotFound)`                            |
//! | `insert`       | `Ok(WriteOutcome::TableMissing)`, commits       |
//! | `update`       | `Ok(WriteOutcome::TableMissing)`, commits       |
//! | `delete`       | `Err(TableNotFound)`, rolls back                |
//! | `create_table` | creates it                                      |
//! | `drop_table`   | `Ok(DropOutcome::Missing)`, commits             |

mod session;

use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::{error, info, warn};

use crate::config::resolve_profile;
use crate::driver::{Connector, DefaultConnector};
use crate::error::FacadeError;
use crate::identifier::TableName;
use crate::query_builder::{self, Statement};
use crate::requests::{
    CreateOutcome, CreateTableRequest, DeleteRequest, DropOutcome, DropTableRequest,
    InsertRequest, Request, SelectRequest, UpdateRequest, WriteOutcome,
};
use crate::results::ResultRow;
use crate::translation::PlaceholderStyle;
use crate::types::RowValues;

use session::Session;

pub const DEFAULT_CONFIG_FILE: &str = "dbconfig.conf";
pub const DEFAULT_CONFIG_SECTION: &str = "database";

/// What [`QueryFacade::run`] hands back for each request shape.
#[derive(Debug, Clone)]
pub enum Outcome {
    Rows(Vec<ResultRow>),
    Write(WriteOutcome),
    Deleted(usize),
    Create(CreateOutcome),
    Drop(DropOutcome),
}

/// Runs CRUD statements against the database named by one INI section.
///
/// The handle holds only the config file and section; every call reads the
/// profile afresh and opens its own connection.
/// ```rust,no_run
/// use sql_facade::prelude::*;
///
/// # fn demo() -> Result<(), FacadeError> {
/// let db = QueryFacade::new("dbconfig.conf", "warehouse").with_show_query(true);
/// db.insert(&InsertRequest::new("people").value("name", "Ann").value("age", 3))?;
/// let rows = db.select(&SelectRequest::new("people").filter(Filter::new("name = ?").param("Ann")))?;
/// assert_eq!(rows[0].get("age"), Some(&RowValues::Int(3)));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct QueryFacade<C: Connector = DefaultConnector> {
    config_file: PathBuf,
    section: String,
    show_query: bool,
    connector: C,
}

impl QueryFacade<DefaultConnector> {
    #[must_use]
    pub fn new(config_file: impl Into<PathBuf>, section: impl Into<String>) -> Self {
        Self::with_connector(config_file, section, DefaultConnector)
    }
}

impl Default for QueryFacade<DefaultConnector> {
    fn default() -> Self {
        Self::new(DEFAULT_CONFIG_FILE, DEFAULT_CONFIG_SECTION)
    }
}

impl<C: Connector> QueryFacade<C> {
    /// Use a custom [`Connector`] instead of the compiled-in drivers.
    #[must_use]
    pub fn with_connector(
        config_file: impl Into<PathBuf>,
        section: impl Into<String>,
        connector: C,
    ) -> Self {
        Self {
            config_file: config_file.into(),
            section: section.into(),
            show_query: false,
            connector,
        }
    }

    /// Log each statement's SQL at `info` rather than `debug`.
    #[must_use]
    pub fn with_show_query(mut self, show_query: bool) -> Self {
        self.show_query = show_query;
        self
    }

    #[must_use]
    pub fn config_file(&self) -> &Path {
        &self.config_file
    }

    pub fn set_config_file(&mut self, config_file: impl Into<PathBuf>) {
        self.config_file = config_file.into();
    }

    #[must_use]
    pub fn config_section(&self) -> &str {
        &self.section
    }

    pub fn set_config_section(&mut self, section: impl Into<String>) {
        self.section = section.into();
    }

    /// A copy of this handle pointed at another section; `self` is unchanged.
    #[must_use]
    pub fn for_section(&self, section: impl Into<String>) -> Self
    where
        C: Clone,
    {
        Self {
            section: section.into(),
            ..self.clone()
        }
    }

    #[must_use]
    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// Fetch rows; string values come back with surrounding spaces removed.
    ///
    /// # Errors
    /// Returns `FacadeError::TableNotFound` when the table is absent, plus any
    /// configuration, validation or driver error.
    pub fn select(&self, req: &SelectRequest) -> Result<Vec<ResultRow>, FacadeError> {
        self.run_op(
            "select",
            |style| Ok((TableName::parse(&req.table)?, query_builder::select(req, style)?)),
            |session, (table, stmt)| {
                if !session.table_exists(&table)? {
                    return Err(FacadeError::TableNotFound(table.to_string()));
                }
                let rs = session.query(&stmt)?;
                info!(rows = rs.results.len(), "fetched rows");
                Ok(rs
                    .results
                    .into_iter()
                    .map(|row| row.map_values(RowValues::trimmed))
                    .collect())
            },
        )
    }

    /// [`select`](Self::select) with every failure collapsed to an empty vector.
    ///
    /// The error is still logged, but callers cannot tell it from "no rows".
    #[must_use]
    pub fn select_or_empty(&self, req: &SelectRequest) -> Vec<ResultRow> {
        self.select(req).unwrap_or_default()
    }

    /// # Errors
    /// Returns configuration, validation or driver errors. A missing table is
    /// not an error.
    pub fn insert(&self, req: &InsertRequest) -> Result<WriteOutcome, FacadeError> {
        self.run_op(
            "insert",
            |style| Ok((TableName::parse(&req.table)?, query_builder::insert(req, style)?)),
            |session, (table, stmt)| write_if_present(session, &table, &stmt, "inserted"),
        )
    }

    /// # Errors
    /// Returns configuration, validation or driver errors. A missing table is
    /// not an error.
    pub fn update(&self, req: &UpdateRequest) -> Result<WriteOutcome, FacadeError> {
        self.run_op(
            "update",
            |style| Ok((TableName::parse(&req.table)?, query_builder::update(req, style)?)),
            |session, (table, stmt)| write_if_present(session, &table, &stmt, "updated"),
        )
    }

    /// Delete matching rows and return how many went.
    ///
    /// # Errors
    /// Returns `FacadeError::TableNotFound` (after rolling back) when the table
    /// is absent, plus any configuration, validation or driver error.
    pub fn delete(&self, req: &DeleteRequest) -> Result<usize, FacadeError> {
        self.run_op(
            "delete",
            |style| Ok((TableName::parse(&req.table)?, query_builder::delete(req, style)?)),
            |session, (table, stmt)| {
                if !session.table_exists(&table)? {
                    return Err(FacadeError::TableNotFound(table.to_string()));
                }
                let deleted = session.execute(&stmt)?;
                info!(rows = deleted, "deleted rows");
                Ok(deleted)
            },
        )
    }

    /// Create a table, or replace it when `overwrite` is set.
    ///
    /// # Errors
    /// Returns configuration, validation or driver errors.
    pub fn create_table(&self, req: &CreateTableRequest) -> Result<CreateOutcome, FacadeError> {
        self.run_op(
            "create_table",
            |_| {
                let table = TableName::parse(&req.table)?;
                let create = query_builder::create_table(req)?;
                let drop_stmt = query_builder::drop_table(&table);
                Ok((table, create, drop_stmt))
            },
            |session, (table, create, drop_stmt)| {
                let exists = session.table_exists(&table)?;
                match (exists, req.overwrite) {
                    (true, false) => {
                        warn!(
                            %table,
                            "table already exists; set overwrite to drop it and create a new one"
                        );
                        Ok(CreateOutcome::AlreadyExists)
                    }
                    (true, true) => {
                        info!(%table, "dropping table");
                        session.execute(&drop_stmt)?;
                        info!(%table, "creating table");
                        session.execute(&create)?;
                        Ok(CreateOutcome::Recreated)
                    }
                    (false, _) => {
                        info!(%table, "creating table");
                        session.execute(&create)?;
                        Ok(CreateOutcome::Created)
                    }
                }
            },
        )
    }

    /// # Errors
    /// Returns configuration, validation or driver errors. A missing table is
    /// not an error.
    pub fn drop_table(&self, req: &DropTableRequest) -> Result<DropOutcome, FacadeError> {
        self.run_op(
            "drop_table",
            |_| {
                let table = TableName::parse(&req.table)?;
                let stmt = query_builder::drop_table(&table);
                Ok((table, stmt))
            },
            |session, (table, stmt)| {
                if !session.table_exists(&table)? {
                    warn!(%table, "table doesn't exist");
                    return Ok(DropOutcome::Missing);
                }
                session.execute(&stmt)?;
                info!(%table, "dropped table");
                Ok(DropOutcome::Dropped)
            },
        )
    }

    /// Dispatch any request shape.
    ///
    /// # Errors
    /// Whatever the matching operation returns.
    pub fn run(&self, req: &Request) -> Result<Outcome, FacadeError> {
        match req {
            Request::Select(r) => self.select(r).map(Outcome::Rows),
            Request::Insert(r) => self.insert(r).map(Outcome::Write),
            Request::Update(r) => self.update(r).map(Outcome::Write),
            Request::Delete(r) => self.delete(r).map(Outcome::Deleted),
            Request::CreateTable(r) => self.create_table(r).map(Outcome::Create),
            Request::DropTable(r) => self.drop_table(r).map(Outcome::Drop),
        }
    }

    /// The shared skeleton. `prepare` validates and assembles statements
    /// before any connection is opened; `body` runs inside the transaction.
    fn run_op<P, T>(
        &self,
        op: &'static str,
        prepare: impl FnOnce(PlaceholderStyle) -> Result<P, FacadeError>,
        body: impl FnOnce(&mut Session, P) -> Result<T, FacadeError>,
    ) -> Result<T, FacadeError> {
        let started = Instant::now();
        let result = self.run_op_inner(op, started, prepare, body);
        if let Err(e) = &result {
            error!(op, error = %e, "operation failed");
        }
        result
    }

    fn run_op_inner<P, T>(
        &self,
        op: &'static str,
        started: Instant,
        prepare: impl FnOnce(PlaceholderStyle) -> Result<P, FacadeError>,
        body: impl FnOnce(&mut Session, P) -> Result<T, FacadeError>,
    ) -> Result<T, FacadeError> {
        let profile = resolve_profile(&self.config_file, &self.section)?;
        let kind = profile.driver_kind()?;
        let prepared = prepare(kind.placeholder_style())?;

        // a failed connect leaves nothing to release
        let conn = self.connector.connect(kind, &profile)?;
        let mut session = Session::new(conn, op, started, self.show_query);

        let result = body(&mut session, prepared).and_then(|value| {
            session.commit()?;
            Ok(value)
        });
        if result.is_err() {
            session.rollback();
        }
        drop(session);
        result
    }
}

fn write_if_present(
    session: &mut Session,
    table: &TableName,
    stmt: &Statement,
    verb: &'static str,
) -> Result<WriteOutcome, FacadeError> {
    if !session.table_exists(table)? {
        warn!(%table, "table doesn't exist");
        return Ok(WriteOutcome::TableMissing);
    }
    let rows_affected = session.execute(stmt)?;
    info!(rows = rows_affected, verb, "rows written");
    Ok(WriteOutcome::Applied { rows_affected })
}
