#![allow(dead_code)]

use std::collections::BTreeSet;
use std::io::Write;
use std::sync::{Arc, Mutex, MutexGuard};

use sql_facade::prelude::*;
use tempfile::NamedTempFile;

/// Everything a fake connection did, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Connect(DriverKind),
    Query(String, Vec<RowValues>),
    Execute(String, Vec<RowValues>),
    Commit,
    Rollback,
    Close,
}

#[derive(Debug, Default)]
pub struct FakeState {
    pub tables: BTreeSet<String>,
    pub rows: Vec<(Vec<String>, Vec<Vec<RowValues>>)>,
    pub affected: usize,
    pub fail_connect: bool,
    pub fail_execute_containing: Option<String>,
    pub fail_commit: bool,
    pub panic_on_execute: bool,
    pub events: Vec<Event>,
}

/// A [`Connector`] that records every call and answers from canned state.
///
/// Catalog queries answer from `tables`; `CREATE TABLE` and `DROP TABLE`
/// update it. Any other query returns the next canned row set.
#[derive(Debug, Clone, Default)]
pub struct FakeConnector {
    pub state: Arc<Mutex<FakeState>>,
}

impl FakeConnector {
    pub fn with_tables(tables: &[&str]) -> Self {
        let fake = Self::default();
        fake.lock()
            .tables
            .extend(tables.iter().map(|t| t.to_lowercase()));
        fake
    }

    pub fn lock(&self) -> MutexGuard<'_, FakeState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn push_rows(&self, columns: &[&str], rows: Vec<Vec<RowValues>>) {
        self.lock()
            .rows
            .push((columns.iter().map(ToString::to_string).collect(), rows));
    }

    pub fn events(&self) -> Vec<Event> {
        self.lock().events.clone()
    }

    pub fn count(&self, wanted: &Event) -> usize {
        self.events().iter().filter(|e| *e == wanted).count()
    }

    /// SQL of every statement other than catalog lookups.
    pub fn statements(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Query(sql, _) | Event::Execute(sql, _)
                    if !sql.contains("information_schema") =>
                {
                    Some(sql)
                }
                _ => None,
            })
            .collect()
    }
}

impl Connector for FakeConnector {
    fn connect(
        &self,
        kind: DriverKind,
        _profile: &ConnectionProfile,
    ) -> Result<Box<dyn DriverConnection>, FacadeError> {
        let mut state = self.lock();
        state.events.push(Event::Connect(kind));
        if state.fail_connect {
            return Err(FacadeError::ConnectionError("refused".into()));
        }
        Ok(Box::new(FakeConnection {
            kind,
            state: Arc::clone(&self.state),
        }))
    }
}

struct FakeConnection {
    kind: DriverKind,
    state: Arc<Mutex<FakeState>>,
}

impl FakeConnection {
    fn lock(&self) -> MutexGuard<'_, FakeState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

fn table_after(sql: &str, keyword: &str) -> Option<String> {
    let rest = sql.strip_prefix(keyword)?;
    rest.split(|c: char| c.is_whitespace() || c == '(')
        .find(|s| !s.is_empty())
        .map(str::to_lowercase)
}

impl DriverConnection for FakeConnection {
    fn kind(&self) -> DriverKind {
        self.kind
    }

    fn query(&mut self, sql: &str, params: &[RowValues]) -> Result<ResultSet, FacadeError> {
        let mut state = self.lock();
        state.events.push(Event::Query(sql.to_string(), params.to_vec()));

        let mut rs = ResultSet::default();
        if sql.contains("information_schema.tables") {
            let name = params
                .first()
                .and_then(RowValues::as_text)
                .map(str::to_lowercase)
                .unwrap_or_default();
            let qualified = params
                .get(1)
                .and_then(RowValues::as_text)
                .map(|schema| format!("{}.{name}", schema.to_lowercase()));
            let found = state.tables.contains(&name)
                || qualified.is_some_and(|q| state.tables.contains(&q));
            rs.set_column_names(Arc::new(vec!["table_count".to_string()]));
            rs.add_row_values(vec![RowValues::Int(i64::from(found))]);
            return Ok(rs);
        }

        if !state.rows.is_empty() {
            let (columns, rows) = state.rows.remove(0);
            rs.set_column_names(Arc::new(columns));
            for row in rows {
                rs.add_row_values(row);
            }
        }
        Ok(rs)
    }

    fn execute(&mut self, sql: &str, params: &[RowValues]) -> Result<usize, FacadeError> {
        let mut state = self.lock();
        state.events.push(Event::Execute(sql.to_string(), params.to_vec()));
        if state.panic_on_execute {
            drop(state);
            panic!("driver blew up");
        }
        if let Some(needle) = &state.fail_execute_containing {
            if sql.contains(needle.as_str()) {
                return Err(FacadeError::ExecutionError(format!("rejected: {sql}")));
            }
        }
        if let Some(t) = table_after(sql, "CREATE TABLE ") {
            state.tables.insert(t);
            return Ok(0);
        }
        if let Some(t) = table_after(sql, "DROP TABLE ") {
            state.tables.remove(&t);
            return Ok(0);
        }
        Ok(state.affected)
    }

    fn commit(&mut self) -> Result<(), FacadeError> {
        let mut state = self.lock();
        state.events.push(Event::Commit);
        if state.fail_commit {
            return Err(FacadeError::ExecutionError("commit refused".into()));
        }
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), FacadeError> {
        self.lock().events.push(Event::Rollback);
        Ok(())
    }

    fn close(self: Box<Self>) -> Result<(), FacadeError> {
        self.lock().events.push(Event::Close);
        Ok(())
    }
}

/// INI text written to a temp file that lives as long as the handle.
pub fn ini_file(text: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp file");
    file.write_all(text.as_bytes()).expect("write ini");
    file.flush().expect("flush ini");
    file
}

pub const POSTGRES_INI: &str = "\
[database]
host = db-postgres.internal
user = app
password = secret
dbname = app

[legacy]
host = mssql01.internal
driver = {ODBC Driver 18 for SQL Server}
";

/// A façade over the fake connector, pointed at `[database]` of `ini`.
pub fn facade(ini: &NamedTempFile, fake: &FakeConnector) -> QueryFacade<FakeConnector> {
    QueryFacade::with_connector(ini.path(), "database", fake.clone())
}
