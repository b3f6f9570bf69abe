//! The six request shapes the façade accepts.
//!
//! Requests are plain values built fluently; nothing is validated until the
//! statement is assembled, so a request can be built once and replayed.
//! ```rust
//! use sql_facade::prelude::*;
//!
//! let req = SelectRequest::new("people")
//!     .columns("name, age")
//!     .filter(Filter::new("age > ? AND city = ?").param(12).param("Lima"))
//!     .order_by("name ASC")
//!     .limit(10);
//! assert_eq!(req.limit, Some(10));
//! ```

use serde::Serialize;

use crate::types::RowValues;

/// Free-form WHERE text with `?` markers and the values bound to them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    pub clause: String,
    pub params: Vec<RowValues>,
}

impl Filter {
    #[must_use]
    pub fn new(clause: impl Into<String>) -> Self {
        Self {
            clause: clause.into(),
            params: Vec::new(),
        }
    }

    /// Bind the next `?` of the clause.
    #[must_use]
    pub fn param(mut self, value: impl Into<RowValues>) -> Self {
        self.params.push(value.into());
        self
    }

    #[must_use]
    pub fn params(mut self, values: impl IntoIterator<Item = RowValues>) -> Self {
        self.params.extend(values);
        self
    }
}

impl From<&str> for Filter {
    fn from(clause: &str) -> Self {
        Filter::new(clause)
    }
}

impl From<String> for Filter {
    fn from(clause: String) -> Self {
        Filter::new(clause)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectRequest {
    pub table: String,
    /// Select list; `*` when absent.
    pub select: Option<String>,
    pub filter: Option<Filter>,
    pub group_by: Option<String>,
    pub order_by: Option<String>,
    pub limit: Option<u64>,
}

impl SelectRequest {
    #[must_use]
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn columns(mut self, select: impl Into<String>) -> Self {
        self.select = Some(select.into());
        self
    }

    #[must_use]
    pub fn filter(mut self, filter: impl Into<Filter>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    #[must_use]
    pub fn group_by(mut self, group_by: impl Into<String>) -> Self {
        self.group_by = Some(group_by.into());
        self
    }

    #[must_use]
    pub fn order_by(mut self, order_by: impl Into<String>) -> Self {
        self.order_by = Some(order_by.into());
        self
    }

    #[must_use]
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Column/value pairs kept in insertion order; setting a column twice keeps
/// its first position and the last value.
fn upsert(values: &mut Vec<(String, RowValues)>, column: String, value: RowValues) {
    if let Some(slot) = values.iter_mut().find(|(c, _)| *c == column) {
        slot.1 = value;
    } else {
        values.push((column, value));
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct InsertRequest {
    pub table: String,
    pub values: Vec<(String, RowValues)>,
}

impl InsertRequest {
    #[must_use]
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            values: Vec::new(),
        }
    }

    #[must_use]
    pub fn value(mut self, column: impl Into<String>, value: impl Into<RowValues>) -> Self {
        upsert(&mut self.values, column.into(), value.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateRequest {
    pub table: String,
    pub values: Vec<(String, RowValues)>,
    pub filter: Filter,
}

impl UpdateRequest {
    #[must_use]
    pub fn new(table: impl Into<String>, filter: impl Into<Filter>) -> Self {
        Self {
            table: table.into(),
            values: Vec::new(),
            filter: filter.into(),
        }
    }

    #[must_use]
    pub fn set(mut self, column: impl Into<String>, value: impl Into<RowValues>) -> Self {
        upsert(&mut self.values, column.into(), value.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeleteRequest {
    pub table: String,
    pub filter: Filter,
}

impl DeleteRequest {
    #[must_use]
    pub fn new(table: impl Into<String>, filter: impl Into<Filter>) -> Self {
        Self {
            table: table.into(),
            filter: filter.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateTableRequest {
    pub table: String,
    /// Column name and its full type spec, e.g. `("id", "serial PRIMARY KEY")`.
    pub columns: Vec<(String, String)>,
    /// Drop and recreate an existing table of the same name.
    pub overwrite: bool,
}

impl CreateTableRequest {
    #[must_use]
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn column(mut self, name: impl Into<String>, type_spec: impl Into<String>) -> Self {
        let name = name.into();
        let type_spec = type_spec.into();
        if let Some(slot) = self.columns.iter_mut().find(|(c, _)| *c == name) {
            slot.1 = type_spec;
        } else {
            self.columns.push((name, type_spec));
        }
        self
    }

    #[must_use]
    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DropTableRequest {
    pub table: String,
}

impl DropTableRequest {
    #[must_use]
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
        }
    }
}

/// Any one of the six operations.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    Select(SelectRequest),
    Insert(InsertRequest),
    Update(UpdateRequest),
    Delete(DeleteRequest),
    CreateTable(CreateTableRequest),
    DropTable(DropTableRequest),
}

/// Result of an insert or update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum WriteOutcome {
    Applied { rows_affected: usize },
    /// The table was absent; nothing ran and the transaction still committed.
    TableMissing,
}

impl WriteOutcome {
    #[must_use]
    pub fn rows_affected(self) -> usize {
        match self {
            WriteOutcome::Applied { rows_affected } => rows_affected,
            WriteOutcome::TableMissing => 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CreateOutcome {
    Created,
    /// An existing table was dropped and created again.
    Recreated,
    /// The table existed and `overwrite` was off; no DDL ran.
    AlreadyExists,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DropOutcome {
    Dropped,
    Missing,
}
