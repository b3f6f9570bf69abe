use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{Map, Value as JsonValue};

use crate::types::RowValues;

/// A row returned by a select.
///
/// Column names are shared by every row of the same result set, so a row is
/// little more than its values plus a pointer to the shared name index.
#[derive(Debug, Clone)]
pub struct ResultRow {
    column_names: Arc<Vec<String>>,
    column_index: Arc<HashMap<String, usize>>,
    values: Vec<RowValues>,
}

impl ResultRow {
    /// Build a standalone row, indexing its column names.
    #[must_use]
    pub fn new(column_names: Arc<Vec<String>>, values: Vec<RowValues>) -> Self {
        let column_index = Arc::new(build_index(&column_names));
        Self {
            column_names,
            column_index,
            values,
        }
    }

    /// Value of the named column.
    #[must_use]
    pub fn get(&self, column_name: &str) -> Option<&RowValues> {
        let idx = self
            .column_index
            .get(column_name)
            .copied()
            .or_else(|| {
                self.column_names
                    .iter()
                    .position(|col| col.eq_ignore_ascii_case(column_name))
            })?;
        self.values.get(idx)
    }

    #[must_use]
    pub fn get_by_index(&self, index: usize) -> Option<&RowValues> {
        self.values.get(index)
    }

    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.column_names
    }

    #[must_use]
    pub fn values(&self) -> &[RowValues] {
        &self.values
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Column/value pairs in select-list order.
    #[must_use]
    pub fn into_pairs(self) -> Vec<(String, RowValues)> {
        self.column_names
            .iter()
            .cloned()
            .zip(self.values)
            .collect()
    }

    /// The row as a JSON object keyed by column name.
    #[must_use]
    pub fn to_json(&self) -> JsonValue {
        let mut map = Map::with_capacity(self.values.len());
        for (name, value) in self.column_names.iter().zip(&self.values) {
            map.insert(name.clone(), value.to_json());
        }
        JsonValue::Object(map)
    }

    pub(crate) fn map_values(self, f: impl Fn(RowValues) -> RowValues) -> Self {
        Self {
            column_names: self.column_names,
            column_index: self.column_index,
            values: self.values.into_iter().map(f).collect(),
        }
    }
}

/// Rows produced by a driver for one statement.
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    /// The rows returned by the query
    pub results: Vec<ResultRow>,
    /// Rows fetched (selects) or reported by the driver
    pub rows_affected: usize,
    column_names: Option<Arc<Vec<String>>>,
    column_index: Option<Arc<HashMap<String, usize>>>,
}

impl ResultSet {
    #[must_use]
    pub fn with_capacity(capacity: usize) -> ResultSet {
        ResultSet {
            results: Vec::with_capacity(capacity),
            ..ResultSet::default()
        }
    }

    /// Set the column names shared by every row added afterwards.
    pub fn set_column_names(&mut self, column_names: Arc<Vec<String>>) {
        self.column_index = Some(Arc::new(build_index(&column_names)));
        self.column_names = Some(column_names);
    }

    #[must_use]
    pub fn get_column_names(&self) -> Option<&Arc<Vec<String>>> {
        self.column_names.as_ref()
    }

    /// Append a row; ignored until column names are known.
    pub fn add_row_values(&mut self, values: Vec<RowValues>) {
        if let (Some(column_names), Some(column_index)) = (&self.column_names, &self.column_index)
        {
            self.results.push(ResultRow {
                column_names: Arc::clone(column_names),
                column_index: Arc::clone(column_index),
                values,
            });
            self.rows_affected += 1;
        }
    }

    /// First value of the first row, if any.
    #[must_use]
    pub fn scalar(&self) -> Option<&RowValues> {
        self.results.first().and_then(|row| row.get_by_index(0))
    }
}

fn build_index(column_names: &[String]) -> HashMap<String, usize> {
    let mut index = HashMap::with_capacity(column_names.len());
    for (i, name) in column_names.iter().enumerate() {
        // first occurrence wins for duplicate names
        index.entry(name.clone()).or_insert(i);
    }
    index
}
