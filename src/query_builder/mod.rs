//! Statement assembly.
//!
//! Builders validate every identifier and fragment, emit `?` markers for all
//! values, and render the markers for the target driver in one final pass.

mod ddl;
mod dml;
mod select;

pub use ddl::{create_table, drop_table};
pub use dml::{delete, insert, update};
pub use select::select;

use crate::error::FacadeError;
use crate::identifier::{self, TableName};
use crate::requests::Filter;
use crate::translation::{PlaceholderStyle, render_placeholders, scan_placeholders};
use crate::types::RowValues;

/// SQL text ready for a driver, and the values bound to it in order.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<RowValues>,
}

impl Statement {
    fn finish(sql: &str, params: Vec<RowValues>, style: PlaceholderStyle) -> Self {
        Self {
            sql: render_placeholders(sql, style).into_owned(),
            params,
        }
    }
}

/// Catalog lookup behind every operation's existence check.
///
/// Names compare case-insensitively; a schema-qualified name also pins the schema.
#[must_use]
pub fn table_exists(table: &TableName, style: PlaceholderStyle) -> Statement {
    let mut sql = String::from(
        "SELECT COUNT(*) AS table_count FROM information_schema.tables WHERE LOWER(table_name) = LOWER(?)",
    );
    let mut params = vec![RowValues::Text(table.table().to_string())];
    if let Some(schema) = table.schema() {
        sql.push_str(" AND LOWER(table_schema) = LOWER(?)");
        params.push(RowValues::Text(schema.to_string()));
    }
    Statement::finish(&sql, params, style)
}

/// Validate a filter and check its markers line up with its values.
fn checked_filter(filter: &Filter) -> Result<&str, FacadeError> {
    let clause = identifier::filter_clause(&filter.clause)?;
    let markers = scan_placeholders(clause).markers;
    if markers != filter.params.len() {
        return Err(FacadeError::ParameterError(format!(
            "filter `{clause}` has {markers} placeholder(s) but {} value(s)",
            filter.params.len()
        )));
    }
    Ok(clause)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn existence_check_for_plain_and_qualified_names() {
        let plain = table_exists(&TableName::parse("People").unwrap(), PlaceholderStyle::Postgres);
        assert_eq!(
            plain.sql,
            "SELECT COUNT(*) AS table_count FROM information_schema.tables WHERE LOWER(table_name) = LOWER($1)"
        );
        assert_eq!(plain.params, vec![RowValues::Text("People".into())]);

        let qualified =
            table_exists(&TableName::parse("hr.people").unwrap(), PlaceholderStyle::Odbc);
        assert!(qualified.sql.ends_with("AND LOWER(table_schema) = LOWER(?)"));
        assert_eq!(qualified.params.len(), 2);
    }

    #[test]
    fn filter_marker_count_must_match() {
        let filter = Filter::new("a = ? AND b = ?").param(1);
        assert!(matches!(
            checked_filter(&filter),
            Err(FacadeError::ParameterError(_))
        ));
        assert!(checked_filter(&Filter::new("a = '?'")).is_ok());
    }
}
