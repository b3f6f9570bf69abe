use std::fmt::Write;

use super::{Statement, checked_filter};
use crate::error::FacadeError;
use crate::identifier::{self, TableName};
use crate::requests::SelectRequest;
use crate::translation::PlaceholderStyle;

/// `SELECT <list> FROM <table> [WHERE ..] [GROUP BY ..] [ORDER BY ..] [LIMIT n]`.
///
/// Clauses always appear in that order; blank optional fragments are skipped.
///
/// # Errors
/// Returns `FacadeError::InvalidIdentifier` or `FacadeError::ParameterError` when a
/// fragment fails validation.
pub fn select(req: &SelectRequest, style: PlaceholderStyle) -> Result<Statement, FacadeError> {
    let table = TableName::parse(&req.table)?;
    let select_list = match non_blank(req.select.as_deref()) {
        Some(list) => identifier::select_list(list)?,
        None => "*".to_string(),
    };

    let mut sql = format!("SELECT {select_list} FROM {table}");
    let mut params = Vec::new();

    if let Some(filter) = req.filter.as_ref().filter(|f| !f.clause.trim().is_empty()) {
        let clause = checked_filter(filter)?;
        sql.push_str(" WHERE ");
        sql.push_str(clause);
        params.extend(filter.params.iter().cloned());
    }
    if let Some(group_by) = non_blank(req.group_by.as_deref()) {
        sql.push_str(" GROUP BY ");
        sql.push_str(&identifier::group_by_list(group_by)?);
    }
    if let Some(order_by) = non_blank(req.order_by.as_deref()) {
        sql.push_str(" ORDER BY ");
        sql.push_str(&identifier::order_by_list(order_by)?);
    }
    if let Some(limit) = req.limit {
        let _ = write!(sql, " LIMIT {limit}");
    }

    Ok(Statement::finish(&sql, params, style))
}

fn non_blank(fragment: Option<&str>) -> Option<&str> {
    fragment.filter(|s| !s.trim().is_empty())
}
