use super::{Statement, checked_filter};
use crate::error::FacadeError;
use crate::identifier::{self, TableName};
use crate::requests::{DeleteRequest, InsertRequest, UpdateRequest};
use crate::translation::PlaceholderStyle;
use crate::types::RowValues;

/// `INSERT INTO <table> (<cols>) VALUES (?, ..)` in insertion order.
///
/// # Errors
/// Returns `FacadeError::ParameterError` for an empty value list and
/// `FacadeError::InvalidIdentifier` for a bad table or column name.
pub fn insert(req: &InsertRequest, style: PlaceholderStyle) -> Result<Statement, FacadeError> {
    let table = TableName::parse(&req.table)?;
    let (columns, params) = split_values(&req.values, "insert")?;
    let markers = vec!["?"; columns.len()].join(", ");
    let sql = format!(
        "INSERT INTO {table} ({}) VALUES ({markers})",
        columns.join(", ")
    );
    Ok(Statement::finish(&sql, params, style))
}

/// `UPDATE <table> SET col = ?, .. WHERE <filter>`; SET values bind before filter values.
///
/// # Errors
/// Returns `FacadeError::ParameterError` for an empty value list or a filter whose
/// markers do not match its values, and `FacadeError::InvalidIdentifier` for bad names
/// or an empty filter.
pub fn update(req: &UpdateRequest, style: PlaceholderStyle) -> Result<Statement, FacadeError> {
    let table = TableName::parse(&req.table)?;
    let (columns, mut params) = split_values(&req.values, "update")?;
    let clause = checked_filter(&req.filter)?;
    let set_clause = columns
        .iter()
        .map(|c| format!("{c} = ?"))
        .collect::<Vec<_>>()
        .join(", ");
    params.extend(req.filter.params.iter().cloned());
    let sql = format!("UPDATE {table} SET {set_clause} WHERE {clause}");
    Ok(Statement::finish(&sql, params, style))
}

/// `DELETE FROM <table> WHERE <filter>`.
///
/// # Errors
/// Same filter and identifier checks as [`update`].
pub fn delete(req: &DeleteRequest, style: PlaceholderStyle) -> Result<Statement, FacadeError> {
    let table = TableName::parse(&req.table)?;
    let clause = checked_filter(&req.filter)?;
    let sql = format!("DELETE FROM {table} WHERE {clause}");
    Ok(Statement::finish(&sql, req.filter.params.clone(), style))
}

fn split_values<'a>(
    values: &'a [(String, RowValues)],
    op: &str,
) -> Result<(Vec<&'a str>, Vec<RowValues>), FacadeError> {
    if values.is_empty() {
        return Err(FacadeError::ParameterError(format!(
            "{op} needs at least one column value"
        )));
    }
    let mut columns = Vec::with_capacity(values.len());
    let mut params = Vec::with_capacity(values.len());
    for (column, value) in values {
        columns.push(identifier::column_name(column)?);
        params.push(value.clone());
    }
    Ok((columns, params))
}
