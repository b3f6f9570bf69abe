use super::Statement;
use crate::error::FacadeError;
use crate::identifier::{self, TableName};
use crate::requests::CreateTableRequest;

/// `CREATE TABLE <table> (<col> <spec>, ..)` in declaration order.
///
/// # Errors
/// Returns `FacadeError::ParameterError` when no columns are given and
/// `FacadeError::InvalidIdentifier` for bad names or type specs.
pub fn create_table(req: &CreateTableRequest) -> Result<Statement, FacadeError> {
    let table = TableName::parse(&req.table)?;
    if req.columns.is_empty() {
        return Err(FacadeError::ParameterError(format!(
            "create table {table} needs at least one column"
        )));
    }
    let mut definitions = Vec::with_capacity(req.columns.len());
    for (name, spec) in &req.columns {
        let name = identifier::column_name(name)?;
        let spec = identifier::column_type_spec(spec)?;
        definitions.push(format!("{name} {spec}"));
    }
    Ok(Statement {
        sql: format!("CREATE TABLE {table} ({})", definitions.join(", ")),
        params: Vec::new(),
    })
}

/// `DROP TABLE <table>`.
#[must_use]
pub fn drop_table(table: &TableName) -> Statement {
    Statement {
        sql: format!("DROP TABLE {table}"),
        params: Vec::new(),
    }
}
