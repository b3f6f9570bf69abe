use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde_json::Value;
use tokio_postgres::Row;

use crate::error::FacadeError;
use crate::results::ResultSet;
use crate::types::RowValues;

/// Extract the value at `idx` of a `tokio_postgres` row by its column type.
///
/// # Errors
/// Returns `FacadeError::ExecutionError` if the column type has no `RowValues`
/// mapping, or the driver error if decoding fails.
pub fn postgres_extract_value(row: &Row, idx: usize) -> Result<RowValues, FacadeError> {
    let type_info = row.columns()[idx].type_();

    match type_info.name() {
        "int2" => {
            let val: Option<i16> = row.try_get(idx)?;
            Ok(val.map_or(RowValues::Null, |v| RowValues::Int(i64::from(v))))
        }
        "int4" => {
            let val: Option<i32> = row.try_get(idx)?;
            Ok(val.map_or(RowValues::Null, |v| RowValues::Int(i64::from(v))))
        }
        "int8" => {
            let val: Option<i64> = row.try_get(idx)?;
            Ok(val.map_or(RowValues::Null, RowValues::Int))
        }
        "float4" => {
            let val: Option<f32> = row.try_get(idx)?;
            Ok(val.map_or(RowValues::Null, |v| RowValues::Float(f64::from(v))))
        }
        "float8" => {
            let val: Option<f64> = row.try_get(idx)?;
            Ok(val.map_or(RowValues::Null, RowValues::Float))
        }
        "numeric" => {
            let val: Option<Decimal> = row.try_get(idx)?;
            Ok(val.map_or(RowValues::Null, numeric_value))
        }
        "bool" => {
            let val: Option<bool> = row.try_get(idx)?;
            Ok(val.map_or(RowValues::Null, RowValues::Bool))
        }
        "timestamp" => {
            let val: Option<NaiveDateTime> = row.try_get(idx)?;
            Ok(val.map_or(RowValues::Null, RowValues::Timestamp))
        }
        "timestamptz" => {
            let val: Option<DateTime<Utc>> = row.try_get(idx)?;
            Ok(val.map_or(RowValues::Null, |v| RowValues::Timestamp(v.naive_utc())))
        }
        "date" => {
            let val: Option<NaiveDate> = row.try_get(idx)?;
            Ok(val
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map_or(RowValues::Null, RowValues::Timestamp))
        }
        "json" | "jsonb" => {
            let val: Option<Value> = row.try_get(idx)?;
            Ok(val.map_or(RowValues::Null, RowValues::JSON))
        }
        "bytea" => {
            let val: Option<Vec<u8>> = row.try_get(idx)?;
            Ok(val.map_or(RowValues::Null, RowValues::Blob))
        }
        "text" | "varchar" | "bpchar" | "name" | "unknown" => {
            let val: Option<String> = row.try_get(idx)?;
            Ok(val.map_or(RowValues::Null, RowValues::Text))
        }
        other => {
            // enums, citext and friends still decode as text
            let val: Option<String> = row.try_get(idx).map_err(|e| {
                FacadeError::ExecutionError(format!(
                    "column {} has unsupported type {other} (cast it with `::text` in the select list): {e}",
                    row.columns()[idx].name()
                ))
            })?;
            Ok(val.map_or(RowValues::Null, RowValues::Text))
        }
    }
}

/// `numeric` comes back as a float when it fits, otherwise as its exact text.
fn numeric_value(d: Decimal) -> RowValues {
    match d.to_f64() {
        Some(f) if f.is_finite() => RowValues::Float(f),
        _ => RowValues::Text(d.to_string()),
    }
}

/// Build a result set from raw rows; column names come from the first row.
///
/// An empty result keeps no column names, which callers treat as "no rows".
///
/// # Errors
/// Returns errors from value extraction.
pub fn build_result_set_from_rows(rows: &[Row]) -> Result<ResultSet, FacadeError> {
    let mut result_set = ResultSet::with_capacity(rows.len());
    if let Some(row) = rows.first() {
        let cols: Vec<String> = row.columns().iter().map(|c| c.name().to_string()).collect();
        result_set.set_column_names(Arc::new(cols));
    }

    for row in rows {
        let col_count = row.columns().len();
        let mut row_values = Vec::with_capacity(col_count);
        for idx in 0..col_count {
            row_values.push(postgres_extract_value(row, idx)?);
        }
        result_set.add_row_values(row_values);
    }

    Ok(result_set)
}
