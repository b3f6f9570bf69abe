use chrono::{NaiveDate, NaiveDateTime};
use odbc_api::DataType;
use odbc_api::parameter::{InputParameter, VarBinaryBox, VarCharBox};
use odbc_api::{Bit, IntoParameter};

use crate::types::RowValues;

/// Box each value as an ODBC input parameter.
///
/// Timestamps and JSON travel as text; drivers convert them on the server side.
#[must_use]
pub fn to_parameters(params: &[RowValues]) -> Vec<Box<dyn InputParameter>> {
    params
        .iter()
        .map(|value| -> Box<dyn InputParameter> {
            match value {
                RowValues::Int(i) => Box::new(*i),
                RowValues::Float(f) => Box::new(*f),
                RowValues::Text(s) => Box::new(s.clone().into_parameter()),
                RowValues::Bool(b) => Box::new(Bit::from_bool(*b)),
                RowValues::Timestamp(dt) => Box::new(
                    dt.format("%Y-%m-%d %H:%M:%S%.f")
                        .to_string()
                        .into_parameter(),
                ),
                RowValues::Null => Box::new(VarCharBox::null()),
                RowValues::JSON(v) => Box::new(v.to_string().into_parameter()),
                RowValues::Blob(bytes) => Box::new(VarBinaryBox::from_vec(bytes.clone())),
            }
        })
        .collect()
}

/// How a result column's text form is turned back into a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnClass {
    Integer,
    Float,
    Bit,
    Timestamp,
    Date,
    Text,
}

impl From<DataType> for ColumnClass {
    fn from(data_type: DataType) -> Self {
        match data_type {
            DataType::TinyInt | DataType::SmallInt | DataType::Integer | DataType::BigInt => {
                ColumnClass::Integer
            }
            DataType::Real | DataType::Double | DataType::Float { .. } => ColumnClass::Float,
            DataType::Bit => ColumnClass::Bit,
            DataType::Timestamp { .. } => ColumnClass::Timestamp,
            DataType::Date => ColumnClass::Date,
            _ => ColumnClass::Text,
        }
    }
}

/// Convert one fetched cell. Text that does not parse as its column class is
/// kept as text rather than dropped.
#[must_use]
pub fn value_from_text(class: ColumnClass, text: &str) -> RowValues {
    let parsed = match class {
        ColumnClass::Integer => text.trim().parse::<i64>().ok().map(RowValues::Int),
        ColumnClass::Float => text.trim().parse::<f64>().ok().map(RowValues::Float),
        ColumnClass::Bit => match text.trim() {
            "1" => Some(RowValues::Bool(true)),
            "0" => Some(RowValues::Bool(false)),
            _ => None,
        },
        ColumnClass::Timestamp => ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"]
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(text.trim(), fmt).ok())
            .map(RowValues::Timestamp),
        ColumnClass::Date => NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(RowValues::Timestamp),
        ColumnClass::Text => None,
    };
    parsed.unwrap_or_else(|| RowValues::Text(text.to_string()))
}
