use std::error::Error;
use std::fmt::Display;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde_json::Value;
use tokio_postgres::types::{IsNull, ToSql, Type, to_sql_checked};
use tokio_util::bytes::BytesMut;

use crate::types::RowValues;

type BindResult = Result<IsNull, Box<dyn Error + Sync + Send>>;

const TIMESTAMP_FORMATS: [&str; 3] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Borrow a parameter slice the way `tokio_postgres` wants it.
#[must_use]
pub fn as_refs(params: &[RowValues]) -> Vec<&(dyn ToSql + Sync)> {
    params.iter().map(|p| p as &(dyn ToSql + Sync)).collect()
}

/// Values are converted to the parameter type the server inferred, so a
/// text literal bound to an `int4` column is parsed, never written raw.
impl ToSql for RowValues {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> BindResult {
        match self {
            RowValues::Int(i) => bind_int(*i, ty, out),
            RowValues::Float(f) => bind_float(*f, ty, out),
            RowValues::Text(s) => bind_text(s, ty, out),
            RowValues::Bool(b) => match *ty {
                Type::BOOL => (*b).to_sql(ty, out),
                _ if is_text(ty) => b.to_string().to_sql(ty, out),
                _ => Err(mismatch("bool", ty)),
            },
            RowValues::Timestamp(dt) => bind_timestamp(dt, ty, out),
            RowValues::Null => Ok(IsNull::Yes),
            RowValues::JSON(jsval) => match *ty {
                Type::JSON | Type::JSONB => jsval.to_sql(ty, out),
                _ if is_text(ty) => match jsval {
                    Value::String(s) => s.to_sql(ty, out),
                    other => other.to_string().to_sql(ty, out),
                },
                _ => Err(mismatch("json", ty)),
            },
            RowValues::Blob(bytes) => match *ty {
                Type::BYTEA => bytes.to_sql(ty, out),
                _ => Err(mismatch("blob", ty)),
            },
        }
    }

    fn accepts(ty: &Type) -> bool {
        matches!(
            *ty,
            Type::INT2
                | Type::INT4
                | Type::INT8
                | Type::FLOAT4
                | Type::FLOAT8
                | Type::NUMERIC
                | Type::TEXT
                | Type::VARCHAR
                | Type::BPCHAR
                | Type::NAME
                | Type::BOOL
                | Type::TIMESTAMP
                | Type::TIMESTAMPTZ
                | Type::DATE
                | Type::JSON
                | Type::JSONB
                | Type::BYTEA
        )
    }

    to_sql_checked!();
}

fn is_text(ty: &Type) -> bool {
    matches!(*ty, Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME)
}

fn mismatch(what: &str, ty: &Type) -> Box<dyn Error + Sync + Send> {
    format!("cannot bind a {what} value to a {ty} parameter").into()
}

fn parse_as<T>(s: &str, ty: &Type) -> Result<T, Box<dyn Error + Sync + Send>>
where
    T: FromStr,
    T::Err: Display,
{
    s.trim()
        .parse::<T>()
        .map_err(|e| format!("cannot bind `{s}` to a {ty} parameter: {e}").into())
}

// a bare i64 would write 8 bytes into an int4, so narrow to the column's width
fn bind_int(i: i64, ty: &Type, out: &mut BytesMut) -> BindResult {
    match *ty {
        Type::INT2 => i16::try_from(i)?.to_sql(ty, out),
        Type::INT4 => i32::try_from(i)?.to_sql(ty, out),
        Type::INT8 => i.to_sql(ty, out),
        #[allow(clippy::cast_precision_loss)]
        Type::FLOAT4 => (i as f32).to_sql(ty, out),
        #[allow(clippy::cast_precision_loss)]
        Type::FLOAT8 => (i as f64).to_sql(ty, out),
        Type::NUMERIC => Decimal::from(i).to_sql(ty, out),
        _ if is_text(ty) => i.to_string().to_sql(ty, out),
        _ => Err(mismatch("integer", ty)),
    }
}

fn bind_float(f: f64, ty: &Type, out: &mut BytesMut) -> BindResult {
    match *ty {
        #[allow(clippy::cast_possible_truncation)]
        Type::FLOAT4 => (f as f32).to_sql(ty, out),
        Type::FLOAT8 => f.to_sql(ty, out),
        Type::NUMERIC => Decimal::try_from(f)?.to_sql(ty, out),
        Type::INT2 | Type::INT4 | Type::INT8 => {
            #[allow(clippy::cast_precision_loss)]
            let in_range = f >= i64::MIN as f64 && f < i64::MAX as f64;
            if f.fract() != 0.0 || !in_range {
                return Err(
                    format!("cannot bind {f} to a {ty} parameter without losing digits").into(),
                );
            }
            #[allow(clippy::cast_possible_truncation)]
            let whole = f as i64;
            bind_int(whole, ty, out)
        }
        _ if is_text(ty) => f.to_string().to_sql(ty, out),
        _ => Err(mismatch("float", ty)),
    }
}

fn bind_text(s: &str, ty: &Type, out: &mut BytesMut) -> BindResult {
    match *ty {
        Type::INT2 => parse_as::<i16>(s, ty)?.to_sql(ty, out),
        Type::INT4 => parse_as::<i32>(s, ty)?.to_sql(ty, out),
        Type::INT8 => parse_as::<i64>(s, ty)?.to_sql(ty, out),
        Type::FLOAT4 => parse_as::<f32>(s, ty)?.to_sql(ty, out),
        Type::FLOAT8 => parse_as::<f64>(s, ty)?.to_sql(ty, out),
        Type::NUMERIC => parse_as::<Decimal>(s, ty)?.to_sql(ty, out),
        Type::BOOL => parse_bool(s)
            .ok_or_else(|| mismatch(&format!("`{s}`"), ty))?
            .to_sql(ty, out),
        Type::DATE => parse_date(s)
            .ok_or_else(|| mismatch(&format!("`{s}`"), ty))?
            .to_sql(ty, out),
        Type::TIMESTAMP => parse_datetime(s)
            .ok_or_else(|| mismatch(&format!("`{s}`"), ty))?
            .to_sql(ty, out),
        Type::TIMESTAMPTZ => parse_datetime_utc(s)
            .ok_or_else(|| mismatch(&format!("`{s}`"), ty))?
            .to_sql(ty, out),
        Type::JSON | Type::JSONB => serde_json::from_str::<Value>(s)?.to_sql(ty, out),
        Type::BYTEA => s.as_bytes().to_sql(ty, out),
        _ if is_text(ty) => s.to_sql(ty, out),
        _ => Err(mismatch("text", ty)),
    }
}

fn bind_timestamp(dt: &NaiveDateTime, ty: &Type, out: &mut BytesMut) -> BindResult {
    match *ty {
        Type::TIMESTAMP => dt.to_sql(ty, out),
        Type::TIMESTAMPTZ => dt.and_utc().to_sql(ty, out),
        Type::DATE => dt.date().to_sql(ty, out),
        _ if is_text(ty) => dt.format(TIMESTAMP_FORMATS[0]).to_string().to_sql(ty, out),
        _ => Err(mismatch("timestamp", ty)),
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" | "t" | "yes" | "y" | "on" | "1" => Some(true),
        "false" | "f" | "no" | "n" | "off" | "0" => Some(false),
        _ => None,
    }
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .or_else(|| parse_datetime(s).map(|dt| dt.date()))
}

fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

// offsets are honoured; a bare timestamp is taken as UTC
fn parse_datetime_utc(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    DateTime::parse_from_rfc3339(s)
        .or_else(|_| DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f%#z"))
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| parse_datetime(s).map(|dt| dt.and_utc()))
}
