//! Runtime type coercion between wire strings and native values.
//!
//! Inbound conversion is lenient: a value that does not parse as its column's type is
//! passed through as text and the database decides whether to accept it.

use super::params::SqlValue;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde_json::{Map, Number, Value};
use std::str::FromStr;

/// Column type as declared in the catalog, reduced to what conversion cares about.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ColumnType {
    Integer,
    Decimal,
    Float,
    Boolean,
    Uuid,
    Date,
    Timestamp,
    TimestampTz,
    Time,
    Unknown,
}

impl ColumnType {
    /// Map an `information_schema.columns.data_type` (or `udt_name`) value.
    pub fn from_catalog(data_type: &str) -> Self {
        match data_type.trim().to_lowercase().as_str() {
            "integer" | "int" | "int4" | "bigint" | "int8" | "smallint" | "int2" => ColumnType::Integer,
            "numeric" | "decimal" => ColumnType::Decimal,
            "real" | "float4" | "double precision" | "float8" => ColumnType::Float,
            "boolean" | "bool" => ColumnType::Boolean,
            "uuid" => ColumnType::Uuid,
            "date" => ColumnType::Date,
            "timestamp without time zone" | "timestamp" => ColumnType::Timestamp,
            "timestamp with time zone" | "timestamptz" => ColumnType::TimestampTz,
            "time" | "time without time zone" => ColumnType::Time,
            _ => ColumnType::Unknown,
        }
    }

    pub fn is_timestamp(self) -> bool {
        matches!(self, ColumnType::Timestamp | ColumnType::TimestampTz)
    }
}

const TRUTHY: &[&str] = &["true", "1", "yes", "si", "t"];

/// Convert a wire string for a column of type `ty`. Falls back to text on any parse failure.
pub fn to_native(value: &str, ty: ColumnType) -> SqlValue {
    try_to_native(value, ty).unwrap_or_else(|| {
        if ty != ColumnType::Unknown {
            tracing::debug!(value = %value, column_type = ?ty, "value kept as text");
        }
        SqlValue::Text(value.to_string())
    })
}

/// Strict form of [`to_native`]: `None` when the value does not parse as `ty`.
pub fn try_to_native(value: &str, ty: ColumnType) -> Option<SqlValue> {
    let trimmed = value.trim();
    match ty {
        ColumnType::Unknown => None,
        ColumnType::Integer => trimmed.parse::<i64>().ok().map(SqlValue::Int),
        ColumnType::Decimal => parse_decimal(trimmed).map(SqlValue::Decimal),
        ColumnType::Float => trimmed.parse::<f64>().ok().map(SqlValue::Float),
        ColumnType::Boolean => {
            let lower = value.to_lowercase();
            Some(SqlValue::Bool(TRUTHY.contains(&lower.as_str())))
        }
        ColumnType::Uuid => uuid::Uuid::parse_str(trimmed).ok().map(SqlValue::Uuid),
        ColumnType::Date => extract_date(value).map(SqlValue::Date),
        ColumnType::Timestamp | ColumnType::TimestampTz => parse_timestamp(value),
        ColumnType::Time => parse_time(trimmed).map(SqlValue::Time),
    }
}

fn parse_decimal(s: &str) -> Option<Decimal> {
    Decimal::from_str(s)
        .or_else(|_| Decimal::from_scientific(s))
        .ok()
}

/// True for strings shaped like `YYYY-MM-DD`: length 10, two hyphens, no `T`.
pub fn is_date_only(value: &str) -> bool {
    value.len() == 10 && value.matches('-').count() == 2 && !value.contains('T')
}

/// Date part of an ISO date or timestamp string.
pub fn extract_date(value: &str) -> Option<NaiveDate> {
    if value.contains('T') {
        return match parse_timestamp(value)? {
            SqlValue::Timestamp(t) => Some(t.date()),
            SqlValue::TimestampTz(t) => Some(t.date_naive()),
            _ => None,
        };
    }
    let head = value.get(..10)?;
    NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()
}

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M%:z",
    "%Y-%m-%d %H:%M%:z",
];

/// ISO-8601 timestamp; a trailing `Z` means `+00:00`. Offset-bearing strings keep their offset.
fn parse_timestamp(value: &str) -> Option<SqlValue> {
    let s = value.trim();
    let s = match s.strip_suffix('Z') {
        Some(rest) => format!("{rest}+00:00"),
        None => s.to_string(),
    };
    for fmt in OFFSET_FORMATS {
        if let Ok(t) = DateTime::parse_from_str(&s, fmt) {
            return Some(SqlValue::TimestampTz(t));
        }
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(t) = NaiveDateTime::parse_from_str(&s, fmt) {
            return Some(SqlValue::Timestamp(t));
        }
    }
    if is_date_only(&s) {
        let d = NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok()?;
        return Some(SqlValue::Timestamp(d.and_time(NaiveTime::MIN)));
    }
    None
}

fn parse_time(s: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(s, "%H:%M:%S%.f")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
        .ok()
}

fn iso_time_format(nanos: u32) -> &'static str {
    if nanos == 0 {
        "%H:%M:%S"
    } else {
        "%H:%M:%S%.6f"
    }
}

/// JSON-safe form of a native value.
pub fn to_wire(value: &SqlValue) -> Value {
    match value {
        SqlValue::Null => Value::Null,
        SqlValue::Text(s) => Value::String(s.clone()),
        SqlValue::Int(n) => Value::Number((*n).into()),
        SqlValue::Decimal(d) => float_value(d.to_f64()),
        SqlValue::Float(f) => float_value(Some(*f)),
        SqlValue::Bool(b) => Value::Bool(*b),
        SqlValue::Uuid(u) => Value::String(u.to_string()),
        SqlValue::Date(d) => Value::String(d.format("%Y-%m-%d").to_string()),
        SqlValue::Timestamp(t) => {
            let fmt = format!("%Y-%m-%dT{}", iso_time_format(t.nanosecond()));
            Value::String(t.format(&fmt).to_string())
        }
        SqlValue::TimestampTz(t) => {
            let fmt = format!("%Y-%m-%dT{}%:z", iso_time_format(t.nanosecond()));
            Value::String(t.format(&fmt).to_string())
        }
        SqlValue::Time(t) => Value::String(t.format(iso_time_format(t.nanosecond())).to_string()),
        SqlValue::Json(v) => v.clone(),
    }
}

fn float_value(f: Option<f64>) -> Value {
    f.and_then(Number::from_f64)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

/// Serialize a decoded row into a JSON object, keeping column order.
pub fn row_to_record(cells: Vec<(String, SqlValue)>) -> Map<String, Value> {
    cells
        .into_iter()
        .map(|(name, v)| {
            let wire = to_wire(&v);
            (name, wire)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn wire(s: &str, ty: ColumnType) -> Value {
        to_wire(&to_native(s, ty))
    }

    #[test]
    fn catalog_names_map_to_types() {
        assert_eq!(ColumnType::from_catalog("integer"), ColumnType::Integer);
        assert_eq!(ColumnType::from_catalog("BIGINT"), ColumnType::Integer);
        assert_eq!(ColumnType::from_catalog("int2"), ColumnType::Integer);
        assert_eq!(ColumnType::from_catalog("numeric"), ColumnType::Decimal);
        assert_eq!(ColumnType::from_catalog("double precision"), ColumnType::Float);
        assert_eq!(ColumnType::from_catalog("boolean"), ColumnType::Boolean);
        assert_eq!(ColumnType::from_catalog("uuid"), ColumnType::Uuid);
        assert_eq!(ColumnType::from_catalog("date"), ColumnType::Date);
        assert_eq!(
            ColumnType::from_catalog("timestamp without time zone"),
            ColumnType::Timestamp
        );
        assert_eq!(
            ColumnType::from_catalog("timestamp with time zone"),
            ColumnType::TimestampTz
        );
        assert_eq!(ColumnType::from_catalog("time without time zone"), ColumnType::Time);
        assert_eq!(ColumnType::from_catalog("character varying"), ColumnType::Unknown);
        assert_eq!(ColumnType::from_catalog("text"), ColumnType::Unknown);
    }

    #[test]
    fn round_trips_through_wire_form() {
        assert_eq!(wire("20", ColumnType::Integer), json!(20));
        assert_eq!(wire("12.50", ColumnType::Decimal), json!(12.5));
        assert_eq!(wire("1e3", ColumnType::Decimal), json!(1000.0));
        assert_eq!(wire("50000.0", ColumnType::Float), json!(50000.0));
        assert_eq!(wire("yes", ColumnType::Boolean), json!(true));
        assert_eq!(
            wire("67E55044-10B1-426F-9247-BB680E5FE0C8", ColumnType::Uuid),
            json!("67e55044-10b1-426f-9247-bb680e5fe0c8")
        );
        assert_eq!(wire("2024-01-15", ColumnType::Date), json!("2024-01-15"));
        assert_eq!(
            wire("2024-01-15T10:30:00", ColumnType::Timestamp),
            json!("2024-01-15T10:30:00")
        );
        assert_eq!(
            wire("2024-01-15T10:30:00.250", ColumnType::Timestamp),
            json!("2024-01-15T10:30:00.250000")
        );
        assert_eq!(
            wire("2024-01-15T10:30:00Z", ColumnType::TimestampTz),
            json!("2024-01-15T10:30:00+00:00")
        );
        assert_eq!(
            wire("2024-01-15T10:30:00-05:00", ColumnType::TimestampTz),
            json!("2024-01-15T10:30:00-05:00")
        );
        assert_eq!(wire("08:15:00", ColumnType::Time), json!("08:15:00"));
        assert_eq!(wire("PR001", ColumnType::Unknown), json!("PR001"));
    }

    #[test]
    fn boolean_truthy_set_is_case_insensitive() {
        for s in ["true", "TRUE", "1", "Yes", "si", "SI", "t"] {
            assert_eq!(to_native(s, ColumnType::Boolean), SqlValue::Bool(true), "{s}");
        }
        for s in ["false", "0", "no", "", "verdadero"] {
            assert_eq!(to_native(s, ColumnType::Boolean), SqlValue::Bool(false), "{s}");
        }
    }

    #[test]
    fn unparsable_values_fall_back_to_text() {
        assert_eq!(
            to_native("not-a-number", ColumnType::Integer),
            SqlValue::Text("not-a-number".into())
        );
        assert_eq!(to_native("abc", ColumnType::Decimal), SqlValue::Text("abc".into()));
        assert_eq!(to_native("zzz", ColumnType::Uuid), SqlValue::Text("zzz".into()));
        assert_eq!(to_native("2024-13-40", ColumnType::Date), SqlValue::Text("2024-13-40".into()));
        assert_eq!(to_native("noon", ColumnType::Time), SqlValue::Text("noon".into()));
        assert_eq!(try_to_native("not-a-number", ColumnType::Integer), None);
        assert_eq!(try_to_native("x", ColumnType::Unknown), None);
    }

    #[test]
    fn date_only_predicate() {
        assert!(is_date_only("2024-01-15"));
        assert!(!is_date_only("2024-01-15T00:00:00"));
        assert!(!is_date_only("2024-1-15"));
        assert!(!is_date_only("2024/01/15"));
    }

    #[test]
    fn extract_date_from_date_and_timestamp() {
        let d = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        assert_eq!(extract_date("2024-01-15"), Some(d));
        assert_eq!(extract_date("2024-01-15T23:59:59"), Some(d));
        assert_eq!(extract_date("2024-01-15T10:00:00Z"), Some(d));
        assert_eq!(extract_date("2024-01-15 10:00:00"), Some(d));
        assert_eq!(extract_date("15/01/2024"), None);
        assert_eq!(extract_date("short"), None);
    }

    #[test]
    fn timestamp_accepts_space_separator_and_bare_date() {
        let midnight = NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(
            to_native("2024-01-15", ColumnType::Timestamp),
            SqlValue::Timestamp(midnight)
        );
        assert!(matches!(
            to_native("2024-01-15 08:00", ColumnType::Timestamp),
            SqlValue::Timestamp(_)
        ));
    }

    #[test]
    fn non_finite_float_serializes_as_null() {
        assert_eq!(to_wire(&SqlValue::Float(f64::NAN)), Value::Null);
    }

    #[test]
    fn record_keeps_column_order() {
        let record = row_to_record(vec![
            ("codigo".into(), SqlValue::Text("PR001".into())),
            ("nombre".into(), SqlValue::Text("Laptop".into())),
            ("stock".into(), SqlValue::Int(20)),
            ("valorunitario".into(), SqlValue::Decimal(Decimal::new(250000050, 2))),
        ]);
        let keys: Vec<&str> = record.keys().map(String::as_str).collect();
        assert_eq!(keys, ["codigo", "nombre", "stock", "valorunitario"]);
        assert_eq!(record["valorunitario"], json!(2500000.5));
    }
}
