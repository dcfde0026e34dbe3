//! Native values bound to PostgreSQL queries and decoded from result rows.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use serde_json::Value;
use sqlx::encode::{Encode, IsNull};
use sqlx::postgres::{PgRow, PgTypeInfo, Postgres};
use sqlx::{Column, Database, Row, TypeInfo};
use uuid::Uuid;

/// A value that can be bound to a PostgreSQL query, each variant with its own wire type.
#[derive(Clone, Debug, PartialEq)]
pub enum SqlValue {
    Null,
    Text(String),
    Int(i64),
    Decimal(Decimal),
    Float(f64),
    Bool(bool),
    Uuid(Uuid),
    Date(NaiveDate),
    Timestamp(NaiveDateTime),
    TimestampTz(DateTime<FixedOffset>),
    Time(NaiveTime),
    Json(Value),
}

impl SqlValue {
    /// Pre-typed request values: numbers, booleans and null bind as-is, strings stay text.
    pub fn from_json(v: &Value) -> Self {
        match v {
            Value::Null => SqlValue::Null,
            Value::Bool(b) => SqlValue::Bool(*b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    SqlValue::Int(i)
                } else if let Some(f) = n.as_f64() {
                    SqlValue::Float(f)
                } else {
                    SqlValue::Text(n.to_string())
                }
            }
            Value::String(s) => SqlValue::Text(s.clone()),
            Value::Array(_) | Value::Object(_) => SqlValue::Json(v.clone()),
        }
    }

    fn pg_type(&self) -> PgTypeInfo {
        match self {
            // Left to the server to infer from the column it lands in.
            SqlValue::Null => PgTypeInfo::with_name("unknown"),
            SqlValue::Text(_) => <String as sqlx::Type<Postgres>>::type_info(),
            SqlValue::Int(_) => <i64 as sqlx::Type<Postgres>>::type_info(),
            SqlValue::Decimal(_) => <Decimal as sqlx::Type<Postgres>>::type_info(),
            SqlValue::Float(_) => <f64 as sqlx::Type<Postgres>>::type_info(),
            SqlValue::Bool(_) => <bool as sqlx::Type<Postgres>>::type_info(),
            SqlValue::Uuid(_) => <Uuid as sqlx::Type<Postgres>>::type_info(),
            SqlValue::Date(_) => <NaiveDate as sqlx::Type<Postgres>>::type_info(),
            SqlValue::Timestamp(_) => <NaiveDateTime as sqlx::Type<Postgres>>::type_info(),
            SqlValue::TimestampTz(_) => <DateTime<FixedOffset> as sqlx::Type<Postgres>>::type_info(),
            SqlValue::Time(_) => <NaiveTime as sqlx::Type<Postgres>>::type_info(),
            SqlValue::Json(_) => <Value as sqlx::Type<Postgres>>::type_info(),
        }
    }
}

impl<'q> Encode<'q, Postgres> for SqlValue {
    fn encode_by_ref(
        &self,
        buf: &mut <Postgres as Database>::ArgumentBuffer<'q>,
    ) -> Result<IsNull, Box<dyn std::error::Error + Send + Sync>> {
        Ok(match self {
            SqlValue::Null => IsNull::Yes,
            SqlValue::Text(s) => <&str as Encode<Postgres>>::encode_by_ref(&s.as_str(), buf)?,
            SqlValue::Int(n) => <i64 as Encode<Postgres>>::encode_by_ref(n, buf)?,
            SqlValue::Decimal(d) => <Decimal as Encode<Postgres>>::encode_by_ref(d, buf)?,
            SqlValue::Float(n) => <f64 as Encode<Postgres>>::encode_by_ref(n, buf)?,
            SqlValue::Bool(b) => <bool as Encode<Postgres>>::encode_by_ref(b, buf)?,
            SqlValue::Uuid(u) => <Uuid as Encode<Postgres>>::encode_by_ref(u, buf)?,
            SqlValue::Date(d) => <NaiveDate as Encode<Postgres>>::encode_by_ref(d, buf)?,
            SqlValue::Timestamp(t) => <NaiveDateTime as Encode<Postgres>>::encode_by_ref(t, buf)?,
            SqlValue::TimestampTz(t) => {
                <DateTime<FixedOffset> as Encode<Postgres>>::encode_by_ref(t, buf)?
            }
            SqlValue::Time(t) => <NaiveTime as Encode<Postgres>>::encode_by_ref(t, buf)?,
            SqlValue::Json(v) => <Value as Encode<Postgres>>::encode_by_ref(v, buf)?,
        })
    }

    fn produces(&self) -> Option<PgTypeInfo> {
        Some(self.pg_type())
    }
}

impl sqlx::Type<Postgres> for SqlValue {
    fn type_info() -> PgTypeInfo {
        PgTypeInfo::with_name("TEXT")
    }
}

/// Decode every cell of a row, in result-set column order.
pub fn decode_row(row: &PgRow) -> Vec<(String, SqlValue)> {
    row.columns()
        .iter()
        .map(|col| (col.name().to_string(), decode_cell(row, col.ordinal(), col.type_info().name())))
        .collect()
}

fn decode_cell(row: &PgRow, idx: usize, type_name: &str) -> SqlValue {
    fn get<'r, T>(row: &'r PgRow, idx: usize, wrap: impl FnOnce(T) -> SqlValue) -> Option<SqlValue>
    where
        T: sqlx::Decode<'r, Postgres> + sqlx::Type<Postgres>,
    {
        match row.try_get::<Option<T>, _>(idx) {
            Ok(Some(v)) => Some(wrap(v)),
            Ok(None) => Some(SqlValue::Null),
            Err(_) => None,
        }
    }

    let decoded = match type_name {
        "INT2" => get::<i16>(row, idx, |n| SqlValue::Int(n.into())),
        "INT4" => get::<i32>(row, idx, |n| SqlValue::Int(n.into())),
        "INT8" => get::<i64>(row, idx, SqlValue::Int),
        "FLOAT4" => get::<f32>(row, idx, |n| SqlValue::Float(n.into())),
        "FLOAT8" => get::<f64>(row, idx, SqlValue::Float),
        "NUMERIC" => get::<Decimal>(row, idx, SqlValue::Decimal),
        "BOOL" => get::<bool>(row, idx, SqlValue::Bool),
        "UUID" => get::<Uuid>(row, idx, SqlValue::Uuid),
        "DATE" => get::<NaiveDate>(row, idx, SqlValue::Date),
        "TIMESTAMP" => get::<NaiveDateTime>(row, idx, SqlValue::Timestamp),
        "TIMESTAMPTZ" => get::<DateTime<chrono::Utc>>(row, idx, |t| SqlValue::TimestampTz(t.fixed_offset())),
        "TIME" => get::<NaiveTime>(row, idx, SqlValue::Time),
        "JSON" | "JSONB" => get::<Value>(row, idx, SqlValue::Json),
        _ => get::<String>(row, idx, SqlValue::Text),
    };
    if let Some(v) = decoded {
        return v;
    }
    // Enums and other types without a native mapping arrive as their text form.
    match row.try_get_unchecked::<Option<String>, _>(idx) {
        Ok(Some(s)) => SqlValue::Text(s),
        _ => SqlValue::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn from_json_keeps_pretyped_scalars() {
        assert_eq!(SqlValue::from_json(&json!(10)), SqlValue::Int(10));
        assert_eq!(SqlValue::from_json(&json!(50000.5)), SqlValue::Float(50000.5));
        assert_eq!(SqlValue::from_json(&json!(true)), SqlValue::Bool(true));
        assert_eq!(SqlValue::from_json(&Value::Null), SqlValue::Null);
        assert_eq!(SqlValue::from_json(&json!("PR001")), SqlValue::Text("PR001".into()));
        assert_eq!(
            SqlValue::from_json(&json!({"a": 1})),
            SqlValue::Json(json!({"a": 1}))
        );
    }

    #[test]
    fn each_variant_declares_its_own_type() {
        assert_eq!(SqlValue::Int(1).pg_type().name(), "INT8");
        assert_eq!(SqlValue::Text("x".into()).pg_type().name(), "TEXT");
        assert_eq!(SqlValue::Bool(true).pg_type().name(), "BOOL");
        assert_eq!(SqlValue::Uuid(Uuid::nil()).pg_type().name(), "UUID");
        assert_eq!(
            SqlValue::Date(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()).pg_type().name(),
            "DATE"
        );
    }
}
