//! Builds parameterized SELECT, INSERT, UPDATE, DELETE for a schema-qualified table.

use super::params::SqlValue;
use crate::error::AppError;
use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

pub const DEFAULT_SCHEMA: &str = "public";
pub const DEFAULT_LIMIT: i64 = 1000;

/// Quote identifier for PostgreSQL.
pub fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

fn identifier_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_$]*$").expect("static identifier pattern"))
}

/// Schema-qualified table. Schema falls back to `public` when absent or blank.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TableRef {
    pub schema: String,
    pub table: String,
}

impl TableRef {
    pub fn new(table: &str, schema: Option<&str>) -> Result<Self, AppError> {
        let table = table.trim();
        if table.is_empty() {
            return Err(AppError::invalid("table name must not be empty"));
        }
        let schema = schema
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_SCHEMA);
        // Schema names reach us from query strings; only plain identifiers are accepted.
        if !identifier_re().is_match(schema) {
            return Err(AppError::invalid(format!("invalid schema name: '{}'", schema)));
        }
        Ok(TableRef {
            schema: schema.to_string(),
            table: table.to_string(),
        })
    }

    /// `"schema"."table"` for use in SQL text.
    pub fn qualified(&self) -> String {
        format!("{}.{}", quoted(&self.schema), quoted(&self.table))
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.schema, self.table)
    }
}

/// Row limit: absent or non-positive means the default.
pub fn effective_limit(limit: Option<i64>) -> i64 {
    limit.filter(|n| *n > 0).unwrap_or(DEFAULT_LIMIT)
}

#[derive(Debug)]
pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<SqlValue>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf {
            sql: String::new(),
            params: Vec::new(),
        }
    }

    fn push_param(&mut self, v: SqlValue) -> usize {
        self.params.push(v);
        self.params.len()
    }
}

/// SELECT * with a bound LIMIT.
pub fn select_all(table: &TableRef, limit: i64) -> QueryBuf {
    let mut q = QueryBuf::new();
    let n = q.push_param(SqlValue::Int(limit));
    q.sql = format!("SELECT * FROM {} LIMIT ${}", table.qualified(), n);
    q
}

/// SELECT * WHERE key = value. With `as_date`, the key column is compared by its date part.
pub fn select_by_key(table: &TableRef, key_column: &str, value: SqlValue, as_date: bool) -> QueryBuf {
    let mut q = QueryBuf::new();
    let n = q.push_param(value);
    let lhs = if as_date {
        format!("CAST({} AS DATE)", quoted(key_column))
    } else {
        quoted(key_column)
    };
    q.sql = format!("SELECT * FROM {} WHERE {} = ${}", table.qualified(), lhs, n);
    q
}

/// INSERT one row; columns in the given order.
pub fn insert(table: &TableRef, values: Vec<(String, SqlValue)>) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut cols = Vec::with_capacity(values.len());
    let mut placeholders = Vec::with_capacity(values.len());
    for (name, v) in values {
        let n = q.push_param(v);
        cols.push(quoted(&name));
        placeholders.push(format!("${}", n));
    }
    q.sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        table.qualified(),
        cols.join(", "),
        placeholders.join(", ")
    );
    q
}

/// UPDATE by key. The key column itself is never assigned. `None` when nothing is left to set.
pub fn update(
    table: &TableRef,
    key_column: &str,
    key_value: SqlValue,
    values: Vec<(String, SqlValue)>,
) -> Option<QueryBuf> {
    let mut q = QueryBuf::new();
    let mut sets = Vec::with_capacity(values.len());
    for (name, v) in values {
        if name == key_column {
            continue;
        }
        let n = q.push_param(v);
        sets.push(format!("{} = ${}", quoted(&name), n));
    }
    if sets.is_empty() {
        return None;
    }
    let key_param = q.push_param(key_value);
    q.sql = format!(
        "UPDATE {} SET {} WHERE {} = ${}",
        table.qualified(),
        sets.join(", "),
        quoted(key_column),
        key_param
    );
    Some(q)
}

/// DELETE by key.
pub fn delete(table: &TableRef, key_column: &str, key_value: SqlValue) -> QueryBuf {
    let mut q = QueryBuf::new();
    let n = q.push_param(key_value);
    q.sql = format!(
        "DELETE FROM {} WHERE {} = ${}",
        table.qualified(),
        quoted(key_column),
        n
    );
    q
}
