//! Generic CRUD against any schema-qualified PostgreSQL table, with column types
//! discovered at runtime.

use super::resolver::{CatalogTypeResolver, TypeResolver};
use super::{Payload, RowRecord};
use crate::config::ConnectionInfo;
use crate::error::AppError;
use crate::sql::convert::row_to_record;
use crate::sql::params::decode_row;
use crate::sql::{self, extract_date, is_date_only, to_native, QueryBuf, SqlValue, TableRef};
use serde_json::Value;
use sqlx::postgres::{PgArguments, PgPoolOptions};
use sqlx::query::Query;
use sqlx::{PgPool, Postgres};
use std::sync::Arc;
use tokio::sync::OnceCell;

const POOL_MAX_CONNECTIONS: u32 = 5;

/// Owns a pool created on first use from the injected connection info.
pub struct SqlRepository {
    connection: Arc<dyn ConnectionInfo>,
    resolver: Arc<dyn TypeResolver>,
    pool: OnceCell<PgPool>,
}

fn require(what: &str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::invalid(format!("{} must not be empty", what)));
    }
    Ok(())
}

impl SqlRepository {
    /// Repository that looks column types up in the catalog on every call.
    pub fn new(connection: Arc<dyn ConnectionInfo>) -> Self {
        Self::with_resolver(connection, Arc::new(CatalogTypeResolver))
    }

    pub fn with_resolver(connection: Arc<dyn ConnectionInfo>, resolver: Arc<dyn TypeResolver>) -> Self {
        SqlRepository {
            connection,
            resolver,
            pool: OnceCell::new(),
        }
    }

    /// The shared pool, created at most once even under concurrent first use.
    pub async fn pool(&self) -> Result<&PgPool, AppError> {
        self.pool
            .get_or_try_init(|| async {
                let url = self.connection.connection_string()?;
                tracing::info!(provider = %self.connection.provider_name(), "creating connection pool");
                PgPoolOptions::new()
                    .max_connections(POOL_MAX_CONNECTIONS)
                    .connect_lazy(&url)
                    .map_err(|e| AppError::Internal(format!("invalid connection string: {}", e)))
            })
            .await
    }

    /// SELECT * ... LIMIT n. Limit defaults to 1000 when absent or non-positive.
    pub async fn select_all(
        &self,
        table: &str,
        schema: Option<&str>,
        limit: Option<i64>,
    ) -> Result<Vec<RowRecord>, AppError> {
        let table = TableRef::new(table, schema)?;
        let q = sql::select_all(&table, sql::effective_limit(limit));
        let pool = self.pool().await?;
        fetch_all(pool, &q)
            .await
            .map_err(|e| AppError::repository("querying", table.to_string(), e))
    }

    /// Rows whose key column equals `key_value`. A bare date against a timestamp key
    /// matches every row on that day. Empty result means not found.
    pub async fn select_by_key(
        &self,
        table: &str,
        key_column: &str,
        key_value: &str,
        schema: Option<&str>,
    ) -> Result<Vec<RowRecord>, AppError> {
        let table = TableRef::new(table, schema)?;
        require("key column", key_column)?;
        require("key value", key_value)?;
        let pool = self.pool().await?;
        let ty = self.resolver.resolve(pool, &table, key_column).await;

        let day = if ty.is_timestamp() && is_date_only(key_value) {
            extract_date(key_value)
        } else {
            None
        };
        let q = match day {
            Some(d) => sql::select_by_key(&table, key_column, SqlValue::Date(d), true),
            None => sql::select_by_key(&table, key_column, to_native(key_value, ty), false),
        };
        fetch_all(pool, &q)
            .await
            .map_err(|e| AppError::repository("filtering", table.to_string(), e))
    }

    /// INSERT one row in its own transaction. True when a row was written.
    pub async fn insert(&self, table: &str, payload: &Payload, schema: Option<&str>) -> Result<bool, AppError> {
        let table = TableRef::new(table, schema)?;
        if payload.is_empty() {
            return Err(AppError::invalid("payload must not be empty"));
        }
        let pool = self.pool().await?;
        let values = self.convert_payload(pool, &table, payload, None).await;
        let q = sql::insert(&table, values);
        let affected = execute_in_tx(pool, &q)
            .await
            .map_err(|e| AppError::repository("inserting into", table.to_string(), e))?;
        Ok(affected > 0)
    }

    /// UPDATE by key in its own transaction. The key column is never reassigned.
    /// Returns rows affected; 0 means no row has that key.
    pub async fn update(
        &self,
        table: &str,
        key_column: &str,
        key_value: &str,
        payload: &Payload,
        schema: Option<&str>,
    ) -> Result<u64, AppError> {
        let table = TableRef::new(table, schema)?;
        require("key column", key_column)?;
        require("key value", key_value)?;
        if payload.is_empty() {
            return Err(AppError::invalid("payload must not be empty"));
        }
        if payload.keys().all(|k| k == key_column) {
            return Err(AppError::invalid(format!(
                "payload has no columns to update besides '{}'",
                key_column
            )));
        }
        let pool = self.pool().await?;
        let values = self.convert_payload(pool, &table, payload, Some(key_column)).await;
        let key_type = self.resolver.resolve(pool, &table, key_column).await;
        let q = sql::update(&table, key_column, to_native(key_value, key_type), values)
            .ok_or_else(|| AppError::invalid("payload has no columns to update"))?;
        execute_in_tx(pool, &q)
            .await
            .map_err(|e| AppError::repository("updating", table.to_string(), e))
    }

    /// DELETE by key in its own transaction. Returns rows affected; 0 means no such key.
    pub async fn delete(
        &self,
        table: &str,
        key_column: &str,
        key_value: &str,
        schema: Option<&str>,
    ) -> Result<u64, AppError> {
        let table = TableRef::new(table, schema)?;
        require("key column", key_column)?;
        require("key value", key_value)?;
        let pool = self.pool().await?;
        let key_type = self.resolver.resolve(pool, &table, key_column).await;
        let q = sql::delete(&table, key_column, to_native(key_value, key_type));
        execute_in_tx(pool, &q)
            .await
            .map_err(|e| AppError::repository("deleting from", table.to_string(), e))
    }

    /// String fields are converted by their column's type (one lookup each, in payload
    /// order); numbers, booleans and nulls bind as they are.
    async fn convert_payload(
        &self,
        pool: &PgPool,
        table: &TableRef,
        payload: &Payload,
        skip: Option<&str>,
    ) -> Vec<(String, SqlValue)> {
        let mut out = Vec::with_capacity(payload.len());
        for (column, value) in payload {
            if skip == Some(column.as_str()) {
                continue;
            }
            let native = match value {
                Value::String(s) => {
                    let ty = self.resolver.resolve(pool, table, column).await;
                    to_native(s, ty)
                }
                other => SqlValue::from_json(other),
            };
            out.push((column.clone(), native));
        }
        out
    }
}

/// Parameter types follow the values, so the same SQL text may carry different types
/// from one call to the next; such statements are never kept in the connection's
/// prepared-statement cache.
fn bind_all<'q>(
    mut query: Query<'q, Postgres, PgArguments>,
    params: &[SqlValue],
) -> Query<'q, Postgres, PgArguments> {
    for p in params {
        query = query.bind(p.clone());
    }
    query.persistent(false)
}

async fn fetch_all(pool: &PgPool, q: &QueryBuf) -> Result<Vec<RowRecord>, sqlx::Error> {
    tracing::debug!(sql = %q.sql, params = ?q.params, "query");
    let rows = bind_all(sqlx::query(&q.sql), &q.params).fetch_all(pool).await?;
    Ok(rows.iter().map(|r| row_to_record(decode_row(r))).collect())
}

/// Single-statement transaction: commit on success, rollback when dropped on error.
async fn execute_in_tx(pool: &PgPool, q: &QueryBuf) -> Result<u64, sqlx::Error> {
    tracing::debug!(sql = %q.sql, params = ?q.params, "query (tx)");
    let mut tx = pool.begin().await?;
    let result = bind_all(sqlx::query(&q.sql), &q.params)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;
    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingInfo {
        calls: AtomicUsize,
        url: Option<&'static str>,
    }

    impl ConnectionInfo for CountingInfo {
        fn provider_name(&self) -> String {
            "postgres".into()
        }

        fn connection_string(&self) -> Result<String, ConfigError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.url
                .map(str::to_string)
                .ok_or_else(|| ConfigError::MissingConnectionString {
                    provider: "postgres".into(),
                    variable: "DB_POSTGRES".into(),
                })
        }
    }

    fn repo(url: Option<&'static str>) -> (Arc<CountingInfo>, SqlRepository) {
        let info = Arc::new(CountingInfo {
            calls: AtomicUsize::new(0),
            url,
        });
        let repo = SqlRepository::new(info.clone());
        (info, repo)
    }

    #[tokio::test]
    async fn concurrent_first_use_creates_one_pool() {
        let (info, repo) = repo(Some("postgres://localhost/unused"));
        let (a, b) = tokio::join!(repo.pool(), repo.pool());
        let (a, b) = (a.unwrap(), b.unwrap());
        assert!(std::ptr::eq(a, b));
        assert!(std::ptr::eq(a, repo.pool().await.unwrap()));
        assert_eq!(info.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn missing_connection_string_surfaces_as_config_error() {
        let (info, repo) = repo(None);
        assert!(matches!(repo.pool().await, Err(AppError::Config(_))));
        // A failed init leaves the cell empty so the next call tries again.
        assert!(repo.pool().await.is_err());
        assert_eq!(info.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn arguments_are_validated_before_any_io() {
        let (info, repo) = repo(None);
        let payload = Payload::new();

        assert!(matches!(repo.select_all(" ", None, None).await, Err(AppError::InvalidArgument(_))));
        assert!(matches!(
            repo.select_by_key("producto", "codigo", "  ", None).await,
            Err(AppError::InvalidArgument(_))
        ));
        assert!(matches!(
            repo.select_by_key("producto", "", "PR001", None).await,
            Err(AppError::InvalidArgument(_))
        ));
        assert!(matches!(repo.insert("producto", &payload, None).await, Err(AppError::InvalidArgument(_))));
        assert!(matches!(
            repo.update("producto", "codigo", "PR001", &payload, None).await,
            Err(AppError::InvalidArgument(_))
        ));
        assert!(matches!(
            repo.delete("producto", "codigo", "", None).await,
            Err(AppError::InvalidArgument(_))
        ));
        assert_eq!(info.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn update_with_only_the_key_is_rejected() {
        let (_info, repo) = repo(None);
        let mut payload = Payload::new();
        payload.insert("codigo".into(), Value::String("PR009".into()));
        assert!(matches!(
            repo.update("producto", "codigo", "PR001", &payload, None).await,
            Err(AppError::InvalidArgument(_))
        ));
    }
}
