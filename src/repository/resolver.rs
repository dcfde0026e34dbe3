//! Column type lookup against `information_schema.columns`.

use crate::sql::{ColumnType, TableRef};
use async_trait::async_trait;
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::RwLock;

/// Resolves a column's declared type. Never fails: anything unresolvable is `Unknown`.
#[async_trait]
pub trait TypeResolver: Send + Sync {
    async fn resolve(&self, pool: &PgPool, table: &TableRef, column: &str) -> ColumnType;
}

/// Queries the catalog on every call.
#[derive(Clone, Copy, Debug, Default)]
pub struct CatalogTypeResolver;

const COLUMN_TYPE_SQL: &str = "SELECT data_type, udt_name FROM information_schema.columns \
     WHERE table_schema = $1 AND table_name = $2 AND column_name = $3";

#[async_trait]
impl TypeResolver for CatalogTypeResolver {
    async fn resolve(&self, pool: &PgPool, table: &TableRef, column: &str) -> ColumnType {
        tracing::debug!(schema = %table.schema, table = %table.table, column, "column type lookup");
        let row = sqlx::query_as::<_, (String, String)>(COLUMN_TYPE_SQL)
            .bind(&table.schema)
            .bind(&table.table)
            .bind(column)
            .fetch_optional(pool)
            .await;
        match row {
            Ok(Some((data_type, _udt_name))) => ColumnType::from_catalog(&data_type),
            Ok(None) => {
                tracing::debug!(table = %table, column, "column not in catalog, treating as text");
                ColumnType::Unknown
            }
            Err(e) => {
                tracing::warn!(table = %table, column, error = %e, "column type lookup failed, treating as text");
                ColumnType::Unknown
            }
        }
    }
}

type CacheKey = (String, String, String);

/// Bounded cache in front of another resolver. Only resolved types are kept, so a
/// failed lookup is retried on the next call.
pub struct CachedTypeResolver<R> {
    inner: R,
    capacity: usize,
    entries: RwLock<HashMap<CacheKey, ColumnType>>,
}

impl<R: TypeResolver> CachedTypeResolver<R> {
    pub fn new(inner: R, capacity: usize) -> Self {
        CachedTypeResolver {
            inner,
            capacity: capacity.max(1),
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Drop every cached column of one table (e.g. after an ALTER TABLE).
    pub fn invalidate_table(&self, table: &TableRef) {
        if let Ok(mut entries) = self.entries.write() {
            entries.retain(|(schema, name, _), _| !(schema == &table.schema && name == &table.table));
        }
    }

    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.write() {
            entries.clear();
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl<R: TypeResolver> TypeResolver for CachedTypeResolver<R> {
    async fn resolve(&self, pool: &PgPool, table: &TableRef, column: &str) -> ColumnType {
        let key = (table.schema.clone(), table.table.clone(), column.to_string());
        let cached = self.entries.read().ok().and_then(|e| e.get(&key).copied());
        if let Some(ty) = cached {
            return ty;
        }
        let ty = self.inner.resolve(pool, table, column).await;
        if ty != ColumnType::Unknown {
            if let Ok(mut entries) = self.entries.write() {
                if entries.len() >= self.capacity && !entries.contains_key(&key) {
                    entries.clear();
                }
                entries.insert(key, ty);
            }
        }
        ty
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::postgres::PgPoolOptions;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct Scripted {
        calls: Arc<AtomicUsize>,
        types: HashMap<&'static str, ColumnType>,
    }

    #[async_trait]
    impl TypeResolver for Scripted {
        async fn resolve(&self, _pool: &PgPool, _table: &TableRef, column: &str) -> ColumnType {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.types.get(column).copied().unwrap_or(ColumnType::Unknown)
        }
    }

    fn lazy_pool() -> PgPool {
        PgPoolOptions::new()
            .max_connections(1)
            .connect_lazy("postgres://localhost/unused")
            .expect("lazy pool")
    }

    fn scripted(calls: &Arc<AtomicUsize>) -> Scripted {
        Scripted {
            calls: calls.clone(),
            types: HashMap::from([("stock", ColumnType::Integer), ("creado", ColumnType::Timestamp)]),
        }
    }

    #[tokio::test]
    async fn cache_serves_repeated_lookups() {
        let calls = Arc::new(AtomicUsize::new(0));
        let resolver = CachedTypeResolver::new(scripted(&calls), 16);
        let pool = lazy_pool();
        let t = TableRef::new("producto", None).unwrap();

        assert_eq!(resolver.resolve(&pool, &t, "stock").await, ColumnType::Integer);
        assert_eq!(resolver.resolve(&pool, &t, "stock").await, ColumnType::Integer);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unknown_is_not_cached() {
        let calls = Arc::new(AtomicUsize::new(0));
        let resolver = CachedTypeResolver::new(scripted(&calls), 16);
        let pool = lazy_pool();
        let t = TableRef::new("producto", None).unwrap();

        resolver.resolve(&pool, &t, "nombre").await;
        resolver.resolve(&pool, &t, "nombre").await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(resolver.is_empty());
    }

    #[tokio::test]
    async fn invalidation_and_capacity() {
        let calls = Arc::new(AtomicUsize::new(0));
        let resolver = CachedTypeResolver::new(scripted(&calls), 1);
        let pool = lazy_pool();
        let t = TableRef::new("producto", None).unwrap();

        resolver.resolve(&pool, &t, "stock").await;
        resolver.resolve(&pool, &t, "creado").await;
        assert_eq!(resolver.len(), 1);

        resolver.invalidate_table(&t);
        assert!(resolver.is_empty());
        resolver.resolve(&pool, &t, "creado").await;
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
