//! `producto` table access.

use super::{Payload, RowRecord, SqlRepository};
use crate::error::AppError;
use async_trait::async_trait;

pub const TABLE: &str = "producto";
pub const PRIMARY_KEY: &str = "codigo";

/// Operations on products. `schema` is `None` for the default schema.
#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn find_all(&self, schema: Option<&str>, limit: Option<i64>) -> Result<Vec<RowRecord>, AppError>;

    async fn find_by_code(&self, code: &str, schema: Option<&str>) -> Result<Vec<RowRecord>, AppError>;

    async fn create(&self, payload: &Payload, schema: Option<&str>) -> Result<bool, AppError>;

    async fn update(&self, code: &str, payload: &Payload, schema: Option<&str>) -> Result<u64, AppError>;

    async fn delete(&self, code: &str, schema: Option<&str>) -> Result<u64, AppError>;

    /// Connectivity check behind `/ready`.
    async fn ping(&self) -> Result<(), AppError>;
}

pub struct PgProductRepository {
    inner: SqlRepository,
}

impl PgProductRepository {
    pub fn new(inner: SqlRepository) -> Self {
        PgProductRepository { inner }
    }
}

#[async_trait]
impl ProductRepository for PgProductRepository {
    async fn find_all(&self, schema: Option<&str>, limit: Option<i64>) -> Result<Vec<RowRecord>, AppError> {
        self.inner.select_all(TABLE, schema, limit).await
    }

    async fn find_by_code(&self, code: &str, schema: Option<&str>) -> Result<Vec<RowRecord>, AppError> {
        self.inner.select_by_key(TABLE, PRIMARY_KEY, code, schema).await
    }

    async fn create(&self, payload: &Payload, schema: Option<&str>) -> Result<bool, AppError> {
        self.inner.insert(TABLE, payload, schema).await
    }

    async fn update(&self, code: &str, payload: &Payload, schema: Option<&str>) -> Result<u64, AppError> {
        self.inner.update(TABLE, PRIMARY_KEY, code, payload, schema).await
    }

    async fn delete(&self, code: &str, schema: Option<&str>) -> Result<u64, AppError> {
        self.inner.delete(TABLE, PRIMARY_KEY, code, schema).await
    }

    async fn ping(&self) -> Result<(), AppError> {
        let pool = self.inner.pool().await?;
        sqlx::query("SELECT 1")
            .fetch_optional(pool)
            .await
            .map_err(|e| AppError::repository("checking", "database", e))?;
        Ok(())
    }
}
