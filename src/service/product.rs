//! Product use cases: argument checks and normalization before the repository.

use crate::error::AppError;
use crate::repository::{Payload, ProductRepository, RowRecord};
use std::sync::Arc;

#[derive(Clone)]
pub struct ProductService {
    repo: Arc<dyn ProductRepository>,
}

/// Blank or whitespace schema means the default schema; otherwise trimmed.
fn normalize_schema(schema: Option<&str>) -> Option<&str> {
    schema.map(str::trim).filter(|s| !s.is_empty())
}

fn normalize_limit(limit: Option<i64>) -> Option<i64> {
    limit.filter(|n| *n > 0)
}

fn require_code(code: &str) -> Result<(), AppError> {
    if code.trim().is_empty() {
        return Err(AppError::invalid("product code must not be empty"));
    }
    Ok(())
}

fn require_payload(payload: &Payload) -> Result<(), AppError> {
    if payload.is_empty() {
        return Err(AppError::invalid("product data must not be empty"));
    }
    Ok(())
}

impl ProductService {
    pub fn new(repo: Arc<dyn ProductRepository>) -> Self {
        ProductService { repo }
    }

    pub async fn list(&self, schema: Option<&str>, limit: Option<i64>) -> Result<Vec<RowRecord>, AppError> {
        self.repo
            .find_all(normalize_schema(schema), normalize_limit(limit))
            .await
    }

    /// Empty result means no product has that code.
    pub async fn get_by_code(&self, code: &str, schema: Option<&str>) -> Result<Vec<RowRecord>, AppError> {
        require_code(code)?;
        self.repo.find_by_code(code, normalize_schema(schema)).await
    }

    pub async fn create(&self, payload: &Payload, schema: Option<&str>) -> Result<bool, AppError> {
        require_payload(payload)?;
        self.repo.create(payload, normalize_schema(schema)).await
    }

    pub async fn update(&self, code: &str, payload: &Payload, schema: Option<&str>) -> Result<u64, AppError> {
        require_code(code)?;
        require_payload(payload)?;
        self.repo.update(code, payload, normalize_schema(schema)).await
    }

    pub async fn delete(&self, code: &str, schema: Option<&str>) -> Result<u64, AppError> {
        require_code(code)?;
        self.repo.delete(code, normalize_schema(schema)).await
    }

    pub async fn ping(&self) -> Result<(), AppError> {
        self.repo.ping().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    /// Records the arguments each call reached the repository with.
    #[derive(Default)]
    struct Recording {
        calls: Mutex<Vec<String>>,
    }

    impl Recording {
        fn log(&self, entry: String) {
            self.calls.lock().unwrap().push(entry);
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ProductRepository for Recording {
        async fn find_all(&self, schema: Option<&str>, limit: Option<i64>) -> Result<Vec<RowRecord>, AppError> {
            self.log(format!("find_all {:?} {:?}", schema, limit));
            Ok(Vec::new())
        }

        async fn find_by_code(&self, code: &str, schema: Option<&str>) -> Result<Vec<RowRecord>, AppError> {
            self.log(format!("find_by_code {} {:?}", code, schema));
            Ok(Vec::new())
        }

        async fn create(&self, payload: &Payload, schema: Option<&str>) -> Result<bool, AppError> {
            self.log(format!("create {} {:?}", payload.len(), schema));
            Ok(true)
        }

        async fn update(&self, code: &str, _payload: &Payload, schema: Option<&str>) -> Result<u64, AppError> {
            self.log(format!("update {} {:?}", code, schema));
            Ok(1)
        }

        async fn delete(&self, code: &str, schema: Option<&str>) -> Result<u64, AppError> {
            self.log(format!("delete {} {:?}", code, schema));
            Ok(0)
        }

        async fn ping(&self) -> Result<(), AppError> {
            Ok(())
        }
    }

    fn service() -> (Arc<Recording>, ProductService) {
        let repo = Arc::new(Recording::default());
        (repo.clone(), ProductService::new(repo))
    }

    fn payload() -> Payload {
        json!({"nombre": "Lapicero", "stock": 10}).as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn list_normalizes_schema_and_limit() {
        let (repo, svc) = service();
        svc.list(Some("   "), Some(0)).await.unwrap();
        svc.list(Some(" ventas "), Some(-5)).await.unwrap();
        svc.list(None, Some(25)).await.unwrap();
        assert_eq!(
            repo.calls(),
            vec![
                "find_all None None",
                "find_all Some(\"ventas\") None",
                "find_all None Some(25)",
            ]
        );
    }

    #[tokio::test]
    async fn blank_code_is_rejected_without_touching_the_repository() {
        let (repo, svc) = service();
        assert!(matches!(svc.get_by_code(" ", None).await, Err(AppError::InvalidArgument(_))));
        assert!(matches!(svc.update("", &payload(), None).await, Err(AppError::InvalidArgument(_))));
        assert!(matches!(svc.delete("\t", None).await, Err(AppError::InvalidArgument(_))));
        assert!(repo.calls().is_empty());
    }

    #[tokio::test]
    async fn empty_payload_is_rejected() {
        let (repo, svc) = service();
        let empty = Payload::new();
        assert!(matches!(svc.create(&empty, None).await, Err(AppError::InvalidArgument(_))));
        assert!(matches!(svc.update("PR001", &empty, None).await, Err(AppError::InvalidArgument(_))));
        assert!(repo.calls().is_empty());
    }

    #[tokio::test]
    async fn delegates_with_normalized_schema() {
        let (repo, svc) = service();
        assert!(svc.create(&payload(), Some("")).await.unwrap());
        assert_eq!(svc.update("PR001", &payload(), Some(" public")).await.unwrap(), 1);
        assert_eq!(svc.delete("PR404", None).await.unwrap(), 0);
        assert!(svc.get_by_code("PR001", None).await.unwrap().is_empty());
        assert!(svc.ping().await.is_ok());
        assert_eq!(
            repo.calls(),
            vec![
                "create 2 None",
                "update PR001 Some(\"public\")",
                "delete PR404 None",
                "find_by_code PR001 None",
            ]
        );
    }
}
