//! Provider name to repository wiring.

use super::product::ProductService;
use crate::config::{ConnectionInfo, ConnectionProvider, Settings};
use crate::error::ConfigError;
use crate::repository::{
    CachedTypeResolver, CatalogTypeResolver, PgProductRepository, ProductRepository, SqlRepository,
};
use std::collections::HashMap;
use std::sync::Arc;

/// Builds a product repository for one provider.
pub type RepositoryConstructor = fn(Arc<dyn ConnectionInfo>, &Settings) -> Arc<dyn ProductRepository>;

/// Supported providers. New backends are added with [`RepositoryRegistry::register`].
#[derive(Clone)]
pub struct RepositoryRegistry {
    constructors: HashMap<String, RepositoryConstructor>,
}

fn postgres_repository(connection: Arc<dyn ConnectionInfo>, settings: &Settings) -> Arc<dyn ProductRepository> {
    let capacity = settings.database.type_cache_capacity;
    let repo = if capacity > 0 {
        tracing::debug!(capacity, "column type cache enabled");
        SqlRepository::with_resolver(connection, Arc::new(CachedTypeResolver::new(CatalogTypeResolver, capacity)))
    } else {
        SqlRepository::new(connection)
    };
    Arc::new(PgProductRepository::new(repo))
}

impl Default for RepositoryRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry
            .register("postgres", postgres_repository)
            .register("postgresql", postgres_repository);
        registry
    }
}

impl RepositoryRegistry {
    pub fn empty() -> Self {
        RepositoryRegistry {
            constructors: HashMap::new(),
        }
    }

    pub fn register(&mut self, provider: &str, constructor: RepositoryConstructor) -> &mut Self {
        self.constructors
            .insert(provider.trim().to_lowercase(), constructor);
        self
    }

    /// Registered provider names, sorted.
    pub fn providers(&self) -> Vec<String> {
        let mut names: Vec<String> = self.constructors.keys().cloned().collect();
        names.sort();
        names
    }

    /// Fails on an unregistered provider or a missing connection string, before any I/O.
    pub fn create_repository(
        &self,
        connection: Arc<dyn ConnectionInfo>,
        settings: &Settings,
    ) -> Result<Arc<dyn ProductRepository>, ConfigError> {
        let provider = connection.provider_name();
        let constructor = self
            .constructors
            .get(&provider)
            .ok_or_else(|| ConfigError::UnsupportedProvider {
                provider: provider.clone(),
                options: self.providers(),
            })?;
        connection.connection_string()?;
        tracing::info!(%provider, "product repository ready");
        Ok(constructor(connection, settings))
    }

    pub fn create_service(&self, settings: &Settings) -> Result<ProductService, ConfigError> {
        let connection: Arc<dyn ConnectionInfo> = Arc::new(ConnectionProvider::new(settings.clone()));
        let repo = self.create_repository(connection, settings)?;
        Ok(ProductService::new(repo))
    }
}

/// Product service for the configured provider using the default registry.
pub fn create_product_service(settings: &Settings) -> Result<ProductService, ConfigError> {
    RepositoryRegistry::default().create_service(settings)
}
