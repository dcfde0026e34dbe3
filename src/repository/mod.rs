//! Data access: catalog type lookup, the generic table repository, and the
//! `producto` binding on top of it.

pub mod generic;
pub mod product;
pub mod resolver;

pub use generic::SqlRepository;
pub use product::{PgProductRepository, ProductRepository, PRIMARY_KEY, TABLE};
pub use resolver::{CachedTypeResolver, CatalogTypeResolver, TypeResolver};

/// One result row: column name to JSON-safe value, in result-set column order.
pub type RowRecord = serde_json::Map<String, serde_json::Value>;

/// Column name to value for INSERT and UPDATE.
pub type Payload = serde_json::Map<String, serde_json::Value>;
