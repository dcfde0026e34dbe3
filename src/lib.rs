//! Producto API: REST CRUD over a PostgreSQL table whose column types are
//! resolved from the catalog at runtime.

pub mod config;
pub mod error;
pub mod handlers;
pub mod model;
pub mod openapi;
pub mod repository;
pub mod response;
pub mod routes;
pub mod service;
pub mod sql;
pub mod state;

pub use config::{settings, ConnectionInfo, ConnectionProvider, Settings};
pub use error::{AppError, ConfigError};
pub use model::Product;
pub use repository::{Payload, ProductRepository, RowRecord, SqlRepository};
pub use routes::{app, common_routes, common_routes_with_ready, product_routes};
pub use service::{create_product_service, ProductService, RepositoryRegistry};
pub use state::AppState;
