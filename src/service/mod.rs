//! Product service and the factory that wires it to a repository.

mod factory;
mod product;

pub use factory::{create_product_service, RepositoryConstructor, RepositoryRegistry};
pub use product::ProductService;
