//! Shared application state for all routes.

use crate::service::ProductService;

#[derive(Clone)]
pub struct AppState {
    pub products: ProductService,
}

impl AppState {
    pub fn new(products: ProductService) -> Self {
        AppState { products }
    }
}
