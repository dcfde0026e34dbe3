//! Product CRUD routes. The collection is served with and without the trailing slash.

use crate::handlers::product::{create_product, delete_product, get_product, list_products, update_product};
use crate::state::AppState;
use axum::{routing::get, Router};

pub const PRODUCT_PATH: &str = "/api/producto";

pub fn product_routes(state: AppState) -> Router {
    Router::new()
        .route(PRODUCT_PATH, get(list_products).post(create_product))
        .route("/api/producto/", get(list_products).post(create_product))
        .route(
            "/api/producto/:codigo",
            get(get_product).put(update_product).delete(delete_product),
        )
        .with_state(state)
}
