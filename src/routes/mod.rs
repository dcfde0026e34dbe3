//! Router assembly.

mod common;
mod product;

pub use common::{common_routes, common_routes_with_ready};
pub use product::{product_routes, PRODUCT_PATH};

use crate::state::AppState;
use axum::Router;
use tower_http::limit::RequestBodyLimitLayer;

/// Largest accepted request body.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Every route of the service with the body size limit applied.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(common_routes_with_ready(state.clone()))
        .merge(product_routes(state))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
}
