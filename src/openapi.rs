//! OpenAPI document for the product API.

use crate::error::{ErrorBody, ErrorDetail};
use crate::handlers::product;
use crate::model::Product;
use crate::response::{Created, Deleted, TableRows, Updated};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "API Producto",
        version = "1.0.0",
        description = "REST CRUD over the producto table, with column types resolved from the database catalog."
    ),
    paths(
        product::list_products,
        product::get_product,
        product::create_product,
        product::update_product,
        product::delete_product,
    ),
    components(schemas(Product, TableRows, Created, Updated, Deleted, ErrorBody, ErrorDetail)),
    tags((name = "Producto", description = "Product CRUD"))
)]
pub struct ApiDoc;

impl ApiDoc {
    pub fn openapi_json_path() -> &'static str {
        "/openapi.json"
    }
}
