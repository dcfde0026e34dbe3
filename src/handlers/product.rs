//! Product CRUD handlers.

use crate::error::{AppError, ErrorBody};
use crate::model::Product;
use crate::repository::{PRIMARY_KEY, TABLE};
use crate::response::{filter_text, table_rows, Created, Deleted, TableRows, Updated};
use crate::state::AppState;
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SchemaParams {
    /// Schema holding the table; `public` when absent.
    pub esquema: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListParams {
    /// Schema holding the table; `public` when absent.
    pub esquema: Option<String>,
    /// Maximum rows returned; 1000 when absent or not positive.
    pub limite: Option<i64>,
}

fn query_params<T>(params: Result<Query<T>, QueryRejection>) -> Result<T, AppError> {
    params
        .map(|Query(p)| p)
        .map_err(|e| AppError::BadRequest(e.body_text()))
}

fn product_body(body: Result<Json<Product>, JsonRejection>) -> Result<Product, AppError> {
    body.map(|Json(p)| p)
        .map_err(|e| AppError::BadRequest(e.body_text()))
}

fn no_such_product(codigo: &str) -> AppError {
    AppError::NotFound(format!("No existe producto con {}", filter_text(PRIMARY_KEY, codigo)))
}

#[utoipa::path(
    get,
    path = "/api/producto/",
    tag = "Producto",
    params(ListParams),
    responses(
        (status = 200, description = "Products", body = TableRows),
        (status = 204, description = "No products"),
        (status = 400, description = "Invalid parameters", body = ErrorBody),
        (status = 500, description = "Server error", body = ErrorBody),
    )
)]
pub async fn list_products(
    State(state): State<AppState>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Response, AppError> {
    let params = query_params(params)?;
    let rows = state
        .products
        .list(params.esquema.as_deref(), params.limite)
        .await?;
    if rows.is_empty() {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }
    Ok(Json(table_rows(TABLE, rows)).into_response())
}

#[utoipa::path(
    get,
    path = "/api/producto/{codigo}",
    tag = "Producto",
    params(("codigo" = String, Path, description = "Product code"), SchemaParams),
    responses(
        (status = 200, description = "Matching products", body = TableRows),
        (status = 404, description = "Not found", body = ErrorBody),
        (status = 500, description = "Server error", body = ErrorBody),
    )
)]
pub async fn get_product(
    State(state): State<AppState>,
    Path(codigo): Path<String>,
    params: Result<Query<SchemaParams>, QueryRejection>,
) -> Result<Json<TableRows>, AppError> {
    let params = query_params(params)?;
    let rows = state
        .products
        .get_by_code(&codigo, params.esquema.as_deref())
        .await?;
    if rows.is_empty() {
        return Err(AppError::NotFound(format!(
            "No se encontró producto con {}",
            filter_text(PRIMARY_KEY, &codigo)
        )));
    }
    Ok(Json(table_rows(TABLE, rows)))
}

#[utoipa::path(
    post,
    path = "/api/producto/",
    tag = "Producto",
    params(SchemaParams),
    request_body = Product,
    responses(
        (status = 200, description = "Created", body = Created),
        (status = 400, description = "Invalid data", body = ErrorBody),
        (status = 500, description = "Insert failed", body = ErrorBody),
    )
)]
pub async fn create_product(
    State(state): State<AppState>,
    params: Result<Query<SchemaParams>, QueryRejection>,
    body: Result<Json<Product>, JsonRejection>,
) -> Result<Json<Created>, AppError> {
    let params = query_params(params)?;
    let payload = product_body(body)?.into_payload();
    if !state
        .products
        .create(&payload, params.esquema.as_deref())
        .await?
    {
        return Err(AppError::Internal("No se pudo crear el producto.".into()));
    }
    Ok(Json(Created {
        estado: StatusCode::OK.as_u16(),
        mensaje: "Producto creado exitosamente.".into(),
        datos: payload,
    }))
}

#[utoipa::path(
    put,
    path = "/api/producto/{codigo}",
    tag = "Producto",
    params(("codigo" = String, Path, description = "Product code"), SchemaParams),
    request_body = Product,
    responses(
        (status = 200, description = "Updated", body = Updated),
        (status = 400, description = "Invalid data", body = ErrorBody),
        (status = 404, description = "Not found", body = ErrorBody),
        (status = 500, description = "Server error", body = ErrorBody),
    )
)]
pub async fn update_product(
    State(state): State<AppState>,
    Path(codigo): Path<String>,
    params: Result<Query<SchemaParams>, QueryRejection>,
    body: Result<Json<Product>, JsonRejection>,
) -> Result<Json<Updated>, AppError> {
    let params = query_params(params)?;
    // The path code wins; a codigo in the body is ignored.
    let payload = product_body(body)?.into_update_payload();
    let affected = state
        .products
        .update(&codigo, &payload, params.esquema.as_deref())
        .await?;
    if affected == 0 {
        return Err(no_such_product(&codigo));
    }
    Ok(Json(Updated {
        estado: StatusCode::OK.as_u16(),
        mensaje: "Producto actualizado exitosamente.".into(),
        filtro: filter_text(PRIMARY_KEY, &codigo),
        filas_afectadas: affected,
    }))
}

#[utoipa::path(
    delete,
    path = "/api/producto/{codigo}",
    tag = "Producto",
    params(("codigo" = String, Path, description = "Product code"), SchemaParams),
    responses(
        (status = 200, description = "Deleted", body = Deleted),
        (status = 404, description = "Not found", body = ErrorBody),
        (status = 500, description = "Server error", body = ErrorBody),
    )
)]
pub async fn delete_product(
    State(state): State<AppState>,
    Path(codigo): Path<String>,
    params: Result<Query<SchemaParams>, QueryRejection>,
) -> Result<Json<Deleted>, AppError> {
    let params = query_params(params)?;
    let deleted = state
        .products
        .delete(&codigo, params.esquema.as_deref())
        .await?;
    if deleted == 0 {
        return Err(no_such_product(&codigo));
    }
    Ok(Json(Deleted {
        estado: StatusCode::OK.as_u16(),
        mensaje: "Producto eliminado exitosamente.".into(),
        filtro: filter_text(PRIMARY_KEY, &codigo),
        filas_eliminadas: deleted,
    }))
}
