//! Response envelopes for the product endpoints.

use crate::repository::{Payload, RowRecord};
use serde::Serialize;
use utoipa::ToSchema;

/// Rows read from a table.
#[derive(Debug, Serialize, ToSchema)]
pub struct TableRows {
    pub tabla: String,
    pub total: usize,
    #[schema(value_type = Vec<Object>)]
    pub datos: Vec<RowRecord>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Created {
    pub estado: u16,
    pub mensaje: String,
    #[schema(value_type = Object)]
    pub datos: Payload,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Updated {
    pub estado: u16,
    pub mensaje: String,
    pub filtro: String,
    pub filas_afectadas: u64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Deleted {
    pub estado: u16,
    pub mensaje: String,
    pub filtro: String,
    pub filas_eliminadas: u64,
}

pub fn table_rows(tabla: &str, datos: Vec<RowRecord>) -> TableRows {
    TableRows {
        tabla: tabla.to_string(),
        total: datos.len(),
        datos,
    }
}

/// `column = value`, as echoed back by update and delete.
pub fn filter_text(column: &str, value: &str) -> String {
    format!("{} = {}", column, value)
}
