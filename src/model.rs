//! Request model for `producto`.

use crate::repository::Payload;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

/// A product as accepted by POST and PUT. Missing optional fields are null.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Product {
    #[schema(example = "PR001")]
    pub codigo: String,
    #[schema(example = "Lapicero azul")]
    pub nombre: String,
    #[serde(default)]
    pub stock: Option<i64>,
    #[serde(default)]
    pub valorunitario: Option<f64>,
}

impl Product {
    /// Every field, nulls included, for INSERT.
    pub fn into_payload(self) -> Payload {
        let mut payload = Payload::new();
        payload.insert("codigo".into(), Value::String(self.codigo.clone()));
        payload.extend(self.into_update_payload());
        payload
    }

    /// Every field except the key, nulls included, for UPDATE.
    pub fn into_update_payload(self) -> Payload {
        let mut payload = Payload::new();
        payload.insert("nombre".into(), Value::String(self.nombre));
        payload.insert("stock".into(), self.stock.map_or(Value::Null, Value::from));
        payload.insert(
            "valorunitario".into(),
            self.valorunitario.map_or(Value::Null, Value::from),
        );
        payload
    }
}
