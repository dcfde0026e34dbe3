//! Typed errors and HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("provider '{provider}' is not supported (options: {})", .options.join(", "))]
    UnsupportedProvider { provider: String, options: Vec<String> },
    #[error("no connection string for provider '{provider}'; set {variable}")]
    MissingConnectionString { provider: String, variable: String },
    #[error("invalid value for {key}: '{value}'")]
    Invalid { key: &'static str, value: String },
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("{0}")]
    InvalidArgument(String),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    /// Statement failure against a schema-qualified table. The driver error is kept as source.
    #[error("postgres error while {operation} '{table}': {source}")]
    Repository {
        operation: &'static str,
        table: String,
        #[source]
        source: sqlx::Error,
    },
    #[error("{0}")]
    Internal(String),
}

impl AppError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        AppError::InvalidArgument(msg.into())
    }

    pub fn repository(operation: &'static str, table: impl Into<String>, source: sqlx::Error) -> Self {
        AppError::Repository {
            operation,
            table: table.into(),
            source,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidArgument(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Config(_) | AppError::Repository { .. } | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Short human-readable message for the response envelope; the cause goes in `detalle`.
    fn summary(&self) -> &'static str {
        match self {
            AppError::InvalidArgument(_) | AppError::BadRequest(_) => "Datos inválidos.",
            AppError::NotFound(_) => "Recurso no encontrado.",
            _ => "Error interno del servidor.",
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    pub detail: ErrorDetail,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorDetail {
    pub estado: u16,
    pub mensaje: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detalle: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        // Not-found carries its own message and no cause.
        let (mensaje, detalle) = match &self {
            AppError::NotFound(msg) => (msg.clone(), None),
            other => (other.summary().to_string(), Some(other.to_string())),
        };
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = ErrorBody {
            detail: ErrorDetail {
                estado: status.as_u16(),
                mensaje,
                detalle,
            },
        };
        (status, Json(body)).into_response()
    }
}
