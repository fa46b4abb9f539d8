///! Service error taxonomy and its HTTP mapping.
///!
///! Every internal operation returns a typed error; this is the single
///! place where those are turned into status codes and JSON bodies.
///! Internal failures are logged in full and answered with a generic
///! body — no detail leaks past the boundary.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use crate::module::country::store::QueryError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("external data source unavailable: {source_name}")]
    UpstreamUnavailable { source_name: &'static str },

    #[error("country not found")]
    NotFound,

    #[error("summary image not found")]
    ImageNotFound,

    #[error("{0}")]
    BadQuery(String),

    #[error("storage failure: {0}")]
    Persistence(#[from] sqlx::Error),

    #[error("image rendering failed: {0}")]
    Render(anyhow::Error),
}

impl From<QueryError> for ApiError {
    fn from(e: QueryError) -> Self {
        match e {
            QueryError::UnknownFilter(key) => ApiError::BadQuery(format!("unknown filter key '{key}'")),
            QueryError::UnsupportedSort(value) => {
                ApiError::BadQuery(format!("unsupported sort '{value}'"))
            }
            QueryError::Db(e) => ApiError::Persistence(e),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ApiError::UpstreamUnavailable { source_name } => (
                StatusCode::SERVICE_UNAVAILABLE,
                json!({
                    "error": "External data source unavailable",
                    "details": format!("Could not fetch data from {source_name}"),
                }),
            ),
            ApiError::NotFound => (
                StatusCode::NOT_FOUND,
                json!({ "error": "Country not found" }),
            ),
            ApiError::ImageNotFound => (
                StatusCode::NOT_FOUND,
                json!({ "error": "Summary image not found" }),
            ),
            ApiError::BadQuery(message) => {
                (StatusCode::BAD_REQUEST, json!({ "error": message }))
            }
            ApiError::Persistence(e) => {
                tracing::error!("Storage failure: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Internal server error" }),
                )
            }
            ApiError::Render(e) => {
                tracing::error!("Image rendering failed: {e:#}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Internal server error" }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}
