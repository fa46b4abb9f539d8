///! HTTP surface: router construction and request handlers.
///!
///! Handlers are thin glue over the store and the refresh pipeline;
///! every failure path is a typed [`ApiError`] mapped to a status code
///! in one place.

use axum::Json;
use axum::Router;
use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use serde_json::json;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::error::ApiError;
use crate::module::country::store::CountryStore;
use crate::module::country::types::{Country, StatusSummary};
use crate::module::country::updater::RefreshService;

/// Shared handler state, constructed once at startup.
pub struct AppState {
    pub store: CountryStore,
    pub refresh: RefreshService,
    pub image_path: PathBuf,
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/countries/refresh", post(refresh_countries))
        .route("/countries", get(get_countries))
        .route("/countries/status", get(get_status))
        .route("/countries/image", get(get_summary_image))
        .route("/countries/images", get(get_summary_image))
        .route("/countries/{name}", get(get_country).delete(delete_country))
        .route("/status", get(get_status))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Liveness banner
async fn home() -> impl IntoResponse {
    Json("Welcome to the Country Currency & Exchange API")
}

/// Fetch both upstreams, reconcile into the store, regenerate the
/// summary image.
async fn refresh_countries(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    state.refresh.refresh().await?;
    Ok(Json(json!({ "message": "Countries refreshed successfully!" })))
}

/// List countries with optional filtering and sorting.
async fn get_countries(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Vec<Country>>, ApiError> {
    let countries = state.store.get_all(&params).await?;
    Ok(Json(countries))
}

/// Fetch a single country by (case-insensitive) name.
async fn get_country(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<Country>, ApiError> {
    match state.store.get_by_name(&name).await? {
        Some(country) => Ok(Json(country)),
        None => Err(ApiError::NotFound),
    }
}

/// Delete a country by name.
async fn delete_country(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    if state.store.delete(&name).await? {
        Ok(Json(json!({
            "message": format!("Country '{}' deleted successfully", name)
        })))
    } else {
        Err(ApiError::NotFound)
    }
}

/// Aggregate status: row count and newest refresh timestamp.
async fn get_status(
    State(state): State<Arc<AppState>>,
) -> Result<Json<StatusSummary>, ApiError> {
    Ok(Json(state.store.status().await?))
}

/// Serve the cached summary PNG. Absent until the first successful
/// refresh — any read failure is reported as not-yet-generated.
async fn get_summary_image(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    match tokio::fs::read(&state.image_path).await {
        Ok(bytes) => Ok(([(header::CONTENT_TYPE, "image/png")], bytes).into_response()),
        Err(_) => Err(ApiError::ImageNotFound),
    }
}
