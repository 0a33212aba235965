use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{PathRejection, QueryRejection},
    },
    http::Uri,
};
use serde_json::Value;

use super::model::EarthquakeQuery;
use crate::AppState;
use crate::cache::cache_key;
use crate::error::AppError;
use crate::upstream::UpstreamQuery;

#[axum::debug_handler]
pub async fn list_earthquakes(
    State(state): State<AppState>,
    uri: Uri,
    query: Result<Query<EarthquakeQuery>, QueryRejection>,
) -> Result<Json<Value>, AppError> {
    let Query(query) = query.map_err(|e| {
        tracing::error!("Rejected earthquake query {}: {}", uri, e.body_text());
        AppError::FetchEarthquakes
    })?;
    match state.upstream.query(&query.upstream_query()).await {
        Ok(payload) => {
            state
                .cache
                .set(cache_key(&uri), payload.clone(), state.config.earthquakes_ttl());
            Ok(Json(payload))
        }
        Err(e) => {
            tracing::error!("Failed to fetch earthquake data: {}", e);
            Err(AppError::FetchEarthquakes)
        }
    }
}

#[axum::debug_handler]
pub async fn get_earthquake(
    State(state): State<AppState>,
    uri: Uri,
    id: Result<Path<String>, PathRejection>,
) -> Result<Json<Value>, AppError> {
    let Path(id) = id.map_err(|e| {
        tracing::error!("Rejected earthquake path {}: {}", uri, e.body_text());
        AppError::Internal
    })?;
    match state.upstream.query(&UpstreamQuery::for_event(&id)).await {
        Ok(payload) => {
            state.cache.set(
                cache_key(&uri),
                payload.clone(),
                state.config.earthquake_details_ttl(),
            );
            Ok(Json(payload))
        }
        Err(e) => {
            tracing::error!("Failed to fetch earthquake {}: {}", id, e);
            Err(AppError::FetchEarthquakeDetails)
        }
    }
}
