use std::sync::Arc;

use axum::{
    Json,
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::{ResponseCache, cache_key};

/// Answers from the cache while the entry is fresh; otherwise hands the request to the route.
pub async fn cache_lookup(
    State(cache): State<Arc<ResponseCache>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let key = cache_key(req.uri());

    if let Some(payload) = cache.get(&key) {
        tracing::debug!("cache hit: {}", key);
        return Json(payload).into_response();
    }

    tracing::debug!("cache miss: {}", key);
    next.run(req).await
}
