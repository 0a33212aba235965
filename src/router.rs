use std::sync::Arc;

use axum::{Router, middleware, routing::get};
use tower::ServiceBuilder;
use tower_http::{catch_panic::CatchPanicLayer, cors::CorsLayer};

use crate::{
    AppState,
    cache::cache_lookup,
    middleware::{RateLimiter, handle_panic, log_errors, rate_limit},
    routes,
};

/// The two earthquake routes. Cache lookup is layered on these routes only.
pub fn earthquake_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/earthquakes", get(routes::earthquake::list_earthquakes))
        .route("/earthquakes/{id}", get(routes::earthquake::get_earthquake))
        .route_layer(middleware::from_fn_with_state(
            state.cache.clone(),
            cache_lookup,
        ))
}

/// Assembles the service. Layers run in the order listed: CORS, rate limiting, panic
/// recovery, server-error logging, then the routes.
pub fn create_router(state: AppState, limiter: Arc<RateLimiter>) -> Router {
    earthquake_routes(&state)
        .layer(
            ServiceBuilder::new()
                .layer(CorsLayer::permissive())
                .layer(middleware::from_fn_with_state(limiter, rate_limit))
                .layer(CatchPanicLayer::custom(handle_panic))
                .layer(middleware::from_fn(log_errors)),
        )
        .with_state(state)
}
