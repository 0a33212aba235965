use std::sync::Arc;

use cache::ResponseCache;
use config::Config;
use upstream::EarthquakeSource;

pub mod cache;
pub mod config;
pub mod error;
pub mod middleware;
pub mod router;
pub mod routes;
pub mod upstream;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub cache: Arc<ResponseCache>,
    pub upstream: Arc<dyn EarthquakeSource>,
}

impl AppState {
    pub fn new(config: Config, upstream: Arc<dyn EarthquakeSource>) -> Self {
        Self {
            config,
            cache: Arc::new(ResponseCache::new()),
            upstream,
        }
    }
}
