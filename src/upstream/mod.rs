//! Client for the public earthquake catalog this service fronts.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;

use crate::config::Config;

pub const FORMAT_GEOJSON: &str = "geojson";

#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    #[error("upstream request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("upstream responded with status {0}")]
    Status(StatusCode),
}

/// Ordered query-string parameters for a single catalog call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpstreamQuery {
    params: Vec<(&'static str, String)>,
}

impl UpstreamQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: &'static str, value: impl Into<String>) -> &mut Self {
        self.params.push((name, value.into()));
        self
    }

    /// Lookup of a single event by its catalog identifier.
    pub fn for_event(id: &str) -> Self {
        let mut query = Self::new();
        query.push("eventid", id).push("format", FORMAT_GEOJSON);
        query
    }

    pub fn params(&self) -> &[(&'static str, String)] {
        &self.params
    }

    #[cfg(test)]
    pub(crate) fn get(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.as_str())
    }
}

#[async_trait]
pub trait EarthquakeSource: Send + Sync {
    async fn query(&self, query: &UpstreamQuery) -> Result<Value, UpstreamError>;
}

/// Catalog client over HTTPS. No timeout and no retry is applied to calls.
#[derive(Clone)]
pub struct UsgsClient {
    http: reqwest::Client,
    url: String,
}

impl UsgsClient {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            url: url.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.upstream_url.clone())
    }
}

#[async_trait]
impl EarthquakeSource for UsgsClient {
    async fn query(&self, query: &UpstreamQuery) -> Result<Value, UpstreamError> {
        tracing::debug!("Querying upstream {} with {:?}", self.url, query.params());
        let response = self.http.get(&self.url).query(query.params()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Status(status));
        }

        Ok(response.json::<Value>().await?)
    }
}
