use serde::Deserialize;

use crate::upstream::{FORMAT_GEOJSON, UpstreamQuery};

const DEFAULT_LIMIT: &str = "10";

/// Filters accepted by the listing route. Values are forwarded as text, unvalidated.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EarthquakeQuery {
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub min_magnitude: Option<String>,
    pub max_magnitude: Option<String>,
    pub limit: Option<String>,
}

impl EarthquakeQuery {
    /// Catalog parameters for this listing: the supplied non-empty filters, the limit
    /// (defaulting to 10) and the geojson format.
    pub fn upstream_query(&self) -> UpstreamQuery {
        let mut query = UpstreamQuery::new();

        let filters = [
            ("starttime", &self.start_time),
            ("endtime", &self.end_time),
            ("minmagnitude", &self.min_magnitude),
            ("maxmagnitude", &self.max_magnitude),
        ];
        for (name, value) in filters {
            if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
                query.push(name, value);
            }
        }

        query.push("limit", self.limit.as_deref().unwrap_or(DEFAULT_LIMIT));
        query.push("format", FORMAT_GEOJSON);
        query
    }
}
