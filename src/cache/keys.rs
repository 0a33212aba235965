use axum::http::Uri;

const RESPONSE_PREFIX: &str = "cache:";

/// Cache key for a request: the path and query string exactly as received, so differently
/// ordered parameters are distinct keys.
pub fn cache_key(uri: &Uri) -> String {
    let path_and_query = uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| uri.path());
    format!("{}{}", RESPONSE_PREFIX, path_and_query)
}
