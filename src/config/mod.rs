use std::env;
use std::net::{IpAddr, Ipv6Addr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_UPSTREAM_URL: &str = "https://earthquake.usgs.gov/fdsnws/event/1/query";

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub rate_limit_window_ms: u64,
    pub rate_limit_max_requests: u32,
    pub cache_ttl_earthquakes_secs: u64,
    pub cache_ttl_earthquake_details_secs: u64,
    pub upstream_url: String,
    pub trust_proxy: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server_host: "0.0.0.0".into(),
            server_port: 3000,
            rate_limit_window_ms: 60_000,
            rate_limit_max_requests: 100,
            cache_ttl_earthquakes_secs: 300,
            cache_ttl_earthquake_details_secs: 600,
            upstream_url: DEFAULT_UPSTREAM_URL.into(),
            trust_proxy: false,
        }
    }
}

impl Config {
    /// Loads `.env` if present, then resolves every field from the process environment.
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Resolves every field through `lookup`. Unset, empty or malformed values fall back to
    /// the default.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();
        let text = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        Config {
            server_host: text("SERVER_HOST").unwrap_or(defaults.server_host),
            server_port: parse_or(text("PORT"), "PORT", defaults.server_port),
            rate_limit_window_ms: nonzero_or(
                parse_or(
                    text("RATE_LIMIT_WINDOW_MS"),
                    "RATE_LIMIT_WINDOW_MS",
                    defaults.rate_limit_window_ms,
                ),
                defaults.rate_limit_window_ms,
            ),
            rate_limit_max_requests: nonzero_or(
                parse_or(
                    text("RATE_LIMIT_MAX_REQUESTS"),
                    "RATE_LIMIT_MAX_REQUESTS",
                    defaults.rate_limit_max_requests,
                ),
                defaults.rate_limit_max_requests,
            ),
            cache_ttl_earthquakes_secs: parse_or(
                text("CACHE_TTL_EARTHQUAKES"),
                "CACHE_TTL_EARTHQUAKES",
                defaults.cache_ttl_earthquakes_secs,
            ),
            cache_ttl_earthquake_details_secs: parse_or(
                text("CACHE_TTL_EARTHQUAKE_DETAILS"),
                "CACHE_TTL_EARTHQUAKE_DETAILS",
                defaults.cache_ttl_earthquake_details_secs,
            ),
            upstream_url: text("UPSTREAM_URL").unwrap_or(defaults.upstream_url),
            trust_proxy: text("TRUST_PROXY")
                .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(defaults.trust_proxy),
        }
    }

    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_millis(self.rate_limit_window_ms)
    }

    pub fn earthquakes_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_earthquakes_secs)
    }

    pub fn earthquake_details_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_earthquake_details_secs)
    }

    pub fn socket_addr(&self) -> SocketAddr {
        let ip = self.server_host.parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid server_host, falling back to dual-stack default");
            IpAddr::V6(Ipv6Addr::UNSPECIFIED)
        });
        SocketAddr::new(ip, self.server_port)
    }
}

fn parse_or<T: FromStr>(value: Option<String>, key: &str, default: T) -> T {
    match value {
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            tracing::warn!("Ignoring non-numeric {}={:?}, using default", key, raw);
            default
        }),
        None => default,
    }
}

fn nonzero_or<T: Default + PartialEq>(value: T, default: T) -> T {
    if value == T::default() { default } else { value }
}
