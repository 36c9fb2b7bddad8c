//! Server configuration module
//!
//! Handles loading configuration from environment variables with sensible defaults.

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use randimg_core::GiphyConfig;

/// Server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port (default: 3000)
    pub port: u16,
    /// Server host (default: 127.0.0.1)
    pub host: [u8; 4],
    /// Whether this is a production deployment (APP_ENV=production)
    pub production: bool,
    /// Allowed CORS origins, comma-separated (default: allow all in dev)
    pub allowed_origins: Option<Vec<String>>,
    /// Request body limit in MB (default: 1)
    pub body_limit_mb: usize,
    /// Request timeout in seconds (default: 30)
    pub timeout_secs: u64,
    /// Enable rate limiting (default: false for tests, true when loaded from env)
    pub rate_limit_enabled: bool,
    /// Rate limit: requests per second (default: 10)
    pub rate_limit_per_sec: u64,
    /// Rate limit: burst size (default: 20)
    pub rate_limit_burst: u32,
    /// PostgreSQL connection string (in-memory storage when unset)
    pub database_url: Option<String>,
    /// Database connection pool maximum connections (default: 20)
    pub database_max_connections: u32,
    /// Database connection pool minimum connections (default: 2)
    pub database_min_connections: u32,
    /// Extra attempts after a duplicate image was fetched (default: 3)
    pub retry_count: u32,
    /// Default lifetime of cached responses in seconds (default: 60)
    pub cache_ttl_secs: u64,
    /// Interval between sweeps of expired cache entries in seconds (default: 100)
    pub cache_check_period_secs: u64,
    /// Lifetime of cached image listings in seconds, overriding `cache_ttl_secs`
    pub images_cache_ttl_secs: Option<u64>,
    /// Giphy API key
    pub giphy_api_key: String,
    /// Giphy API base URL
    pub giphy_base_url: String,
    /// Giphy random image endpoint path
    pub giphy_random_image_path: String,
    /// Use the mock image source instead of Giphy (default: false)
    pub mock_source: bool,
    /// Emit logs as JSON (LOG_FORMAT=json)
    pub log_json: bool,
}

/// Parse a variable into any `FromStr` type; unset or malformed values yield `None`.
fn parse_var<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    lookup(key).and_then(|v| v.trim().parse().ok())
}

impl Default for Config {
    fn default() -> Self {
        let giphy = GiphyConfig::default();
        Self {
            port: 3000,
            host: [127, 0, 0, 1],
            production: false,
            allowed_origins: None, // None = allow all (dev mode)
            body_limit_mb: 1,
            timeout_secs: 30,
            rate_limit_enabled: false, // Disabled by default (for tests)
            rate_limit_per_sec: 10,
            rate_limit_burst: 20,
            database_url: None,
            database_max_connections: 20,
            database_min_connections: 2,
            retry_count: 3,
            cache_ttl_secs: 60,
            cache_check_period_secs: 100,
            images_cache_ttl_secs: None,
            giphy_api_key: giphy.api_key,
            giphy_base_url: giphy.base_url,
            giphy_random_image_path: giphy.random_image_path,
            mock_source: false,
            log_json: false,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let flag = |key: &str| lookup(key).map(|v| v.to_lowercase() == "true");

        let host = lookup("HOST")
            .map(|h| {
                if h == "0.0.0.0" {
                    [0, 0, 0, 0]
                } else {
                    [127, 0, 0, 1]
                }
            })
            .unwrap_or(defaults.host);

        let allowed_origins = lookup("ALLOWED_ORIGINS").map(|origins| {
            origins
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        });

        // Rate limiting enabled by default in production, can be disabled with RATE_LIMIT_ENABLED=false
        let rate_limit_enabled = lookup("RATE_LIMIT_ENABLED")
            .map(|v| v.to_lowercase() != "false")
            .unwrap_or(true);

        let database_url = lookup("DATABASE_URL").filter(|url| !url.is_empty());

        Self {
            port: parse_var(&lookup, "PORT").unwrap_or(defaults.port),
            host,
            production: lookup("APP_ENV").is_some_and(|env| env == "production"),
            allowed_origins,
            body_limit_mb: parse_var(&lookup, "BODY_LIMIT_MB").unwrap_or(defaults.body_limit_mb),
            timeout_secs: parse_var(&lookup, "REQUEST_TIMEOUT_SECS")
                .unwrap_or(defaults.timeout_secs),
            rate_limit_enabled,
            rate_limit_per_sec: parse_var(&lookup, "RATE_LIMIT_PER_SEC")
                .unwrap_or(defaults.rate_limit_per_sec),
            rate_limit_burst: parse_var(&lookup, "RATE_LIMIT_BURST")
                .unwrap_or(defaults.rate_limit_burst),
            database_url,
            database_max_connections: parse_var(&lookup, "DATABASE_MAX_CONNECTIONS")
                .unwrap_or(defaults.database_max_connections),
            database_min_connections: parse_var(&lookup, "DATABASE_MIN_CONNECTIONS")
                .unwrap_or(defaults.database_min_connections),
            retry_count: parse_var(&lookup, "RETRY_COUNT").unwrap_or(defaults.retry_count),
            cache_ttl_secs: parse_var(&lookup, "CACHE_TTL_SECS").unwrap_or(defaults.cache_ttl_secs),
            cache_check_period_secs: parse_var(&lookup, "CACHE_CHECK_PERIOD_SECS")
                .unwrap_or(defaults.cache_check_period_secs),
            images_cache_ttl_secs: parse_var(&lookup, "IMAGES_CACHE_TTL_SECS"),
            giphy_api_key: lookup("GIPHY_API_KEY").unwrap_or(defaults.giphy_api_key),
            giphy_base_url: lookup("GIPHY_BASE_URL").unwrap_or(defaults.giphy_base_url),
            giphy_random_image_path: lookup("GIPHY_RANDOM_IMAGE_PATH")
                .unwrap_or(defaults.giphy_random_image_path),
            mock_source: flag("RANDIMG_MOCK_SOURCE").unwrap_or(defaults.mock_source),
            log_json: lookup("LOG_FORMAT").is_some_and(|f| f.eq_ignore_ascii_case("json")),
        }
    }

    /// Get socket address from config
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::from((self.host, self.port))
    }

    /// Default cache entry lifetime
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// Cache sweep interval
    pub fn cache_check_period(&self) -> Duration {
        Duration::from_secs(self.cache_check_period_secs)
    }

    /// Route TTL for `GET /images`; `None` uses the cache default
    pub fn images_cache_ttl(&self) -> Option<Duration> {
        self.images_cache_ttl_secs.map(Duration::from_secs)
    }

    /// Giphy client settings
    pub fn giphy(&self) -> GiphyConfig {
        GiphyConfig {
            api_key: self.giphy_api_key.clone(),
            base_url: self.giphy_base_url.clone(),
            random_image_path: self.giphy_random_image_path.clone(),
            ..Default::default()
        }
    }

    /// Whether internal error messages may be shown to clients
    pub fn expose_internal_errors(&self) -> bool {
        !self.production
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.port, 3000);
        assert_eq!(config.retry_count, 3);
        assert_eq!(config.cache_check_period_secs, 100);
        assert!(config.database_url.is_none());
        assert!(!config.production);
        assert!(config.expose_internal_errors());
    }

    #[test]
    fn test_from_lookup_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("PORT", "8080"),
            ("HOST", "0.0.0.0"),
            ("APP_ENV", "production"),
            ("RETRY_COUNT", "5"),
            ("CACHE_TTL_SECS", "10"),
            ("GIPHY_API_KEY", "key"),
            ("ALLOWED_ORIGINS", "https://a.example, ,https://b.example"),
            ("DATABASE_URL", ""),
            ("LOG_FORMAT", "JSON"),
        ]));

        assert_eq!(config.port, 8080);
        assert_eq!(config.host, [0, 0, 0, 0]);
        assert!(config.production);
        assert!(!config.expose_internal_errors());
        assert_eq!(config.retry_count, 5);
        assert_eq!(config.cache_ttl(), Duration::from_secs(10));
        assert_eq!(config.giphy().api_key, "key");
        assert_eq!(
            config.allowed_origins,
            Some(vec![
                "https://a.example".to_string(),
                "https://b.example".to_string()
            ])
        );
        assert!(config.database_url.is_none());
        assert!(config.log_json);
    }

    #[test]
    fn test_from_lookup_parses_every_numeric_type() {
        let config = Config::from_lookup(lookup_from(&[
            ("PORT", " 9000 "),
            ("BODY_LIMIT_MB", "4"),
            ("REQUEST_TIMEOUT_SECS", "15"),
            ("RATE_LIMIT_PER_SEC", "7"),
            ("RATE_LIMIT_BURST", "9"),
            ("DATABASE_MAX_CONNECTIONS", "12"),
            ("DATABASE_MIN_CONNECTIONS", "1"),
            ("CACHE_CHECK_PERIOD_SECS", "30"),
        ]));

        assert_eq!(config.port, 9000);
        assert_eq!(config.body_limit_mb, 4);
        assert_eq!(config.timeout_secs, 15);
        assert_eq!(config.rate_limit_per_sec, 7);
        assert_eq!(config.rate_limit_burst, 9);
        assert_eq!(config.database_max_connections, 12);
        assert_eq!(config.database_min_connections, 1);
        assert_eq!(config.cache_check_period(), Duration::from_secs(30));
        assert_eq!(config.images_cache_ttl(), None);

        let config = Config::from_lookup(lookup_from(&[("IMAGES_CACHE_TTL_SECS", "5")]));
        assert_eq!(config.images_cache_ttl(), Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_from_lookup_ignores_unparsable_values() {
        let config = Config::from_lookup(lookup_from(&[
            ("PORT", "not-a-port"),
            ("RETRY_COUNT", "-1"),
        ]));
        assert_eq!(config.port, 3000);
        assert_eq!(config.retry_count, 3);
        assert!(config.rate_limit_enabled);
    }
}
