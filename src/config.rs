//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// TCP port the dispatch layer listens on
    pub server_port: u16,
    /// Maximum number of concurrently handled requests
    pub max_concurrent_requests: usize,
    /// Maximum number of pages the cache can hold
    pub cache_capacity: usize,
    /// Seconds a cached page may remain unrefreshed before expiring
    pub cache_ttl: u64,
    /// Path of the persisted statistics snapshot
    pub snapshot_path: String,
    /// MediaWiki Action API endpoint for the content source
    pub wiki_api_url: String,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - TCP listen port (default: 4949)
    /// - `MAX_CONCURRENT_REQUESTS` - Worker pool size (default: 10)
    /// - `CACHE_CAPACITY` - Maximum cached pages (default: 100)
    /// - `CACHE_TTL` - Page TTL in seconds (default: 3600)
    /// - `SNAPSHOT_PATH` - Statistics snapshot file (default: local/stats.json)
    /// - `WIKI_API_URL` - Content source endpoint (default: en.wikipedia.org)
    pub fn from_env() -> Self {
        Self {
            server_port: env::var("SERVER_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(4949),
            max_concurrent_requests: env::var("MAX_CONCURRENT_REQUESTS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),
            cache_capacity: env::var("CACHE_CAPACITY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(100),
            cache_ttl: env::var("CACHE_TTL")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3600),
            snapshot_path: env::var("SNAPSHOT_PATH")
                .unwrap_or_else(|_| "local/stats.json".to_string()),
            wiki_api_url: env::var("WIKI_API_URL")
                .unwrap_or_else(|_| "https://en.wikipedia.org/w/api.php".to_string()),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 4949,
            max_concurrent_requests: 10,
            cache_capacity: 100,
            cache_ttl: 3600,
            snapshot_path: "local/stats.json".to_string(),
            wiki_api_url: "https://en.wikipedia.org/w/api.php".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.server_port, 4949);
        assert_eq!(config.max_concurrent_requests, 10);
        assert_eq!(config.cache_capacity, 100);
        assert_eq!(config.cache_ttl, 3600);
        assert_eq!(config.snapshot_path, "local/stats.json");
    }

    #[test]
    fn test_config_from_env_defaults() {
        // Clear any existing env vars to test defaults
        env::remove_var("SERVER_PORT");
        env::remove_var("MAX_CONCURRENT_REQUESTS");
        env::remove_var("CACHE_CAPACITY");
        env::remove_var("CACHE_TTL");
        env::remove_var("SNAPSHOT_PATH");
        env::remove_var("WIKI_API_URL");

        let config = Config::from_env();
        assert_eq!(config.server_port, 4949);
        assert_eq!(config.max_concurrent_requests, 10);
        assert_eq!(config.cache_capacity, 100);
        assert_eq!(config.cache_ttl, 3600);
        assert!(config.wiki_api_url.contains("wikipedia.org"));
    }
}
