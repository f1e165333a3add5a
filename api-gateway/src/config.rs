//! Application configuration

use std::env;

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// API port
    pub port: u16,
    /// Database URL; the in-memory repository is used when absent
    pub database_url: Option<String>,
    /// Seed for the mock quote feed
    pub seed_quotes: Option<u64>,
    /// Reject tickers the mock feed does not list
    pub strict_symbols: bool,
}

impl AppConfig {
    /// Create a new configuration from environment variables
    pub fn new() -> Self {
        Self {
            port: env::var("API_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8081),
            database_url: env::var("DATABASE_URL").ok().filter(|url| !url.is_empty()),
            seed_quotes: env::var("SEED_QUOTES").ok().and_then(|s| s.parse().ok()),
            strict_symbols: env::var("STRICT_SYMBOLS")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::new()
    }
}
