use std::env;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Postgres (snapshot backend)
    pub database_url: String,

    // AI provider
    pub anthropic_api_key: String,

    // Sync
    pub sync_items_per_source: usize,
}

impl Config {
    /// Load configuration from environment variables.
    /// Panics with a clear message if required vars are missing.
    pub fn from_env() -> Self {
        Self {
            database_url: required_env("DATABASE_URL"),
            anthropic_api_key: required_env("ANTHROPIC_API_KEY"),
            sync_items_per_source: env::var("SYNC_ITEMS_PER_SOURCE")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .expect("SYNC_ITEMS_PER_SOURCE must be a number"),
        }
    }

    /// Load a minimal config for read-only operations (no AI key needed).
    pub fn read_only_from_env() -> Self {
        Self {
            database_url: required_env("DATABASE_URL"),
            anthropic_api_key: String::new(),
            sync_items_per_source: 5,
        }
    }
}

fn required_env(key: &str) -> String {
    env::var(key).unwrap_or_else(|_| panic!("{key} environment variable is required"))
}
