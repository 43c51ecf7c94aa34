//! Local cache database
//!
//! The on-device listing cache lives in SQLite. This module builds the pool
//! for it. An in-memory database only exists for as long as its connection
//! does, so memory URLs get a single connection that is never recycled.

use crate::error::{DatabaseError, DatabaseResult};
use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
};
use std::str::FromStr;
use tracing::info;

/// Configuration for the local SQLite cache
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// SQLite connection URL (e.g., "sqlite://listings.db" or "sqlite::memory:")
    pub url: String,
    /// Maximum number of connections in the pool
    pub max_connections: u32,
}

impl CacheConfig {
    /// Create a new CacheConfig from environment variables
    ///
    /// # Environment Variables
    /// - `LOCAL_CACHE_URL`: SQLite connection URL (default: "sqlite::memory:")
    /// - `LOCAL_CACHE_MAX_CONNECTIONS`: Maximum number of connections (default: 4, forced to 1 in memory)
    pub fn from_env() -> DatabaseResult<Self> {
        let url = std::env::var("LOCAL_CACHE_URL").unwrap_or_else(|_| "sqlite::memory:".to_string());
        let max_connections = std::env::var("LOCAL_CACHE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "4".to_string())
            .parse()
            .unwrap_or(4);

        Ok(Self::new(url, max_connections))
    }

    /// Build a config, clamping the pool to one connection for memory databases
    pub fn new(url: impl Into<String>, max_connections: u32) -> Self {
        let url = url.into();
        let max_connections = if is_memory_url(&url) {
            1
        } else {
            max_connections.max(1)
        };

        CacheConfig {
            url,
            max_connections,
        }
    }

    /// An in-memory cache, used by tests and by the service when no file is configured
    pub fn in_memory() -> Self {
        Self::new("sqlite::memory:", 1)
    }

    pub fn is_memory(&self) -> bool {
        is_memory_url(&self.url)
    }
}

fn is_memory_url(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}

/// Open the SQLite pool backing the listing cache
pub async fn init_cache_pool(config: &CacheConfig) -> DatabaseResult<SqlitePool> {
    let mut options = SqliteConnectOptions::from_str(&config.url)
        .map_err(|e| DatabaseError::Configuration(format!("Invalid cache URL: {}", e)))?
        .create_if_missing(true);

    // WAL lets readers keep seeing the last committed table while a refresh
    // transaction is open.
    if !config.is_memory() {
        options = options.journal_mode(SqliteJournalMode::Wal);
    }

    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .map_err(DatabaseError::Connection)?;

    info!("Local cache opened at {}", config.url);
    Ok(pool)
}
