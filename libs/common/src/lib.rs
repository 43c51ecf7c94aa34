//! Common library for the RentIt services
//!
//! Shared infrastructure used by the listing core and the API service:
//! database configuration and pooling for the remote document tables and the
//! local listing cache, plus the error types they raise.

pub mod cache;
pub mod database;
pub mod error;

/// Example usage of the database modules
///
/// ```rust,no_run
/// use common::cache::{CacheConfig, init_cache_pool};
/// use common::database::{DatabaseConfig, health_check, init_pool};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let remote = init_pool(&DatabaseConfig::from_env()?).await?;
///     let _local = init_cache_pool(&CacheConfig::from_env()?).await?;
///     println!("Remote database health check: {}", health_check(&remote).await?);
///     Ok(())
/// }
/// ```
pub fn example_usage() {}
