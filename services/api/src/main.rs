use anyhow::Result;
use aws_config::BehaviorVersion;
use std::sync::Arc;
use tracing::{Level, error, info};
use tracing_subscriber::EnvFilter;

mod config;
mod error;
mod models;
mod regions;
mod repositories;
mod routes;
mod sessions;
mod state;
mod storage;

use common::cache::{CacheConfig, init_cache_pool};
use common::database::{DatabaseConfig, init_pool};
use listings::local_cache::LocalListingCache;
use listings::profile::ProfileService;
use listings::ListingSynchronizer;
use tokio::net::TcpListener;

use crate::{
    config::ApiConfig,
    regions::RegionList,
    repositories::{PgListingStore, PgUserDirectory},
    sessions::SessionRegistry,
    state::AppState,
    storage::S3BlobStore,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_max_level(Level::INFO)
        .init();

    info!("Starting API service");

    let config = ApiConfig::from_env()?;

    // Remote document tables
    let db_config = DatabaseConfig::from_env()?;
    let pool = init_pool(&db_config).await?;

    if common::database::health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }
    repositories::ensure_schema(&pool).await?;

    // Local listing cache
    let cache_config = CacheConfig::from_env()?;
    let cache = LocalListingCache::open(init_cache_pool(&cache_config).await?).await?;

    // Initialize AWS S3 client
    let aws_config = aws_config::load_defaults(BehaviorVersion::latest()).await;
    let s3_client = aws_sdk_s3::Client::new(&aws_config);
    let blobs = S3BlobStore::new(
        s3_client,
        config.media_bucket.clone(),
        config.media_public_base_url.clone(),
    );

    let store = Arc::new(PgListingStore::new(pool.clone()));
    let users = Arc::new(PgUserDirectory::new(pool.clone()));

    let synchronizer = ListingSynchronizer::new(store, users.clone(), cache)
        .with_fanout_concurrency(config.fanout_concurrency);
    let sessions = SessionRegistry::new(users.clone());
    let profile = ProfileService::new(users, Arc::new(blobs), synchronizer.clone());

    let regions = Arc::new(RegionList::new());
    regions
        .load(&reqwest::Client::new(), &config.regions_api_url)
        .await;

    // First load of the listing screen
    match synchronizer.refresh_all().await {
        Ok(count) => info!("Initial refresh loaded {} listings", count),
        Err(e) => error!("Initial refresh failed: {}", e),
    }

    let app_state = AppState {
        db_pool: pool,
        synchronizer,
        sessions,
        profile,
        regions,
    };

    info!("API service initialized successfully");

    // Start the web server
    let app = routes::create_router(app_state);

    let listener = TcpListener::bind(&config.bind_addr).await?;
    info!("API service listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
