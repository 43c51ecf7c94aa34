//! Service configuration read from the environment

use anyhow::Result;
use listings::synchronizer::DEFAULT_FANOUT_CONCURRENCY;

/// Public region list on the Israeli government open-data portal
pub const DEFAULT_REGIONS_API_URL: &str = "https://data.gov.il/api/3/action/datastore_search?resource_id=8f714b6f-c35c-4b40-a0e7-547b675eee0e&limit=20&offset=0&fields=region_name&distinct=true&sort=region_name&include_total=false";

/// API service configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Address the HTTP server binds to
    pub bind_addr: String,
    /// Bucket holding avatars and listing images
    pub media_bucket: String,
    /// Public URL prefix under which bucket objects are served
    pub media_public_base_url: String,
    pub regions_api_url: String,
    /// Parallel liked-set updates while deleting a listing
    pub fanout_concurrency: usize,
}

impl ApiConfig {
    /// Create a new ApiConfig from environment variables
    ///
    /// # Environment Variables
    /// - `API_BIND_ADDR` (default: "0.0.0.0:3001")
    /// - `MEDIA_BUCKET_NAME` (default: "rentit-media")
    /// - `MEDIA_PUBLIC_BASE_URL` (default: "https://<bucket>.s3.amazonaws.com")
    /// - `REGIONS_API_URL` (default: the data.gov.il region list)
    /// - `LIKE_FANOUT_CONCURRENCY` (default: 4)
    pub fn from_env() -> Result<Self> {
        let bind_addr = std::env::var("API_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3001".to_string());
        let media_bucket =
            std::env::var("MEDIA_BUCKET_NAME").unwrap_or_else(|_| "rentit-media".to_string());
        let media_public_base_url = std::env::var("MEDIA_PUBLIC_BASE_URL")
            .unwrap_or_else(|_| format!("https://{}.s3.amazonaws.com", media_bucket));
        let regions_api_url = std::env::var("REGIONS_API_URL")
            .unwrap_or_else(|_| DEFAULT_REGIONS_API_URL.to_string());

        let fanout_concurrency = std::env::var("LIKE_FANOUT_CONCURRENCY")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_FANOUT_CONCURRENCY);
        if fanout_concurrency == 0 {
            anyhow::bail!("LIKE_FANOUT_CONCURRENCY must be at least 1");
        }

        Ok(ApiConfig {
            bind_addr,
            media_bucket,
            media_public_base_url,
            regions_api_url,
            fanout_concurrency,
        })
    }
}
