//! Region names from the public open-data portal
//!
//! Fetched once at start-up and kept for the lifetime of the process. A failed
//! fetch is logged and leaves the list empty.

use serde::Deserialize;
use std::sync::OnceLock;
use tracing::{error, info};

#[derive(Debug, Deserialize)]
struct RegionSearchResponse {
    result: RegionSearchResult,
}

#[derive(Debug, Deserialize)]
struct RegionSearchResult {
    #[serde(default)]
    records: Vec<RegionRecord>,
}

#[derive(Debug, Deserialize)]
struct RegionRecord {
    region_name: Option<String>,
}

/// Region names, loaded at most once
#[derive(Debug, Default)]
pub struct RegionList {
    names: OnceLock<Vec<String>>,
}

impl RegionList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loaded names, empty before `load` or after a failed one
    pub fn names(&self) -> &[String] {
        self.names.get().map(Vec::as_slice).unwrap_or(&[])
    }

    /// Fetch the list unless it was already fetched
    pub async fn load(&self, client: &reqwest::Client, url: &str) {
        if self.names.get().is_some() {
            return;
        }

        let names = match fetch(client, url).await {
            Ok(names) => {
                info!("Loaded {} regions", names.len());
                names
            }
            Err(e) => {
                error!("Failed to load regions: {}", e);
                Vec::new()
            }
        };

        let _ = self.names.set(names);
    }
}

async fn fetch(client: &reqwest::Client, url: &str) -> anyhow::Result<Vec<String>> {
    let response = client.get(url).send().await?;

    if !response.status().is_success() {
        anyhow::bail!("region service answered {}", response.status());
    }

    let body: RegionSearchResponse = response.json().await?;
    Ok(region_names(body))
}

fn region_names(response: RegionSearchResponse) -> Vec<String> {
    response
        .result
        .records
        .into_iter()
        .filter_map(|record| record.region_name)
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .collect()
}
