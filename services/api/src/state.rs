//! Application state shared across handlers

use listings::ListingSynchronizer;
use listings::profile::ProfileService;
use sqlx::PgPool;
use std::sync::Arc;

use crate::regions::RegionList;
use crate::sessions::SessionRegistry;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub synchronizer: ListingSynchronizer,
    pub sessions: SessionRegistry,
    pub profile: ProfileService,
    pub regions: Arc<RegionList>,
}
