//! Listing synchronizer
//!
//! Keeps the local cache in step with the remote listing collection. Every
//! mutation reaches the remote store first; the cache is only touched once
//! the remote write has been acknowledged.

use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::error::{RemoteError, SyncError, SyncResult};
use crate::fanout::retract_everywhere;
use crate::local_cache::{ListingSubscription, LocalListingCache};
use crate::models::{Listing, LoadingState};
use crate::remote::{ListingStore, UserDirectory};

/// Default number of liked-set updates run in parallel during a delete
pub const DEFAULT_FANOUT_CONCURRENCY: usize = 4;

#[derive(Clone)]
pub struct ListingSynchronizer {
    store: Arc<dyn ListingStore>,
    users: Arc<dyn UserDirectory>,
    cache: LocalListingCache,
    status: Arc<watch::Sender<LoadingState>>,
    fanout_concurrency: usize,
}

impl ListingSynchronizer {
    pub fn new(
        store: Arc<dyn ListingStore>,
        users: Arc<dyn UserDirectory>,
        cache: LocalListingCache,
    ) -> Self {
        let (status, _) = watch::channel(LoadingState::default());
        Self {
            store,
            users,
            cache,
            status: Arc::new(status),
            fanout_concurrency: DEFAULT_FANOUT_CONCURRENCY,
        }
    }

    pub fn with_fanout_concurrency(mut self, concurrency: usize) -> Self {
        self.fanout_concurrency = concurrency.max(1);
        self
    }

    pub fn status(&self) -> LoadingState {
        *self.status.borrow()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<LoadingState> {
        self.status.subscribe()
    }

    pub fn cache(&self) -> &LocalListingCache {
        &self.cache
    }

    /// Cached listings as last published
    pub fn listings(&self) -> Arc<Vec<Listing>> {
        self.cache.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<Vec<Listing>>> {
        self.cache.subscribe_all()
    }

    pub fn subscribe_listing(&self, id: &str) -> ListingSubscription {
        self.cache.subscribe_one(id)
    }

    pub async fn listing(&self, id: &str) -> SyncResult<Option<Listing>> {
        Ok(self.cache.get(id).await?)
    }

    /// Point lookup against the remote store, bypassing the cache
    pub async fn remote_listing(&self, id: &str) -> SyncResult<Option<Listing>> {
        let document = self.store.get(id).await?;
        Ok(document.as_ref().map(Listing::from_document))
    }

    /// Replace the cache with the full remote collection
    ///
    /// Status goes to `Loading`, then `Loaded` or `Error`. On error the cache
    /// keeps its previous contents. Returns the number of listings cached.
    pub async fn refresh_all(&self) -> SyncResult<usize> {
        self.status.send_replace(LoadingState::Loading);
        info!("Refreshing listings from remote store");

        match self.pull().await {
            Ok(count) => {
                self.status.send_replace(LoadingState::Loaded);
                info!("Cached {} listings", count);
                Ok(count)
            }
            Err(e) => {
                error!("Failed to refresh listings: {}", e);
                self.status.send_replace(LoadingState::Error);
                Err(e)
            }
        }
    }

    async fn pull(&self) -> SyncResult<usize> {
        let documents = self.store.list().await?;
        debug!("Remote store returned {} documents", documents.len());

        let listings: Vec<Listing> = documents.iter().map(Listing::from_document).collect();
        self.cache.replace_all(&listings).await?;
        Ok(listings.len())
    }

    /// Create a listing remotely and refresh; returns the id the store assigned
    ///
    /// A failed refresh after a successful write is reported through the
    /// loading status only, since the listing itself was stored.
    pub async fn add(&self, listing: &Listing) -> SyncResult<String> {
        let id = self.store.add(listing.to_fields()).await?;
        info!("Added listing {} for owner {}", id, listing.owner_id);

        self.refresh_after_write(&id).await;
        Ok(id)
    }

    /// Overwrite an existing listing remotely and refresh
    ///
    /// Fails with `NotFound` when no remote document has that id, so an
    /// update never creates a listing under a caller-chosen id.
    pub async fn update(&self, listing: &Listing) -> SyncResult<()> {
        if listing.id.is_empty() {
            return Err(SyncError::MissingId);
        }
        if self.store.get(&listing.id).await?.is_none() {
            return Err(RemoteError::NotFound(format!("listings/{}", listing.id)).into());
        }

        self.store.set(&listing.id, listing.to_fields()).await?;
        info!("Updated listing {}", listing.id);

        self.refresh_after_write(&listing.id).await;
        Ok(())
    }

    async fn refresh_after_write(&self, id: &str) {
        if let Err(e) = self.refresh_all().await {
            warn!("Listing {} was saved but the refresh failed: {}", id, e);
        }
    }

    /// Delete a listing everywhere
    ///
    /// Retracts it from all liked-sets, removes the remote document, then
    /// drops the cached row. The steps are not atomic; each one is
    /// idempotent so a failed delete can simply be run again.
    pub async fn delete(&self, id: &str) -> SyncResult<()> {
        if id.is_empty() {
            return Err(SyncError::MissingId);
        }

        let retracted =
            retract_everywhere(Arc::clone(&self.users), id, self.fanout_concurrency).await?;
        self.store.delete(id).await?;
        let removed = self.cache.delete(id).await?;

        info!(
            "Deleted listing {} (liked by {} users, cached: {})",
            id, retracted, removed
        );
        Ok(())
    }

    /// Local-only update of the cached liked flag
    pub async fn set_liked_flag(&self, id: &str, liked: bool) -> SyncResult<()> {
        if !self.cache.set_liked(id, liked).await? {
            debug!("Listing {} is not cached, liked flag not stored", id);
        }
        Ok(())
    }
}
