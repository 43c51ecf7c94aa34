//! In-process collaborators
//!
//! Document collections kept in a `BTreeMap` behind a mutex. Each store can
//! be switched offline to reproduce network failures.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{BlobStore, ListingStore, Upload, UserDirectory};
use crate::error::{RemoteError, RemoteResult};
use crate::models::user::LIKED_LISTINGS_KEY;
use crate::models::{Document, Fields};

/// Shared state of one in-memory collection
#[derive(Clone, Default)]
struct Collection {
    documents: Arc<Mutex<BTreeMap<String, Fields>>>,
    offline: Arc<AtomicBool>,
}

impl Collection {
    fn ensure_online(&self) -> RemoteResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(RemoteError::Unavailable("store is offline".to_string()));
        }
        Ok(())
    }

    fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    async fn list(&self) -> RemoteResult<Vec<Document>> {
        self.ensure_online()?;
        let documents = self.documents.lock().await;
        Ok(documents
            .iter()
            .map(|(id, fields)| Document::new(id.clone(), fields.clone()))
            .collect())
    }

    async fn get(&self, id: &str) -> RemoteResult<Option<Document>> {
        self.ensure_online()?;
        let documents = self.documents.lock().await;
        Ok(documents
            .get(id)
            .map(|fields| Document::new(id, fields.clone())))
    }

    async fn set(&self, id: &str, fields: Fields) -> RemoteResult<()> {
        self.ensure_online()?;
        self.documents.lock().await.insert(id.to_string(), fields);
        Ok(())
    }

    async fn len(&self) -> usize {
        self.documents.lock().await.len()
    }
}

/// Listing collection held in memory
#[derive(Clone, Default)]
pub struct InMemoryListingStore {
    collection: Collection,
}

impl InMemoryListingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call fail with [`RemoteError::Unavailable`] until switched back
    pub fn set_offline(&self, offline: bool) {
        self.collection.set_offline(offline);
    }

    pub async fn len(&self) -> usize {
        self.collection.len().await
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl ListingStore for InMemoryListingStore {
    async fn list(&self) -> RemoteResult<Vec<Document>> {
        self.collection.list().await
    }

    async fn get(&self, id: &str) -> RemoteResult<Option<Document>> {
        self.collection.get(id).await
    }

    async fn set(&self, id: &str, fields: Fields) -> RemoteResult<()> {
        self.collection.set(id, fields).await
    }

    async fn add(&self, fields: Fields) -> RemoteResult<String> {
        let id = Uuid::new_v4().simple().to_string();
        self.collection.set(&id, fields).await?;
        Ok(id)
    }

    async fn delete(&self, id: &str) -> RemoteResult<()> {
        self.collection.ensure_online()?;
        self.collection.documents.lock().await.remove(id);
        Ok(())
    }
}

/// User collection held in memory
#[derive(Clone, Default)]
pub struct InMemoryUserDirectory {
    collection: Collection,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_offline(&self, offline: bool) {
        self.collection.set_offline(offline);
    }

    /// Apply `edit` to the liked-set array of an existing user
    async fn edit_liked<F>(&self, user_id: &str, edit: F) -> RemoteResult<()>
    where
        F: FnOnce(&mut Vec<Value>),
    {
        self.collection.ensure_online()?;
        let mut documents = self.collection.documents.lock().await;
        let fields = documents
            .get_mut(user_id)
            .ok_or_else(|| RemoteError::NotFound(format!("users/{}", user_id)))?;

        let liked = fields
            .entry(LIKED_LISTINGS_KEY)
            .or_insert_with(|| Value::Array(Vec::new()));
        if !liked.is_array() {
            *liked = Value::Array(Vec::new());
        }
        if let Value::Array(items) = liked {
            edit(items);
        }
        Ok(())
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn get(&self, id: &str) -> RemoteResult<Option<Document>> {
        self.collection.get(id).await
    }

    async fn set(&self, id: &str, fields: Fields) -> RemoteResult<()> {
        self.collection.set(id, fields).await
    }

    async fn update(&self, id: &str, fields: Fields) -> RemoteResult<()> {
        self.collection.ensure_online()?;
        let mut documents = self.collection.documents.lock().await;
        let existing = documents
            .get_mut(id)
            .ok_or_else(|| RemoteError::NotFound(format!("users/{}", id)))?;
        existing.extend(fields);
        Ok(())
    }

    async fn add_liked(&self, user_id: &str, listing_id: &str) -> RemoteResult<()> {
        self.edit_liked(user_id, |items| {
            if !items.iter().any(|item| item.as_str() == Some(listing_id)) {
                items.push(Value::String(listing_id.to_string()));
            }
        })
        .await
    }

    async fn remove_liked(&self, user_id: &str, listing_id: &str) -> RemoteResult<()> {
        self.edit_liked(user_id, |items| {
            items.retain(|item| item.as_str() != Some(listing_id));
        })
        .await
    }

    async fn find_liking(&self, listing_id: &str) -> RemoteResult<Vec<String>> {
        self.collection.ensure_online()?;
        let documents = self.collection.documents.lock().await;
        Ok(documents
            .iter()
            .filter(|(_, fields)| {
                fields
                    .get(LIKED_LISTINGS_KEY)
                    .and_then(Value::as_array)
                    .is_some_and(|items| items.iter().any(|item| item.as_str() == Some(listing_id)))
            })
            .map(|(id, _)| id.clone())
            .collect())
    }
}

/// Blob store keeping uploads in memory and handing out `memory://` URLs
#[derive(Clone, Default)]
pub struct InMemoryBlobStore {
    objects: Arc<Mutex<BTreeMap<String, Upload>>>,
    offline: Arc<AtomicBool>,
}

impl InMemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Stored object at `key` (`<prefix>/<name>`)
    pub async fn object(&self, key: &str) -> Option<Upload> {
        self.objects.lock().await.get(key).cloned()
    }

    pub async fn keys(&self) -> Vec<String> {
        self.objects.lock().await.keys().cloned().collect()
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn upload(&self, prefix: &str, upload: Upload) -> RemoteResult<String> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(RemoteError::Unavailable("blob store is offline".to_string()));
        }
        let key = format!("{}/{}", prefix, Uuid::new_v4());
        self.objects.lock().await.insert(key.clone(), upload);
        Ok(format!("memory://{}", key))
    }
}
