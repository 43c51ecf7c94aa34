//! Remote collaborators
//!
//! The listing core never talks to a vendor SDK directly. It goes through
//! these traits, which the API service implements on PostgreSQL and S3 and
//! which [`memory`] implements in process for tests and local runs.

use async_trait::async_trait;

use crate::error::RemoteResult;
use crate::models::{Document, Fields};

pub mod memory;

/// Storage prefix for user avatars
pub const AVATAR_PREFIX: &str = "users";
/// Storage prefix for listing images
pub const LISTING_IMAGE_PREFIX: &str = "apartments";

/// The remote listing collection, source of truth for listings
#[async_trait]
pub trait ListingStore: Send + Sync {
    /// Every document in the collection
    async fn list(&self) -> RemoteResult<Vec<Document>>;

    async fn get(&self, id: &str) -> RemoteResult<Option<Document>>;

    /// Create or overwrite the document at `id`
    async fn set(&self, id: &str, fields: Fields) -> RemoteResult<()>;

    /// Create a document under a store-assigned id and return that id
    async fn add(&self, fields: Fields) -> RemoteResult<String>;

    /// Remove a document. Removing a missing document succeeds.
    async fn delete(&self, id: &str) -> RemoteResult<()>;
}

/// The remote user collection
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn get(&self, id: &str) -> RemoteResult<Option<Document>>;

    async fn set(&self, id: &str, fields: Fields) -> RemoteResult<()>;

    /// Merge `fields` into an existing document
    async fn update(&self, id: &str, fields: Fields) -> RemoteResult<()>;

    /// Add one id to a user's liked-set (set union, no duplicates)
    async fn add_liked(&self, user_id: &str, listing_id: &str) -> RemoteResult<()>;

    /// Remove one id from a user's liked-set (set difference)
    async fn remove_liked(&self, user_id: &str, listing_id: &str) -> RemoteResult<()>;

    /// Ids of every user whose liked-set contains `listing_id`
    async fn find_liking(&self, listing_id: &str) -> RemoteResult<Vec<String>>;
}

/// Bytes to be stored in the blob store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

impl Upload {
    pub fn new(bytes: impl Into<Vec<u8>>, content_type: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            content_type: content_type.into(),
        }
    }

    pub fn jpeg(bytes: impl Into<Vec<u8>>) -> Self {
        Self::new(bytes, "image/jpeg")
    }
}

/// Object storage for images
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `upload` under `prefix` with a fresh unique name and return its download URL
    async fn upload(&self, prefix: &str, upload: Upload) -> RemoteResult<String>;
}
