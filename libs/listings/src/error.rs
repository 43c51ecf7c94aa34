//! Error types for the listing core

use common::error::DatabaseError;
use thiserror::Error;

/// Failure reported by a remote collaborator (document store, user directory, blob store)
#[derive(Error, Debug)]
pub enum RemoteError {
    /// The service could not be reached
    #[error("Remote service unavailable: {0}")]
    Unavailable(String),

    /// The addressed document does not exist
    #[error("Document not found: {0}")]
    NotFound(String),

    /// The service answered with an error
    #[error("Remote service error: {0}")]
    Backend(String),

    /// A stored document could not be read at all
    #[error("Malformed document {id}: {reason}")]
    Malformed { id: String, reason: String },
}

/// Error type for synchronizer, session and profile operations
#[derive(Error, Debug)]
pub enum SyncError {
    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error("Local cache error: {0}")]
    Cache(#[from] DatabaseError),

    /// Operation needs a persisted listing but got one without an id
    #[error("Listing has no id")]
    MissingId,

    #[error("User {0} not found")]
    UserNotFound(String),

    /// Some liked-set retractions failed; the delete can be retried
    #[error("Failed to retract listing from {failed} of {total} users: {source}")]
    Fanout {
        failed: usize,
        total: usize,
        #[source]
        source: RemoteError,
    },
}

impl SyncError {
    /// True for failures a user can fix by simply trying again
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            SyncError::Remote(RemoteError::Unavailable(_)) | SyncError::Fanout { .. }
        )
    }
}

pub type RemoteResult<T> = Result<T, RemoteError>;
pub type SyncResult<T> = Result<T, SyncError>;
