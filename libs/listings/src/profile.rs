//! Profile and like operations for the signed-in user
//!
//! One `ProfileService` serves every viewer. Operations that act on behalf
//! of a user take that viewer's [`Session`].

use std::sync::Arc;
use tracing::info;

use crate::error::SyncResult;
use crate::models::{UpdateProfile, User};
use crate::remote::{AVATAR_PREFIX, BlobStore, LISTING_IMAGE_PREFIX, Upload, UserDirectory};
use crate::session::{Session, SessionOutcome};
use crate::synchronizer::ListingSynchronizer;

#[derive(Clone)]
pub struct ProfileService {
    directory: Arc<dyn UserDirectory>,
    blobs: Arc<dyn BlobStore>,
    synchronizer: ListingSynchronizer,
}

impl ProfileService {
    pub fn new(
        directory: Arc<dyn UserDirectory>,
        blobs: Arc<dyn BlobStore>,
        synchronizer: ListingSynchronizer,
    ) -> Self {
        Self {
            directory,
            blobs,
            synchronizer,
        }
    }

    /// Write the profile document of a freshly registered user
    pub async fn register(&self, user: &User) -> SyncResult<()> {
        info!("Registering profile for user {}", user.id);
        self.directory.set(&user.id, user.to_fields()).await?;
        Ok(())
    }

    /// Update the session user's profile, uploading a new avatar first when given
    pub async fn update_me(
        &self,
        session: &Session,
        mut update: UpdateProfile,
        avatar: Option<Upload>,
    ) -> SyncResult<SessionOutcome<Arc<User>>> {
        let Some(user_id) = session.user_id() else {
            return Ok(SessionOutcome::Unauthenticated);
        };

        if let Some(avatar) = avatar {
            update.avatar_url = self.blobs.upload(AVATAR_PREFIX, avatar).await?;
        }

        self.directory.update(&user_id, update.to_fields()).await?;
        info!("Updated profile of user {}", user_id);
        session.refresh().await
    }

    /// Like or unlike a listing for the session user
    ///
    /// The directory is updated first with an add-one / remove-one operation,
    /// then the session snapshot, then the cached liked flag.
    pub async fn set_liked(
        &self,
        session: &Session,
        listing_id: &str,
        liked: bool,
    ) -> SyncResult<SessionOutcome<()>> {
        let Some(user_id) = session.user_id() else {
            return Ok(SessionOutcome::Unauthenticated);
        };

        if liked {
            self.directory.add_liked(&user_id, listing_id).await?;
        } else {
            self.directory.remove_liked(&user_id, listing_id).await?;
        }
        session.record_like(listing_id, liked);
        self.synchronizer.set_liked_flag(listing_id, liked).await?;

        info!("User {} set liked={} on listing {}", user_id, liked, listing_id);
        Ok(SessionOutcome::Applied(()))
    }

    /// Store a listing image and return its download URL
    pub async fn upload_listing_image(&self, image: Upload) -> SyncResult<String> {
        Ok(self.blobs.upload(LISTING_IMAGE_PREFIX, image).await?)
    }
}
