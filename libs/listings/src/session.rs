//! Session context
//!
//! Holds the signed-in user's profile snapshot. The snapshot is an
//! `Arc<User>` swapped whole under a short write lock, so readers always get
//! a complete user and never block on I/O.

use std::sync::{Arc, PoisonError, RwLock};
use tracing::info;

use crate::error::{SyncError, SyncResult};
use crate::models::User;
use crate::remote::UserDirectory;

/// Result of an operation that needs a signed-in user
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub enum SessionOutcome<T> {
    Applied(T),
    /// Nobody is signed in; the operation did nothing
    Unauthenticated,
}

impl<T> SessionOutcome<T> {
    pub fn is_applied(&self) -> bool {
        matches!(self, SessionOutcome::Applied(_))
    }

    pub fn applied(self) -> Option<T> {
        match self {
            SessionOutcome::Applied(value) => Some(value),
            SessionOutcome::Unauthenticated => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> SessionOutcome<U> {
        match self {
            SessionOutcome::Applied(value) => SessionOutcome::Applied(f(value)),
            SessionOutcome::Unauthenticated => SessionOutcome::Unauthenticated,
        }
    }
}

#[derive(Clone)]
pub struct Session {
    directory: Arc<dyn UserDirectory>,
    current: Arc<RwLock<Option<Arc<User>>>>,
}

impl Session {
    pub fn new(directory: Arc<dyn UserDirectory>) -> Self {
        Self {
            directory,
            current: Arc::new(RwLock::new(None)),
        }
    }

    pub fn current(&self) -> Option<Arc<User>> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn user_id(&self) -> Option<String> {
        self.current().map(|user| user.id.clone())
    }

    fn replace(&self, user: Option<Arc<User>>) {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = user;
    }

    /// Load `user_id` from the directory and make it the current user
    ///
    /// The id comes from the authentication provider, which sits outside
    /// this crate.
    pub async fn sign_in(&self, user_id: &str) -> SyncResult<Arc<User>> {
        let user = Arc::new(self.fetch(user_id).await?);
        self.replace(Some(Arc::clone(&user)));
        info!("Signed in user {}", user_id);
        Ok(user)
    }

    /// Refetch the current user, e.g. after a profile update
    pub async fn refresh(&self) -> SyncResult<SessionOutcome<Arc<User>>> {
        let Some(user_id) = self.user_id() else {
            return Ok(SessionOutcome::Unauthenticated);
        };

        let user = Arc::new(self.fetch(&user_id).await?);
        self.replace(Some(Arc::clone(&user)));
        Ok(SessionOutcome::Applied(user))
    }

    /// Drop the cached snapshot without signing out of the provider
    pub fn invalidate(&self) {
        self.replace(None);
    }

    pub fn sign_out(&self) {
        if let Some(user_id) = self.user_id() {
            info!("Signed out user {}", user_id);
        }
        self.replace(None);
    }

    /// Mirror a liked-set change the directory already accepted
    pub fn record_like(&self, listing_id: &str, liked: bool) {
        let mut slot = self.current.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(user) = slot.as_ref() {
            let mut next = User::clone(user);
            if liked {
                next.liked_listings.insert(listing_id.to_string());
            } else {
                next.liked_listings.remove(listing_id);
            }
            *slot = Some(Arc::new(next));
        }
    }

    async fn fetch(&self, user_id: &str) -> SyncResult<User> {
        let document = self
            .directory
            .get(user_id)
            .await?
            .ok_or_else(|| SyncError::UserNotFound(user_id.to_string()))?;
        Ok(User::from_document(&document))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::memory::InMemoryUserDirectory;

    fn dana() -> User {
        User {
            id: "U1".to_string(),
            name: "Dana".to_string(),
            phone_number: "0501234567".to_string(),
            email: "dana@example.com".to_string(),
            avatar_url: String::new(),
            liked_listings: ["A".to_string()].into(),
        }
    }

    async fn session_with_dana() -> SyncResult<(InMemoryUserDirectory, Session)> {
        let directory = InMemoryUserDirectory::new();
        directory.set("U1", dana().to_fields()).await?;
        let session = Session::new(Arc::new(directory.clone()));
        Ok((directory, session))
    }

    #[tokio::test]
    async fn test_sign_in_caches_snapshot() -> SyncResult<()> {
        let (_, session) = session_with_dana().await?;
        assert!(session.current().is_none());

        let user = session.sign_in("U1").await?;
        assert_eq!(*user, dana());
        assert_eq!(session.user_id().as_deref(), Some("U1"));

        session.sign_out();
        assert!(session.current().is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_sign_in_unknown_user_fails() -> SyncResult<()> {
        let (_, session) = session_with_dana().await?;
        assert!(matches!(
            session.sign_in("ghost").await,
            Err(SyncError::UserNotFound(id)) if id == "ghost"
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_refresh_picks_up_remote_changes() -> SyncResult<()> {
        let (directory, session) = session_with_dana().await?;
        assert_eq!(session.refresh().await?, SessionOutcome::Unauthenticated);

        session.sign_in("U1").await?;
        directory.add_liked("U1", "B").await?;

        let refreshed = session.refresh().await?.applied().expect("signed in");
        assert!(refreshed.likes("B"));
        Ok(())
    }

    #[tokio::test]
    async fn test_record_like_swaps_snapshot() -> SyncResult<()> {
        let (_, session) = session_with_dana().await?;
        session.sign_in("U1").await?;
        let before = session.current().expect("signed in");

        session.record_like("B", true);
        session.record_like("A", false);

        let after = session.current().expect("signed in");
        assert!(after.likes("B") && !after.likes("A"));
        // Earlier readers keep their own copy
        assert!(before.likes("A") && !before.likes("B"));
        Ok(())
    }
}
