//! Listing core for the RentIt application
//!
//! Keeps a local SQLite mirror of the remote listing collection, applies
//! listing mutations remote-first, and projects cached listings for the
//! signed-in viewer.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use common::cache::{CacheConfig, init_cache_pool};
//! use listings::local_cache::LocalListingCache;
//! use listings::presentation::project;
//! use listings::remote::memory::{InMemoryListingStore, InMemoryUserDirectory};
//! use listings::session::Session;
//! use listings::synchronizer::ListingSynchronizer;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let cache = LocalListingCache::open(init_cache_pool(&CacheConfig::in_memory()).await?).await?;
//!     let users = Arc::new(InMemoryUserDirectory::new());
//!     let sync = ListingSynchronizer::new(Arc::new(InMemoryListingStore::new()), users.clone(), cache);
//!     let session = Session::new(users);
//!
//!     sync.refresh_all().await?;
//!     let viewer = session.current();
//!     let visible = project(&sync.listings(), viewer.as_deref());
//!     println!("{} listings", visible.len());
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod fanout;
pub mod local_cache;
pub mod models;
pub mod presentation;
pub mod profile;
pub mod remote;
pub mod session;
pub mod synchronizer;

pub use error::{RemoteError, SyncError, SyncResult};
pub use models::{Category, Listing, LoadingState, User};
pub use session::{Session, SessionOutcome};
pub use synchronizer::ListingSynchronizer;
