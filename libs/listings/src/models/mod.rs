//! Listing and user models

pub mod document;
pub mod listing;
pub mod user;

// Re-export for convenience
pub use document::{Document, Fields};
pub use listing::{Category, Listing, LoadingState};
pub use user::{UpdateProfile, User};
