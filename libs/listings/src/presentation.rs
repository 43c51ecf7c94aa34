//! Viewer-relative projections of cached listings
//!
//! These functions never write anywhere: they return fresh copies with
//! `liked` and `is_mine` computed for the given viewer.

use chrono::DateTime;

use crate::models::{Listing, User};

/// Annotate a single listing for `viewer`. Without a viewer both flags are false.
pub fn project_one(listing: &Listing, viewer: Option<&User>) -> Listing {
    let mut projected = listing.clone();
    projected.liked = viewer.is_some_and(|user| user.likes(&listing.id));
    projected.is_mine = viewer.is_some_and(|user| user.owns(&listing.owner_id));
    projected
}

/// Every listing, annotated for `viewer`
pub fn project(listings: &[Listing], viewer: Option<&User>) -> Vec<Listing> {
    listings
        .iter()
        .map(|listing| project_one(listing, viewer))
        .collect()
}

/// Listings the viewer liked; empty when nobody is signed in
pub fn liked_only(listings: &[Listing], viewer: Option<&User>) -> Vec<Listing> {
    let Some(user) = viewer else {
        return Vec::new();
    };
    project(listings, Some(user))
        .into_iter()
        .filter(|listing| listing.liked)
        .collect()
}

/// Listings the viewer owns; empty when nobody is signed in
pub fn mine_only(listings: &[Listing], viewer: Option<&User>) -> Vec<Listing> {
    let Some(user) = viewer else {
        return Vec::new();
    };
    project(listings, Some(user))
        .into_iter()
        .filter(|listing| listing.is_mine)
        .collect()
}

/// Render epoch milliseconds as `dd/MM/yyyy` (UTC)
pub fn format_date(millis: i64) -> String {
    DateTime::from_timestamp_millis(millis)
        .map(|date| date.format("%d/%m/%Y").to_string())
        .unwrap_or_default()
}
