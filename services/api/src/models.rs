//! API models for request and response payloads

use listings::models::{Category, Listing, UpdateProfile, User};
use listings::presentation::format_date;
use serde::{Deserialize, Serialize};

/// Body of `POST /listings` and `PUT /listings/:id`
#[derive(Debug, Deserialize)]
pub struct ListingRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub category: Category,
    #[serde(default)]
    pub rooms: u32,
    #[serde(default)]
    pub price_per_night: u32,
    /// Epoch milliseconds
    #[serde(default)]
    pub start_date: i64,
    #[serde(default)]
    pub end_date: i64,
    #[serde(default)]
    pub image_url: String,
}

impl ListingRequest {
    pub fn into_listing(self, id: String, owner_id: String) -> Listing {
        Listing {
            id,
            owner_id,
            title: self.title,
            description: self.description,
            city: self.city,
            category: self.category,
            rooms: self.rooms,
            price_per_night: self.price_per_night,
            start_date: self.start_date,
            end_date: self.end_date,
            image_url: self.image_url,
            liked: false,
            is_mine: false,
        }
    }
}

/// A projected listing with its dates rendered for display
#[derive(Debug, Serialize)]
pub struct ListingResponse {
    #[serde(flatten)]
    pub listing: Listing,
    pub start_date_text: String,
    pub end_date_text: String,
}

impl From<Listing> for ListingResponse {
    fn from(listing: Listing) -> Self {
        Self {
            start_date_text: format_date(listing.start_date),
            end_date_text: format_date(listing.end_date),
            listing,
        }
    }
}

/// Response for `POST /listings`
#[derive(Debug, Serialize)]
pub struct CreatedListingResponse {
    pub id: String,
}

/// Request for `POST /session`
#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    pub user_id: String,
}

/// Response for `POST /session`; `token` goes into `Authorization: Bearer`
#[derive(Debug, Serialize)]
pub struct SignInResponse {
    pub token: String,
    pub user: User,
}

/// Request for `PUT /me`
#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub name: String,
    pub phone_number: String,
    #[serde(default)]
    pub avatar_url: String,
}

impl From<UpdateProfileRequest> for UpdateProfile {
    fn from(request: UpdateProfileRequest) -> Self {
        UpdateProfile {
            name: request.name,
            phone_number: request.phone_number,
            avatar_url: request.avatar_url,
        }
    }
}

/// Request for `POST /users`, sent once the auth provider created the account
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub avatar_url: String,
}

impl From<RegisterRequest> for User {
    fn from(request: RegisterRequest) -> Self {
        User {
            id: request.id,
            name: request.name,
            phone_number: request.phone_number,
            email: request.email,
            avatar_url: request.avatar_url,
            liked_listings: Default::default(),
        }
    }
}

/// Response for URL-producing uploads
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_request_defaults() {
        let request: ListingRequest = serde_json::from_str(r#"{"title": "Loft"}"#).unwrap();
        let listing = request.into_listing(String::new(), "u1".into());

        assert_eq!(listing.title, "Loft");
        assert_eq!(listing.owner_id, "u1");
        assert_eq!(listing.category, Category::House);
        assert_eq!(listing.rooms, 0);
        assert!(!listing.is_mine);
    }

    #[test]
    fn test_listing_response_renders_dates() {
        let request: ListingRequest = serde_json::from_str(
            r#"{"title": "Loft", "category": "Villa", "start_date": 1700000000000}"#,
        )
        .unwrap();
        let response = ListingResponse::from(request.into_listing("l1".into(), "u1".into()));
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["id"], "l1");
        assert_eq!(json["category"], "Villa");
        assert_eq!(json["start_date_text"], "14/11/2023");
        assert_eq!(json["end_date_text"], "01/01/1970");
    }
}
