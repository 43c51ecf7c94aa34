//! User profile model

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;

use super::document::{Document, Fields, read_string, read_string_set};

const ID_KEY: &str = "id";
const NAME_KEY: &str = "name";
const PHONE_NUMBER_KEY: &str = "phoneNumber";
const EMAIL_KEY: &str = "email";
const AVATAR_URL_KEY: &str = "avatarUrl";
/// Field holding the liked-set in a user document
pub const LIKED_LISTINGS_KEY: &str = "likedApartments";

/// User entity, keyed by the authentication provider's user id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub phone_number: String,
    pub email: String,
    pub avatar_url: String,
    /// Ids of the listings this user liked
    #[serde(default)]
    pub liked_listings: BTreeSet<String>,
}

impl User {
    /// Build a user from a directory document, trusting the document key over
    /// any id stored in the body
    pub fn from_document(document: &Document) -> Self {
        let fields = &document.fields;
        let id = if document.id.is_empty() {
            read_string(fields, ID_KEY)
        } else {
            document.id.clone()
        };

        User {
            id,
            name: read_string(fields, NAME_KEY),
            phone_number: read_string(fields, PHONE_NUMBER_KEY),
            email: read_string(fields, EMAIL_KEY),
            avatar_url: read_string(fields, AVATAR_URL_KEY),
            liked_listings: read_string_set(fields, LIKED_LISTINGS_KEY),
        }
    }

    pub fn to_fields(&self) -> Fields {
        let liked: Vec<Value> = self
            .liked_listings
            .iter()
            .cloned()
            .map(Value::String)
            .collect();

        let mut fields = Fields::new();
        fields.insert(ID_KEY.into(), self.id.clone().into());
        fields.insert(NAME_KEY.into(), self.name.clone().into());
        fields.insert(PHONE_NUMBER_KEY.into(), self.phone_number.clone().into());
        fields.insert(EMAIL_KEY.into(), self.email.clone().into());
        fields.insert(AVATAR_URL_KEY.into(), self.avatar_url.clone().into());
        fields.insert(LIKED_LISTINGS_KEY.into(), Value::Array(liked));
        fields
    }

    pub fn likes(&self, listing_id: &str) -> bool {
        self.liked_listings.contains(listing_id)
    }

    pub fn owns(&self, owner_id: &str) -> bool {
        self.id == owner_id
    }
}

/// Profile fields a user may change about themselves
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct UpdateProfile {
    pub name: String,
    pub phone_number: String,
    pub avatar_url: String,
}

impl UpdateProfile {
    /// Partial document body; the liked-set and email are left untouched
    pub fn to_fields(&self) -> Fields {
        let mut fields = Fields::new();
        fields.insert(NAME_KEY.into(), self.name.clone().into());
        fields.insert(PHONE_NUMBER_KEY.into(), self.phone_number.clone().into());
        fields.insert(AVATAR_URL_KEY.into(), self.avatar_url.clone().into());
        fields
    }
}
