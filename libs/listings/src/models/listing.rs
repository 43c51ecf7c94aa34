//! Listing model and its document mapping

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use tracing::{debug, warn};

use super::document::{Document, Fields, read_count, read_millis, read_string};

const TITLE_KEY: &str = "title";
const USER_ID_KEY: &str = "userId";
const PRICE_PER_NIGHT_KEY: &str = "pricePerNight";
const DESCRIPTION_KEY: &str = "description";
const CITY_KEY: &str = "city";
const TYPE_KEY: &str = "type";
const NUM_OF_ROOMS_KEY: &str = "numOfRooms";
const START_DATE_KEY: &str = "startDate";
const END_DATE_KEY: &str = "endDate";
const IMAGE_URL_KEY: &str = "imageUrl";

/// Kind of property being rented
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Category {
    Apartment,
    #[default]
    House,
    Villa,
    Penthouse,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Apartment,
        Category::House,
        Category::Villa,
        Category::Penthouse,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Apartment => "Apartment",
            Category::House => "House",
            Category::Villa => "Villa",
            Category::Penthouse => "Penthouse",
        }
    }

    /// Exact, case-sensitive match on the variant name
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == value)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A rentable property
///
/// `liked` and `is_mine` are relative to whoever is looking at the listing.
/// They are computed per read and never written to the remote store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing {
    /// Document key; empty until the remote store has assigned one
    pub id: String,
    pub owner_id: String,
    pub title: String,
    pub description: String,
    pub city: String,
    pub category: Category,
    pub rooms: u32,
    pub price_per_night: u32,
    /// Availability window in epoch milliseconds
    pub start_date: i64,
    pub end_date: i64,
    /// Empty means "show the placeholder image"
    pub image_url: String,
    #[serde(default)]
    pub liked: bool,
    #[serde(default)]
    pub is_mine: bool,
}

impl Listing {
    /// Build a listing from a remote document
    ///
    /// Missing or mistyped fields fall back to defaults so one bad document
    /// never aborts a refresh. An absent or unknown category becomes `House`.
    pub fn from_document(document: &Document) -> Self {
        let fields = &document.fields;
        debug!("Mapping listing document {}", document.id);

        let category = match fields.get(TYPE_KEY) {
            Some(Value::String(name)) => Category::parse(name).unwrap_or_else(|| {
                warn!(
                    "Listing {} has unknown type {:?}, defaulting to House",
                    document.id, name
                );
                Category::House
            }),
            _ => {
                warn!(
                    "Listing {} has no usable type, defaulting to House",
                    document.id
                );
                Category::House
            }
        };

        Listing {
            id: document.id.clone(),
            owner_id: read_string(fields, USER_ID_KEY),
            title: read_string(fields, TITLE_KEY),
            description: read_string(fields, DESCRIPTION_KEY),
            city: read_string(fields, CITY_KEY),
            category,
            rooms: read_count(fields, NUM_OF_ROOMS_KEY),
            price_per_night: read_count(fields, PRICE_PER_NIGHT_KEY),
            start_date: read_millis(fields, START_DATE_KEY),
            end_date: read_millis(fields, END_DATE_KEY),
            image_url: read_string(fields, IMAGE_URL_KEY),
            liked: false,
            is_mine: false,
        }
    }

    /// Document body for the remote store. The id travels as the key instead.
    pub fn to_fields(&self) -> Fields {
        let mut fields = Fields::new();
        fields.insert(TITLE_KEY.into(), self.title.clone().into());
        fields.insert(USER_ID_KEY.into(), self.owner_id.clone().into());
        fields.insert(PRICE_PER_NIGHT_KEY.into(), self.price_per_night.into());
        fields.insert(DESCRIPTION_KEY.into(), self.description.clone().into());
        fields.insert(CITY_KEY.into(), self.city.clone().into());
        fields.insert(TYPE_KEY.into(), self.category.as_str().into());
        fields.insert(NUM_OF_ROOMS_KEY.into(), self.rooms.into());
        fields.insert(START_DATE_KEY.into(), self.start_date.into());
        fields.insert(END_DATE_KEY.into(), self.end_date.into());
        fields.insert(IMAGE_URL_KEY.into(), self.image_url.clone().into());
        fields
    }

    pub fn has_image(&self) -> bool {
        !self.image_url.is_empty()
    }
}

/// Progress of the latest listing refresh
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadingState {
    Loading,
    /// Also the initial state: an empty cache counts as loaded
    #[default]
    Loaded,
    Error,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn loft() -> Listing {
        Listing {
            id: "L1".to_string(),
            owner_id: "U1".to_string(),
            title: "Loft".to_string(),
            description: "Top floor, lots of light".to_string(),
            city: "Tel Aviv".to_string(),
            category: Category::Penthouse,
            rooms: 2,
            price_per_night: 100,
            start_date: 1_700_000_000_000,
            end_date: 1_700_500_000_000,
            image_url: String::new(),
            liked: true,
            is_mine: true,
        }
    }

    fn document(id: &str, body: Value) -> Document {
        match body {
            Value::Object(fields) => Document::new(id, fields),
            _ => Document::new(id, Fields::new()),
        }
    }

    #[test]
    fn test_round_trip_drops_only_viewer_flags() {
        let original = loft();
        let parsed = Listing::from_document(&Document::new("L1", original.to_fields()));

        assert_eq!(
            parsed,
            Listing {
                liked: false,
                is_mine: false,
                ..original
            }
        );
    }

    #[test]
    fn test_document_body_excludes_id_and_viewer_flags() {
        let fields = loft().to_fields();
        assert!(!fields.contains_key("id"));
        assert!(!fields.contains_key("liked"));
        assert!(!fields.contains_key("isMine"));
        assert_eq!(fields.get("type"), Some(&json!("Penthouse")));
    }

    #[test]
    fn test_missing_category_defaults_to_house() {
        let listing = Listing::from_document(&document("A", json!({ "title": "Hut" })));
        assert_eq!(listing.category, Category::House);
        assert_eq!(listing.title, "Hut");
    }

    #[test]
    fn test_unknown_category_defaults_to_house() {
        let listing = Listing::from_document(&document("A", json!({ "type": "Castle" })));
        assert_eq!(listing.category, Category::House);

        let listing = Listing::from_document(&document("A", json!({ "type": 3 })));
        assert_eq!(listing.category, Category::House);
    }

    #[test]
    fn test_mistyped_fields_fall_back_to_defaults() {
        let listing = Listing::from_document(&document(
            "A",
            json!({
                "title": 12,
                "pricePerNight": "cheap",
                "numOfRooms": -3,
                "startDate": null,
                "city": "Haifa",
                "type": "Villa"
            }),
        ));

        assert_eq!(listing.id, "A");
        assert_eq!(listing.title, "");
        assert_eq!(listing.price_per_night, 0);
        assert_eq!(listing.rooms, 0);
        assert_eq!(listing.start_date, 0);
        assert_eq!(listing.city, "Haifa");
        assert_eq!(listing.category, Category::Villa);
    }

    #[test]
    fn test_initial_loading_state_is_loaded() {
        assert_eq!(LoadingState::default(), LoadingState::Loaded);
    }
}
