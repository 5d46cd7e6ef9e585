use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// A product, keyed by its UPC, with every store it was reported at
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Assigned by MongoDB on insert; the JSONL backend never sets it
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub upc: String,
    pub name: String,
    pub stores: Vec<Store>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Store {
    pub name: String,
    pub location: Location,
    pub price: Vec<Price>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub long: f64,
}

/// A single crowd-sourced price report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Price {
    pub user: String,
    pub price: f64,
    pub upvote: u32,
    pub downvote: u32,
    pub date: DateTime<Utc>,
}

impl Price {
    /// Fresh report with both vote counters at zero
    pub fn new(user: String, price: f64, date: DateTime<Utc>) -> Self {
        Self {
            user,
            price,
            upvote: 0,
            downvote: 0,
            date,
        }
    }
}

impl Item {
    /// Build the one-store, one-price document a submission produces
    pub fn reported(
        upc: String,
        name: String,
        store_name: String,
        location: Location,
        price: Price,
    ) -> Self {
        Self {
            id: None,
            upc,
            name,
            stores: vec![Store {
                name: store_name,
                location,
                price: vec![price],
            }],
        }
    }
}

/// Equality filters the search route can issue
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemFilter {
    Name(String),
    Upc(String),
}

impl ItemFilter {
    pub fn matches(&self, item: &Item) -> bool {
        match self {
            ItemFilter::Name(name) => item.name == *name,
            ItemFilter::Upc(upc) => item.upc == *upc,
        }
    }

    /// Document field the filter compares against
    pub fn field(&self) -> &'static str {
        match self {
            ItemFilter::Name(_) => "name",
            ItemFilter::Upc(_) => "upc",
        }
    }

    pub fn value(&self) -> &str {
        match self {
            ItemFilter::Name(v) | ItemFilter::Upc(v) => v,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn milk() -> Item {
        let date = Utc.with_ymd_and_hms(2026, 10, 16, 8, 0, 0).unwrap();
        Item::reported(
            "123".to_string(),
            "Milk".to_string(),
            "CornerMart".to_string(),
            Location { lat: 1.0, long: 2.0 },
            Price::new("u1".to_string(), 3.5, date),
        )
    }

    #[test]
    fn serializes_nested_document_shape() {
        let value = serde_json::to_value(milk()).unwrap();

        assert_eq!(
            value,
            json!({
                "upc": "123",
                "name": "Milk",
                "stores": [{
                    "name": "CornerMart",
                    "location": {"lat": 1.0, "long": 2.0},
                    "price": [{
                        "user": "u1",
                        "price": 3.5,
                        "upvote": 0,
                        "downvote": 0,
                        "date": "2026-10-16T08:00:00Z"
                    }]
                }]
            })
        );
    }

    #[test]
    fn stored_id_is_kept_in_output() {
        let id = ObjectId::parse_str("65f1c0ffee0123456789abcd").unwrap();
        let item = Item {
            id: Some(id),
            ..milk()
        };

        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value["_id"], json!({"$oid": "65f1c0ffee0123456789abcd"}));
        assert_eq!(value["upc"], "123");
    }

    #[test]
    fn documents_without_id_still_decode() {
        let value = serde_json::to_value(milk()).unwrap();
        let decoded: Item = serde_json::from_value(value).unwrap();

        assert_eq!(decoded.id, None);
        assert_eq!(decoded, milk());
    }

    #[test]
    fn filters_compare_exactly() {
        let item = milk();

        assert!(ItemFilter::Name("Milk".into()).matches(&item));
        assert!(!ItemFilter::Name("milk".into()).matches(&item));
        assert!(!ItemFilter::Name("Mil".into()).matches(&item));
        assert!(ItemFilter::Upc("123".into()).matches(&item));
        assert!(!ItemFilter::Upc("1234".into()).matches(&item));
    }
}
