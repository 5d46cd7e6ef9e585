//! Payload checks for item submissions.
//!
//! Presence is checked first and only by key. Type checks happen afterwards
//! when the payload is turned into a [`Submission`].

use serde_json::{Map, Value};
use thiserror::Error;

/// Keys every `POST /item` payload must carry
pub const REQUIRED_FIELDS: [&str; 7] = ["name", "upc", "price", "user", "store", "lat", "long"];

/// True iff every key is present. Values are not inspected, and a payload
/// that is not a JSON object has no keys.
pub fn has_required(payload: &Value, keys: &[&str]) -> bool {
    match payload.as_object() {
        Some(object) => keys.iter().all(|key| object.contains_key(*key)),
        None => keys.is_empty(),
    }
}

#[derive(Error, Debug, PartialEq)]
pub enum FieldError {
    #[error("Field '{0}' is missing")]
    Missing(&'static str),

    #[error("Field '{0}' must be a string")]
    NotAString(&'static str),

    #[error("Field '{0}' must be a number")]
    NotANumber(&'static str),
}

/// Typed view of a submission payload
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub name: String,
    pub upc: String,
    pub price: f64,
    pub user: String,
    pub store: String,
    pub lat: f64,
    pub long: f64,
}

impl Submission {
    pub fn from_payload(payload: &Value) -> Result<Self, FieldError> {
        let empty = Map::new();
        let object = payload.as_object().unwrap_or(&empty);

        Ok(Self {
            name: string_field(object, "name")?,
            upc: string_field(object, "upc")?,
            price: number_field(object, "price")?,
            user: string_field(object, "user")?,
            store: string_field(object, "store")?,
            lat: number_field(object, "lat")?,
            long: number_field(object, "long")?,
        })
    }
}

fn string_field(object: &Map<String, Value>, key: &'static str) -> Result<String, FieldError> {
    match object.get(key) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(FieldError::NotAString(key)),
        None => Err(FieldError::Missing(key)),
    }
}

// Numeric strings are accepted, e.g. "3.50" from a form field
fn number_field(object: &Map<String, Value>, key: &'static str) -> Result<f64, FieldError> {
    let number = match object.get(key) {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(_) => None,
        None => return Err(FieldError::Missing(key)),
    };

    number
        .filter(|n| n.is_finite())
        .ok_or(FieldError::NotANumber(key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn milk() -> Value {
        json!({
            "name": "Milk",
            "upc": "123",
            "price": 3.5,
            "user": "u1",
            "store": "CornerMart",
            "lat": 1.0,
            "long": 2.0
        })
    }

    #[test]
    fn complete_payload_passes() {
        assert!(has_required(&milk(), &REQUIRED_FIELDS));
    }

    #[test]
    fn any_missing_key_fails() {
        for key in REQUIRED_FIELDS {
            let mut payload = milk();
            payload.as_object_mut().unwrap().remove(key);
            assert!(!has_required(&payload, &REQUIRED_FIELDS), "{key} removed");
        }
    }

    #[test]
    fn presence_ignores_values() {
        let payload = json!({
            "name": "", "upc": null, "price": 0, "user": false,
            "store": [], "lat": {}, "long": "x"
        });
        assert!(has_required(&payload, &REQUIRED_FIELDS));
    }

    #[test]
    fn non_object_has_no_keys() {
        assert!(!has_required(&json!([1, 2, 3]), &REQUIRED_FIELDS));
        assert!(!has_required(&json!("name"), &["name"]));
        assert!(has_required(&json!(null), &[]));
    }

    #[test]
    fn extra_keys_are_fine() {
        let mut payload = milk();
        payload["note"] = json!("on sale");
        assert!(has_required(&payload, &REQUIRED_FIELDS));
    }

    #[test]
    fn submission_from_complete_payload() {
        let submission = Submission::from_payload(&milk()).unwrap();

        assert_eq!(submission.name, "Milk");
        assert_eq!(submission.upc, "123");
        assert_eq!(submission.price, 3.5);
        assert_eq!(submission.store, "CornerMart");
        assert_eq!((submission.lat, submission.long), (1.0, 2.0));
    }

    #[test]
    fn numeric_strings_are_parsed() {
        let mut payload = milk();
        payload["price"] = json!(" 4.25 ");
        payload["lat"] = json!("40.1");

        let submission = Submission::from_payload(&payload).unwrap();
        assert_eq!(submission.price, 4.25);
        assert_eq!(submission.lat, 40.1);
    }

    #[test]
    fn mistyped_fields_are_named() {
        let mut payload = milk();
        payload["price"] = json!("cheap");
        assert_eq!(
            Submission::from_payload(&payload),
            Err(FieldError::NotANumber("price"))
        );

        let mut payload = milk();
        payload["upc"] = json!(123);
        assert_eq!(
            Submission::from_payload(&payload),
            Err(FieldError::NotAString("upc"))
        );
        assert_eq!(
            FieldError::NotAString("upc").to_string(),
            "Field 'upc' must be a string"
        );
    }
}
