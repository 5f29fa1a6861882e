use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Key of the single-slot pending booking.
pub const PENDING_BOOKING_KEY: &str = "droppit_pending_booking";
/// Key of the booking collection (JSON array, newest first).
pub const BOOKINGS_KEY: &str = "droppit_bookings";
/// Key of the most recently paid order id.
pub const LAST_PAID_ORDER_KEY: &str = "droppit_last_paid_order";
/// Key of the checkout success marker.
pub const CHECKOUT_SUCCESS_KEY: &str = "droppit_checkout_success";

/// A booking record.
///
/// Only `id` has meaning to the checkout; every other field is carried as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub id: String,
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

impl Booking {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            details: Map::new(),
        }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }

    /// Decodes a stored record, returning `None` for anything malformed.
    pub fn decode(raw: &str) -> Option<Self> {
        serde_json::from_str(raw).ok()
    }
}

/// Decodes the stored booking collection.
///
/// A collection that is not a JSON array reads as empty. Entries that are not
/// valid bookings are skipped.
pub fn decode_collection(raw: &str) -> Vec<Booking> {
    match serde_json::from_str::<Vec<Value>>(raw) {
        Ok(entries) => entries
            .into_iter()
            .filter_map(|entry| serde_json::from_value(entry).ok())
            .collect(),
        Err(_) => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_booking_round_trips_extra_fields() {
        let raw = r#"{"id":"ord_1","size":"Medium","pickup":{"city":"Austin"}}"#;
        let booking = Booking::decode(raw).unwrap();
        assert_eq!(booking.id, "ord_1");
        assert_eq!(booking.details["size"], json!("Medium"));

        let encoded = serde_json::to_value(&booking).unwrap();
        assert_eq!(encoded["pickup"]["city"], "Austin");
    }

    #[test]
    fn test_decode_rejects_missing_id() {
        assert!(Booking::decode(r#"{"size":"Small"}"#).is_none());
        assert!(Booking::decode("not json").is_none());
        assert!(Booking::decode(r#"{"id":42}"#).is_none());
    }

    #[test]
    fn test_decode_collection_tolerates_garbage() {
        assert!(decode_collection("{oops").is_empty());
        assert!(decode_collection(r#"{"id":"ord_1"}"#).is_empty());

        let bookings = decode_collection(r#"[{"id":"ord_2"}, 7, {"id":"ord_1"}]"#);
        let ids: Vec<&str> = bookings.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec!["ord_2", "ord_1"]);
    }
}
