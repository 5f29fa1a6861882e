use crate::domain::booking::{
    BOOKINGS_KEY, Booking, CHECKOUT_SUCCESS_KEY, LAST_PAID_ORDER_KEY, PENDING_BOOKING_KEY,
    decode_collection,
};
use crate::domain::ports::KeyValueStoreBox;
use crate::error::Result;
use tracing::{debug, info};

/// Which branch a promotion took.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Promotion {
    /// The pending booking moved into the collection.
    Promoted,
    /// Nothing usable in the pending slot.
    NoPending,
    /// The pending booking belongs to another order and was left alone.
    Mismatch { pending_id: String },
    /// The collection already holds this order.
    AlreadyRecorded,
}

/// Typed access to the bookings kept in a [`KeyValueStore`].
///
/// Malformed stored JSON never surfaces as an error here: an unreadable slot
/// behaves as if it were empty and is overwritten by the next successful write.
///
/// [`KeyValueStore`]: crate::domain::ports::KeyValueStore
pub struct BookingLedger {
    store: KeyValueStoreBox,
}

impl BookingLedger {
    /// Creates a new `BookingLedger`.
    ///
    /// # Arguments
    ///
    /// * `store` - The key-value store holding the pending slot and the collection.
    pub fn new(store: KeyValueStoreBox) -> Self {
        Self { store }
    }

    /// Stages a booking in the pending slot, replacing whatever was there.
    pub async fn stage(&self, booking: &Booking) -> Result<()> {
        let raw = serde_json::to_string(booking)?;
        self.store.put(PENDING_BOOKING_KEY, raw).await
    }

    pub async fn pending(&self) -> Result<Option<Booking>> {
        Ok(self
            .store
            .get(PENDING_BOOKING_KEY)
            .await?
            .and_then(|raw| Booking::decode(&raw)))
    }

    /// The booking collection, newest first.
    pub async fn bookings(&self) -> Result<Vec<Booking>> {
        Ok(self
            .store
            .get(BOOKINGS_KEY)
            .await?
            .map(|raw| decode_collection(&raw))
            .unwrap_or_default())
    }

    pub async fn last_paid_order(&self) -> Result<Option<String>> {
        self.store.get(LAST_PAID_ORDER_KEY).await
    }

    /// Moves the pending booking for `order_id` into the collection.
    ///
    /// Safe to call repeatedly for the same order: once the order is in the
    /// collection every further call is a no-op.
    pub async fn promote(&self, order_id: &str) -> Result<Promotion> {
        let Some(pending) = self.pending().await? else {
            debug!(order_id, "no pending booking to promote");
            return Ok(Promotion::NoPending);
        };

        if pending.id != order_id {
            debug!(order_id, pending_id = %pending.id, "pending booking belongs to another order");
            return Ok(Promotion::Mismatch {
                pending_id: pending.id,
            });
        }

        let mut bookings = self.bookings().await?;
        if bookings.iter().any(|booking| booking.id == order_id) {
            debug!(order_id, "booking already recorded");
            return Ok(Promotion::AlreadyRecorded);
        }

        bookings.insert(0, pending);
        self.store
            .put(BOOKINGS_KEY, serde_json::to_string(&bookings)?)
            .await?;
        self.store.remove(PENDING_BOOKING_KEY).await?;
        self.store
            .put(LAST_PAID_ORDER_KEY, order_id.to_string())
            .await?;
        self.store
            .put(CHECKOUT_SUCCESS_KEY, "true".to_string())
            .await?;

        info!(order_id, total = bookings.len(), "promoted pending booking");
        Ok(Promotion::Promoted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::in_memory::InMemoryStore;
    use crate::domain::ports::KeyValueStore;

    fn ledger_with(store: &InMemoryStore) -> BookingLedger {
        BookingLedger::new(Box::new(store.clone()))
    }

    #[tokio::test]
    async fn test_promote_moves_pending_booking() {
        let store = InMemoryStore::new();
        let ledger = ledger_with(&store);
        ledger
            .stage(&Booking::new("ord_1").with_field("size", "Small"))
            .await
            .unwrap();

        assert_eq!(ledger.promote("ord_1").await.unwrap(), Promotion::Promoted);

        let bookings = ledger.bookings().await.unwrap();
        assert_eq!(bookings.len(), 1);
        assert_eq!(bookings[0].id, "ord_1");
        assert_eq!(bookings[0].details["size"], "Small");
        assert!(ledger.pending().await.unwrap().is_none());
        assert_eq!(
            ledger.last_paid_order().await.unwrap().as_deref(),
            Some("ord_1")
        );
        assert_eq!(
            store.get(CHECKOUT_SUCCESS_KEY).await.unwrap().as_deref(),
            Some("true")
        );
    }

    #[tokio::test]
    async fn test_promote_prepends_newest_first() {
        let store = InMemoryStore::new();
        let ledger = ledger_with(&store);

        for id in ["ord_1", "ord_2", "ord_3"] {
            ledger.stage(&Booking::new(id)).await.unwrap();
            ledger.promote(id).await.unwrap();
        }

        let ids: Vec<String> = ledger
            .bookings()
            .await
            .unwrap()
            .into_iter()
            .map(|b| b.id)
            .collect();
        assert_eq!(ids, vec!["ord_3", "ord_2", "ord_1"]);
    }

    #[tokio::test]
    async fn test_promote_without_pending_is_noop() {
        let store = InMemoryStore::new();
        let ledger = ledger_with(&store);

        assert_eq!(ledger.promote("ord_1").await.unwrap(), Promotion::NoPending);
        assert!(store.get(BOOKINGS_KEY).await.unwrap().is_none());
        assert!(store.get(LAST_PAID_ORDER_KEY).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_promote_is_idempotent() {
        let store = InMemoryStore::new();
        let ledger = ledger_with(&store);
        ledger.stage(&Booking::new("ord_1")).await.unwrap();

        ledger.promote("ord_1").await.unwrap();
        let once = store.get(BOOKINGS_KEY).await.unwrap();

        // Re-staging the same order simulates a duplicate success event.
        ledger.stage(&Booking::new("ord_1")).await.unwrap();
        assert_eq!(
            ledger.promote("ord_1").await.unwrap(),
            Promotion::AlreadyRecorded
        );
        assert_eq!(store.get(BOOKINGS_KEY).await.unwrap(), once);
    }

    #[tokio::test]
    async fn test_mismatch_leaves_everything_untouched() {
        let store = InMemoryStore::new();
        let ledger = ledger_with(&store);
        ledger.stage(&Booking::new("ord_2")).await.unwrap();

        assert_eq!(
            ledger.promote("ord_1").await.unwrap(),
            Promotion::Mismatch {
                pending_id: "ord_2".to_string()
            }
        );
        assert!(ledger.bookings().await.unwrap().is_empty());
        assert_eq!(ledger.pending().await.unwrap().unwrap().id, "ord_2");
    }

    #[tokio::test]
    async fn test_corrupt_slots_read_as_empty() {
        let store = InMemoryStore::new();
        let ledger = ledger_with(&store);

        store
            .put(PENDING_BOOKING_KEY, "{not json".to_string())
            .await
            .unwrap();
        assert_eq!(ledger.promote("ord_1").await.unwrap(), Promotion::NoPending);

        store
            .put(BOOKINGS_KEY, "also not json".to_string())
            .await
            .unwrap();
        ledger.stage(&Booking::new("ord_1")).await.unwrap();
        assert_eq!(ledger.promote("ord_1").await.unwrap(), Promotion::Promoted);

        let bookings = ledger.bookings().await.unwrap();
        assert_eq!(bookings.len(), 1);
        assert_eq!(bookings[0].id, "ord_1");
    }
}
