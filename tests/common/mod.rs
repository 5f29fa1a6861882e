#![allow(dead_code)]

use async_trait::async_trait;
use droppit::application::checkout::Checkout;
use droppit::application::ledger::BookingLedger;
use droppit::domain::checkout::CheckoutRequest;
use droppit::domain::payment::ClientSecret;
use droppit::domain::ports::{IntentFailure, IntentGateway, KeyValueStore, PaymentProviderBox};
use droppit::infrastructure::in_memory::InMemoryStore;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Notify;

pub fn secret_for(order_id: &str) -> String {
    format!("pi_{}_secret_test", order_id)
}

/// Hands out a client secret per order and counts the requests.
///
/// Requests for `held` park until `release` is notified.
#[derive(Clone, Default)]
pub struct FakeGateway {
    pub calls: Arc<AtomicUsize>,
    pub held: Option<String>,
    pub entered: Arc<Notify>,
    pub release: Arc<Notify>,
}

impl FakeGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn holding(order_id: &str) -> Self {
        Self {
            held: Some(order_id.to_string()),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IntentGateway for FakeGateway {
    async fn create_intent(
        &self,
        request: &CheckoutRequest,
    ) -> Result<ClientSecret, IntentFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.held.as_deref() == Some(request.order_id()) {
            self.entered.notify_one();
            self.release.notified().await;
        }
        Ok(ClientSecret::new(secret_for(request.order_id())))
    }
}

pub fn request(order_id: &str, amount_cents: i64) -> CheckoutRequest {
    CheckoutRequest::new(order_id, amount_cents).unwrap()
}

pub fn checkout_with(
    store: &InMemoryStore,
    request: CheckoutRequest,
    gateway: FakeGateway,
    provider: PaymentProviderBox,
) -> Arc<Checkout> {
    Arc::new(Checkout::new(
        request,
        Box::new(gateway),
        provider,
        BookingLedger::new(Box::new(store.clone())),
    ))
}

/// Wraps an [`InMemoryStore`] and never finishes a `remove`.
#[derive(Clone, Default)]
pub struct StallingStore {
    pub inner: InMemoryStore,
}

#[async_trait]
impl KeyValueStore for StallingStore {
    async fn get(&self, key: &str) -> droppit::error::Result<Option<String>> {
        self.inner.get(key).await
    }

    async fn put(&self, key: &str, value: String) -> droppit::error::Result<()> {
        self.inner.put(key, value).await
    }

    async fn remove(&self, _key: &str) -> droppit::error::Result<()> {
        std::future::pending().await
    }
}
