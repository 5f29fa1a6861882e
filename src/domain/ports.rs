use super::checkout::CheckoutRequest;
use super::payment::{ClientSecret, ConfirmationResult, IntentParams, IssuedIntent, PaymentDetails};
use super::state::ErrorClass;
use crate::error::Result;
use async_trait::async_trait;

/// A flat string key-value store, the shape of browser local storage.
///
/// Values are stored raw so that corrupt data stays observable to callers.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn put(&self, key: &str, value: String) -> Result<()>;
    async fn remove(&self, key: &str) -> Result<()>;
}

pub type KeyValueStoreBox = Box<dyn KeyValueStore>;

/// Why the intent endpoint did not hand out a client secret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntentFailure {
    pub class: ErrorClass,
    pub message: String,
}

impl IntentFailure {
    pub fn validation(message: impl Into<String>) -> Self {
        Self {
            class: ErrorClass::Validation,
            message: message.into(),
        }
    }

    pub fn server(message: impl Into<String>) -> Self {
        Self {
            class: ErrorClass::Server,
            message: message.into(),
        }
    }
}

/// Client side of the "create payment intent" endpoint.
#[async_trait]
pub trait IntentGateway: Send + Sync {
    async fn create_intent(
        &self,
        request: &CheckoutRequest,
    ) -> std::result::Result<ClientSecret, IntentFailure>;
}

pub type IntentGatewayBox = Box<dyn IntentGateway>;

/// The payment provider's client-side SDK surface.
///
/// An `Err` is an unexpected failure of the call itself. A payment the provider
/// declined comes back as `Ok(ConfirmationResult::Error { .. })`.
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    fn is_initialized(&self) -> bool {
        true
    }

    async fn confirm_payment(
        &self,
        client_secret: &ClientSecret,
        details: &PaymentDetails,
    ) -> Result<ConfirmationResult>;
}

pub type PaymentProviderBox = Box<dyn PaymentProvider>;

/// Server side of the payment provider: issues payment intents.
#[async_trait]
pub trait IntentIssuer: Send + Sync {
    async fn issue(&self, params: &IntentParams) -> Result<IssuedIntent>;
}

pub type IntentIssuerBox = Box<dyn IntentIssuer>;

/// A generative text model.
#[async_trait]
pub trait TextModel: Send + Sync {
    async fn generate(&self, prompt: &str, temperature: f32) -> Result<String>;
}

pub type TextModelBox = Box<dyn TextModel>;
