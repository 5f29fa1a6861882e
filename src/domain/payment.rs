use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque single-use credential for confirming one payment intent.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientSecret(String);

impl ClientSecret {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The payment intent id, i.e. everything before `_secret_`.
    pub fn intent_id(&self) -> &str {
        self.0
            .split_once("_secret_")
            .map(|(id, _)| id)
            .unwrap_or(&self.0)
    }
}

impl fmt::Debug for ClientSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClientSecret({}_secret_***)", self.intent_id())
    }
}

/// Status of a payment intent as reported by the provider.
///
/// Statuses this crate does not know are kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PaymentStatus {
    Succeeded,
    Processing,
    RequiresAction,
    RequiresPaymentMethod,
    RequiresConfirmation,
    RequiresCapture,
    Canceled,
    Other(String),
}

impl PaymentStatus {
    pub fn as_str(&self) -> &str {
        match self {
            PaymentStatus::Succeeded => "succeeded",
            PaymentStatus::Processing => "processing",
            PaymentStatus::RequiresAction => "requires_action",
            PaymentStatus::RequiresPaymentMethod => "requires_payment_method",
            PaymentStatus::RequiresConfirmation => "requires_confirmation",
            PaymentStatus::RequiresCapture => "requires_capture",
            PaymentStatus::Canceled => "canceled",
            PaymentStatus::Other(status) => status,
        }
    }

    /// `processing` counts as paid: the provider has accepted the charge.
    pub fn is_success(&self) -> bool {
        matches!(self, PaymentStatus::Succeeded | PaymentStatus::Processing)
    }
}

impl From<&str> for PaymentStatus {
    fn from(status: &str) -> Self {
        match status {
            "succeeded" => PaymentStatus::Succeeded,
            "processing" => PaymentStatus::Processing,
            "requires_action" => PaymentStatus::RequiresAction,
            "requires_payment_method" => PaymentStatus::RequiresPaymentMethod,
            "requires_confirmation" => PaymentStatus::RequiresConfirmation,
            "requires_capture" => PaymentStatus::RequiresCapture,
            "canceled" => PaymentStatus::Canceled,
            other => PaymentStatus::Other(other.to_string()),
        }
    }
}

impl From<String> for PaymentStatus {
    fn from(status: String) -> Self {
        PaymentStatus::from(status.as_str())
    }
}

impl From<PaymentStatus> for String {
    fn from(status: PaymentStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payment details collected by the provider's entry surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentDetails {
    /// Provider reference to the collected payment method (e.g. `pm_card_visa`).
    pub payment_method: String,
    /// Where the provider sends the user back if the method forces a redirect.
    pub return_url: Option<String>,
}

impl PaymentDetails {
    pub fn new(payment_method: impl Into<String>) -> Self {
        Self {
            payment_method: payment_method.into(),
            return_url: None,
        }
    }

    pub fn with_return_url(mut self, url: impl Into<String>) -> Self {
        self.return_url = Some(url.into());
        self
    }
}

/// What the provider's confirmation call produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmationResult {
    /// The provider rejected the payment.
    Error { message: Option<String> },
    /// The provider accepted the confirmation and reports the intent status.
    Intent {
        status: PaymentStatus,
        redirect_url: Option<String>,
    },
}

/// Parameters for issuing a new payment intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntentParams {
    pub amount_cents: i64,
    pub currency: String,
    pub order_id: String,
}

/// A payment intent freshly issued by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedIntent {
    #[serde(rename = "paymentIntentId")]
    pub id: String,
    pub client_secret: ClientSecret,
}
