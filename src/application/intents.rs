use crate::domain::checkout::{CheckoutRequest, DEFAULT_CURRENCY, MIN_AMOUNT_CENTS};
use crate::domain::payment::{ClientSecret, IntentParams, IssuedIntent};
use crate::domain::ports::{IntentFailure, IntentGateway, IntentIssuerBox};
use crate::error::CheckoutError;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{error, info};

#[derive(Error, Debug)]
pub enum IntentServiceError {
    #[error("Invalid amountCents")]
    InvalidAmount,
    #[error("Payment provider error")]
    Provider(#[source] CheckoutError),
}

/// Body of `POST /api/create-payment-intent`.
///
/// Fields stay loosely typed so that a wrong type is reported as a validation
/// failure rather than as a parse failure.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateIntentBody {
    #[serde(default)]
    pub amount_cents: Option<Value>,
    #[serde(default)]
    pub currency: Option<Value>,
    #[serde(default)]
    pub order_id: Option<Value>,
}

impl CreateIntentBody {
    /// Parses a raw body. Anything unparseable reads as an empty body.
    pub fn from_slice(bytes: &[u8]) -> Self {
        serde_json::from_slice(bytes).unwrap_or_default()
    }

    fn params(&self) -> Result<IntentParams, IntentServiceError> {
        let amount_cents = self
            .amount_cents
            .as_ref()
            .and_then(whole_number)
            .filter(|amount| *amount >= MIN_AMOUNT_CENTS)
            .ok_or(IntentServiceError::InvalidAmount)?;
        let currency = self
            .currency
            .as_ref()
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_CURRENCY)
            .to_string();
        let order_id = self
            .order_id
            .as_ref()
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        Ok(IntentParams {
            amount_cents,
            currency,
            order_id,
        })
    }
}

/// An integer, or a float with no fractional part such as `1999.0`.
fn whole_number(value: &Value) -> Option<i64> {
    value.as_i64().or_else(|| {
        value
            .as_f64()
            .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f <= i64::MAX as f64)
            .map(|f| f as i64)
    })
}

/// Validates intent requests and forwards them to the provider.
pub struct IntentService {
    issuer: IntentIssuerBox,
}

impl IntentService {
    /// Creates a new `IntentService`.
    ///
    /// # Arguments
    ///
    /// * `issuer` - The payment provider that issues the intents.
    pub fn new(issuer: IntentIssuerBox) -> Self {
        Self { issuer }
    }

    pub async fn create(&self, body: &CreateIntentBody) -> Result<IssuedIntent, IntentServiceError> {
        let params = body.params()?;
        match self.issuer.issue(&params).await {
            Ok(intent) => {
                info!(order_id = %params.order_id, intent = %intent.id, amount_cents = params.amount_cents, "issued payment intent");
                Ok(intent)
            }
            Err(e) => {
                error!(order_id = %params.order_id, error = %e, "payment provider rejected intent");
                Err(IntentServiceError::Provider(e))
            }
        }
    }
}

/// Lets a checkout talk to the service in-process, skipping HTTP.
#[async_trait]
impl IntentGateway for IntentService {
    async fn create_intent(
        &self,
        request: &CheckoutRequest,
    ) -> Result<ClientSecret, IntentFailure> {
        let body = CreateIntentBody {
            amount_cents: Some(Value::from(request.amount().value())),
            currency: Some(Value::from(DEFAULT_CURRENCY)),
            order_id: Some(Value::from(request.order_id())),
        };
        match self.create(&body).await {
            Ok(intent) => Ok(intent.client_secret),
            Err(e @ IntentServiceError::InvalidAmount) => Err(IntentFailure::validation(e.to_string())),
            Err(e @ IntentServiceError::Provider(_)) => Err(IntentFailure::server(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::state::ErrorClass;
    use crate::infrastructure::simulated::SimulatedIssuer;
    use serde_json::json;

    fn body(value: Value) -> CreateIntentBody {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_amount_validation() {
        assert!(body(json!({"amountCents": 50})).params().is_ok());
        assert!(matches!(
            body(json!({"amountCents": 49})).params(),
            Err(IntentServiceError::InvalidAmount)
        ));
        assert!(body(json!({"amountCents": "1999"})).params().is_err());
        assert!(body(json!({"amountCents": 19.99})).params().is_err());
        assert_eq!(
            body(json!({"amountCents": 1999.0})).params().unwrap().amount_cents,
            1999
        );
        assert!(body(json!({"amountCents": 49.0})).params().is_err());
        assert!(body(json!({})).params().is_err());
    }

    #[test]
    fn test_defaults() {
        let params = body(json!({"amountCents": 1999})).params().unwrap();
        assert_eq!(params.currency, "usd");
        assert_eq!(params.order_id, "");
    }

    #[test]
    fn test_unparseable_body_reads_as_empty() {
        let parsed = CreateIntentBody::from_slice(b"{nope");
        assert!(parsed.amount_cents.is_none());
    }

    #[tokio::test]
    async fn test_in_process_gateway_classifies_failures() {
        let service = IntentService::new(Box::new(SimulatedIssuer::new()));
        let low = CheckoutRequest::new("ord_1", 10).unwrap();
        let failure = service.create_intent(&low).await.unwrap_err();
        assert_eq!(failure.class, ErrorClass::Validation);
        assert_eq!(failure.message, "Invalid amountCents");

        let broken = IntentService::new(Box::new(SimulatedIssuer::failing()));
        let ok = CheckoutRequest::new("ord_1", 1999).unwrap();
        let failure = broken.create_intent(&ok).await.unwrap_err();
        assert_eq!(failure.class, ErrorClass::Server);
    }

    #[tokio::test]
    async fn test_issues_with_order_metadata() {
        let issuer = SimulatedIssuer::new();
        let service = IntentService::new(Box::new(issuer.clone()));
        let intent = service
            .create(&body(json!({"amountCents": 1999, "orderId": "ord_1"})))
            .await
            .unwrap();
        assert!(intent.client_secret.as_str().starts_with(&intent.id));
        assert_eq!(issuer.issued().await[0].order_id, "ord_1");
    }
}
