use crate::domain::checkout::{CheckoutRequest, DEFAULT_CURRENCY};
use crate::domain::payment::ClientSecret;
use crate::domain::ports::{IntentFailure, IntentGateway};
use crate::error::CheckoutError;
use async_trait::async_trait;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const CREATE_INTENT_PATH: &str = "/api/create-payment-intent";
pub const MISSING_CLIENT_SECRET: &str = "Server did not return clientSecret.";
pub const REVIEW_PATH: &str = "/review";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateIntentPayload<'a> {
    order_id: &'a str,
    amount_cents: i64,
    currency: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateIntentReply {
    client_secret: Option<String>,
}

/// Where the payment provider sends the user back after a forced redirect:
/// `<origin of base_url>/review?orderId=<order_id>`.
pub fn review_url(base_url: &str, order_id: &str) -> Result<String, CheckoutError> {
    let mut url = Url::parse(base_url)
        .and_then(|base| base.join(REVIEW_PATH))
        .map_err(|e| CheckoutError::ValidationError(format!("Invalid base URL `{}`: {}", base_url, e)))?;
    url.query_pairs_mut().append_pair("orderId", order_id);
    Ok(url.into())
}

/// Pulls a human-readable message out of an error body.
fn body_message(body: &Value) -> Option<String> {
    ["error", "message"]
        .iter()
        .filter_map(|field| body.get(*field).and_then(Value::as_str))
        .find(|message| !message.trim().is_empty())
        .map(str::to_string)
}

/// Requests payment intents from the checkout backend over HTTP.
#[derive(Clone)]
pub struct HttpIntentGateway {
    client: reqwest::Client,
    base_url: String,
}

impl HttpIntentGateway {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl IntentGateway for HttpIntentGateway {
    async fn create_intent(&self, request: &CheckoutRequest) -> Result<ClientSecret, IntentFailure> {
        let payload = CreateIntentPayload {
            order_id: request.order_id(),
            amount_cents: request.amount().value(),
            currency: DEFAULT_CURRENCY,
        };

        let response = self
            .client
            .post(format!("{}{}", self.base_url, CREATE_INTENT_PATH))
            .json(&payload)
            .send()
            .await
            .map_err(|e| IntentFailure::server(format!("Could not reach payment server: {}", e)))?;

        let status = response.status();
        let body = response.json::<Value>().await.ok();

        if !status.is_success() {
            let message = body
                .as_ref()
                .and_then(body_message)
                .unwrap_or_else(|| format!("Request failed with status {}", status.as_u16()));
            return Err(if status.is_client_error() {
                IntentFailure::validation(message)
            } else {
                IntentFailure::server(message)
            });
        }

        let reply = body
            .and_then(|body| serde_json::from_value::<CreateIntentReply>(body).ok())
            .ok_or_else(|| {
                IntentFailure::server(format!(
                    "Request failed with status {}: malformed response",
                    status.as_u16()
                ))
            })?;

        reply
            .client_secret
            .filter(|secret| !secret.is_empty())
            .map(ClientSecret::new)
            .ok_or_else(|| IntentFailure::server(MISSING_CLIENT_SECRET))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::state::ErrorClass;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn gateway_answering(template: ResponseTemplate) -> (MockServer, HttpIntentGateway) {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(CREATE_INTENT_PATH))
            .respond_with(template)
            .mount(&server)
            .await;
        let gateway = HttpIntentGateway::new(server.uri());
        (server, gateway)
    }

    fn request() -> CheckoutRequest {
        CheckoutRequest::new("ord_1", 1999).unwrap()
    }

    #[test]
    fn test_review_url_uses_origin_and_encodes_order() {
        assert_eq!(
            review_url("http://localhost:3000", "ord_1").unwrap(),
            "http://localhost:3000/review?orderId=ord_1"
        );
        assert_eq!(
            review_url("https://shop.example/api/", "ord 1&x").unwrap(),
            "https://shop.example/review?orderId=ord+1%26x"
        );
        assert!(review_url("not a url", "ord_1").is_err());
    }

    #[tokio::test]
    async fn test_sends_order_amount_and_currency() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(CREATE_INTENT_PATH))
            .and(body_json(json!({"orderId": "ord_1", "amountCents": 1999, "currency": "usd"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "clientSecret": "pi_1_secret_x",
                "paymentIntentId": "pi_1"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let gateway = HttpIntentGateway::new(format!("{}/", server.uri()));
        let secret = gateway.create_intent(&request()).await.unwrap();
        assert_eq!(secret.as_str(), "pi_1_secret_x");
    }

    #[tokio::test]
    async fn test_rejection_uses_body_error() {
        let (_server, gateway) = gateway_answering(
            ResponseTemplate::new(400).set_body_json(json!({"error": "Invalid amountCents"})),
        )
        .await;
        let failure = gateway.create_intent(&request()).await.unwrap_err();
        assert_eq!(failure, IntentFailure::validation("Invalid amountCents"));
    }

    #[tokio::test]
    async fn test_rejection_falls_back_to_message_field() {
        let (_server, gateway) = gateway_answering(
            ResponseTemplate::new(502).set_body_json(json!({"message": "Bad gateway"})),
        )
        .await;
        let failure = gateway.create_intent(&request()).await.unwrap_err();
        assert_eq!(failure.class, ErrorClass::Server);
        assert_eq!(failure.message, "Bad gateway");
    }

    #[tokio::test]
    async fn test_rejection_without_body_uses_status() {
        let (_server, gateway) =
            gateway_answering(ResponseTemplate::new(500).set_body_string("<html>oops</html>")).await;
        let failure = gateway.create_intent(&request()).await.unwrap_err();
        assert_eq!(failure.message, "Request failed with status 500");
    }

    #[tokio::test]
    async fn test_success_without_secret() {
        let (_server, gateway) = gateway_answering(
            ResponseTemplate::new(200).set_body_json(json!({"paymentIntentId": "pi_1"})),
        )
        .await;
        let failure = gateway.create_intent(&request()).await.unwrap_err();
        assert_eq!(failure.message, MISSING_CLIENT_SECRET);
    }

    #[tokio::test]
    async fn test_success_with_malformed_body() {
        let (_server, gateway) =
            gateway_answering(ResponseTemplate::new(200).set_body_string("not json")).await;
        let failure = gateway.create_intent(&request()).await.unwrap_err();
        assert_eq!(failure.class, ErrorClass::Server);
    }
}
