//! Stripe REST adapters.
//!
//! `StripeIntentIssuer` runs server side with the secret key.
//! `StripePaymentProvider` confirms with the publishable key and the intent's
//! client secret, which is what Stripe.js does in the browser.

use crate::domain::payment::{
    ClientSecret, ConfirmationResult, IntentParams, IssuedIntent, PaymentDetails, PaymentStatus,
};
use crate::domain::ports::{IntentIssuer, PaymentProvider};
use crate::error::{CheckoutError, Result};
use async_trait::async_trait;
use reqwest::Response;
use serde::Deserialize;

pub const STRIPE_API_BASE: &str = "https://api.stripe.com";

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: StripeError,
}

#[derive(Debug, Deserialize)]
struct StripeError {
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PaymentIntentObject {
    id: String,
    client_secret: Option<String>,
    status: PaymentStatus,
    next_action: Option<NextAction>,
}

#[derive(Debug, Deserialize)]
struct NextAction {
    redirect_to_url: Option<RedirectToUrl>,
}

#[derive(Debug, Deserialize)]
struct RedirectToUrl {
    url: Option<String>,
}

async fn error_message(response: Response) -> Option<String> {
    response
        .json::<ErrorEnvelope>()
        .await
        .ok()
        .and_then(|envelope| envelope.error.message)
}

/// Issues payment intents with automatic payment methods enabled.
#[derive(Clone)]
pub struct StripeIntentIssuer {
    client: reqwest::Client,
    base_url: String,
    secret_key: String,
}

impl StripeIntentIssuer {
    pub fn new(secret_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: STRIPE_API_BASE.to_string(),
            secret_key: secret_key.into(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl IntentIssuer for StripeIntentIssuer {
    async fn issue(&self, params: &IntentParams) -> Result<IssuedIntent> {
        let amount = params.amount_cents.to_string();
        let form = [
            ("amount", amount.as_str()),
            ("currency", params.currency.as_str()),
            ("automatic_payment_methods[enabled]", "true"),
            ("metadata[orderId]", params.order_id.as_str()),
        ];

        let response = self
            .client
            .post(format!("{}/v1/payment_intents", self.base_url))
            .bearer_auth(&self.secret_key)
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = error_message(response)
                .await
                .unwrap_or_else(|| format!("Stripe returned {}", status));
            return Err(CheckoutError::ProviderError(message));
        }

        let intent: PaymentIntentObject = response.json().await?;
        let client_secret = intent.client_secret.ok_or_else(|| {
            CheckoutError::ProviderError("Stripe did not return a client secret".to_string())
        })?;
        Ok(IssuedIntent {
            id: intent.id,
            client_secret: ClientSecret::new(client_secret),
        })
    }
}

/// Confirms payment intents from the client side.
#[derive(Clone)]
pub struct StripePaymentProvider {
    client: reqwest::Client,
    base_url: String,
    publishable_key: String,
}

impl StripePaymentProvider {
    pub fn new(publishable_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: STRIPE_API_BASE.to_string(),
            publishable_key: publishable_key.into(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl PaymentProvider for StripePaymentProvider {
    fn is_initialized(&self) -> bool {
        !self.publishable_key.trim().is_empty()
    }

    async fn confirm_payment(
        &self,
        client_secret: &ClientSecret,
        details: &PaymentDetails,
    ) -> Result<ConfirmationResult> {
        let mut form = vec![
            ("client_secret", client_secret.as_str()),
            ("payment_method", details.payment_method.as_str()),
        ];
        if let Some(return_url) = details.return_url.as_deref() {
            form.push(("return_url", return_url));
        }

        let response = self
            .client
            .post(format!(
                "{}/v1/payment_intents/{}/confirm",
                self.base_url,
                client_secret.intent_id()
            ))
            .bearer_auth(&self.publishable_key)
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            let intent: PaymentIntentObject = response.json().await?;
            let redirect_url = intent
                .next_action
                .and_then(|action| action.redirect_to_url)
                .and_then(|redirect| redirect.url);
            return Ok(ConfirmationResult::Intent {
                status: intent.status,
                redirect_url,
            });
        }

        // Declines come back as a Stripe error envelope; anything else is an outage.
        match error_message(response).await {
            Some(message) => Ok(ConfirmationResult::Error {
                message: Some(message),
            }),
            None if status.is_client_error() => Ok(ConfirmationResult::Error { message: None }),
            None => Err(CheckoutError::ProviderError(format!(
                "Stripe returned {}",
                status
            ))),
        }
    }
}
