//! Offline stand-ins for the payment provider.

use crate::domain::payment::{
    ClientSecret, ConfirmationResult, IntentParams, IssuedIntent, PaymentDetails, PaymentStatus,
};
use crate::domain::ports::{IntentIssuer, PaymentProvider};
use crate::error::{CheckoutError, Result};
use async_trait::async_trait;
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;
use tracing::info;

/// Issues fake intents and remembers what it was asked for.
#[derive(Default, Clone)]
pub struct SimulatedIssuer {
    issued: Arc<RwLock<Vec<IntentParams>>>,
    fail: bool,
}

impl SimulatedIssuer {
    pub fn new() -> Self {
        Self::default()
    }

    /// An issuer whose every call fails like a provider outage.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub async fn issued(&self) -> Vec<IntentParams> {
        self.issued.read().await.clone()
    }
}

#[async_trait]
impl IntentIssuer for SimulatedIssuer {
    async fn issue(&self, params: &IntentParams) -> Result<IssuedIntent> {
        if self.fail {
            return Err(CheckoutError::ProviderError(
                "simulated provider outage".to_string(),
            ));
        }
        let mut issued = self.issued.write().await;
        issued.push(params.clone());
        let id = format!("pi_sim_{:06}", issued.len());
        info!(intent = %id, order_id = %params.order_id, "simulated intent issued");
        Ok(IssuedIntent {
            client_secret: ClientSecret::new(format!("{}_secret_sim", id)),
            id,
        })
    }
}

/// What a [`SimulatedProvider`] answers to every confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimulatedOutcome {
    Status(PaymentStatus),
    Declined(Option<String>),
    /// The call itself blows up.
    Crash(String),
}

impl FromStr for SimulatedOutcome {
    type Err = CheckoutError;

    /// `declined`, `error`, or any payment status such as `succeeded`.
    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "" => Err(CheckoutError::ValidationError(
                "simulated outcome must not be empty".to_string(),
            )),
            "declined" => Ok(SimulatedOutcome::Declined(Some(
                "Your card was declined.".to_string(),
            ))),
            "error" => Ok(SimulatedOutcome::Crash(
                "simulated provider outage".to_string(),
            )),
            status => Ok(SimulatedOutcome::Status(PaymentStatus::from(status))),
        }
    }
}

#[derive(Clone)]
pub struct SimulatedProvider {
    outcome: SimulatedOutcome,
    initialized: bool,
    confirmations: Arc<AtomicUsize>,
}

impl SimulatedProvider {
    pub fn new(outcome: SimulatedOutcome) -> Self {
        Self {
            outcome,
            initialized: true,
            confirmations: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn succeeding() -> Self {
        Self::new(SimulatedOutcome::Status(PaymentStatus::Succeeded))
    }

    /// A provider whose client never finished loading.
    pub fn uninitialized(mut self) -> Self {
        self.initialized = false;
        self
    }

    pub fn confirmations(&self) -> usize {
        self.confirmations.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PaymentProvider for SimulatedProvider {
    fn is_initialized(&self) -> bool {
        self.initialized
    }

    async fn confirm_payment(
        &self,
        client_secret: &ClientSecret,
        _details: &PaymentDetails,
    ) -> Result<ConfirmationResult> {
        self.confirmations.fetch_add(1, Ordering::SeqCst);
        info!(intent = client_secret.intent_id(), outcome = ?self.outcome, "simulated confirmation");
        match &self.outcome {
            SimulatedOutcome::Status(status) => Ok(ConfirmationResult::Intent {
                status: status.clone(),
                redirect_url: None,
            }),
            SimulatedOutcome::Declined(message) => Ok(ConfirmationResult::Error {
                message: message.clone(),
            }),
            SimulatedOutcome::Crash(message) => Err(CheckoutError::ProviderError(message.clone())),
        }
    }
}
