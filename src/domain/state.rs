use super::payment::{ClientSecret, PaymentStatus};
use crate::error::{CheckoutError, Result};
use std::fmt;

/// Message shown when the provider rejects a payment without saying why.
pub const DEFAULT_PAYMENT_FAILURE: &str = "Payment failed. Please try again.";
/// Message shown when a confirmation never produced a result.
pub const INTERRUPTED_PAYMENT: &str = "Payment confirmation was interrupted.";

/// Which side a boot failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// The endpoint refused the request (4xx).
    Validation,
    /// The endpoint failed, answered with garbage, or was unreachable.
    Server,
}

/// The checkout's UI state.
///
/// `Error` and `Succeeded` are terminal. `Failed` is the retryable
/// "ready with an inline error" state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CheckoutState {
    #[default]
    Booting,
    Error {
        class: ErrorClass,
        message: String,
    },
    Ready {
        client_secret: ClientSecret,
        status: Option<PaymentStatus>,
        redirect_url: Option<String>,
    },
    Confirming {
        client_secret: ClientSecret,
    },
    Succeeded {
        order_id: String,
    },
    Failed {
        client_secret: ClientSecret,
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutEvent {
    IntentCreated(ClientSecret),
    IntentRejected { class: ErrorClass, message: String },
    /// The request changed; start over.
    Restarted,
    /// A submission was refused before reaching the provider.
    Rejected(String),
    Submitted,
    Confirmed {
        order_id: String,
        status: PaymentStatus,
        redirect_url: Option<String>,
    },
    ConfirmFailed(String),
}

impl CheckoutEvent {
    pub fn name(&self) -> &'static str {
        match self {
            CheckoutEvent::IntentCreated(_) => "accept an intent",
            CheckoutEvent::IntentRejected { .. } => "reject an intent",
            CheckoutEvent::Restarted => "restart",
            CheckoutEvent::Rejected(_) => "reject a submission",
            CheckoutEvent::Submitted => "submit",
            CheckoutEvent::Confirmed { .. } => "confirm",
            CheckoutEvent::ConfirmFailed(_) => "fail a confirmation",
        }
    }
}

impl CheckoutState {
    pub fn name(&self) -> &'static str {
        match self {
            CheckoutState::Booting => "booting",
            CheckoutState::Error { .. } => "error",
            CheckoutState::Ready { .. } => "ready",
            CheckoutState::Confirming { .. } => "confirming",
            CheckoutState::Succeeded { .. } => "succeeded",
            CheckoutState::Failed { .. } => "failed",
        }
    }

    /// The single transition function of the checkout.
    pub fn apply(self, event: CheckoutEvent) -> Result<CheckoutState> {
        use CheckoutEvent as E;
        use CheckoutState as S;

        match (self, event) {
            (S::Booting, E::IntentCreated(client_secret)) => Ok(S::Ready {
                client_secret,
                status: None,
                redirect_url: None,
            }),
            (S::Booting, E::IntentRejected { class, message }) => Ok(S::Error { class, message }),
            (
                S::Booting | S::Error { .. } | S::Ready { .. } | S::Failed { .. },
                E::Restarted,
            ) => Ok(S::Booting),
            (
                S::Ready { client_secret, .. } | S::Failed { client_secret, .. },
                E::Rejected(message),
            ) => Ok(S::Failed {
                client_secret,
                message,
            }),
            (S::Ready { client_secret, .. } | S::Failed { client_secret, .. }, E::Submitted) => {
                Ok(S::Confirming { client_secret })
            }
            (
                S::Confirming { client_secret },
                E::Confirmed {
                    order_id,
                    status,
                    redirect_url,
                },
            ) => {
                if status.is_success() {
                    Ok(S::Succeeded { order_id })
                } else {
                    Ok(S::Ready {
                        client_secret,
                        status: Some(status),
                        redirect_url,
                    })
                }
            }
            (S::Confirming { client_secret }, E::ConfirmFailed(message)) => Ok(S::Failed {
                client_secret,
                message,
            }),
            (state, event) => Err(CheckoutError::InvalidTransition {
                state: state.name(),
                event: event.name(),
            }),
        }
    }

    /// Whether a confirmation is in flight. Submitting is disabled meanwhile.
    pub fn is_loading(&self) -> bool {
        matches!(self, CheckoutState::Confirming { .. })
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            CheckoutState::Error { .. } | CheckoutState::Succeeded { .. }
        )
    }

    pub fn can_submit(&self) -> bool {
        matches!(
            self,
            CheckoutState::Ready { .. } | CheckoutState::Failed { .. }
        )
    }

    pub fn client_secret(&self) -> Option<&ClientSecret> {
        match self {
            CheckoutState::Ready { client_secret, .. }
            | CheckoutState::Confirming { client_secret }
            | CheckoutState::Failed { client_secret, .. } => Some(client_secret),
            _ => None,
        }
    }
}

impl fmt::Display for CheckoutState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckoutState::Booting => write!(f, "booting"),
            CheckoutState::Error { message, .. } => write!(f, "error: {}", message),
            CheckoutState::Ready {
                status: None,
                ..
            } => write!(f, "ready"),
            CheckoutState::Ready {
                status: Some(status),
                redirect_url,
                ..
            } => {
                write!(f, "ready (payment status: {})", status)?;
                if let Some(url) = redirect_url {
                    write!(f, ", continue at {}", url)?;
                }
                Ok(())
            }
            CheckoutState::Confirming { .. } => write!(f, "confirming"),
            CheckoutState::Succeeded { order_id } => write!(f, "succeeded: order {}", order_id),
            CheckoutState::Failed { message, .. } => write!(f, "failed: {}", message),
        }
    }
}
