use super::ledger::{BookingLedger, Promotion};
use super::scope::{Liveness, MountScope};
use crate::domain::checkout::CheckoutRequest;
use crate::domain::payment::{ConfirmationResult, PaymentDetails, PaymentStatus};
use crate::domain::ports::{IntentGatewayBox, PaymentProviderBox};
use crate::domain::state::{
    CheckoutEvent, CheckoutState, DEFAULT_PAYMENT_FAILURE, INTERRUPTED_PAYMENT,
};
use crate::error::{CheckoutError, Result};
use tokio::sync::{Mutex, oneshot, watch};
use tracing::{debug, info, warn};

pub const PROVIDER_NOT_READY: &str = "Payment system is still loading. Please try again.";
pub const FORM_NOT_READY: &str = "Payment form is not ready yet.";
pub const UNEXPECTED_FAILURE: &str = "An unexpected error occurred.";

/// Emitted once when the checkout reaches `Succeeded`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaidOrder {
    pub order_id: String,
    pub status: PaymentStatus,
}

/// One mounted checkout: boots a payment intent, then confirms payments
/// against it until one succeeds.
///
/// The state lives in a `watch` channel so hosts can [`subscribe`] to it;
/// success is additionally delivered once through [`paid`].
///
/// [`subscribe`]: Checkout::subscribe
/// [`paid`]: Checkout::paid
pub struct Checkout {
    request: Mutex<CheckoutRequest>,
    requested: Mutex<Option<CheckoutRequest>>,
    gateway: IntentGatewayBox,
    provider: PaymentProviderBox,
    ledger: BookingLedger,
    state: watch::Sender<CheckoutState>,
    paid_tx: Mutex<Option<oneshot::Sender<PaidOrder>>>,
    paid_rx: Mutex<Option<oneshot::Receiver<PaidOrder>>>,
    scope: MountScope,
}

impl Checkout {
    /// Creates a mounted checkout in the `Booting` state.
    ///
    /// # Arguments
    ///
    /// * `request` - The order and amount to pay for.
    /// * `gateway` - Where payment intents are requested.
    /// * `provider` - The payment provider that confirms payments.
    /// * `ledger` - Receives the pending booking once the payment succeeds.
    pub fn new(
        request: CheckoutRequest,
        gateway: IntentGatewayBox,
        provider: PaymentProviderBox,
        ledger: BookingLedger,
    ) -> Self {
        let (state, _) = watch::channel(CheckoutState::Booting);
        let (paid_tx, paid_rx) = oneshot::channel();
        Self {
            request: Mutex::new(request),
            requested: Mutex::new(None),
            gateway,
            provider,
            ledger,
            state,
            paid_tx: Mutex::new(Some(paid_tx)),
            paid_rx: Mutex::new(Some(paid_rx)),
            scope: MountScope::new(),
        }
    }

    pub fn state(&self) -> CheckoutState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<CheckoutState> {
        self.state.subscribe()
    }

    /// Takes the success signal. Only the first caller gets it.
    pub async fn paid(&self) -> Option<oneshot::Receiver<PaidOrder>> {
        self.paid_rx.lock().await.take()
    }

    pub async fn request(&self) -> CheckoutRequest {
        self.request.lock().await.clone()
    }

    pub fn ledger(&self) -> &BookingLedger {
        &self.ledger
    }

    /// Requests a payment intent for the current request.
    ///
    /// Issues at most one request per distinct request value. A response that
    /// arrives after [`unmount`](Checkout::unmount) or after the request was
    /// replaced is dropped.
    pub async fn boot(&self) -> Result<()> {
        if !self.scope.is_mounted() {
            debug!("checkout unmounted, skipping intent request");
            return Ok(());
        }

        // Captured before reading the request so that a reinitialize racing
        // with this call makes the result stale.
        let liveness = self.scope.capture();
        let request = self.request.lock().await.clone();
        {
            let mut requested = self.requested.lock().await;
            if !liveness.is_live() {
                debug!(order_id = request.order_id(), "checkout changed before requesting intent");
                return Ok(());
            }
            if requested.as_ref() == Some(&request) {
                debug!(order_id = request.order_id(), "payment intent already requested");
                return Ok(());
            }
            *requested = Some(request.clone());
        }

        let order_id = request.order_id();
        info!(order_id, amount = %request.amount(), "requesting payment intent");

        let event = match self.gateway.create_intent(&request).await {
            Ok(client_secret) => {
                debug!(order_id, intent = client_secret.intent_id(), "payment intent ready");
                CheckoutEvent::IntentCreated(client_secret)
            }
            Err(failure) => {
                warn!(order_id, class = ?failure.class, error = %failure.message, "payment intent failed");
                CheckoutEvent::IntentRejected {
                    class: failure.class,
                    message: failure.message,
                }
            }
        };

        if !self.apply(event, Some(&liveness))? {
            debug!(order_id, "discarded intent response for a stale checkout");
        }
        Ok(())
    }

    /// Replaces the request and boots again if it changed.
    pub async fn reinitialize(&self, request: CheckoutRequest) -> Result<()> {
        let mut current = self.request.lock().await;
        if *current != request {
            self.restart()?;
            info!(
                from = current.order_id(),
                to = request.order_id(),
                "checkout request changed"
            );
            *current = request;
            *self.requested.lock().await = None;
        }
        drop(current);
        self.boot().await
    }

    /// Confirms a payment with the details collected by the entry surface.
    ///
    /// Refused with [`CheckoutError::InvalidTransition`] unless the checkout is
    /// ready (or ready with an error). Every other outcome is reported through
    /// the returned state.
    pub async fn submit(&self, details: Option<&PaymentDetails>) -> Result<CheckoutState> {
        let current = self.state();
        let client_secret = match &current {
            CheckoutState::Ready { client_secret, .. }
            | CheckoutState::Failed { client_secret, .. } => client_secret.clone(),
            other => {
                return Err(CheckoutError::InvalidTransition {
                    state: other.name(),
                    event: "submit",
                });
            }
        };

        let request = self.request.lock().await.clone();
        let order_id = request.order_id();

        let details = match self.check_preconditions(details) {
            Ok(details) => details,
            Err(message) => {
                warn!(order_id, reason = message, "payment submission refused");
                self.apply(CheckoutEvent::Rejected(message.to_string()), None)?;
                return Ok(self.state());
            }
        };

        self.apply(CheckoutEvent::Submitted, None)?;
        let guard = ConfirmingGuard::new(&self.state);
        info!(order_id, intent = client_secret.intent_id(), "confirming payment");

        let event = match self.provider.confirm_payment(&client_secret, details).await {
            Ok(ConfirmationResult::Error { message }) => {
                let message = message
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_PAYMENT_FAILURE.to_string());
                warn!(order_id, error = %message, "payment declined");
                CheckoutEvent::ConfirmFailed(message)
            }
            Ok(ConfirmationResult::Intent {
                status,
                redirect_url,
            }) => {
                if !status.is_success() {
                    info!(order_id, %status, "payment not completed");
                }
                CheckoutEvent::Confirmed {
                    order_id: order_id.to_string(),
                    status,
                    redirect_url,
                }
            }
            Err(e) => {
                warn!(order_id, error = %e, "payment confirmation raised");
                let message = match e {
                    CheckoutError::ProviderError(message) => message,
                    other => other.to_string(),
                };
                CheckoutEvent::ConfirmFailed(if message.trim().is_empty() {
                    UNEXPECTED_FAILURE.to_string()
                } else {
                    message
                })
            }
        };

        let paid = match &event {
            CheckoutEvent::Confirmed {
                order_id, status, ..
            } if status.is_success() => Some(PaidOrder {
                order_id: order_id.clone(),
                status: status.clone(),
            }),
            _ => None,
        };

        // The provider's answer is final from here on.
        self.apply(event, None)?;
        guard.disarm();

        if let Some(paid) = paid {
            info!(order_id, status = %paid.status, "payment succeeded");
            let _notice = PaidNotice {
                tx: self.paid_tx.lock().await.take(),
                paid: Some(paid),
            };
            self.record_booking(order_id).await;
        }

        Ok(self.state())
    }

    /// Tears the checkout down. In-flight intent responses are discarded.
    pub fn unmount(&self) {
        debug!("checkout unmounted");
        self.scope.unmount();
    }

    fn check_preconditions<'a>(
        &self,
        details: Option<&'a PaymentDetails>,
    ) -> std::result::Result<&'a PaymentDetails, &'static str> {
        if !self.provider.is_initialized() {
            return Err(PROVIDER_NOT_READY);
        }
        details
            .filter(|d| !d.payment_method.trim().is_empty())
            .ok_or(FORM_NOT_READY)
    }

    async fn record_booking(&self, order_id: &str) {
        match self.ledger.promote(order_id).await {
            Ok(Promotion::Promoted) => {}
            Ok(outcome) => debug!(order_id, ?outcome, "pending booking not promoted"),
            Err(e) => warn!(order_id, error = %e, "failed to record paid booking"),
        }
    }

    /// Applies `event`, unless `liveness` went stale. Returns whether it applied.
    fn apply(&self, event: CheckoutEvent, liveness: Option<&Liveness>) -> Result<bool> {
        let mut outcome = Ok(false);
        self.state.send_if_modified(|state| {
            if liveness.is_some_and(|l| !l.is_live()) {
                return false;
            }
            match state.clone().apply(event) {
                Ok(next) => {
                    outcome = Ok(true);
                    let changed = *state != next;
                    *state = next;
                    changed
                }
                Err(e) => {
                    outcome = Err(e);
                    false
                }
            }
        });
        outcome
    }

    /// Back to `Booting`, invalidating in-flight intent requests atomically
    /// with the state change.
    fn restart(&self) -> Result<()> {
        let mut outcome = Ok(());
        self.state.send_if_modified(|state| {
            match state.clone().apply(CheckoutEvent::Restarted) {
                Ok(next) => {
                    self.scope.invalidate();
                    let changed = *state != next;
                    *state = next;
                    changed
                }
                Err(e) => {
                    outcome = Err(e);
                    false
                }
            }
        });
        outcome
    }
}

/// Releases `Confirming` if the confirmation future is dropped midway.
struct ConfirmingGuard<'a> {
    state: &'a watch::Sender<CheckoutState>,
    armed: bool,
}

impl<'a> ConfirmingGuard<'a> {
    fn new(state: &'a watch::Sender<CheckoutState>) -> Self {
        Self { state, armed: true }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for ConfirmingGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        self.state.send_if_modified(|state| {
            match state
                .clone()
                .apply(CheckoutEvent::ConfirmFailed(INTERRUPTED_PAYMENT.to_string()))
            {
                Ok(next) => {
                    *state = next;
                    true
                }
                Err(_) => false,
            }
        });
    }
}

/// Delivers the success signal when dropped, so the host hears about a paid
/// order even if the booking promotion is abandoned.
struct PaidNotice {
    tx: Option<oneshot::Sender<PaidOrder>>,
    paid: Option<PaidOrder>,
}

impl Drop for PaidNotice {
    fn drop(&mut self) {
        if let (Some(tx), Some(paid)) = (self.tx.take(), self.paid.take()) {
            // The host may have stopped listening.
            let _ = tx.send(paid);
        }
    }
}
