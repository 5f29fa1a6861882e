//! Application layer containing the checkout orchestration.
//!
//! `Checkout` drives one payment from intent creation to confirmation and
//! hands paid orders to the `BookingLedger`. `IntentService` is the server
//! half of intent creation. `SizingAdvisor` is the package sizing helper.

pub mod checkout;
pub mod intents;
pub mod ledger;
pub mod scope;
pub mod sizing;
