//! Domain types and the ports the checkout talks through.

pub mod booking;
pub mod checkout;
pub mod payment;
pub mod ports;
pub mod state;
