use crate::error::{CheckoutError, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Smallest charge the payment endpoint accepts, in minor units.
pub const MIN_AMOUNT_CENTS: i64 = 50;

/// Currency sent with every intent request.
pub const DEFAULT_CURRENCY: &str = "usd";

/// A charge expressed in minor units (cents).
///
/// Only positivity is checked here. The endpoint owns the minimum charge rule,
/// so an amount below [`MIN_AMOUNT_CENTS`] is still a well-formed request that
/// the server is expected to reject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AmountCents(i64);

impl AmountCents {
    pub fn new(value: i64) -> Result<Self> {
        if value > 0 {
            Ok(Self(value))
        } else {
            Err(CheckoutError::ValidationError(
                "amountCents must be a positive number".to_string(),
            ))
        }
    }

    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn meets_minimum(&self) -> bool {
        self.0 >= MIN_AMOUNT_CENTS
    }

    /// The amount in major units, keeping two decimal places.
    pub fn to_dollars(&self) -> Decimal {
        Decimal::new(self.0, 2)
    }
}

impl TryFrom<i64> for AmountCents {
    type Error = CheckoutError;

    fn try_from(value: i64) -> Result<Self> {
        Self::new(value)
    }
}

impl FromStr for AmountCents {
    type Err = CheckoutError;

    fn from_str(s: &str) -> Result<Self> {
        let value = s.trim().parse::<i64>().map_err(|_| {
            CheckoutError::ValidationError("amountCents must be numeric".to_string())
        })?;
        Self::new(value)
    }
}

impl fmt::Display for AmountCents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}", self.to_dollars())
    }
}

/// What the host hands to the checkout when the user chooses to pay.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CheckoutRequest {
    order_id: String,
    amount: AmountCents,
}

impl CheckoutRequest {
    pub fn new(order_id: impl Into<String>, amount_cents: i64) -> Result<Self> {
        let order_id = order_id.into();
        if order_id.trim().is_empty() {
            return Err(CheckoutError::ValidationError(
                "orderId is required".to_string(),
            ));
        }
        Ok(Self {
            order_id,
            amount: AmountCents::new(amount_cents)?,
        })
    }

    /// Builds a request from loosely typed input, such as query parameters.
    pub fn parse(order_id: Option<&str>, amount_cents: Option<&str>) -> Result<Self> {
        let order_id = order_id
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| CheckoutError::ValidationError("orderId is required".to_string()))?;
        let amount = amount_cents
            .ok_or_else(|| {
                CheckoutError::ValidationError("amountCents is required".to_string())
            })?
            .parse::<AmountCents>()?;
        Ok(Self {
            order_id: order_id.to_string(),
            amount,
        })
    }

    pub fn order_id(&self) -> &str {
        &self.order_id
    }

    pub fn amount(&self) -> AmountCents {
        self.amount
    }
}
