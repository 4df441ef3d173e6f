use super::account::{Amount, UserId};
use crate::error::{LedgerError, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Minor units per star in the platform's payment representation.
pub const MINOR_UNITS_PER_STAR: u32 = 100;

/// Opaque transaction identifier issued by the payment platform.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaymentReference(String);

impl PaymentReference {
    /// Builds a reference from user input, rejecting blank text.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(LedgerError::MissingReference);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PaymentReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Inbound "payment confirmed" notification from the platform.
#[derive(Debug, Clone, PartialEq)]
pub struct SuccessfulPayment {
    pub user: UserId,
    pub total_amount_minor_units: u64,
    pub reference: PaymentReference,
}

impl SuccessfulPayment {
    /// Converts the minor-unit total into the star amount to credit.
    pub fn major_amount(&self) -> Result<Amount> {
        let major = Decimal::from(self.total_amount_minor_units)
            / Decimal::from(MINOR_UNITS_PER_STAR);
        Amount::new(major)
    }
}

/// Most recent unrefunded payment reference for a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingPayment {
    pub user: UserId,
    pub reference: PaymentReference,
}
