use super::ledger::LedgerStore;
use crate::domain::account::{Amount, UserId};
use crate::error::{LedgerError, Result};
use rust_decimal::Decimal;
use std::sync::Arc;

/// Parses user-supplied transfer text into a whole, positive star amount.
pub fn parse_amount(text: &str) -> Result<Amount> {
    let trimmed = text.trim();
    let stars: u64 = trimmed
        .parse()
        .map_err(|_| LedgerError::InvalidAmount(format!("'{}' is not a whole number", trimmed)))?;
    Amount::new(Decimal::from(stars))
}

/// Moves stars between users without creating or destroying any.
pub struct TransferEngine {
    ledger: Arc<LedgerStore>,
}

impl TransferEngine {
    pub fn new(ledger: Arc<LedgerStore>) -> Self {
        Self { ledger }
    }

    /// Sender loses exactly what the receiver gains; on any failure neither
    /// balance changes.
    pub async fn transfer(&self, sender: UserId, receiver: UserId, amount_text: &str) -> Result<Amount> {
        let amount = parse_amount(amount_text)?;

        if let Err(e) = self.ledger.move_between(sender, receiver, amount).await {
            tracing::warn!(%sender, %receiver, %amount, error = %e, "transfer rejected");
            return Err(e);
        }

        tracing::info!(%sender, %receiver, %amount, "stars transferred");
        Ok(amount)
    }
}
