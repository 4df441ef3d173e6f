use crate::domain::account::UserId;
use crate::domain::payment::PaymentReference;
use crate::domain::ports::{PendingPaymentStore, RefundGatewayBox};
use crate::error::{LedgerError, Result};
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_REFUND_TIMEOUT: Duration = Duration::from_secs(10);

/// Requests refunds from the platform and clears the pending reference once
/// the platform confirms.
///
/// Reads no balance and never debits the ledger: a refund only touches the
/// payment-reference bookkeeping.
pub struct RefundCoordinator {
    pending: Arc<dyn PendingPaymentStore>,
    gateway: RefundGatewayBox,
    timeout: Duration,
}

impl RefundCoordinator {
    pub fn new(pending: Arc<dyn PendingPaymentStore>, gateway: RefundGatewayBox) -> Self {
        Self {
            pending,
            gateway,
            timeout: DEFAULT_REFUND_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Refunds the last payment on file for `user`.
    ///
    /// Only the refunded reference is cleared. A payment recorded while the
    /// platform call was in flight stays on file.
    pub async fn refund_for_user(&self, user: UserId) -> Result<()> {
        let pending = self
            .pending
            .get(user)
            .await?
            .ok_or(LedgerError::NoPaymentOnFile(user))?;

        self.request(user, &pending.reference).await?;
        self.clear(user, &pending.reference).await?;
        tracing::info!(%user, reference = %pending.reference, "refund completed");
        Ok(())
    }

    /// Refunds an explicit reference on behalf of `user`.
    ///
    /// The reference is not matched against the one on file; on success the
    /// reference that was on file when the refund started is cleared either
    /// way.
    pub async fn refund_by_reference(&self, user: UserId, reference: &str) -> Result<()> {
        let reference = PaymentReference::parse(reference)?;
        let on_file = self.pending.get(user).await?;

        self.request(user, &reference).await?;
        if let Some(on_file) = on_file {
            self.clear(user, &on_file.reference).await?;
        }
        tracing::info!(%user, %reference, "refund by reference completed");
        Ok(())
    }

    async fn clear(&self, user: UserId, reference: &PaymentReference) -> Result<()> {
        if !self.pending.remove_if(user, reference).await? {
            tracing::info!(%user, %reference, "newer payment on file, keeping it");
        }
        Ok(())
    }

    async fn request(&self, user: UserId, reference: &PaymentReference) -> Result<()> {
        match tokio::time::timeout(self.timeout, self.gateway.refund(user, reference)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => {
                tracing::warn!(%user, %reference, error = %e, "refund rejected");
                Err(LedgerError::RefundFailed(e.to_string()))
            }
            Err(_) => {
                tracing::warn!(%user, %reference, timeout = ?self.timeout, "refund timed out");
                Err(LedgerError::RefundFailed(format!(
                    "no answer from payment platform within {:?}",
                    self.timeout
                )))
            }
        }
    }
}
