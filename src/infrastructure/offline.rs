use crate::domain::account::UserId;
use crate::domain::payment::PaymentReference;
use crate::domain::ports::RefundGateway;
use crate::error::Result;
use async_trait::async_trait;

/// Refund gateway for batch replay: acknowledges every refund without
/// contacting the platform.
#[derive(Debug, Default, Clone)]
pub struct OfflineRefundGateway;

#[async_trait]
impl RefundGateway for OfflineRefundGateway {
    async fn refund(&self, user: UserId, reference: &PaymentReference) -> Result<()> {
        tracing::debug!(%user, %reference, "offline refund acknowledged");
        Ok(())
    }
}
