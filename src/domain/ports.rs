use super::account::{Account, UserId};
use super::invoice::Invoice;
use super::payment::{PaymentReference, PendingPayment};
use crate::error::Result;
use async_trait::async_trait;

#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn store(&self, account: Account) -> Result<()>;
    /// Writes every account or none of them.
    async fn store_batch(&self, accounts: Vec<Account>) -> Result<()>;
    async fn get(&self, user: UserId) -> Result<Option<Account>>;
    async fn get_all(&self) -> Result<Vec<Account>>;
}

#[async_trait]
pub trait PendingPaymentStore: Send + Sync {
    async fn store(&self, payment: PendingPayment) -> Result<()>;
    async fn get(&self, user: UserId) -> Result<Option<PendingPayment>>;
    /// Removes the user's entry only while it still holds `reference`.
    /// Returns whether anything was removed.
    async fn remove_if(&self, user: UserId, reference: &PaymentReference) -> Result<bool>;
    async fn get_all(&self) -> Result<Vec<PendingPayment>>;
}

/// The platform's refund capability.
///
/// Not guaranteed idempotent: a repeated refund of the same reference may
/// report success again.
#[async_trait]
pub trait RefundGateway: Send + Sync {
    async fn refund(&self, user: UserId, reference: &PaymentReference) -> Result<()>;
}

#[async_trait]
pub trait InvoiceGateway: Send + Sync {
    /// Returns a payable link for the invoice.
    async fn create_invoice_link(&self, invoice: &Invoice) -> Result<String>;
}

pub type AccountStoreBox = Box<dyn AccountStore>;
pub type PendingPaymentStoreBox = Box<dyn PendingPaymentStore>;
pub type RefundGatewayBox = Box<dyn RefundGateway>;

