use super::ledger::LedgerStore;
use super::payments::{PaymentOutcome, PaymentProcessor};
use super::refunds::RefundCoordinator;
use super::transfer::TransferEngine;
use crate::domain::account::{Amount, Balance, UserId};
use crate::domain::payment::{PaymentReference, PendingPayment, SuccessfulPayment};
use crate::domain::ports::{AccountStoreBox, PendingPaymentStore, PendingPaymentStoreBox, RefundGatewayBox};
use crate::error::Result;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

/// Row of the ledger state as reported to the outside.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountSnapshot {
    pub user: UserId,
    pub balance: Balance,
    pub pending_reference: Option<PaymentReference>,
}

/// The ledger core as seen by the command shell.
///
/// `StarsEngine` owns the balance store and the pending-payment bookkeeping
/// and exposes the payment, refund and transfer operations over them. It is
/// `Send + Sync`; balance mutations are serialised inside the ledger.
pub struct StarsEngine {
    ledger: Arc<LedgerStore>,
    pending: Arc<dyn PendingPaymentStore>,
    payments: PaymentProcessor,
    refunds: RefundCoordinator,
    transfers: TransferEngine,
}

impl StarsEngine {
    /// Creates a new `StarsEngine`.
    ///
    /// # Arguments
    ///
    /// * `account_store` - Backing store for star balances.
    /// * `pending_store` - Backing store for the last payment reference per user.
    /// * `refund_gateway` - The platform's refund capability.
    pub fn new(
        account_store: AccountStoreBox,
        pending_store: PendingPaymentStoreBox,
        refund_gateway: RefundGatewayBox,
    ) -> Self {
        let ledger = Arc::new(LedgerStore::new(account_store));
        let pending: Arc<dyn PendingPaymentStore> = Arc::from(pending_store);

        Self {
            payments: PaymentProcessor::new(ledger.clone(), pending.clone()),
            refunds: RefundCoordinator::new(pending.clone(), refund_gateway),
            transfers: TransferEngine::new(ledger.clone()),
            ledger,
            pending,
        }
    }

    /// Bounds how long a refund call may wait on the platform.
    pub fn with_refund_timeout(mut self, timeout: Duration) -> Self {
        self.refunds = self.refunds.with_timeout(timeout);
        self
    }

    pub async fn get_balance(&self, user: UserId) -> Result<Balance> {
        self.ledger.get_balance(user).await
    }

    pub async fn credit_from_payment(&self, payment: SuccessfulPayment) -> Result<PaymentOutcome> {
        self.payments.process(payment).await
    }

    pub async fn refund_for_user(&self, user: UserId) -> Result<()> {
        self.refunds.refund_for_user(user).await
    }

    pub async fn refund_by_reference(&self, user: UserId, reference: &str) -> Result<()> {
        self.refunds.refund_by_reference(user, reference).await
    }

    /// Parses `amount_text` and moves that many stars from `sender` to `receiver`.
    pub async fn transfer(&self, sender: UserId, receiver: UserId, amount_text: &str) -> Result<Amount> {
        self.transfers.transfer(sender, receiver, amount_text).await
    }

    pub async fn pending_payment(&self, user: UserId) -> Result<Option<PendingPayment>> {
        self.pending.get(user).await
    }

    /// Every user with a balance record or a pending payment, ordered by id.
    pub async fn snapshot(&self) -> Result<Vec<AccountSnapshot>> {
        let mut rows: BTreeMap<UserId, AccountSnapshot> = BTreeMap::new();

        for account in self.ledger.accounts().await? {
            rows.insert(
                account.user,
                AccountSnapshot {
                    user: account.user,
                    balance: account.balance,
                    pending_reference: None,
                },
            );
        }

        for payment in self.pending.get_all().await? {
            rows.entry(payment.user)
                .or_insert_with(|| AccountSnapshot {
                    user: payment.user,
                    balance: Balance::ZERO,
                    pending_reference: None,
                })
                .pending_reference = Some(payment.reference);
        }

        Ok(rows.into_values().collect())
    }
}
