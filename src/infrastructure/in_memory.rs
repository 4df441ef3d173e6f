use crate::domain::account::{Account, UserId};
use crate::domain::payment::{PaymentReference, PendingPayment};
use crate::domain::ports::{AccountStore, PendingPaymentStore};
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A thread-safe in-memory store for star accounts.
///
/// Contents live for the process lifetime only; nothing survives a restart.
#[derive(Default, Clone)]
pub struct InMemoryAccountStore {
    accounts: Arc<RwLock<HashMap<UserId, Account>>>,
}

impl InMemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountStore for InMemoryAccountStore {
    async fn store(&self, account: Account) -> Result<()> {
        let mut accounts = self.accounts.write().await;
        accounts.insert(account.user, account);
        Ok(())
    }

    async fn store_batch(&self, batch: Vec<Account>) -> Result<()> {
        let mut accounts = self.accounts.write().await;
        for account in batch {
            accounts.insert(account.user, account);
        }
        Ok(())
    }

    async fn get(&self, user: UserId) -> Result<Option<Account>> {
        let accounts = self.accounts.read().await;
        Ok(accounts.get(&user).cloned())
    }

    async fn get_all(&self) -> Result<Vec<Account>> {
        let accounts = self.accounts.read().await;
        Ok(accounts.values().cloned().collect())
    }
}

/// A thread-safe in-memory map of user to last payment reference.
#[derive(Default, Clone)]
pub struct InMemoryPendingPaymentStore {
    payments: Arc<RwLock<HashMap<UserId, PendingPayment>>>,
}

impl InMemoryPendingPaymentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PendingPaymentStore for InMemoryPendingPaymentStore {
    async fn store(&self, payment: PendingPayment) -> Result<()> {
        let mut payments = self.payments.write().await;
        payments.insert(payment.user, payment);
        Ok(())
    }

    async fn get(&self, user: UserId) -> Result<Option<PendingPayment>> {
        let payments = self.payments.read().await;
        Ok(payments.get(&user).cloned())
    }

    async fn remove_if(&self, user: UserId, reference: &PaymentReference) -> Result<bool> {
        let mut payments = self.payments.write().await;
        if payments.get(&user).is_some_and(|p| &p.reference == reference) {
            payments.remove(&user);
            Ok(true)
        } else {
            Ok(false)
        }
    }

    async fn get_all(&self) -> Result<Vec<PendingPayment>> {
        let payments = self.payments.read().await;
        Ok(payments.values().cloned().collect())
    }
}
