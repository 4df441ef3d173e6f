use crate::domain::account::{Account, Amount, Balance, UserId};
use crate::domain::ports::AccountStoreBox;
use crate::error::Result;
use tokio::sync::Mutex;

/// Per-user star balances.
///
/// Every mutation runs under one writer lock, so a debit/credit pair can never
/// interleave with another mutation touching the same accounts even when the
/// ledger is shared across tasks.
pub struct LedgerStore {
    accounts: AccountStoreBox,
    writer: Mutex<()>,
}

impl LedgerStore {
    pub fn new(accounts: AccountStoreBox) -> Self {
        Self {
            accounts,
            writer: Mutex::new(()),
        }
    }

    /// Zero for a user that was never credited.
    pub async fn get_balance(&self, user: UserId) -> Result<Balance> {
        Ok(self
            .accounts
            .get(user)
            .await?
            .map(|account| account.balance)
            .unwrap_or(Balance::ZERO))
    }

    /// Adds `amount` to the user's balance, initializing the account if needed.
    pub async fn credit(&self, user: UserId, amount: Amount) -> Result<Balance> {
        let _guard = self.writer.lock().await;
        let mut account = self.load(user).await?;
        account.credit(amount);
        let balance = account.balance;
        self.accounts.store(account).await?;
        tracing::debug!(%user, %amount, %balance, "credited");
        Ok(balance)
    }

    /// Removes `amount` from the user's balance. Fails with
    /// `InsufficientFunds` and leaves the balance untouched if it would go
    /// negative.
    pub async fn debit(&self, user: UserId, amount: Amount) -> Result<Balance> {
        let _guard = self.writer.lock().await;
        let mut account = self.load(user).await?;
        account.debit(amount)?;
        let balance = account.balance;
        self.accounts.store(account).await?;
        tracing::debug!(%user, %amount, %balance, "debited");
        Ok(balance)
    }

    /// Debits `from` and credits `to` as a single write.
    ///
    /// Nothing is written when the debit fails. Moving stars to oneself only
    /// checks the balance covers the amount.
    pub async fn move_between(&self, from: UserId, to: UserId, amount: Amount) -> Result<()> {
        let _guard = self.writer.lock().await;
        let mut sender = self.load(from).await?;
        sender.debit(amount)?;

        if from == to {
            return Ok(());
        }

        let mut receiver = self.load(to).await?;
        receiver.credit(amount);
        self.accounts.store_batch(vec![sender, receiver]).await
    }

    /// All accounts that have ever been written.
    pub async fn accounts(&self) -> Result<Vec<Account>> {
        self.accounts.get_all().await
    }

    async fn load(&self, user: UserId) -> Result<Account> {
        Ok(self
            .accounts
            .get(user)
            .await?
            .unwrap_or_else(|| Account::new(user)))
    }
}
