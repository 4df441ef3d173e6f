use crate::domain::account::{Account, UserId};
use crate::domain::payment::{PaymentReference, PendingPayment};
use crate::domain::ports::{AccountStore, PendingPaymentStore};
use crate::error::{LedgerError, Result};
use async_trait::async_trait;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, IteratorMode, Options, WriteBatch};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Column Family for storing account balances.
pub const CF_ACCOUNTS: &str = "accounts";
/// Column Family for storing pending payment references.
pub const CF_PAYMENTS: &str = "payments";

/// A persistent store using RocksDB.
///
/// Holds both `Account` and `PendingPayment` records in separate Column
/// Families, keyed by the big-endian user id. Only used when explicitly
/// requested; the default ledger is volatile.
///
/// `Clone` shares the underlying `Arc<DB>`.
#[derive(Clone)]
pub struct RocksDBStore {
    db: Arc<DB>,
    /// Serialises read-then-delete on the payments family against writers.
    payments_lock: Arc<Mutex<()>>,
}

impl RocksDBStore {
    /// Opens or creates a RocksDB instance at the specified path, creating the
    /// "accounts" and "payments" column families if missing.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_accounts = ColumnFamilyDescriptor::new(CF_ACCOUNTS, Options::default());
        let cf_payments = ColumnFamilyDescriptor::new(CF_PAYMENTS, Options::default());

        let db = DB::open_cf_descriptors(&opts, path, vec![cf_accounts, cf_payments])?;

        Ok(Self {
            db: Arc::new(db),
            payments_lock: Arc::new(Mutex::new(())),
        })
    }

    fn cf(&self, name: &str) -> Result<&ColumnFamily> {
        self.db.cf_handle(name).ok_or_else(|| {
            LedgerError::LedgerWriteError(format!("{} column family not found", name))
        })
    }

    fn put<T: Serialize>(&self, cf_name: &str, user: UserId, value: &T) -> Result<()> {
        let cf = self.cf(cf_name)?;
        self.db.put_cf(cf, user.0.to_be_bytes(), encode(value)?)?;
        Ok(())
    }

    fn fetch<T: DeserializeOwned>(&self, cf_name: &str, user: UserId) -> Result<Option<T>> {
        let cf = self.cf(cf_name)?;
        match self.db.get_pinned_cf(cf, user.0.to_be_bytes())? {
            Some(bytes) => serde_json::from_slice(&bytes).map(Some).map_err(|e| {
                LedgerError::LedgerWriteError(format!("Deserialization error: {}", e))
            }),
            None => Ok(None),
        }
    }

    fn scan<T: DeserializeOwned>(&self, cf_name: &str) -> Result<Vec<T>> {
        let cf = self.cf(cf_name)?;
        let mut items = Vec::new();
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (_key, value) = item?;
            let decoded = serde_json::from_slice(&value).map_err(|e| {
                LedgerError::LedgerWriteError(format!("Deserialization error: {}", e))
            })?;
            items.push(decoded);
        }
        Ok(items)
    }
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(value)
        .map_err(|e| LedgerError::LedgerWriteError(format!("Serialization error: {}", e)))
}

#[async_trait]
impl AccountStore for RocksDBStore {
    async fn store(&self, account: Account) -> Result<()> {
        self.put(CF_ACCOUNTS, account.user, &account)
    }

    async fn store_batch(&self, accounts: Vec<Account>) -> Result<()> {
        let cf = self.cf(CF_ACCOUNTS)?;
        let mut batch = WriteBatch::default();
        for account in &accounts {
            batch.put_cf(cf, account.user.0.to_be_bytes(), encode(account)?);
        }
        self.db.write(batch)?;
        Ok(())
    }

    async fn get(&self, user: UserId) -> Result<Option<Account>> {
        self.fetch(CF_ACCOUNTS, user)
    }

    async fn get_all(&self) -> Result<Vec<Account>> {
        self.scan(CF_ACCOUNTS)
    }
}

#[async_trait]
impl PendingPaymentStore for RocksDBStore {
    async fn store(&self, payment: PendingPayment) -> Result<()> {
        let _guard = self.payments_lock.lock().await;
        self.put(CF_PAYMENTS, payment.user, &payment)
    }

    async fn get(&self, user: UserId) -> Result<Option<PendingPayment>> {
        self.fetch(CF_PAYMENTS, user)
    }

    async fn remove_if(&self, user: UserId, reference: &PaymentReference) -> Result<bool> {
        let _guard = self.payments_lock.lock().await;
        let current: Option<PendingPayment> = self.fetch(CF_PAYMENTS, user)?;
        if !current.is_some_and(|p| &p.reference == reference) {
            return Ok(false);
        }
        let cf = self.cf(CF_PAYMENTS)?;
        self.db.delete_cf(cf, user.0.to_be_bytes())?;
        Ok(true)
    }

    async fn get_all(&self) -> Result<Vec<PendingPayment>> {
        self.scan(CF_PAYMENTS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::account::Balance;
    use crate::domain::payment::PaymentReference;
    use rust_decimal_macros::dec;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_rocksdb_open_cf() {
        let dir = tempdir().unwrap();
        let store = RocksDBStore::open(dir.path()).expect("Failed to open RocksDB");

        assert!(store.db.cf_handle(CF_ACCOUNTS).is_some());
        assert!(store.db.cf_handle(CF_PAYMENTS).is_some());
    }

    #[tokio::test]
    async fn test_rocksdb_account_store() {
        let dir = tempdir().unwrap();
        let store = RocksDBStore::open(dir.path()).unwrap();

        let mut account = Account::new(UserId(-42));
        account.balance = Balance::new(dec!(12.5));

        AccountStore::store(&store, account.clone()).await.unwrap();

        let retrieved = AccountStore::get(&store, UserId(-42)).await.unwrap().unwrap();
        assert_eq!(retrieved, account);

        let all = AccountStore::get_all(&store).await.unwrap();
        assert_eq!(all, vec![account]);

        assert!(AccountStore::get(&store, UserId(2)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_rocksdb_store_batch() {
        let dir = tempdir().unwrap();
        let store = RocksDBStore::open(dir.path()).unwrap();

        let mut sender = Account::new(UserId(1));
        sender.balance = Balance::new(dec!(5));
        let mut receiver = Account::new(UserId(2));
        receiver.balance = Balance::new(dec!(10));

        store
            .store_batch(vec![sender.clone(), receiver.clone()])
            .await
            .unwrap();

        assert_eq!(AccountStore::get(&store, UserId(1)).await.unwrap(), Some(sender));
        assert_eq!(AccountStore::get(&store, UserId(2)).await.unwrap(), Some(receiver));
    }

    #[tokio::test]
    async fn test_rocksdb_pending_payment_store() {
        let dir = tempdir().unwrap();
        let store = RocksDBStore::open(dir.path()).unwrap();

        let payment = PendingPayment {
            user: UserId(9),
            reference: PaymentReference::parse("stxAbc").unwrap(),
        };
        let stale = PaymentReference::parse("stxOlder").unwrap();

        PendingPaymentStore::store(&store, payment.clone()).await.unwrap();
        assert_eq!(
            PendingPaymentStore::get(&store, UserId(9)).await.unwrap(),
            Some(payment.clone())
        );

        assert!(!store.remove_if(UserId(9), &stale).await.unwrap());
        assert!(PendingPaymentStore::get(&store, UserId(9)).await.unwrap().is_some());

        assert!(store.remove_if(UserId(9), &payment.reference).await.unwrap());
        assert!(PendingPaymentStore::get(&store, UserId(9)).await.unwrap().is_none());
    }
}
