use super::ledger::LedgerStore;
use crate::domain::account::Balance;
use crate::domain::payment::{PendingPayment, SuccessfulPayment};
use crate::domain::ports::PendingPaymentStore;
use crate::error::{LedgerError, Result};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Outcome of handling a payment notification.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PaymentOutcome {
    /// The ledger was credited; carries the new balance.
    Credited(Balance),
    /// Same reference as the one already on file; nothing changed.
    Redelivered,
}

/// Turns successful-payment notifications into ledger credits.
pub struct PaymentProcessor {
    ledger: Arc<LedgerStore>,
    pending: Arc<dyn PendingPaymentStore>,
    serial: Mutex<()>,
}

impl PaymentProcessor {
    pub fn new(ledger: Arc<LedgerStore>, pending: Arc<dyn PendingPaymentStore>) -> Self {
        Self {
            ledger,
            pending,
            serial: Mutex::new(()),
        }
    }

    /// Credits `total / 100` stars and records the reference for refunds,
    /// overwriting any older one.
    ///
    /// Redelivery is detected only against the latest reference on file. A
    /// notification whose reference has since been overwritten by a newer
    /// payment, or cleared by a refund, is credited again.
    ///
    /// The reference is written before the credit. If the credit then fails
    /// the previous reference is put back, so a failed notification leaves no
    /// trace and its redelivery is credited once. Either store failing
    /// surfaces as `LedgerWriteError`.
    pub async fn process(&self, payment: SuccessfulPayment) -> Result<PaymentOutcome> {
        let amount = payment.major_amount()?;
        let _guard = self.serial.lock().await;

        let previous = self.pending.get(payment.user).await.map_err(as_write_error)?;
        if previous
            .as_ref()
            .is_some_and(|p| p.reference == payment.reference)
        {
            tracing::info!(
                user = %payment.user,
                reference = %payment.reference,
                "duplicate payment notification ignored"
            );
            return Ok(PaymentOutcome::Redelivered);
        }

        self.pending
            .store(PendingPayment {
                user: payment.user,
                reference: payment.reference.clone(),
            })
            .await
            .map_err(as_write_error)?;

        let balance = match self.ledger.credit(payment.user, amount).await {
            Ok(balance) => balance,
            Err(e) => {
                self.restore(&payment, previous).await;
                return Err(as_write_error(e));
            }
        };

        tracing::info!(
            user = %payment.user,
            %amount,
            reference = %payment.reference,
            "user received stars"
        );
        Ok(PaymentOutcome::Credited(balance))
    }

    async fn restore(&self, payment: &SuccessfulPayment, previous: Option<PendingPayment>) {
        let result = match previous {
            Some(previous) => self.pending.store(previous).await,
            None => self
                .pending
                .remove_if(payment.user, &payment.reference)
                .await
                .map(|_| ()),
        };
        if let Err(e) = result {
            tracing::error!(
                user = %payment.user,
                reference = %payment.reference,
                error = %e,
                "could not roll back payment reference"
            );
        }
    }
}

fn as_write_error(err: LedgerError) -> LedgerError {
    match err {
        LedgerError::LedgerWriteError(_) => err,
        other => LedgerError::LedgerWriteError(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::account::UserId;
    use crate::domain::payment::PaymentReference;
    use crate::domain::account::Account;
    use crate::domain::ports::AccountStore;
    use crate::infrastructure::in_memory::{InMemoryAccountStore, InMemoryPendingPaymentStore};
    use async_trait::async_trait;
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Fails the first `failures` writes, then behaves like the in-memory store.
    #[derive(Default)]
    struct FlakyPendingStore {
        inner: InMemoryPendingPaymentStore,
        failures: AtomicUsize,
    }

    impl FlakyPendingStore {
        fn failing(failures: usize) -> Self {
            Self {
                failures: AtomicUsize::new(failures),
                ..Default::default()
            }
        }
    }

    #[async_trait]
    impl PendingPaymentStore for FlakyPendingStore {
        async fn store(&self, payment: PendingPayment) -> Result<()> {
            if self
                .failures
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
            {
                return Err(LedgerError::LedgerWriteError("disk full".to_string()));
            }
            self.inner.store(payment).await
        }

        async fn get(&self, user: UserId) -> Result<Option<PendingPayment>> {
            self.inner.get(user).await
        }

        async fn remove_if(&self, user: UserId, reference: &PaymentReference) -> Result<bool> {
            self.inner.remove_if(user, reference).await
        }

        async fn get_all(&self) -> Result<Vec<PendingPayment>> {
            self.inner.get_all().await
        }
    }

    /// Rejects every balance write.
    #[derive(Default)]
    struct ReadOnlyAccountStore {
        inner: InMemoryAccountStore,
    }

    #[async_trait]
    impl AccountStore for ReadOnlyAccountStore {
        async fn store(&self, _account: Account) -> Result<()> {
            Err(LedgerError::LedgerWriteError("read-only".to_string()))
        }

        async fn store_batch(&self, _accounts: Vec<Account>) -> Result<()> {
            Err(LedgerError::LedgerWriteError("read-only".to_string()))
        }

        async fn get(&self, user: UserId) -> Result<Option<Account>> {
            self.inner.get(user).await
        }

        async fn get_all(&self) -> Result<Vec<Account>> {
            self.inner.get_all().await
        }
    }

    fn processor() -> (PaymentProcessor, Arc<LedgerStore>, Arc<InMemoryPendingPaymentStore>) {
        let ledger = Arc::new(LedgerStore::new(Box::new(InMemoryAccountStore::new())));
        let pending = Arc::new(InMemoryPendingPaymentStore::new());
        let processor = PaymentProcessor::new(ledger.clone(), pending.clone());
        (processor, ledger, pending)
    }

    fn payment(user: i64, minor: u64, reference: &str) -> SuccessfulPayment {
        SuccessfulPayment {
            user: UserId(user),
            total_amount_minor_units: minor,
            reference: PaymentReference::parse(reference).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_payment_credits_and_records_reference() {
        let (processor, ledger, pending) = processor();

        let outcome = processor.process(payment(100, 2500, "ref-1")).await.unwrap();

        assert_eq!(outcome, PaymentOutcome::Credited(Balance::new(dec!(25))));
        assert_eq!(
            ledger.get_balance(UserId(100)).await.unwrap(),
            Balance::new(dec!(25))
        );
        let on_file = pending.get(UserId(100)).await.unwrap().unwrap();
        assert_eq!(on_file.reference.as_str(), "ref-1");
    }

    #[tokio::test]
    async fn test_new_payment_overwrites_reference() {
        let (processor, ledger, pending) = processor();

        processor.process(payment(1, 1000, "ref-a")).await.unwrap();
        processor.process(payment(1, 550, "ref-b")).await.unwrap();

        assert_eq!(
            ledger.get_balance(UserId(1)).await.unwrap(),
            Balance::new(dec!(15.5))
        );
        let on_file = pending.get(UserId(1)).await.unwrap().unwrap();
        assert_eq!(on_file.reference.as_str(), "ref-b");
    }

    #[tokio::test]
    async fn test_redelivery_does_not_credit_twice() {
        let (processor, ledger, _) = processor();

        processor.process(payment(1, 2500, "ref-a")).await.unwrap();
        let outcome = processor.process(payment(1, 2500, "ref-a")).await.unwrap();

        assert_eq!(outcome, PaymentOutcome::Redelivered);
        assert_eq!(
            ledger.get_balance(UserId(1)).await.unwrap(),
            Balance::new(dec!(25))
        );
    }

    #[tokio::test]
    async fn test_zero_payment_is_rejected() {
        let (processor, ledger, pending) = processor();

        let result = processor.process(payment(1, 0, "ref-a")).await;

        assert!(matches!(result, Err(LedgerError::InvalidAmount(_))));
        assert_eq!(ledger.get_balance(UserId(1)).await.unwrap(), Balance::ZERO);
        assert!(pending.get(UserId(1)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_failed_reference_write_is_not_credited() {
        let ledger = Arc::new(LedgerStore::new(Box::new(InMemoryAccountStore::new())));
        let pending = Arc::new(FlakyPendingStore::failing(1));
        let processor = PaymentProcessor::new(ledger.clone(), pending.clone());

        let first = processor.process(payment(1, 2500, "stx")).await;
        assert!(matches!(first, Err(LedgerError::LedgerWriteError(_))));
        assert_eq!(ledger.get_balance(UserId(1)).await.unwrap(), Balance::ZERO);
        assert!(pending.get(UserId(1)).await.unwrap().is_none());

        // The platform redelivers the same notification.
        let second = processor.process(payment(1, 2500, "stx")).await.unwrap();
        assert_eq!(second, PaymentOutcome::Credited(Balance::new(dec!(25))));

        let third = processor.process(payment(1, 2500, "stx")).await.unwrap();
        assert_eq!(third, PaymentOutcome::Redelivered);
        assert_eq!(
            ledger.get_balance(UserId(1)).await.unwrap(),
            Balance::new(dec!(25))
        );
    }

    #[tokio::test]
    async fn test_failed_credit_restores_previous_reference() {
        let ledger = Arc::new(LedgerStore::new(Box::new(ReadOnlyAccountStore::default())));
        let pending = Arc::new(InMemoryPendingPaymentStore::new());
        pending
            .store(PendingPayment {
                user: UserId(1),
                reference: PaymentReference::parse("ref-old").unwrap(),
            })
            .await
            .unwrap();
        let processor = PaymentProcessor::new(ledger.clone(), pending.clone());

        let result = processor.process(payment(1, 2500, "ref-new")).await;

        assert!(matches!(result, Err(LedgerError::LedgerWriteError(_))));
        let on_file = pending.get(UserId(1)).await.unwrap().unwrap();
        assert_eq!(on_file.reference.as_str(), "ref-old");
    }

    #[tokio::test]
    async fn test_failed_first_credit_leaves_no_reference() {
        let ledger = Arc::new(LedgerStore::new(Box::new(ReadOnlyAccountStore::default())));
        let pending = Arc::new(InMemoryPendingPaymentStore::new());
        let processor = PaymentProcessor::new(ledger, pending.clone());

        let result = processor.process(payment(1, 2500, "ref-new")).await;

        assert!(matches!(result, Err(LedgerError::LedgerWriteError(_))));
        assert!(pending.get(UserId(1)).await.unwrap().is_none());
    }
}
