#![allow(dead_code)]

use async_trait::async_trait;
use stars_ledger::application::engine::StarsEngine;
use stars_ledger::domain::account::UserId;
use stars_ledger::domain::payment::{PaymentReference, SuccessfulPayment};
use stars_ledger::domain::ports::{RefundGateway, RefundGatewayBox};
use stars_ledger::error::{LedgerError, Result};
use stars_ledger::infrastructure::in_memory::{InMemoryAccountStore, InMemoryPendingPaymentStore};
use std::io::Write;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tempfile::NamedTempFile;

pub const HEADER: &str = "type, user, target, amount, reference";

/// Writes an events CSV with the standard header followed by `rows`.
pub fn events_csv(rows: &[&str]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "{}", HEADER).unwrap();
    for row in rows {
        writeln!(file, "{}", row).unwrap();
    }
    file
}

pub fn engine_with(gateway: RefundGatewayBox) -> StarsEngine {
    StarsEngine::new(
        Box::new(InMemoryAccountStore::new()),
        Box::new(InMemoryPendingPaymentStore::new()),
        gateway,
    )
}

pub fn payment(user: i64, minor: u64, reference: &str) -> SuccessfulPayment {
    SuccessfulPayment {
        user: UserId(user),
        total_amount_minor_units: minor,
        reference: PaymentReference::parse(reference).unwrap(),
    }
}

/// Accepts every refund and counts the calls.
#[derive(Clone, Default)]
pub struct CountingGateway {
    pub calls: Arc<AtomicUsize>,
}

#[async_trait]
impl RefundGateway for CountingGateway {
    async fn refund(&self, _user: UserId, _reference: &PaymentReference) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Rejects every refund the way the platform does for an unknown charge.
pub struct RejectingGateway;

#[async_trait]
impl RefundGateway for RejectingGateway {
    async fn refund(&self, _user: UserId, _reference: &PaymentReference) -> Result<()> {
        Err(LedgerError::Gateway(
            "refundStarPayment: Bad Request: CHARGE_NOT_FOUND".to_string(),
        ))
    }
}

/// Never answers within any reasonable timeout.
pub struct StalledGateway;

#[async_trait]
impl RefundGateway for StalledGateway {
    async fn refund(&self, _user: UserId, _reference: &PaymentReference) -> Result<()> {
        tokio::time::sleep(Duration::from_secs(60)).await;
        Ok(())
    }
}

/// Accepts every refund after a fixed delay.
pub struct SlowGateway(pub Duration);

#[async_trait]
impl RefundGateway for SlowGateway {
    async fn refund(&self, _user: UserId, _reference: &PaymentReference) -> Result<()> {
        tokio::time::sleep(self.0).await;
        Ok(())
    }
}
