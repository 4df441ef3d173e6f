use rust_decimal_macros::dec;
use stars_ledger::domain::account::{Balance, UserId};
use stars_ledger::infrastructure::offline::OfflineRefundGateway;
use std::sync::Arc;

mod common;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_transfers_conserve_total() {
    let engine = Arc::new(common::engine_with(Box::new(OfflineRefundGateway)));
    for user in 1..=4 {
        engine
            .credit_from_payment(common::payment(user, 1000, &format!("stx-{}", user)))
            .await
            .unwrap();
    }

    let mut handles = Vec::new();
    for i in 0..200i64 {
        let engine = engine.clone();
        handles.push(tokio::spawn(async move {
            let sender = UserId(i % 4 + 1);
            let receiver = UserId((i + 1) % 4 + 1);
            // Overdrafts are expected and simply rejected.
            let _ = engine.transfer(sender, receiver, "3").await;
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let rows = engine.snapshot().await.unwrap();
    let total = rows
        .iter()
        .fold(Balance::ZERO, |acc, row| acc + row.balance);
    assert_eq!(total, Balance::new(dec!(40)));
    assert!(rows.iter().all(|row| row.balance >= Balance::ZERO));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_drain_never_overdraws() {
    let engine = Arc::new(common::engine_with(Box::new(OfflineRefundGateway)));
    engine
        .credit_from_payment(common::payment(1, 1000, "stx-1"))
        .await
        .unwrap();

    let mut handles = Vec::new();
    for receiver in 2..=21 {
        let engine = engine.clone();
        handles.push(tokio::spawn(async move {
            engine.transfer(UserId(1), UserId(receiver), "1").await.is_ok()
        }));
    }
    let mut succeeded = 0;
    for handle in handles {
        if handle.await.unwrap() {
            succeeded += 1;
        }
    }

    assert_eq!(succeeded, 10);
    assert_eq!(engine.get_balance(UserId(1)).await.unwrap(), Balance::ZERO);
}
