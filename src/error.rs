use crate::domain::account::{Balance, UserId};
use thiserror::Error;

/// Typed failures returned by the ledger core and its boundaries.
///
/// None of these are fatal: the shell translates each variant into a reply
/// and keeps serving.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Insufficient funds for user {user}: requested {requested}, available {available}")]
    InsufficientFunds {
        user: UserId,
        requested: Balance,
        available: Balance,
    },
    #[error("No payment on file for user {0}")]
    NoPaymentOnFile(UserId),
    #[error("Missing payment reference")]
    MissingReference,
    #[error("Refund failed: {0}")]
    RefundFailed(String),
    #[error("Ledger write error: {0}")]
    LedgerWriteError(String),
    #[error("Malformed event: {0}")]
    MalformedEvent(String),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Gateway error: {0}")]
    Gateway(String),
}

#[cfg(feature = "storage-rocksdb")]
impl From<rocksdb::Error> for LedgerError {
    fn from(err: rocksdb::Error) -> Self {
        LedgerError::LedgerWriteError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, LedgerError>;
