//! Application layer containing the ledger core.
//!
//! `StarsEngine` is the entry point used by the command shell. It wires the
//! `LedgerStore` into the payment, refund and transfer components, which each
//! own one part of the payment lifecycle.

pub mod engine;
pub mod ledger;
pub mod payments;
pub mod refunds;
pub mod transfer;
