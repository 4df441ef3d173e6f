//! Domain types and the ports the ledger core depends on.

pub mod account;
pub mod invoice;
pub mod payment;
pub mod ports;
