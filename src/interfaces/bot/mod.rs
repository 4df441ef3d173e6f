//! Chat command shell. Owns all user-facing text; the ledger core never
//! formats replies.

pub mod command;
pub mod handler;
pub mod shell;
