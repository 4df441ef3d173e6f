use crate::application::engine::AccountSnapshot;
use crate::error::Result;
use serde::Serialize;
use std::io::Write;

#[derive(Serialize)]
struct BalanceRow<'a> {
    user: i64,
    balance: String,
    pending_reference: Option<&'a str>,
}

/// Writes `user,balance,pending_reference` rows.
pub struct BalanceWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> BalanceWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    pub fn write_snapshots(&mut self, rows: &[AccountSnapshot]) -> Result<()> {
        if rows.is_empty() {
            self.writer
                .write_record(["user", "balance", "pending_reference"])?;
        }
        for row in rows {
            self.writer.serialize(BalanceRow {
                user: row.user.0,
                balance: row.balance.to_string(),
                pending_reference: row.pending_reference.as_ref().map(|r| r.as_str()),
            })?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
