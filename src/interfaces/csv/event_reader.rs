use crate::application::engine::StarsEngine;
use crate::domain::account::UserId;
use crate::domain::payment::{PaymentReference, SuccessfulPayment};
use crate::error::{LedgerError, Result};
use serde::Deserialize;
use std::io::Read;

#[derive(Debug, Deserialize, PartialEq, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Payment,
    Transfer,
    Refund,
    RefundByReference,
}

/// One CSV row: `type, user, target, amount, reference`.
#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct EventRecord {
    pub r#type: EventType,
    pub user: i64,
    pub target: Option<i64>,
    pub amount: Option<String>,
    pub reference: Option<String>,
}

/// A ledger operation decoded from a record.
#[derive(Debug, Clone, PartialEq)]
pub enum LedgerEvent {
    Payment(SuccessfulPayment),
    Transfer {
        sender: UserId,
        receiver: UserId,
        amount_text: String,
    },
    Refund(UserId),
    RefundByReference {
        user: UserId,
        reference: String,
    },
}

impl TryFrom<EventRecord> for LedgerEvent {
    type Error = LedgerError;

    fn try_from(record: EventRecord) -> Result<Self> {
        let user = UserId(record.user);
        match record.r#type {
            EventType::Payment => {
                let raw = record.amount.ok_or_else(|| {
                    LedgerError::MalformedEvent("payment without amount".to_string())
                })?;
                let total_amount_minor_units: u64 = raw.trim().parse().map_err(|_| {
                    LedgerError::InvalidAmount(format!("'{}' is not a minor-unit total", raw))
                })?;
                let reference =
                    PaymentReference::parse(record.reference.as_deref().unwrap_or_default())?;
                Ok(LedgerEvent::Payment(SuccessfulPayment {
                    user,
                    total_amount_minor_units,
                    reference,
                }))
            }
            EventType::Transfer => {
                let receiver = record.target.ok_or_else(|| {
                    LedgerError::MalformedEvent("transfer without target".to_string())
                })?;
                Ok(LedgerEvent::Transfer {
                    sender: user,
                    receiver: UserId(receiver),
                    amount_text: record.amount.unwrap_or_default(),
                })
            }
            EventType::Refund => Ok(LedgerEvent::Refund(user)),
            EventType::RefundByReference => Ok(LedgerEvent::RefundByReference {
                user,
                reference: record.reference.unwrap_or_default(),
            }),
        }
    }
}

impl LedgerEvent {
    /// Runs the event against the engine.
    pub async fn apply(self, engine: &StarsEngine) -> Result<()> {
        match self {
            LedgerEvent::Payment(payment) => engine.credit_from_payment(payment).await.map(|_| ()),
            LedgerEvent::Transfer {
                sender,
                receiver,
                amount_text,
            } => engine
                .transfer(sender, receiver, &amount_text)
                .await
                .map(|_| ()),
            LedgerEvent::Refund(user) => engine.refund_for_user(user).await,
            LedgerEvent::RefundByReference { user, reference } => {
                engine.refund_by_reference(user, &reference).await
            }
        }
    }
}

/// Reads ledger events from a CSV source.
///
/// Wraps `csv::Reader` with whitespace trimming and flexible record lengths, so
/// trailing empty columns may be omitted.
pub struct EventReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> EventReader<R> {
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Lazily decodes events; a bad row yields an error without ending the
    /// stream.
    pub fn events(self) -> impl Iterator<Item = Result<LedgerEvent>> {
        self.reader.into_deserialize().map(|result| {
            let record: EventRecord = result.map_err(LedgerError::from)?;
            LedgerEvent::try_from(record)
        })
    }
}
