use super::command::Command;
use crate::application::engine::StarsEngine;
use crate::domain::account::UserId;
use crate::domain::invoice::Invoice;
use crate::domain::ports::InvoiceGateway;
use crate::error::LedgerError;
use std::sync::Arc;

pub const COMMANDS_MENU: &str = "\
/start - Restart the bot.
/pay - Send an invoice to pay with stars.
/paylink - Send a link to pay with stars.
/status - Check your star balance.
/refund - Refund your last payment (takes 1-5 min).
/refundbyid [operation ID] - Refund a payment by its operation ID.
/sendstars [user ID] [amount] - Send stars to another user.";

/// What the shell should send back for a command.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Text(String),
    Invoice(Invoice),
    Nothing,
}

impl Reply {
    fn text(s: impl Into<String>) -> Self {
        Reply::Text(s.into())
    }
}

/// User-facing wording for each core failure.
pub fn describe_error(err: &LedgerError) -> &'static str {
    match err {
        LedgerError::InvalidAmount(_) => "Please enter a valid number of stars to send.",
        LedgerError::InsufficientFunds { .. } => "Not enough stars on your balance to send.",
        LedgerError::NoPaymentOnFile(_) => "You have not paid yet, there is nothing to refund.",
        LedgerError::MissingReference => "Enter the operation ID to refund.",
        LedgerError::RefundFailed(_) => "The refund did not go through.",
        _ => "Something went wrong, please try again later.",
    }
}

/// Maps chat commands onto the ledger core.
pub struct CommandHandler {
    engine: Arc<StarsEngine>,
    invoices: Box<dyn InvoiceGateway>,
    invoice: Invoice,
}

impl CommandHandler {
    pub fn new(engine: Arc<StarsEngine>, invoices: Box<dyn InvoiceGateway>, invoice: Invoice) -> Self {
        Self {
            engine,
            invoices,
            invoice,
        }
    }

    pub async fn handle(&self, user: UserId, command: Command) -> Reply {
        match command {
            Command::Start => Reply::Text(format!(
                "Welcome! Here are the available commands:\n{}",
                COMMANDS_MENU
            )),
            Command::Pay => Reply::Invoice(self.invoice.clone()),
            Command::PayLink => match self.invoices.create_invoice_link(&self.invoice).await {
                Ok(link) => Reply::Text(format!("Here is the payment link: {}", link)),
                Err(e) => {
                    tracing::error!(%user, error = %e, "could not create invoice link");
                    Reply::text("Could not create an invoice link.")
                }
            },
            Command::Status => match self.engine.get_balance(user).await {
                Ok(balance) => Reply::Text(format!("Your current balance: {} stars", balance)),
                Err(e) => Reply::text(describe_error(&e)),
            },
            Command::Refund => match self.engine.refund_for_user(user).await {
                Ok(()) => Reply::text("Refund completed successfully."),
                Err(e) => Reply::text(describe_error(&e)),
            },
            Command::RefundById(reference) => {
                let reference = reference.unwrap_or_default();
                match self.engine.refund_by_reference(user, &reference).await {
                    Ok(()) => Reply::text("Refund completed successfully."),
                    Err(e) => Reply::text(describe_error(&e)),
                }
            }
            Command::SendStars {
                receiver: Some(receiver),
                amount: Some(amount),
            } => {
                let Ok(receiver_id) = receiver.parse::<i64>().map(UserId) else {
                    return Reply::text("Enter the user ID and the number of stars to send.");
                };
                match self.engine.transfer(user, receiver_id, &amount).await {
                    Ok(sent) => Reply::Text(format!(
                        "You sent {} stars to the user with ID {}.",
                        sent, receiver_id
                    )),
                    Err(e) => Reply::text(describe_error(&e)),
                }
            }
            Command::SendStars { .. } => {
                Reply::text("Enter the user ID and the number of stars to send.")
            }
            Command::Unknown(name) => {
                tracing::debug!(%user, command = %name, "unknown command");
                Reply::Nothing
            }
        }
    }
}
