use super::command::Command;
use super::handler::{CommandHandler, Reply};
use crate::application::engine::StarsEngine;
use crate::domain::account::UserId;
use crate::domain::invoice::Invoice;
use crate::domain::payment::{PaymentReference, SuccessfulPayment};
use crate::error::{LedgerError, Result};
use crate::infrastructure::telegram::{Message, TelegramClient, Update};
use async_trait::async_trait;
use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;

const RETRY_DELAY: Duration = Duration::from_secs(1);

/// The chat calls the shell makes.
#[async_trait]
pub trait BotApi: Send + Sync {
    async fn get_updates(&self, offset: i64, timeout_secs: u64) -> Result<Vec<Update>>;
    async fn send_message(&self, chat_id: i64, text: &str) -> Result<()>;
    async fn send_invoice(&self, chat_id: i64, invoice: &Invoice) -> Result<()>;
    async fn answer_pre_checkout_query(&self, query_id: &str, ok: bool) -> Result<()>;
}

#[async_trait]
impl BotApi for TelegramClient {
    async fn get_updates(&self, offset: i64, timeout_secs: u64) -> Result<Vec<Update>> {
        TelegramClient::get_updates(self, offset, timeout_secs).await
    }

    async fn send_message(&self, chat_id: i64, text: &str) -> Result<()> {
        TelegramClient::send_message(self, chat_id, text).await
    }

    async fn send_invoice(&self, chat_id: i64, invoice: &Invoice) -> Result<()> {
        TelegramClient::send_invoice(self, chat_id, invoice).await
    }

    async fn answer_pre_checkout_query(&self, query_id: &str, ok: bool) -> Result<()> {
        TelegramClient::answer_pre_checkout_query(self, query_id, ok).await
    }
}

/// Long-polling loop that feeds Telegram updates into the ledger core.
pub struct BotShell {
    api: Box<dyn BotApi>,
    engine: Arc<StarsEngine>,
    handler: CommandHandler,
    poll_timeout_secs: u64,
}

impl BotShell {
    pub fn new(
        api: Box<dyn BotApi>,
        engine: Arc<StarsEngine>,
        handler: CommandHandler,
        poll_timeout_secs: u64,
    ) -> Self {
        Self {
            api,
            engine,
            handler,
            poll_timeout_secs,
        }
    }

    /// Polls until Ctrl-C.
    pub async fn run(&self) {
        let mut offset = 0;
        tracing::info!("bot started, polling for updates");

        loop {
            let updates = tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("shutting down");
                    return;
                }
                result = self.api.get_updates(offset, self.poll_timeout_secs) => result,
            };

            match updates {
                Ok(updates) => match self.process_batch(updates, offset).await {
                    ControlFlow::Continue(next) => offset = next,
                    ControlFlow::Break(retry_from) => {
                        offset = retry_from;
                        tokio::time::sleep(RETRY_DELAY).await;
                    }
                },
                Err(e) => {
                    tracing::warn!(error = %e, "polling failed");
                    tokio::time::sleep(RETRY_DELAY).await;
                }
            }
        }
    }

    /// Dispatches `updates` in order and returns the offset to poll from.
    ///
    /// Breaks at the first payment whose credit could not be written, with
    /// that update's id as the offset, so the platform delivers it again.
    pub async fn process_batch(&self, updates: Vec<Update>, mut offset: i64) -> ControlFlow<i64, i64> {
        for update in updates {
            let update_id = update.update_id;
            if let Err(e) = self.dispatch(update).await {
                tracing::warn!(update_id, error = %e, "payment not recorded, awaiting redelivery");
                return ControlFlow::Break(update_id);
            }
            offset = offset.max(update_id + 1);
        }
        ControlFlow::Continue(offset)
    }

    /// Routes one update. Only a failed ledger write is returned; everything
    /// else is answered or logged here.
    async fn dispatch(&self, update: Update) -> Result<()> {
        if let Some(query) = update.pre_checkout_query {
            if let Err(e) = self.api.answer_pre_checkout_query(&query.id, true).await {
                tracing::error!(error = %e, "error answering pre_checkout_query");
            }
            return Ok(());
        }

        let Some(message) = update.message else {
            return Ok(());
        };
        let Some(from) = message.from.as_ref() else {
            return Ok(());
        };
        let user = UserId(from.id);

        if let Some(payment) = &message.successful_payment {
            return self
                .record_payment(user, payment.total_amount, &payment.telegram_payment_charge_id)
                .await;
        }

        if let Some(command) = message.text.as_deref().and_then(Command::parse) {
            let reply = self.handler.handle(user, command).await;
            self.send(&message, reply).await;
        }
        Ok(())
    }

    async fn record_payment(&self, user: UserId, total_amount: u64, charge_id: &str) -> Result<()> {
        let reference = match PaymentReference::parse(charge_id) {
            Ok(reference) => reference,
            Err(e) => {
                tracing::error!(%user, error = %e, "payment without charge id");
                return Ok(());
            }
        };
        let payment = SuccessfulPayment {
            user,
            total_amount_minor_units: total_amount,
            reference,
        };
        match self.engine.credit_from_payment(payment).await {
            Ok(_) => Ok(()),
            Err(e @ LedgerError::LedgerWriteError(_)) => Err(e),
            Err(e) => {
                tracing::error!(%user, error = %e, "payment rejected");
                Ok(())
            }
        }
    }

    async fn send(&self, message: &Message, reply: Reply) {
        let chat_id = message.chat.id;
        let result = match reply {
            Reply::Text(text) => self.api.send_message(chat_id, &text).await,
            Reply::Invoice(invoice) => self.api.send_invoice(chat_id, &invoice).await,
            Reply::Nothing => Ok(()),
        };
        if let Err(e) = result {
            tracing::error!(chat_id, error = %e, "could not reply");
        }
    }
}
