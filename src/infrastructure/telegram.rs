//! Telegram Bot API client.
//!
//! Provides the refund and invoice-link capabilities consumed by the ledger
//! core, plus the handful of calls the chat shell needs to poll for updates
//! and reply.

use crate::domain::account::UserId;
use crate::domain::invoice::{Invoice, LabeledPrice};
use crate::domain::payment::PaymentReference;
use crate::domain::ports::{InvoiceGateway, RefundGateway};
use crate::error::{LedgerError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Telegram API base URL
const API_BASE: &str = "https://api.telegram.org";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
    pub pre_checkout_query: Option<PreCheckoutQuery>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Message {
    pub message_id: i64,
    pub from: Option<User>,
    pub chat: Chat,
    pub text: Option<String>,
    pub successful_payment: Option<SuccessfulPaymentPayload>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct User {
    pub id: i64,
    pub username: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SuccessfulPaymentPayload {
    pub currency: String,
    pub total_amount: u64,
    pub telegram_payment_charge_id: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PreCheckoutQuery {
    pub id: String,
    pub from: User,
    pub currency: String,
    pub total_amount: u64,
}

/// Envelope every Bot API method responds with.
#[derive(Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Serialize)]
struct InvoiceBody<'a> {
    title: &'a str,
    description: &'a str,
    payload: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    provider_token: Option<&'a str>,
    currency: &'a str,
    prices: &'a [LabeledPrice],
}

/// HTTP client for the Bot API.
#[derive(Clone)]
pub struct TelegramClient {
    token: String,
    provider_token: Option<String>,
    client: Client,
    base_url: String,
}

impl TelegramClient {
    pub fn new(token: impl Into<String>, provider_token: Option<String>) -> Self {
        Self {
            token: token.into(),
            provider_token,
            client: Client::new(),
            base_url: API_BASE.to_string(),
        }
    }

    /// Points the client at another Bot API server (e.g. a local one).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn api_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.base_url, self.token, method)
    }

    async fn call<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: &str,
        body: &B,
    ) -> Result<T> {
        let response = self
            .client
            .post(self.api_url(method))
            .json(body)
            .send()
            .await
            .map_err(|e| LedgerError::Gateway(format!("{}: {}", method, e)))?;

        let data: ApiResponse<T> = response
            .json()
            .await
            .map_err(|e| LedgerError::Gateway(format!("{}: {}", method, e)))?;

        match (data.ok, data.result) {
            (true, Some(result)) => Ok(result),
            _ => Err(LedgerError::Gateway(format!(
                "{}: {}",
                method,
                data.description
                    .unwrap_or_else(|| "request rejected".to_string())
            ))),
        }
    }

    /// Long-polls for updates starting at `offset`.
    pub async fn get_updates(&self, offset: i64, timeout_secs: u64) -> Result<Vec<Update>> {
        #[derive(Serialize)]
        struct Body {
            offset: i64,
            timeout: u64,
            allowed_updates: [&'static str; 2],
        }

        self.call(
            "getUpdates",
            &Body {
                offset,
                timeout: timeout_secs,
                allowed_updates: ["message", "pre_checkout_query"],
            },
        )
        .await
    }

    pub async fn send_message(&self, chat_id: i64, text: &str) -> Result<()> {
        #[derive(Serialize)]
        struct Body<'a> {
            chat_id: i64,
            text: &'a str,
        }

        let _: Message = self.call("sendMessage", &Body { chat_id, text }).await?;
        Ok(())
    }

    pub async fn send_invoice(&self, chat_id: i64, invoice: &Invoice) -> Result<()> {
        #[derive(Serialize)]
        struct Body<'a> {
            chat_id: i64,
            #[serde(flatten)]
            invoice: InvoiceBody<'a>,
        }

        let _: Message = self
            .call(
                "sendInvoice",
                &Body {
                    chat_id,
                    invoice: self.invoice_body(invoice),
                },
            )
            .await?;
        Ok(())
    }

    pub async fn answer_pre_checkout_query(&self, query_id: &str, ok: bool) -> Result<()> {
        #[derive(Serialize)]
        struct Body<'a> {
            pre_checkout_query_id: &'a str,
            ok: bool,
        }

        let _: bool = self
            .call(
                "answerPreCheckoutQuery",
                &Body {
                    pre_checkout_query_id: query_id,
                    ok,
                },
            )
            .await?;
        Ok(())
    }

    fn invoice_body<'a>(&'a self, invoice: &'a Invoice) -> InvoiceBody<'a> {
        InvoiceBody {
            title: &invoice.title,
            description: &invoice.description,
            payload: &invoice.payload,
            provider_token: self.provider_token.as_deref(),
            currency: &invoice.currency,
            prices: &invoice.prices,
        }
    }
}

#[async_trait]
impl RefundGateway for TelegramClient {
    async fn refund(&self, user: UserId, reference: &PaymentReference) -> Result<()> {
        #[derive(Serialize)]
        struct Body<'a> {
            user_id: i64,
            telegram_payment_charge_id: &'a str,
        }

        let _: bool = self
            .call(
                "refundStarPayment",
                &Body {
                    user_id: user.0,
                    telegram_payment_charge_id: reference.as_str(),
                },
            )
            .await?;
        Ok(())
    }
}

#[async_trait]
impl InvoiceGateway for TelegramClient {
    async fn create_invoice_link(&self, invoice: &Invoice) -> Result<String> {
        self.call("createInvoiceLink", &self.invoice_body(invoice))
            .await
    }
}
