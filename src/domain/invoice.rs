use serde::{Deserialize, Serialize};

/// Currency code for platform stars.
pub const STARS_CURRENCY: &str = "XTR";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledPrice {
    pub label: String,
    pub amount: u64,
}

/// A payable invoice description handed to the payment provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Invoice {
    pub title: String,
    pub description: String,
    pub payload: String,
    pub currency: String,
    pub prices: Vec<LabeledPrice>,
}

impl Default for Invoice {
    fn default() -> Self {
        Self {
            title: "Star donation".to_string(),
            description: "Support the author and their projects. Thank you for the donation!"
                .to_string(),
            payload: "{}".to_string(),
            currency: STARS_CURRENCY.to_string(),
            prices: vec![LabeledPrice {
                label: "Payment of «Telegram Stars»".to_string(),
                amount: 25,
            }],
        }
    }
}
