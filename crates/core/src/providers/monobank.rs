//! Monobank personal webhook models.
//!
//! See <https://api.monobank.ua/docs/> (`/personal/webhook`).

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::transactions::TransactionRecord;

/// Webhook `type` value carrying a statement item.
pub const MONOBANK_STATEMENT_ITEM: &str = "StatementItem";

/// Webhook envelope sent by Monobank.
#[derive(Debug, Clone, Deserialize)]
pub struct MonobankWebhook {
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: MonobankWebhookData,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonobankWebhookData {
    pub account: String,
    pub statement_item: MonobankStatementItem,
}

/// Statement item as documented for the statement and webhook endpoints.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonobankStatementItem {
    pub id: String,
    /// Epoch seconds, decoded as UTC
    #[serde(with = "chrono::serde::ts_seconds")]
    pub time: DateTime<Utc>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub mcc: i32,
    #[serde(default)]
    pub original_mcc: i32,
    #[serde(default)]
    pub hold: bool,
    pub amount: i64,
    #[serde(default)]
    pub operation_amount: i64,
    pub currency_code: i32,
    #[serde(default)]
    pub commission_rate: i64,
    #[serde(default)]
    pub cashback_amount: i64,
    #[serde(default)]
    pub balance: i64,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub receipt_id: String,
    #[serde(default)]
    pub invoice_id: String,
    #[serde(default)]
    pub counter_edrpou: String,
    #[serde(default)]
    pub counter_iban: String,
    #[serde(default)]
    pub counter_name: String,
}

impl MonobankWebhook {
    /// Whether this webhook carries a transaction.
    pub fn is_statement_item(&self) -> bool {
        self.event_type == MONOBANK_STATEMENT_ITEM
    }
}

impl From<MonobankWebhook> for TransactionRecord {
    fn from(webhook: MonobankWebhook) -> Self {
        let item = webhook.data.statement_item;
        TransactionRecord {
            account_id: webhook.data.account,
            external_transaction_id: item.id,
            amount_minor_units: item.amount,
            occurred_at: item.time,
            currency_code: item.currency_code,
            merchant_category_code: item.mcc,
            description: item.description,
            comment: item.comment,
            counterparty_iban: item.counter_iban,
            counterparty_name: item.counter_name,
        }
    }
}
