//! Ledger transaction payload.
//!
//! A payload is built fresh for every submission attempt and written once.

use chrono::{DateTime, Utc};
use iso_currency::Currency;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::accounts::ResolvedAccount;
use crate::constants::{BRIDGE_TAG, MINOR_UNIT_SCALE};
use crate::transactions::{Direction, TransactionRecord};

/// Body of the ledger's store-transaction request.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TransactionPayload {
    pub error_if_duplicate_hash: bool,
    pub apply_rules: bool,
    pub fire_webhooks: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_title: Option<String>,
    pub transactions: Vec<TransactionSplit>,
}

/// A single split of a ledger transaction.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TransactionSplit {
    #[serde(rename = "type")]
    pub transaction_type: Direction,
    pub description: String,
    pub date: DateTime<Utc>,
    pub amount: String,
    pub notes: String,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency_code: Option<String>,
    pub external_id: String,
    pub internal_reference: String,
}

impl TransactionPayload {
    /// Build the payload for a record whose direction and ledger account are
    /// already known.
    ///
    /// On a withdrawal the resolved account is the source of funds, on a
    /// deposit it is the destination.
    pub fn build(
        record: &TransactionRecord,
        direction: Direction,
        account: &ResolvedAccount,
        error_if_duplicate_hash: bool,
    ) -> Self {
        let currency_code = currency_code(record.currency_code);

        let mut split = TransactionSplit {
            transaction_type: direction,
            description: record.description.clone(),
            date: record.occurred_at,
            amount: format_amount(record.amount_minor_units),
            notes: compose_notes(record, currency_code.as_deref()),
            tags: vec![BRIDGE_TAG.to_string()],
            source_id: None,
            source_name: None,
            destination_id: None,
            destination_name: None,
            currency_code,
            external_id: format!("AccountId: {}", record.account_id),
            internal_reference: record.external_transaction_id.clone(),
        };

        match direction {
            Direction::Withdrawal => {
                split.source_id = Some(account.id.clone());
                split.source_name = Some(account.name.clone());
            }
            Direction::Deposit => {
                split.destination_id = Some(account.id.clone());
                split.destination_name = Some(account.name.clone());
            }
        }

        Self {
            error_if_duplicate_hash,
            apply_rules: true,
            fire_webhooks: true,
            group_title: None,
            transactions: vec![split],
        }
    }
}

/// Absolute amount in major units with two decimals, e.g. `-12345` -> `"123.45"`.
pub fn format_amount(amount_minor_units: i64) -> String {
    Decimal::from_i128_with_scale(
        i128::from(amount_minor_units.unsigned_abs()),
        MINOR_UNIT_SCALE,
    )
    .to_string()
}

/// Textual ISO 4217 code for a numeric one; unknown codes yield `None`.
fn currency_code(numeric: i32) -> Option<String> {
    u16::try_from(numeric)
        .ok()
        .and_then(Currency::from_numeric)
        .map(|currency| currency.code().to_string())
}

/// Free-text note preserving the metadata the ledger has no field for.
pub fn compose_notes(record: &TransactionRecord, currency_code: Option<&str>) -> String {
    let lines = [
        ("MCC:", record.merchant_category_code.to_string()),
        ("Comment:", record.comment.clone()),
        ("Description:", record.description.clone()),
        ("Counter IBAN:", record.counterparty_iban.clone()),
        ("Counter name:", record.counterparty_name.clone()),
        ("Currency code:", currency_code.unwrap_or_default().to_string()),
    ];

    lines
        .iter()
        .map(|(label, value)| format!("{} {}\n", label, value))
        .collect()
}
