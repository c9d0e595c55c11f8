//! Canonical transaction record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Direction of money relative to the source bank account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Money leaving the source account
    Withdrawal,
    /// Money entering the source account
    Deposit,
}

impl Direction {
    /// Ledger transaction type for this direction.
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Withdrawal => "withdrawal",
            Direction::Deposit => "deposit",
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Provider-independent transaction record.
///
/// A record is produced once by the intake side and then moved from stage to
/// stage; nothing keeps a copy once submission completes or fails.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    /// Source-system account identifier
    pub account_id: String,
    /// Source-system transaction identifier
    pub external_transaction_id: String,
    /// Amount in minor units; negative is a withdrawal, positive a deposit
    pub amount_minor_units: i64,
    pub occurred_at: DateTime<Utc>,
    /// Numeric ISO 4217 currency code
    pub currency_code: i32,
    pub merchant_category_code: i32,
    pub description: String,
    pub comment: String,
    pub counterparty_iban: String,
    pub counterparty_name: String,
}

impl TransactionRecord {
    /// Direction implied by the sign of the amount, `None` for a zero amount.
    pub fn direction(&self) -> Option<Direction> {
        match self.amount_minor_units {
            0 => None,
            amount if amount < 0 => Some(Direction::Withdrawal),
            _ => Some(Direction::Deposit),
        }
    }

    /// Key used by the duplicate guard, `None` when the provider gave no id.
    pub fn dedup_key(&self) -> Option<(String, String)> {
        if self.external_transaction_id.is_empty() {
            return None;
        }
        Some((
            self.account_id.clone(),
            self.external_transaction_id.clone(),
        ))
    }
}
