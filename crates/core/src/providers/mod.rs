//! Provider notification variants.
//!
//! Each upstream bank schema is modelled as its own variant and converts into
//! the single [`TransactionRecord`]. Provider-only fields never reach the
//! canonical model.

pub mod monobank;

use crate::transactions::TransactionRecord;

pub use monobank::{MonobankStatementItem, MonobankWebhook, MONOBANK_STATEMENT_ITEM};

/// A transaction notification received from a bank provider.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum BankNotification {
    Monobank(MonobankWebhook),
}

impl BankNotification {
    /// Name of the provider the notification came from.
    pub fn provider(&self) -> &'static str {
        match self {
            BankNotification::Monobank(_) => "monobank",
        }
    }
}

impl From<BankNotification> for TransactionRecord {
    fn from(notification: BankNotification) -> Self {
        match notification {
            BankNotification::Monobank(webhook) => webhook.into(),
        }
    }
}
