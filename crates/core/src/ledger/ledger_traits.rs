use async_trait::async_trait;

use super::payload::TransactionPayload;
use crate::accounts::LedgerAccount;
use crate::errors::Result;

/// Raw outcome of a transaction creation request.
///
/// Status interpretation is left to the submitter, which knows which
/// statuses count as success.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerResponse {
    pub status: u16,
    pub body: String,
}

impl LedgerResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Trait for the personal-finance ledger API
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Fetch the full ledger account list.
    ///
    /// Fails with `LedgerApiUnavailable` on transport errors or non-success
    /// statuses.
    async fn list_accounts(&self) -> Result<Vec<LedgerAccount>>;

    /// Submit a transaction and return the raw status and body.
    ///
    /// Only transport failures are errors here.
    async fn store_transaction(&self, payload: &TransactionPayload) -> Result<LedgerResponse>;
}
