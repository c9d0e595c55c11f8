//! Ledger account models.

use serde::{Deserialize, Serialize};

/// Account as listed by the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct LedgerAccount {
    pub id: String,
    pub name: String,
    /// Free-form notes; may embed a mapping tag
    #[serde(default)]
    pub notes: String,
}

impl LedgerAccount {
    pub fn new(id: impl Into<String>, name: impl Into<String>, notes: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            notes: notes.into(),
        }
    }
}

/// Ledger account a source account resolves to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedAccount {
    pub id: String,
    pub name: String,
}

impl From<&LedgerAccount> for ResolvedAccount {
    fn from(account: &LedgerAccount) -> Self {
        Self {
            id: account.id.clone(),
            name: account.name.clone(),
        }
    }
}
