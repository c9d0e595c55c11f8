//! Firefly III API response types (internal, for parsing responses).

use banksync_core::LedgerAccount;
use log::warn;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub(crate) struct ApiAccountsResponse {
    #[serde(default)]
    pub data: Vec<ApiAccount>,
    #[serde(default)]
    pub meta: Option<ApiMeta>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiAccount {
    /// JSON:API resource id
    #[serde(default)]
    pub id: Option<String>,
    pub attributes: ApiAccountAttributes,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiAccountAttributes {
    /// Some deployments repeat the id inside the attributes
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiMeta {
    #[serde(default)]
    pub pagination: Option<ApiPagination>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiPagination {
    pub current_page: u32,
    pub total_pages: u32,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorResponse {
    #[serde(default)]
    pub message: Option<String>,
}

impl ApiAccountsResponse {
    /// Whether another page follows this one.
    pub fn has_next_page(&self) -> bool {
        self.meta
            .as_ref()
            .and_then(|m| m.pagination.as_ref())
            .map(|p| p.current_page < p.total_pages)
            .unwrap_or(false)
    }

    /// Convert to ledger accounts, dropping entries without an id.
    pub fn into_accounts(self) -> Vec<LedgerAccount> {
        self.data
            .into_iter()
            .filter_map(|account| {
                let id = account.id.or(account.attributes.id);
                match id {
                    Some(id) => Some(LedgerAccount {
                        id,
                        name: account.attributes.name,
                        notes: account.attributes.notes.unwrap_or_default(),
                    }),
                    None => {
                        warn!(
                            "[FireflyApi] Skipping account '{}' without id",
                            account.attributes.name
                        );
                        None
                    }
                }
            })
            .collect()
    }
}
