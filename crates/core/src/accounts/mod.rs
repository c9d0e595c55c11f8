//! Accounts module - ledger account model, mapping tags and resolution.

mod account_resolver;
mod accounts_model;
mod mapping_tag;


pub use account_resolver::{check_unique_mappings, find_mapped_account, AccountResolver};
pub use accounts_model::{LedgerAccount, ResolvedAccount};
pub use mapping_tag::MappingTag;
