//! Resolution of a bank account to its ledger account.
//!
//! The mapping lives in the ledger itself: each ledger account that mirrors a
//! bank account carries a mapping tag in its notes. Resolution scans the
//! account list and returns the first account whose tag value equals the
//! source account id. Duplicate tag values are caught by
//! [`check_unique_mappings`] at startup, not at resolution time.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use log::{debug, warn};
use tokio::time::Instant;

use super::accounts_model::{LedgerAccount, ResolvedAccount};
use super::mapping_tag::MappingTag;
use crate::constants::DEFAULT_MAPPING_NAMESPACE;
use crate::errors::{Error, Result};
use crate::ledger::LedgerClient;

/// First account in list order whose mapping tag value is `source_account_id`.
pub fn find_mapped_account<'a>(
    accounts: &'a [LedgerAccount],
    namespace: &str,
    source_account_id: &str,
) -> Option<&'a LedgerAccount> {
    accounts.iter().find(|account| {
        match MappingTag::find_in(&account.notes, namespace) {
            Some(Ok(tag)) => tag.value == source_account_id,
            Some(Err(e)) => {
                debug!(
                    "[Resolver] Ignoring malformed mapping tag on account {}: {}",
                    account.id, e
                );
                false
            }
            None => false,
        }
    })
}

/// Verify that no two ledger accounts carry the same mapping tag value.
///
/// Returns the number of mapped accounts.
pub fn check_unique_mappings(accounts: &[LedgerAccount], namespace: &str) -> Result<usize> {
    let mut by_value: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for account in accounts {
        if let Some(Ok(tag)) = MappingTag::find_in(&account.notes, namespace) {
            by_value.entry(tag.value).or_default().push(account.id.clone());
        }
    }

    let mapped = by_value.values().map(Vec::len).sum();
    match by_value.into_iter().find(|(_, ids)| ids.len() > 1) {
        Some((source_account_id, ledger_account_ids)) => Err(Error::AmbiguousAccountMapping {
            source_account_id,
            ledger_account_ids,
        }),
        None => Ok(mapped),
    }
}

/// Account list kept for a limited time.
struct CachedAccounts {
    fetched_at: Instant,
    accounts: Arc<Vec<LedgerAccount>>,
}

/// Resolves bank account ids to ledger accounts.
///
/// With the default zero TTL every resolution fetches the full account list.
/// A positive TTL keeps the list between resolutions; a lookup miss on a
/// cached list invalidates it and retries once against a fresh list so that
/// mappings added at runtime are picked up.
pub struct AccountResolver {
    ledger: Arc<dyn LedgerClient>,
    namespace: String,
    cache_ttl: Duration,
    cache: Mutex<Option<CachedAccounts>>,
}

impl AccountResolver {
    pub fn new(ledger: Arc<dyn LedgerClient>) -> Self {
        Self {
            ledger,
            namespace: DEFAULT_MAPPING_NAMESPACE.to_string(),
            cache_ttl: Duration::ZERO,
            cache: Mutex::new(None),
        }
    }

    /// Use a different mapping tag namespace.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Keep the account list for `ttl`; zero disables caching.
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Resolve a bank account id to the ledger account id and name.
    pub async fn resolve(&self, source_account_id: &str) -> Result<ResolvedAccount> {
        let (accounts, from_cache) = self.accounts().await?;
        if let Some(account) = find_mapped_account(&accounts, &self.namespace, source_account_id) {
            return Ok(account.into());
        }

        if from_cache {
            debug!(
                "[Resolver] No mapping for {} in cached account list, refetching",
                source_account_id
            );
            self.invalidate();
            let (accounts, _) = self.accounts().await?;
            if let Some(account) =
                find_mapped_account(&accounts, &self.namespace, source_account_id)
            {
                return Ok(account.into());
            }
        }

        Err(Error::AccountMappingNotFound(source_account_id.to_string()))
    }

    /// Fetch the account list and check mapping uniqueness.
    pub async fn validate_mappings(&self) -> Result<usize> {
        let accounts = self.ledger.list_accounts().await?;
        let mapped = check_unique_mappings(&accounts, &self.namespace)?;
        if mapped == 0 {
            warn!(
                "[Resolver] No ledger account carries a '{}.' mapping tag",
                self.namespace
            );
        }
        Ok(mapped)
    }

    /// Drop the cached account list, if any.
    pub fn invalidate(&self) {
        self.lock_cache().take();
    }

    /// Account list and whether it came from the cache.
    async fn accounts(&self) -> Result<(Arc<Vec<LedgerAccount>>, bool)> {
        if !self.cache_ttl.is_zero() {
            if let Some(cached) = self.lock_cache().as_ref() {
                if cached.fetched_at.elapsed() < self.cache_ttl {
                    return Ok((cached.accounts.clone(), true));
                }
            }
        }

        let accounts = Arc::new(self.ledger.list_accounts().await?);
        debug!("[Resolver] Fetched {} ledger accounts", accounts.len());

        if !self.cache_ttl.is_zero() {
            *self.lock_cache() = Some(CachedAccounts {
                fetched_at: Instant::now(),
                accounts: accounts.clone(),
            });
        }
        Ok((accounts, false))
    }

    /// Lock the cache, recovering from poison.
    fn lock_cache(&self) -> MutexGuard<'_, Option<CachedAccounts>> {
        self.cache.lock().unwrap_or_else(|poisoned| {
            warn!("[Resolver] Account cache mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }
}
