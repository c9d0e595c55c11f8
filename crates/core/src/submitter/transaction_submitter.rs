//! Transaction submission.
//!
//! A submission resolves the ledger account, builds a fresh payload and posts
//! it once. There is no retry: the pipeline logs a failure and drops the
//! record.

use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, warn};

use crate::accounts::AccountResolver;
use crate::constants::DEFAULT_TOLERATED_STATUS;
use crate::errors::{Error, Result};
use crate::ledger::{LedgerClient, TransactionPayload};
use crate::transactions::TransactionRecord;

/// Anything the pipeline can hand a record to.
#[async_trait]
pub trait TransactionForwarder: Send + Sync {
    async fn forward(&self, record: TransactionRecord) -> Result<()>;
}

/// Options for [`TransactionSubmitter`].
#[derive(Debug, Clone)]
pub struct SubmitterOptions {
    /// Non-200 status the ledger returns even though the transaction was
    /// created. `None` makes every non-200 status a failure.
    pub tolerated_status: Option<u16>,
    /// Ask the ledger to reject transactions whose hash it has seen before.
    pub error_if_duplicate_hash: bool,
}

impl Default for SubmitterOptions {
    fn default() -> Self {
        Self {
            tolerated_status: Some(DEFAULT_TOLERATED_STATUS),
            error_if_duplicate_hash: false,
        }
    }
}

pub struct TransactionSubmitter {
    ledger: Arc<dyn LedgerClient>,
    resolver: Arc<AccountResolver>,
    options: SubmitterOptions,
}

impl TransactionSubmitter {
    pub fn new(
        ledger: Arc<dyn LedgerClient>,
        resolver: Arc<AccountResolver>,
        options: SubmitterOptions,
    ) -> Self {
        Self {
            ledger,
            resolver,
            options,
        }
    }

    /// Submit one record to the ledger.
    pub async fn submit(&self, record: &TransactionRecord) -> Result<()> {
        let direction = record.direction().ok_or_else(|| Error::ZeroAmountRejected {
            transaction_id: record.external_transaction_id.clone(),
        })?;

        let account = self.resolver.resolve(&record.account_id).await?;
        debug!(
            "[Submitter] Creating {} of {} for ledger account {} ({})",
            direction, record.amount_minor_units, account.id, account.name
        );

        let payload = TransactionPayload::build(
            record,
            direction,
            &account,
            self.options.error_if_duplicate_hash,
        );
        let response = self.ledger.store_transaction(&payload).await?;

        match response.status {
            200 => Ok(()),
            status if Some(status) == self.options.tolerated_status => {
                warn!(
                    "[Submitter] Ledger answered {} for transaction {}, treating as created: {}",
                    status, record.external_transaction_id, response.body
                );
                Ok(())
            }
            status => Err(Error::SubmissionFailed {
                status,
                body: response.body,
            }),
        }
    }
}

#[async_trait]
impl TransactionForwarder for TransactionSubmitter {
    async fn forward(&self, record: TransactionRecord) -> Result<()> {
        self.submit(&record).await
    }
}
