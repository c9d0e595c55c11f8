//! Ledger module - the client seam and the transaction payload model.

mod ledger_traits;
mod mock;
mod payload;

pub use ledger_traits::{LedgerClient, LedgerResponse};
pub use mock::MockLedgerClient;
pub use payload::{compose_notes, format_amount, TransactionPayload, TransactionSplit};
