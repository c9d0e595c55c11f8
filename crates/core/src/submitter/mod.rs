//! Submitter module - turns a record into a ledger transaction.

mod transaction_submitter;

#[cfg(test)]
mod transaction_submitter_tests;

pub use transaction_submitter::{SubmitterOptions, TransactionForwarder, TransactionSubmitter};
