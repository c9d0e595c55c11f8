//! Transactions module - the canonical record flowing through the pipeline.

mod transactions_model;

pub use transactions_model::{Direction, TransactionRecord};
