//! Banksync Core - transaction translation and forwarding.
//!
//! This crate turns bank notifications into canonical transaction records,
//! resolves the ledger account each record belongs to, and submits ledger
//! transactions through a bounded concurrent pipeline. It is HTTP-agnostic:
//! the ledger is reached through the [`ledger::LedgerClient`] trait, which the
//! `firefly` crate implements.

pub mod accounts;
pub mod constants;
pub mod errors;
pub mod ledger;
pub mod pipeline;
pub mod providers;
pub mod submitter;
pub mod transactions;

// Re-export error types
pub use errors::Error;
pub use errors::Result;

pub use accounts::{AccountResolver, LedgerAccount, MappingTag, ResolvedAccount};
pub use ledger::{LedgerClient, LedgerResponse, TransactionPayload};
pub use pipeline::{
    ForwardingPipeline, IntakeClosed, IntakeHandle, PipelineConfig, PipelineHandle,
    PipelineState, PipelineStats,
};
pub use providers::BankNotification;
pub use submitter::{SubmitterOptions, TransactionForwarder, TransactionSubmitter};
pub use transactions::{Direction, TransactionRecord};
