//! Firefly III ledger client.
//!
//! Implements [`banksync_core::LedgerClient`] on top of the Firefly III REST
//! API (`/api/v1`).

mod client;
mod models;

pub use client::{FireflyApiClient, DEFAULT_TIMEOUT_SECS};
