//! In-memory ledger for tests or dry runs.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use super::ledger_traits::{LedgerClient, LedgerResponse};
use super::payload::TransactionPayload;
use crate::accounts::LedgerAccount;
use crate::errors::{Error, Result};

#[derive(Default)]
struct MockState {
    accounts: Vec<LedgerAccount>,
    accounts_error: Option<String>,
    responses: VecDeque<LedgerResponse>,
    store_error: Option<String>,
    store_delay: Duration,
    stored: Vec<TransactionPayload>,
}

/// Mock ledger - serves a fixed account list and records stored payloads.
///
/// Store requests answer 200 unless responses were queued with
/// [`MockLedgerClient::push_response`].
#[derive(Clone, Default)]
pub struct MockLedgerClient {
    state: Arc<Mutex<MockState>>,
    list_calls: Arc<AtomicUsize>,
    store_calls: Arc<AtomicUsize>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

impl MockLedgerClient {
    pub fn new(accounts: Vec<LedgerAccount>) -> Self {
        let client = Self::default();
        client.set_accounts(accounts);
        client
    }

    fn state(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn set_accounts(&self, accounts: Vec<LedgerAccount>) {
        self.state().accounts = accounts;
    }

    /// Make `list_accounts` fail until cleared with `None`.
    pub fn fail_accounts(&self, message: Option<&str>) {
        self.state().accounts_error = message.map(str::to_string);
    }

    /// Make `store_transaction` fail with a transport error.
    pub fn fail_store(&self, message: Option<&str>) {
        self.state().store_error = message.map(str::to_string);
    }

    /// Queue the response for the next store request.
    pub fn push_response(&self, response: LedgerResponse) {
        self.state().responses.push_back(response);
    }

    /// Delay every store request.
    pub fn set_store_delay(&self, delay: Duration) {
        self.state().store_delay = delay;
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn store_calls(&self) -> usize {
        self.store_calls.load(Ordering::SeqCst)
    }

    /// Highest number of store requests observed running at once.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Payloads received, in arrival order.
    pub fn stored(&self) -> Vec<TransactionPayload> {
        self.state().stored.clone()
    }
}

#[async_trait]
impl LedgerClient for MockLedgerClient {
    async fn list_accounts(&self) -> Result<Vec<LedgerAccount>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let state = self.state();
        match &state.accounts_error {
            Some(message) => Err(Error::LedgerApiUnavailable(message.clone())),
            None => Ok(state.accounts.clone()),
        }
    }

    async fn store_transaction(&self, payload: &TransactionPayload) -> Result<LedgerResponse> {
        self.store_calls.fetch_add(1, Ordering::SeqCst);
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);

        let delay = self.state().store_delay;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let result = {
            let mut state = self.state();
            state.stored.push(payload.clone());
            match &state.store_error {
                Some(message) => Err(Error::LedgerApiUnavailable(message.clone())),
                None => Ok(state
                    .responses
                    .pop_front()
                    .unwrap_or_else(|| LedgerResponse::new(200, "{}"))),
            }
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}
