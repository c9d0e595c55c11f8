//! Forwarding pipeline.
//!
//! One producer feeds a bounded queue; a single dispatcher drains it in
//! intake order and spawns one submission task per record. A semaphore caps
//! the number of submissions running at once. Completion order across records
//! is not guaranteed. A failed submission is logged and dropped; it never
//! affects the dispatcher or other records.
//!
//! The optional duplicate guard marks a transaction as seen when it is
//! dispatched, so a redelivery arriving while the first attempt is still in
//! flight is skipped. If that attempt fails the key is forgotten again and a
//! later redelivery is forwarded.
//!
//! ```text
//! Running --(every intake handle dropped)--> Draining --(last task done)--> Stopped
//! ```

use std::sync::Arc;

use log::{debug, error, info, warn};
use thiserror::Error;
use tokio::sync::{mpsc, watch, Semaphore};
use tokio::task::{JoinError, JoinHandle, JoinSet};

use super::dedup::SeenTransactions;
use crate::constants::{DEFAULT_MAX_IN_FLIGHT, DEFAULT_QUEUE_CAPACITY};
use crate::submitter::TransactionForwarder;
use crate::transactions::TransactionRecord;

/// Configuration for the forwarding pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Capacity of the intake queue; producers wait when it is full.
    pub queue_capacity: usize,
    /// Maximum number of submissions running at once.
    pub max_in_flight: usize,
    /// Number of recent transaction keys remembered by the duplicate
    /// guard; zero disables it.
    pub dedup_capacity: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
            dedup_capacity: 0,
        }
    }
}

/// Lifecycle of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    /// Draining the queue and spawning submissions
    Running,
    /// Intake closed, waiting for in-flight submissions
    Draining,
    /// Every dispatched submission has finished
    Stopped,
}

/// Outcome counters, returned once the pipeline stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineStats {
    pub dispatched: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub duplicates_skipped: usize,
}

/// Result of one submission task.
struct Outcome {
    succeeded: bool,
    dedup_key: Option<(String, String)>,
}

/// Count a finished task and release its duplicate-guard key on failure.
fn settle(
    stats: &mut PipelineStats,
    seen: &mut SeenTransactions,
    joined: std::result::Result<Outcome, JoinError>,
) {
    match joined {
        Ok(Outcome {
            succeeded: true, ..
        }) => stats.succeeded += 1,
        Ok(Outcome {
            succeeded: false,
            dedup_key,
        }) => {
            stats.failed += 1;
            if let Some(key) = dedup_key {
                seen.forget(&key);
            }
        }
        Err(e) => {
            error!("[Pipeline] Submission task aborted: {}", e);
            stats.failed += 1;
        }
    }
}

/// The queue no longer accepts records; the rejected record is handed back.
#[derive(Error, Debug)]
#[error("Intake queue is closed")]
pub struct IntakeClosed(pub TransactionRecord);

/// Producer side of the pipeline.
///
/// The queue closes once every clone of the handle has been dropped.
#[derive(Debug, Clone)]
pub struct IntakeHandle {
    tx: mpsc::Sender<TransactionRecord>,
}

impl IntakeHandle {
    /// Enqueue a record, waiting while the queue is full.
    pub async fn send(&self, record: TransactionRecord) -> Result<(), IntakeClosed> {
        self.tx
            .send(record)
            .await
            .map_err(|mpsc::error::SendError(record)| IntakeClosed(record))
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Owner side of the pipeline.
#[derive(Debug)]
pub struct PipelineHandle {
    state: watch::Receiver<PipelineState>,
    dispatcher: JoinHandle<PipelineStats>,
}

impl PipelineHandle {
    pub fn state(&self) -> PipelineState {
        *self.state.borrow()
    }

    /// Receiver notified on every state transition.
    pub fn subscribe(&self) -> watch::Receiver<PipelineState> {
        self.state.clone()
    }

    /// Wait until the last dispatched submission has finished.
    pub async fn stopped(self) -> PipelineStats {
        match self.dispatcher.await {
            Ok(stats) => stats,
            Err(e) => {
                error!("[Pipeline] Dispatcher terminated abnormally: {}", e);
                PipelineStats::default()
            }
        }
    }
}

pub struct ForwardingPipeline;

impl ForwardingPipeline {
    /// Start the dispatcher on the current tokio runtime.
    pub fn spawn(
        forwarder: Arc<dyn TransactionForwarder>,
        config: PipelineConfig,
    ) -> (IntakeHandle, PipelineHandle) {
        let (tx, rx) = mpsc::channel(config.queue_capacity.max(1));
        let (state_tx, state_rx) = watch::channel(PipelineState::Running);

        let dispatcher = tokio::spawn(dispatch(rx, forwarder, config, state_tx));

        (
            IntakeHandle { tx },
            PipelineHandle {
                state: state_rx,
                dispatcher,
            },
        )
    }
}

async fn dispatch(
    mut rx: mpsc::Receiver<TransactionRecord>,
    forwarder: Arc<dyn TransactionForwarder>,
    config: PipelineConfig,
    state: watch::Sender<PipelineState>,
) -> PipelineStats {
    info!(
        "[Pipeline] Started (queue capacity {}, max in flight {})",
        config.queue_capacity.max(1),
        config.max_in_flight.max(1)
    );

    let permits = Arc::new(Semaphore::new(config.max_in_flight.max(1)));
    let mut seen = SeenTransactions::new(config.dedup_capacity);
    let mut tasks: JoinSet<Outcome> = JoinSet::new();
    let mut stats = PipelineStats::default();

    while let Some(record) = rx.recv().await {
        // Settle finished tasks first so failed keys are released before the check.
        while let Some(joined) = tasks.try_join_next() {
            settle(&mut stats, &mut seen, joined);
        }

        if !seen.insert(&record) {
            warn!(
                "[Pipeline] Skipping duplicate transaction {} for account {}",
                record.external_transaction_id, record.account_id
            );
            stats.duplicates_skipped += 1;
            continue;
        }

        // Waits for any running submission to finish, never for a specific one.
        let permit = match permits.clone().acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => break,
        };

        stats.dispatched += 1;
        let seq = stats.dispatched;
        debug!(
            "[Pipeline] Dispatching #{} transaction {}",
            seq, record.external_transaction_id
        );

        let forwarder = forwarder.clone();
        let dedup_key = record.dedup_key();
        tasks.spawn(async move {
            let _permit = permit;
            Outcome {
                succeeded: forward_one(forwarder.as_ref(), seq, record).await,
                dedup_key,
            }
        });
    }

    info!(
        "[Pipeline] Intake closed, draining {} in-flight submission(s)",
        tasks.len()
    );
    state.send_replace(PipelineState::Draining);

    while let Some(joined) = tasks.join_next().await {
        settle(&mut stats, &mut seen, joined);
    }

    state.send_replace(PipelineState::Stopped);
    info!(
        "[Pipeline] Stopped: {} dispatched, {} succeeded, {} failed, {} duplicates skipped",
        stats.dispatched, stats.succeeded, stats.failed, stats.duplicates_skipped
    );
    stats
}

async fn forward_one(
    forwarder: &dyn TransactionForwarder,
    seq: usize,
    record: TransactionRecord,
) -> bool {
    let transaction_id = record.external_transaction_id.clone();
    let account_id = record.account_id.clone();

    match forwarder.forward(record).await {
        Ok(()) => {
            info!(
                "[Pipeline] #{} transaction {} recorded in ledger",
                seq, transaction_id
            );
            true
        }
        Err(e) => {
            warn!(
                "[Pipeline] #{} failed to create transaction {} (account {}) [{}]: {}",
                seq,
                transaction_id,
                account_id,
                e.kind(),
                e
            );
            false
        }
    }
}
