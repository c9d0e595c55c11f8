//! Bounded memory of recently seen transactions.

use std::collections::{HashSet, VecDeque};

use crate::transactions::TransactionRecord;

/// Remembers the last `capacity` transaction keys; the oldest key is forgotten
/// first. Records without a transaction id are never considered duplicates.
#[derive(Debug)]
pub struct SeenTransactions {
    capacity: usize,
    order: VecDeque<(String, String)>,
    keys: HashSet<(String, String)>,
}

impl SeenTransactions {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            order: VecDeque::with_capacity(capacity),
            keys: HashSet::with_capacity(capacity),
        }
    }

    /// Record the transaction; returns `false` if it was already seen.
    pub fn insert(&mut self, record: &TransactionRecord) -> bool {
        if self.capacity == 0 {
            return true;
        }
        let Some(key) = record.dedup_key() else {
            return true;
        };
        if self.keys.contains(&key) {
            return false;
        }

        if self.order.len() == self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.keys.remove(&oldest);
            }
        }
        self.keys.insert(key.clone());
        self.order.push_back(key);
        true
    }

    /// Forget a key so a later redelivery is forwarded again.
    pub fn forget(&mut self, key: &(String, String)) {
        if self.keys.remove(key) {
            self.order.retain(|k| k != key);
        }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
