//! Keyed locks serializing ingestion per host.
//!
//! Two submissions for the same host would otherwise both read the same
//! "latest" row and both write. Different hosts get different mutexes.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

/// Idle entries are dropped once the table grows past this.
const PRUNE_THRESHOLD: usize = 1024;

#[derive(Debug, Default)]
pub struct HostLocks {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl HostLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// The mutex for a host. Lock it for the read-decide-write sequence.
    pub fn handle(&self, host_ip: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock();
        if locks.len() > PRUNE_THRESHOLD {
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        }
        locks
            .entry(host_ip.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    pub fn len(&self) -> usize {
        self.locks.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
