//! In-memory record store with per-entry eviction timers.

use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::debug;

use super::models::{OtpRecord, Purpose};

/// Store key: at most one live record per (identifier, purpose) pair.
pub(crate) type Key = (String, Purpose);

/// Timers fire one second after the record's own deadline. A verification
/// racing the timer inside that window still sees the record and reports
/// expiry instead of absence; the verify path itself rejects anything past
/// `expires_at`.
const EVICTION_LAG: Duration = Duration::from_secs(1);

/// Whether `update` should keep the record after the closure ran.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Verdict {
    Keep,
    Remove,
}

struct Entry {
    record: OtpRecord,
    eviction: JoinHandle<()>,
}

type Entries = Mutex<HashMap<Key, Entry>>;

/// Keyed record store. Every `put` arms a one-shot task that deletes the
/// entry once its expiry elapses, so abandoned flows reclaim memory without
/// any caller ever verifying.
///
/// Contents are process-memory only and lost on restart.
pub(crate) struct OtpStore {
    entries: Arc<Entries>,
}

impl OtpStore {
    pub(crate) fn new() -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Insert or replace the record for `key` and (re)arm its eviction
    /// timer. Replacing a record cancels the previous timer.
    pub(crate) async fn put(&self, key: Key, record: OtpRecord) {
        let mut entries = self.entries.lock().await;
        if let Some(old) = entries.remove(&key) {
            old.eviction.abort();
        }
        let deadline = record.expires_at + EVICTION_LAG;
        let eviction = spawn_eviction(Arc::downgrade(&self.entries), key.clone(), deadline);
        entries.insert(key, Entry { record, eviction });
    }

    /// Clone out the record for `key`, if any. Pure read.
    pub(crate) async fn get(&self, key: &Key) -> Option<OtpRecord> {
        let entries = self.entries.lock().await;
        entries.get(key).map(|entry| entry.record.clone())
    }

    /// Atomically inspect and mutate the record for `key` while the store
    /// lock is held. A `Remove` verdict deletes the entry and cancels its
    /// timer. Returns `None` when no record exists.
    pub(crate) async fn update<R>(
        &self,
        key: &Key,
        f: impl FnOnce(&mut OtpRecord) -> (Verdict, R),
    ) -> Option<R> {
        let mut entries = self.entries.lock().await;
        let entry = entries.get_mut(key)?;
        let (verdict, result) = f(&mut entry.record);
        if verdict == Verdict::Remove {
            if let Some(entry) = entries.remove(key) {
                entry.eviction.abort();
            }
        }
        Some(result)
    }

    /// Delete every record for `identifier` across all purposes. Returns
    /// the number of records removed.
    pub(crate) async fn clear_identifier(&self, identifier: &str) -> usize {
        let mut entries = self.entries.lock().await;
        let keys: Vec<Key> = entries
            .keys()
            .filter(|(id, _)| id == identifier)
            .cloned()
            .collect();
        for key in &keys {
            if let Some(entry) = entries.remove(key) {
                entry.eviction.abort();
            }
        }
        keys.len()
    }

    /// Drop every record and cancel all pending eviction timers. Without
    /// this, timers parked on far-off deadlines keep their tasks alive
    /// until the runtime shuts down.
    pub(crate) async fn shutdown(&self) {
        let mut entries = self.entries.lock().await;
        for (_, entry) in entries.drain() {
            entry.eviction.abort();
        }
    }

    #[cfg(test)]
    pub(crate) async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }
}

/// The task holds only a weak reference: dropping the store frees the map
/// immediately while parked timers exit on their next wakeup.
fn spawn_eviction(entries: Weak<Entries>, key: Key, deadline: Instant) -> JoinHandle<()> {
    tokio::spawn(async move {
        sleep_until(deadline).await;
        if let Some(entries) = entries.upgrade() {
            let mut entries = entries.lock().await;
            if entries.remove(&key).is_some() {
                debug!(identifier = %key.0, purpose = %key.1, "evicted expired record");
            }
        }
    })
}
