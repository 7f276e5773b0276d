//! Informer contract
//!
//! The router is driven entirely by callbacks from a watch collaborator.
//! This module fixes the shape of that collaboration:
//!
//! ```text
//! watch stream ──► InformerStore ──► EventHandler::{on_add, on_update, on_delete}
//!                       │
//!                       └─► SyncNotifier ──► HasSynced (initial list delivered)
//! ```
//!
//! Callbacks receive typed [`EventRecord`]s; converting upstream objects is
//! the adapter's job (see [`kubernetes`]).

pub mod kubernetes;

use async_trait::async_trait;
use eventrouter_core::EventRecord;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::debug;

pub use self::kubernetes::KubeEventInformer;

/// Receives informer notifications
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// A new object, including every object of the initial list
    async fn on_add(&self, record: &EventRecord);

    /// A change notification or a resync replay of an existing object
    async fn on_update(&self, old: &EventRecord, new: &EventRecord);

    /// The object was removed upstream
    async fn on_delete(&self, record: &EventRecord);
}

/// Readiness flag set once the informer's initial list has been delivered
#[derive(Clone)]
pub struct HasSynced {
    rx: watch::Receiver<bool>,
}

impl HasSynced {
    /// Whether the initial list has been delivered
    pub fn is_synced(&self) -> bool {
        *self.rx.borrow()
    }

    /// Wait for the initial list to be delivered
    ///
    /// Returns `false` if the informer went away before syncing.
    pub async fn wait(&mut self) -> bool {
        self.rx.wait_for(|synced| *synced).await.is_ok()
    }
}

/// Informer side of [`HasSynced`]
pub struct SyncNotifier {
    tx: watch::Sender<bool>,
}

impl SyncNotifier {
    /// Mark the initial list as delivered
    pub fn mark_synced(&self) {
        self.tx.send_replace(true);
    }
}

/// Create a linked notifier / readiness pair
pub fn sync_channel() -> (SyncNotifier, HasSynced) {
    let (tx, rx) = watch::channel(false);
    (SyncNotifier { tx }, HasSynced { rx })
}

/// Block until `synced` reports the initial list, `stop` fires, or
/// `timeout` elapses
///
/// Returns `true` only in the first case. A closed stop channel counts as
/// stop.
pub async fn wait_for_cache_sync(
    stop: &mut watch::Receiver<bool>,
    synced: &mut HasSynced,
    timeout: Option<Duration>,
) -> bool {
    if synced.is_synced() {
        return true;
    }

    let wait = async {
        tokio::select! {
            synced = synced.wait() => synced,
            _ = async { let _ = stop.wait_for(|stopped| *stopped).await; } => false,
        }
    };

    match timeout {
        Some(limit) => tokio::time::timeout(limit, wait).await.unwrap_or(false),
        None => wait.await,
    }
}

/// Local cache that turns a raw watch stream into paired callbacks
///
/// Objects are keyed by `namespace/name`. An apply for a known key is an
/// update carrying the cached snapshot as `old`; an unknown key is an add.
/// A relist (begin, applies, finish) deletes cached objects the new list
/// no longer contains. [`resync`](Self::resync) replays the whole cache as
/// updates with identical old and new snapshots.
pub struct InformerStore {
    items: HashMap<String, EventRecord>,
    relist_seen: Option<HashSet<String>>,
    handlers: Vec<Arc<dyn EventHandler>>,
}

impl InformerStore {
    pub fn new() -> Self {
        Self {
            items: HashMap::new(),
            relist_seen: None,
            handlers: Vec::new(),
        }
    }

    /// Subscribe a handler to every subsequent notification
    pub fn add_handler(&mut self, handler: Arc<dyn EventHandler>) {
        self.handlers.push(handler);
    }

    /// Number of cached objects
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Cached snapshot for a `namespace/name` key
    pub fn get(&self, key: &str) -> Option<&EventRecord> {
        self.items.get(key)
    }

    /// Record an object observed by a watch or list
    pub async fn apply(&mut self, record: EventRecord) {
        let key = record.key();
        if let Some(seen) = self.relist_seen.as_mut() {
            seen.insert(key.clone());
        }

        match self.items.insert(key, record.clone()) {
            Some(old) => {
                for handler in &self.handlers {
                    handler.on_update(&old, &record).await;
                }
            }
            None => {
                for handler in &self.handlers {
                    handler.on_add(&record).await;
                }
            }
        }
    }

    /// Record an object removed upstream
    ///
    /// Handlers see the last cached snapshot when there is one.
    pub async fn delete(&mut self, record: EventRecord) {
        let last = self.items.remove(&record.key()).unwrap_or(record);
        for handler in &self.handlers {
            handler.on_delete(&last).await;
        }
    }

    /// Start a full relist
    pub fn begin_relist(&mut self) {
        self.relist_seen = Some(HashSet::new());
    }

    /// Finish a relist, deleting objects the list did not contain
    pub async fn finish_relist(&mut self) {
        let Some(seen) = self.relist_seen.take() else {
            return;
        };

        let gone: Vec<String> = self
            .items
            .keys()
            .filter(|key| !seen.contains(*key))
            .cloned()
            .collect();

        debug!(listed = seen.len(), removed = gone.len(), "Relist complete");

        for key in gone {
            if let Some(record) = self.items.remove(&key) {
                for handler in &self.handlers {
                    handler.on_delete(&record).await;
                }
            }
        }
    }

    /// Replay every cached object as an unchanged update
    pub async fn resync(&self) {
        debug!(objects = self.items.len(), "Resyncing informer cache");
        for record in self.items.values() {
            for handler in &self.handlers {
                handler.on_update(record, record).await;
            }
        }
    }
}

impl Default for InformerStore {
    fn default() -> Self {
        Self::new()
    }
}
