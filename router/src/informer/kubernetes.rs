//! Kubernetes event informer
//!
//! Adapts `kube::runtime::watcher` over `core/v1` `Event` objects to the
//! typed [`EventHandler`] contract:
//!
//! - watcher `Apply` / `Delete` become add, update or delete through the
//!   [`InformerStore`]
//! - `Init` .. `InitDone` is a relist; the first `InitDone` marks the cache
//!   synced
//! - a resync timer replays the cache as unchanged updates
//!
//! Reconnects and backoff are left to the watcher.

use super::{sync_channel, EventHandler, HasSynced, InformerStore, SyncNotifier};
use eventrouter_core::{EventRecord, ObjectReference};
use futures::StreamExt;
use k8s_openapi::api::core::v1::Event as KubeEvent;
use kube::runtime::{watcher, WatchStreamExt};
use kube::{Api, Client};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tracing::{info, warn};

/// Watches cluster events and feeds registered handlers
pub struct KubeEventInformer {
    api: Api<KubeEvent>,
    store: InformerStore,
    resync_period: Option<Duration>,
    notifier: SyncNotifier,
    synced: HasSynced,
    scope: String,
}

impl KubeEventInformer {
    /// Watch events in `namespace`, or in all namespaces when `None`
    ///
    /// A `resync_period` of `None` disables resync replays.
    pub fn new(client: Client, namespace: Option<&str>, resync_period: Option<Duration>) -> Self {
        let (api, scope) = match namespace {
            Some(ns) => (Api::namespaced(client, ns), ns.to_string()),
            None => (Api::all(client), "*".to_string()),
        };
        let (notifier, synced) = sync_channel();

        Self {
            api,
            store: InformerStore::new(),
            resync_period,
            notifier,
            synced,
            scope,
        }
    }

    /// Subscribe a handler; must happen before [`run`](Self::run)
    pub fn add_event_handler(&mut self, handler: Arc<dyn EventHandler>) {
        self.store.add_handler(handler);
    }

    /// Readiness signal for the initial list
    pub fn has_synced(&self) -> HasSynced {
        self.synced.clone()
    }

    /// Watch until `stop` fires or the stream ends
    pub async fn run(mut self, mut stop: watch::Receiver<bool>) {
        info!(
            namespace = %self.scope,
            resync_secs = self.resync_period.map(|p| p.as_secs()),
            "Starting event informer"
        );

        let stream = watcher(self.api.clone(), watcher::Config::default()).default_backoff();
        let mut stream = std::pin::pin!(stream);
        let mut resync = self.resync_period.map(resync_timer);

        loop {
            tokio::select! {
                _ = async { let _ = stop.wait_for(|stopped| *stopped).await; } => break,
                _ = tick(&mut resync) => self.store.resync().await,
                item = stream.next() => match item {
                    Some(Ok(event)) => self.handle(event).await,
                    Some(Err(e)) => warn!(error = %e, "Event watch error"),
                    None => {
                        warn!("Event watch stream ended");
                        break;
                    }
                },
            }
        }

        info!(cached = self.store.len(), "Event informer stopped");
    }

    async fn handle(&mut self, event: watcher::Event<KubeEvent>) {
        match event {
            watcher::Event::Apply(obj) => self.store.apply(record_from_kube(&obj)).await,
            watcher::Event::Delete(obj) => self.store.delete(record_from_kube(&obj)).await,
            watcher::Event::Init => self.store.begin_relist(),
            watcher::Event::InitApply(obj) => self.store.apply(record_from_kube(&obj)).await,
            watcher::Event::InitDone => {
                self.store.finish_relist().await;
                if !self.synced.is_synced() {
                    info!(cached = self.store.len(), "Event cache synced");
                    self.notifier.mark_synced();
                }
            }
        }
    }
}

fn resync_timer(period: Duration) -> Interval {
    let mut timer = tokio::time::interval_at(Instant::now() + period, period);
    timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
    timer
}

async fn tick(timer: &mut Option<Interval>) {
    match timer {
        Some(timer) => {
            timer.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

/// Narrow a Kubernetes `Event` to an [`EventRecord`]
///
/// Absent optional fields become empty strings. The source is the
/// reporting host, or the reporting component when no host is set.
///
/// Controller-emitted events carry no host, so they are labelled
/// `source="<component>"` rather than `source=""`. Dashboards keyed on the
/// host alone will not match them.
pub fn record_from_kube(event: &KubeEvent) -> EventRecord {
    let involved = &event.involved_object;
    let source = event
        .source
        .as_ref()
        .and_then(|source| {
            source
                .host
                .clone()
                .filter(|host| !host.is_empty())
                .or_else(|| source.component.clone())
        })
        .unwrap_or_default();

    EventRecord {
        name: event.metadata.name.clone().unwrap_or_default(),
        namespace: event.metadata.namespace.clone().unwrap_or_default(),
        event_type: event.type_.clone().unwrap_or_default(),
        involved_object: ObjectReference::new(
            involved.kind.clone().unwrap_or_default(),
            involved.name.clone().unwrap_or_default(),
            involved.namespace.clone().unwrap_or_default(),
        ),
        reason: event.reason.clone().unwrap_or_default(),
        message: event.message.clone().unwrap_or_default(),
        source,
        resource_version: event.metadata.resource_version.clone().unwrap_or_default(),
        count: event.count.unwrap_or_default(),
    }
}
