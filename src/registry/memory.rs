use anyhow::Result;
use futures::future::BoxFuture;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use tokio::sync::{broadcast, mpsc, watch};

use super::types::{Registry, RegistryEvent};

/// How many trailing events the replay log keeps. A watcher resuming from
/// an older revision re-lists instead.
const LOG_CAPACITY: usize = 1024;

struct State {
    entries: BTreeMap<String, String>,
    revision: i64,
    log: Vec<(i64, RegistryEvent)>,
}

/// In-process registry with the same contract as the etcd-backed one:
/// revisioned entries, prefix snapshots, and replayable watches. A
/// registration lives exactly as long as its keep-alive task, mirroring a
/// lease that stops being renewed.
///
/// Backs the integration tests and single-machine demo clusters.
pub struct MemoryRegistry {
    state: Mutex<State>,
    events: broadcast::Sender<(i64, RegistryEvent)>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(LOG_CAPACITY);
        Self {
            state: Mutex::new(State {
                entries: BTreeMap::new(),
                revision: 0,
                log: Vec::new(),
            }),
            events,
        }
    }

    /// Applies one mutation and publishes it, all under the state lock so
    /// watchers observe a single total order of revisions.
    fn apply(&self, event: RegistryEvent) {
        let mut state = self.state.lock();
        state.revision += 1;
        let revision = state.revision;

        match &event {
            RegistryEvent::Put { key, value } => {
                state.entries.insert(key.clone(), value.clone());
            }
            RegistryEvent::Delete { key } => {
                state.entries.remove(key);
            }
        }

        if state.log.len() >= LOG_CAPACITY {
            state.log.remove(0);
        }
        state.log.push((revision, event.clone()));
        // Nobody listening is fine.
        let _ = self.events.send((revision, event));
    }

    fn put(&self, key: String, value: String) {
        self.apply(RegistryEvent::Put { key, value });
    }

    fn delete(&self, key: String) {
        self.apply(RegistryEvent::Delete { key });
    }
}

impl Default for MemoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry for MemoryRegistry {
    fn register<'a>(
        &'a self,
        service: &'a str,
        addr: &'a str,
        mut stop: watch::Receiver<bool>,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let key = format!("{}/{}", service, addr);
            self.put(key.clone(), addr.to_string());
            tracing::info!("[{}] registered in memory registry", addr);

            // A dropped sender counts as a revoke too.
            while !*stop.borrow() {
                if stop.changed().await.is_err() {
                    break;
                }
            }

            self.delete(key);
            tracing::info!("[{}] revoked from memory registry", addr);
            Ok(())
        })
    }

    fn list<'a>(&'a self, prefix: &'a str) -> BoxFuture<'a, Result<(Vec<(String, String)>, i64)>> {
        Box::pin(async move {
            let state = self.state.lock();
            let pairs = state
                .entries
                .range(prefix.to_string()..)
                .take_while(|(key, _)| key.starts_with(prefix))
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect();
            Ok((pairs, state.revision))
        })
    }

    fn watch<'a>(
        &'a self,
        prefix: &'a str,
        from_revision: i64,
    ) -> BoxFuture<'a, Result<mpsc::Receiver<RegistryEvent>>> {
        Box::pin(async move {
            let prefix = prefix.to_string();
            let (tx, rx) = mpsc::channel(64);

            // Snapshot the replay tail and subscribe under one lock so no
            // revision can slip between the two. Matches the store contract:
            // events at or after `from_revision` are delivered.
            let (replay, mut live, mut cursor) = {
                let state = self.state.lock();
                let replay: Vec<_> = state
                    .log
                    .iter()
                    .filter(|(revision, event)| {
                        *revision >= from_revision && event_key(event).starts_with(&prefix)
                    })
                    .cloned()
                    .collect();
                (replay, self.events.subscribe(), from_revision - 1)
            };

            tokio::spawn(async move {
                for (revision, event) in replay {
                    cursor = revision;
                    if tx.send(event).await.is_err() {
                        return;
                    }
                }
                while let Ok((revision, event)) = live.recv().await {
                    if revision <= cursor || !event_key(&event).starts_with(&prefix) {
                        continue;
                    }
                    cursor = revision;
                    if tx.send(event).await.is_err() {
                        return;
                    }
                }
                // Lagged or closed; dropping tx tells the watcher to re-list.
            });

            Ok(rx)
        })
    }
}

fn event_key(event: &RegistryEvent) -> &str {
    match event {
        RegistryEvent::Put { key, .. } => key,
        RegistryEvent::Delete { key } => key,
    }
}
