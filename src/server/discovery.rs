//! Membership Watcher
//!
//! Keeps one server's topology in step with the registry: an initial
//! snapshot of the service prefix, then an incremental watch applying
//! put/delete events to the ring and client map. Watch sessions run in
//! their own tasks so a panic on a malformed event is contained, logged,
//! and retried instead of taking the node down.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::watch;

use super::service::Server;
use crate::registry::{RegistryEvent, DEFAULT_SERVICE};

/// Base delay before re-opening a failed watch; a little jitter keeps a
/// restarted fleet from stampeding the registry in lockstep.
const WATCH_BACKOFF: Duration = Duration::from_millis(500);

/// Supervises watch sessions until the server shuts down.
pub async fn watch_peers(server: Arc<Server>) {
    let mut shutdown = server.subscribe_shutdown();

    while !*shutdown.borrow() {
        let session = {
            let server = server.clone();
            let shutdown = shutdown.clone();
            tokio::spawn(async move { watch_session(server, shutdown).await })
        };

        match session.await {
            // Clean shutdown observed inside the session.
            Ok(Ok(())) => return,
            Ok(Err(e)) => {
                tracing::warn!("[{}] membership watch failed: {}", server.addr(), e);
            }
            Err(join_error) => {
                tracing::error!(
                    "[{}] membership watch panicked: {}",
                    server.addr(),
                    join_error
                );
            }
        }

        if *shutdown.borrow() {
            return;
        }
        let jitter = rand::random::<u64>() % 200;
        tokio::time::sleep(WATCH_BACKOFF + Duration::from_millis(jitter)).await;
    }
}

/// One snapshot-then-watch session. Returns `Ok(())` only on shutdown;
/// every other exit is an error the supervisor retries.
async fn watch_session(server: Arc<Server>, mut shutdown: watch::Receiver<bool>) -> Result<()> {
    let registry = server.registry();
    let prefix = format!("{}/", DEFAULT_SERVICE);

    let (pairs, revision) = registry.list(&prefix).await?;
    for (_, endpoint) in pairs {
        apply_put(&server, &endpoint);
    }

    let mut events = registry.watch(&prefix, revision + 1).await?;
    loop {
        tokio::select! {
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    return Ok(());
                }
            }
            event = events.recv() => {
                match event {
                    Some(RegistryEvent::Put { value, .. }) => apply_put(&server, &value),
                    Some(RegistryEvent::Delete { key }) => apply_delete(&server, &key, &prefix),
                    None => anyhow::bail!("watch channel closed"),
                }
            }
        }
    }
}

/// A known endpoint re-announcing itself is a metadata refresh; only an
/// unknown one mutates the topology.
fn apply_put(server: &Server, endpoint: &str) {
    match server.add_peer(endpoint) {
        Ok(true) => tracing::info!("[{}] discovered peer {}", server.addr(), endpoint),
        Ok(false) => {}
        Err(e) => {
            tracing::warn!(
                "[{}] ignoring registration with bad endpoint {}: {}",
                server.addr(),
                endpoint,
                e
            );
        }
    }
}

fn apply_delete(server: &Server, key: &str, prefix: &str) {
    let endpoint = key.strip_prefix(prefix).unwrap_or(key);
    server.remove_peer(endpoint);
    tracing::info!("[{}] peer {} left the fleet", server.addr(), endpoint);
}
