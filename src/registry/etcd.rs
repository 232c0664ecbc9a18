use std::time::Duration;

use anyhow::{Context, Result};
use etcd_client::{Client, EventType, GetOptions, PutOptions, WatchOptions};
use futures::future::BoxFuture;
use tokio::sync::{mpsc, watch};

use super::types::{Registry, RegistryEvent, DEFAULT_LEASE_TTL};

/// Registry backed by an etcd cluster.
///
/// Each trait method opens its own client session, so a stalled watch
/// never interferes with a registration keep-alive.
pub struct EtcdRegistry {
    endpoints: Vec<String>,
}

impl EtcdRegistry {
    pub fn new(endpoints: Vec<String>) -> Self {
        Self { endpoints }
    }

    async fn connect(&self) -> Result<Client> {
        Client::connect(&self.endpoints, None)
            .await
            .with_context(|| format!("connect to registry {:?}", self.endpoints))
    }
}

impl Registry for EtcdRegistry {
    fn register<'a>(
        &'a self,
        service: &'a str,
        addr: &'a str,
        mut stop: watch::Receiver<bool>,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let mut client = self.connect().await?;

            let lease = client
                .lease_grant(DEFAULT_LEASE_TTL, None)
                .await
                .context("grant lease")?;
            let lease_id = lease.id();

            let key = format!("{}/{}", service, addr);
            client
                .put(key, addr, Some(PutOptions::new().with_lease(lease_id)))
                .await
                .context("put registration under lease")?;

            let (mut keeper, mut responses) = client
                .lease_keep_alive(lease_id)
                .await
                .context("open keep-alive stream")?;
            tracing::info!("[{}] registered with lease {}", addr, lease_id);

            // Renew well inside the TTL window.
            let mut ticker =
                tokio::time::interval(Duration::from_secs((DEFAULT_LEASE_TTL as u64 / 3).max(1)));

            loop {
                tokio::select! {
                    changed = stop.changed() => {
                        if changed.is_err() || *stop.borrow() {
                            client.lease_revoke(lease_id).await.context("revoke lease")?;
                            tracing::info!("[{}] revoked lease {}", addr, lease_id);
                            return Ok(());
                        }
                    }
                    _ = ticker.tick() => {
                        keeper.keep_alive().await.context("send keep-alive")?;
                    }
                    message = responses.message() => {
                        match message.context("keep-alive stream")? {
                            Some(_) => {}
                            None => anyhow::bail!("keep-alive channel closed"),
                        }
                    }
                }
            }
        })
    }

    fn list<'a>(&'a self, prefix: &'a str) -> BoxFuture<'a, Result<(Vec<(String, String)>, i64)>> {
        Box::pin(async move {
            let mut client = self.connect().await?;
            let response = client
                .get(prefix, Some(GetOptions::new().with_prefix()))
                .await
                .with_context(|| format!("list prefix {}", prefix))?;

            let revision = response
                .header()
                .map(|header| header.revision())
                .unwrap_or_default();

            let mut pairs = Vec::with_capacity(response.kvs().len());
            for kv in response.kvs() {
                pairs.push((kv.key_str()?.to_string(), kv.value_str()?.to_string()));
            }
            Ok((pairs, revision))
        })
    }

    fn watch<'a>(
        &'a self,
        prefix: &'a str,
        from_revision: i64,
    ) -> BoxFuture<'a, Result<mpsc::Receiver<RegistryEvent>>> {
        Box::pin(async move {
            let mut client = self.connect().await?;
            let options = WatchOptions::new()
                .with_prefix()
                .with_start_revision(from_revision)
                .with_prev_key();
            let (watcher, mut stream) = client
                .watch(prefix, Some(options))
                .await
                .with_context(|| format!("watch prefix {}", prefix))?;

            let (tx, rx) = mpsc::channel(64);
            tokio::spawn(async move {
                // Keep the watcher handle alive for the stream's lifetime.
                let _watcher = watcher;
                loop {
                    let response = match stream.message().await {
                        Ok(Some(response)) => response,
                        Ok(None) => break,
                        Err(e) => {
                            tracing::warn!("registry watch stream failed: {}", e);
                            break;
                        }
                    };
                    for event in response.events() {
                        let Some(kv) = event.kv() else { continue };
                        let forwarded = match event.event_type() {
                            EventType::Put => RegistryEvent::Put {
                                key: kv.key_str().unwrap_or_default().to_string(),
                                value: kv.value_str().unwrap_or_default().to_string(),
                            },
                            EventType::Delete => RegistryEvent::Delete {
                                key: kv.key_str().unwrap_or_default().to_string(),
                            },
                        };
                        if tx.send(forwarded).await.is_err() {
                            return;
                        }
                    }
                }
                // Dropping tx closes the channel; the caller re-lists.
            });

            Ok(rx)
        })
    }
}
