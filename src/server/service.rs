use std::collections::HashMap;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::routing::get;
use axum::Router;
use parking_lot::Mutex;
use tokio::sync::watch;

use super::client::Client;
use super::discovery;
use super::handlers::handle_cache_fetch;
use super::protocol::ENDPOINT_CACHE;
use crate::error::CacheError;
use crate::group::{PeerFetcher, PeerPicker};
use crate::registry::{EtcdRegistry, Registry, DEFAULT_SERVICE};
use crate::ring::{HashRing, DEFAULT_REPLICAS};

/// Registry endpoint assumed when none is configured.
const DEFAULT_REGISTRY_ENDPOINT: &str = "127.0.0.1:2379";

/// Grace period before the watcher first reads the registry, letting our
/// own registration land so the snapshot already contains it.
const STABILIZATION_DELAY: Duration = Duration::from_secs(1);

/// Pause between registration attempts after a registry failure.
const REGISTER_RETRY_DELAY: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ServerStatus {
    Idle,
    Running,
    Stopped,
}

/// Ring and client map, mutated together so they never disagree: every
/// address on the ring has a client, and vice versa.
struct Topology {
    ring: HashRing,
    clients: HashMap<String, Arc<Client>>,
}

impl Topology {
    fn empty() -> Self {
        Self {
            ring: HashRing::new(DEFAULT_REPLICAS, None),
            clients: HashMap::new(),
        }
    }
}

/// One cache node's control plane.
///
/// Owns the peer topology and the server lifecycle; the group layer sees it
/// only through the [`PeerPicker`] capability.
pub struct Server {
    addr: String,
    status: Mutex<ServerStatus>,
    topology: Mutex<Topology>,
    shutdown: watch::Sender<bool>,
    registry: Arc<dyn Registry>,
}

impl Server {
    /// Creates a server speaking to the default etcd endpoint. `addr` must
    /// be `host:port` with a `localhost`, IPv4, or bracketed IPv6 host.
    pub fn new(addr: &str) -> Result<Arc<Self>, CacheError> {
        Self::with_registry(
            addr,
            Arc::new(EtcdRegistry::new(vec![DEFAULT_REGISTRY_ENDPOINT.to_string()])),
        )
    }

    /// Creates a server against an explicit registry implementation.
    pub fn with_registry(
        addr: &str,
        registry: Arc<dyn Registry>,
    ) -> Result<Arc<Self>, CacheError> {
        if !valid_peer_addr(addr) {
            return Err(CacheError::AddrInvalid(addr.to_string()));
        }
        let (shutdown, _) = watch::channel(false);
        Ok(Arc::new(Self {
            addr: addr.to_string(),
            status: Mutex::new(ServerStatus::Idle),
            topology: Mutex::new(Topology::empty()),
            shutdown,
            registry,
        }))
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Replaces the whole peer set: fresh ring, fresh clients. Static
    /// configuration counterpart of the incremental discovery updates.
    pub fn set_peers<I, S>(&self, addrs: I) -> Result<(), CacheError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let addrs: Vec<String> = addrs.into_iter().map(|a| a.as_ref().to_string()).collect();
        for addr in &addrs {
            if !valid_peer_addr(addr) {
                return Err(CacheError::AddrInvalid(addr.clone()));
            }
        }

        let mut topology = self.topology.lock();
        *topology = Topology::empty();
        topology.ring.register(&addrs);
        for addr in addrs {
            topology
                .clients
                .entry(addr.clone())
                .or_insert_with(|| Arc::new(Client::new(&addr)));
        }
        Ok(())
    }

    /// Adds one peer to the topology. Returns `false` when it was already
    /// present (a metadata refresh).
    pub fn add_peer(&self, addr: &str) -> Result<bool, CacheError> {
        if !valid_peer_addr(addr) {
            return Err(CacheError::AddrInvalid(addr.to_string()));
        }
        let mut topology = self.topology.lock();
        if topology.clients.contains_key(addr) {
            return Ok(false);
        }
        topology.ring.register([addr]);
        topology
            .clients
            .insert(addr.to_string(), Arc::new(Client::new(addr)));
        Ok(true)
    }

    /// Drops one peer's clients and ring points. Unknown peers are a no-op.
    pub fn remove_peer(&self, addr: &str) {
        let mut topology = self.topology.lock();
        topology.ring.destroy([addr]);
        topology.clients.remove(addr);
    }

    /// Addresses currently on the topology, self included once running.
    pub fn peer_addrs(&self) -> Vec<String> {
        let topology = self.topology.lock();
        let mut addrs: Vec<String> = topology.clients.keys().cloned().collect();
        addrs.sort();
        addrs
    }

    pub fn has_peer(&self, addr: &str) -> bool {
        self.topology.lock().clients.contains_key(addr)
    }

    pub(crate) fn subscribe_shutdown(&self) -> watch::Receiver<bool> {
        self.shutdown.subscribe()
    }

    pub(crate) fn registry(&self) -> Arc<dyn Registry> {
        self.registry.clone()
    }

    /// Runs the node: binds the cache RPC listener, keeps the registration
    /// lease alive, and watches the fleet. Blocks until [`Server::stop`]
    /// fires or the listener fails.
    pub async fn start(self: Arc<Self>) -> Result<()> {
        {
            let mut status = self.status.lock();
            if *status != ServerStatus::Idle {
                return Err(CacheError::AlreadyStarted.into());
            }
            *status = ServerStatus::Running;
        }

        // Seed ourselves so a single-node ring resolves every key locally.
        self.add_peer(&self.addr)?;

        let listener = tokio::net::TcpListener::bind(&self.addr).await?;
        tracing::info!("[{}] cache server listening", self.addr);

        let registration = {
            let server = self.clone();
            tokio::spawn(async move { server.registration_loop().await })
        };
        let watcher = {
            let server = self.clone();
            tokio::spawn(async move {
                tokio::time::sleep(STABILIZATION_DELAY).await;
                discovery::watch_peers(server).await;
            })
        };

        let app = Router::new().route(
            &format!("{}/:group", ENDPOINT_CACHE),
            get(handle_cache_fetch),
        );
        let mut shutdown = self.shutdown.subscribe();
        let result = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                if !*shutdown.borrow() {
                    let _ = shutdown.changed().await;
                }
            })
            .await;

        // Covers the fatal-error path; a no-op after a regular stop.
        self.stop();
        let _ = tokio::join!(registration, watcher);
        tracing::info!("[{}] cache server exited", self.addr);
        result.map_err(Into::into)
    }

    /// Keeps this node registered for as long as it runs. A lost registry
    /// session is retried; the data plane never notices.
    async fn registration_loop(self: Arc<Self>) {
        let mut shutdown = self.shutdown.subscribe();
        while !*shutdown.borrow() {
            let outcome = self
                .registry
                .register(DEFAULT_SERVICE, &self.addr, shutdown.clone())
                .await;
            match outcome {
                Ok(()) => return,
                Err(e) => {
                    tracing::warn!("[{}] registration lost: {}", self.addr, e);
                }
            }
            if *shutdown.borrow() {
                return;
            }
            tokio::time::sleep(REGISTER_RETRY_DELAY).await;
        }
    }

    /// Transitions Running -> Stopped, signalling every background task and
    /// the serve loop, then clears the topology. No-op unless running.
    pub fn stop(&self) {
        {
            let mut status = self.status.lock();
            if *status != ServerStatus::Running {
                return;
            }
            *status = ServerStatus::Stopped;
        }
        let _ = self.shutdown.send(true);
        *self.topology.lock() = Topology::empty();
        tracing::info!("[{}] cache server stopping", self.addr);
    }
}

impl PeerPicker for Server {
    /// Ring lookup under the topology mutex; `None` means load locally.
    fn pick_peer(&self, key: &str) -> Option<Arc<dyn PeerFetcher>> {
        let topology = self.topology.lock();
        let owner = topology.ring.get(key)?;
        if owner == self.addr {
            return None;
        }
        tracing::debug!("[{}] picked remote peer {}", self.addr, owner);
        let client: Arc<dyn PeerFetcher> = topology.clients.get(owner).cloned()?;
        Some(client)
    }

    fn shutdown(&self) {
        self.stop();
    }
}

/// Validates `host:port`: `localhost`, an IPv4 literal, or a bracketed
/// IPv6 literal, with a port in `1..=65535`.
pub fn valid_peer_addr(addr: &str) -> bool {
    let Some((host, port)) = addr.rsplit_once(':') else {
        return false;
    };
    if !port.parse::<u16>().is_ok_and(|p| p >= 1) {
        return false;
    }
    if host == "localhost" {
        return true;
    }
    if let Some(v6) = host.strip_prefix('[').and_then(|h| h.strip_suffix(']')) {
        return v6.parse::<Ipv6Addr>().is_ok();
    }
    host.parse::<Ipv4Addr>().is_ok()
}
