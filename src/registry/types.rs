use anyhow::Result;
use futures::future::BoxFuture;
use tokio::sync::{mpsc, watch};

/// Well-known service name; nodes publish `distcache/<addr>` -> `<addr>`.
pub const DEFAULT_SERVICE: &str = "distcache";

/// Seconds a registration survives without a keep-alive.
pub const DEFAULT_LEASE_TTL: i64 = 5;

/// A membership change observed under a watched prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryEvent {
    Put { key: String, value: String },
    Delete { key: String },
}

/// The registry contract the control plane imports.
///
/// Implementations must be safe to share across tasks; every method runs
/// its own session against the store, so one slow call never blocks
/// another.
pub trait Registry: Send + Sync {
    /// Publishes `addr` under `<service>/<addr>` with a leased TTL and
    /// keeps the lease alive until `stop` turns true (or its sender is
    /// dropped), then revokes the lease. Blocks for the lifetime of the
    /// registration.
    fn register<'a>(
        &'a self,
        service: &'a str,
        addr: &'a str,
        stop: watch::Receiver<bool>,
    ) -> BoxFuture<'a, Result<()>>;

    /// Snapshot of every `(key, value)` pair under `prefix`, together with
    /// the store revision the snapshot observed.
    fn list<'a>(&'a self, prefix: &'a str) -> BoxFuture<'a, Result<(Vec<(String, String)>, i64)>>;

    /// Incremental watch of `prefix` delivering every event with a revision
    /// at or after `from_revision`. The returned channel closes when the
    /// underlying watch does; callers re-list and re-watch.
    fn watch<'a>(
        &'a self,
        prefix: &'a str,
        from_revision: i64,
    ) -> BoxFuture<'a, Result<mpsc::Receiver<RegistryEvent>>>;
}
