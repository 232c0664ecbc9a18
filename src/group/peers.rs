use std::sync::Arc;

use futures::future::BoxFuture;

use crate::error::CacheError;

/// Capability to fetch a `(group, key)` value from one remote peer.
///
/// Implemented by the transport client; the core depends only on this
/// contract and never on the wire format behind it.
pub trait PeerFetcher: Send + Sync {
    /// Returns the raw value bytes held by the peer for `key` in `group`.
    fn fetch<'a>(
        &'a self,
        group: &'a str,
        key: &'a str,
    ) -> BoxFuture<'a, Result<Vec<u8>, CacheError>>;
}

/// Capability to locate the peer that owns a key.
///
/// Implemented by the node server over its consistent-hash ring. The picker
/// never references the group that holds it, so membership updates touch
/// only server state.
pub trait PeerPicker: Send + Sync {
    /// Returns the fetcher for the owning remote peer, or `None` when the
    /// key belongs to this node (load locally).
    fn pick_peer(&self, key: &str) -> Option<Arc<dyn PeerFetcher>>;

    /// Invoked when the owning group is destroyed. Servers stop themselves
    /// here; standalone pickers need not care.
    fn shutdown(&self) {}
}
