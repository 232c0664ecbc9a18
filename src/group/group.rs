use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use once_cell::sync::Lazy;
use parking_lot::RwLock;

use crate::cache::ByteView;
use crate::error::CacheError;
use crate::flight::Flight;

use super::cache::MainCache;
use super::peers::{PeerFetcher, PeerPicker};
use super::source::Loader;

/// Process-wide group index. Creation and destruction are rare; lookup is
/// the hot path, so readers take the shared mode.
static GROUPS: Lazy<RwLock<HashMap<String, Arc<Group>>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// A named cache namespace.
///
/// Composes the local LRU store, the single-flight coalescer, the
/// authoritative loader, and (once peering is registered) the picker that
/// routes keys to their owning peer.
pub struct Group {
    name: String,
    loader: Arc<dyn Loader>,
    main_cache: MainCache,
    peers: OnceLock<Arc<dyn PeerPicker>>,
    flight: Flight<ByteView>,
}

/// Creates a group and registers it in the process-wide index under `name`.
pub fn new_group(name: &str, cache_bytes: i64, loader: Arc<dyn Loader>) -> Arc<Group> {
    let group = Arc::new(Group {
        name: name.to_string(),
        loader,
        main_cache: MainCache::new(cache_bytes),
        peers: OnceLock::new(),
        flight: Flight::new(),
    });
    GROUPS.write().insert(name.to_string(), group.clone());
    tracing::info!("group [{}] created with budget {} bytes", name, cache_bytes);
    group
}

/// Looks up a previously created group.
pub fn get_group(name: &str) -> Option<Arc<Group>> {
    GROUPS.read().get(name).cloned()
}

/// Unregisters `name` and stops its attached server, if any.
pub fn destroy_group(name: &str) {
    let group = GROUPS.write().remove(name);
    if let Some(group) = group {
        if let Some(picker) = group.peers.get() {
            picker.shutdown();
        }
        tracing::info!("group [{}] destroyed", name);
    }
}

impl Group {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Attaches the peer picker. May be called at most once; a second call
    /// is a programming bug and panics.
    pub fn register_peers(&self, picker: Arc<dyn PeerPicker>) {
        if self.peers.set(picker).is_err() {
            panic!("register_peers called more than once on group [{}]", self.name);
        }
    }

    /// Returns the value for `key`, consulting the local store, then the
    /// owning peer, then the loader. Concurrent misses for one key collapse
    /// into a single load.
    pub async fn get(&self, key: &str) -> Result<ByteView, CacheError> {
        if key.is_empty() {
            return Err(CacheError::EmptyKey);
        }

        if let Some(view) = self.main_cache.get(key) {
            tracing::debug!("group [{}] hit for {}", self.name, key);
            return Ok(view);
        }

        self.flight.work(key, || self.load(key)).await
    }

    /// One coalesced load: try the owning peer first, fall back to the
    /// local loader on any transport failure.
    async fn load(&self, key: &str) -> Result<ByteView, CacheError> {
        if let Some(picker) = self.peers.get()
            && let Some(peer) = picker.pick_peer(key)
        {
            match self.fetch_from_peer(peer.as_ref(), key).await {
                Ok(view) => return Ok(view),
                Err(e) => {
                    tracing::warn!("group [{}] peer fetch for {} failed: {}", self.name, key, e);
                }
            }
        }
        self.load_locally(key).await
    }

    /// Fetches from the owning peer. The result is NOT cached locally; the
    /// authoritative copy lives on the owner, and a second local copy would
    /// go stale silently across topology changes.
    async fn fetch_from_peer(
        &self,
        peer: &dyn PeerFetcher,
        key: &str,
    ) -> Result<ByteView, CacheError> {
        let bytes = peer.fetch(&self.name, key).await?;
        Ok(ByteView::from_vec(bytes))
    }

    /// Runs the user loader and populates the local store with its result.
    async fn load_locally(&self, key: &str) -> Result<ByteView, CacheError> {
        let bytes = self.loader.load(key).await?;
        let view = ByteView::from_vec(bytes);
        self.main_cache.add(key, view.clone());
        Ok(view)
    }

    /// Number of entries resident in the local store.
    pub fn cache_len(&self) -> usize {
        self.main_cache.len()
    }

    /// Bytes resident in the local store.
    pub fn cache_used_bytes(&self) -> i64 {
        self.main_cache.used_bytes()
    }
}
