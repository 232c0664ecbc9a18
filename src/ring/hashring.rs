use std::collections::HashMap;

/// Hash function mapping bytes onto the `u32` ring.
pub type RingHashFn = Box<dyn Fn(&[u8]) -> u32 + Send + Sync>;

/// Virtual points contributed by each real node.
pub const DEFAULT_REPLICAS: usize = 50;

/// Consistent hash ring with virtual nodes.
///
/// Keys and nodes share one `u32` hash space. A key is owned by the node
/// whose nearest clockwise virtual point covers it. Two virtual points
/// hashing to the same value are tolerated but leave the mapping ambiguous
/// (the last registration wins in `owners`); with CRC32 over `host:port`
/// inputs this does not occur in practice.
pub struct HashRing {
    replicas: usize,
    hash: RingHashFn,
    /// Virtual points, kept sorted ascending.
    points: Vec<u32>,
    /// Virtual point -> real node address.
    owners: HashMap<u32, String>,
}

impl HashRing {
    /// Creates a ring with `replicas` virtual points per node. `hash`
    /// defaults to CRC32 when not supplied.
    pub fn new(replicas: usize, hash: Option<RingHashFn>) -> Self {
        Self {
            replicas: replicas.max(1),
            hash: hash.unwrap_or_else(|| Box::new(crc32fast::hash)),
            points: Vec::new(),
            owners: HashMap::new(),
        }
    }

    /// Adds nodes to the ring. Each node lands on `replicas` virtual points
    /// hashed from `"{i}{node}"`. Registering a node twice replays the same
    /// points and is therefore idempotent.
    pub fn register<I, S>(&mut self, nodes: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for node in nodes {
            let node = node.as_ref();
            for i in 0..self.replicas {
                let point = (self.hash)(format!("{}{}", i, node).as_bytes());
                if !self.owners.contains_key(&point) {
                    self.points.push(point);
                }
                self.owners.insert(point, node.to_string());
            }
        }
        self.points.sort_unstable();
    }

    /// Removes nodes from the ring by recomputing and deleting each of
    /// their virtual points. Unknown nodes are a no-op.
    pub fn destroy<I, S>(&mut self, nodes: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for node in nodes {
            let node = node.as_ref();
            for i in 0..self.replicas {
                let point = (self.hash)(format!("{}{}", i, node).as_bytes());
                // Only drop points this node still owns; a collision may have
                // handed the point to a later registration.
                if self.owners.get(&point).is_some_and(|owner| owner == node) {
                    self.owners.remove(&point);
                    if let Ok(idx) = self.points.binary_search(&point) {
                        self.points.remove(idx);
                    }
                }
            }
        }
    }

    /// Returns the node owning `key`, or `None` on an empty ring. The owner
    /// is the first virtual point at or after `hash(key)`, wrapping around.
    pub fn get(&self, key: &str) -> Option<&str> {
        if self.points.is_empty() {
            return None;
        }
        let hash = (self.hash)(key.as_bytes());
        let idx = self.points.partition_point(|&point| point < hash) % self.points.len();
        self.owners.get(&self.points[idx]).map(String::as_str)
    }

    /// True when no node is registered.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// All distinct real nodes currently on the ring.
    pub fn nodes(&self) -> Vec<String> {
        let mut nodes: Vec<String> = self.owners.values().cloned().collect();
        nodes.sort();
        nodes.dedup();
        nodes
    }

    /// Sorted virtual points, exposed for placement diagnostics.
    pub fn points(&self) -> &[u32] {
        &self.points
    }
}
