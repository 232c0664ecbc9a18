use std::collections::HashMap;

use super::view::ByteView;

/// Invoked with each evicted pair, after it has left the store.
pub type EvictCallback = Box<dyn FnMut(&str, &ByteView) + Send>;

/// Sentinel indices in the node arena.
const HEAD: usize = 0; // most-recently-used end
const TAIL: usize = 1; // least-recently-used end
const NULL: usize = usize::MAX;

struct Node {
    /// `None` only for the HEAD and TAIL sentinels and freed slots.
    key: Option<String>,
    value: Option<ByteView>,
    prev: usize,
    next: usize,
}

/// Byte-budgeted LRU store.
///
/// Entries cost `key.len() + value.len()` bytes against `max_bytes`. Inserts
/// evict from the cold end until the budget holds again; a single entry larger
/// than the whole budget is allowed to remain alone rather than looping
/// forever. A budget of zero or less turns the store into a no-op sink.
///
/// The recency list is an index-arena doubly-linked list, so hits, inserts,
/// and evictions are all O(1) without raw pointers.
///
/// Not concurrency-safe; the owning group serializes access with a mutex.
pub struct LruCache {
    max_bytes: i64,
    cur_bytes: i64,
    nodes: Vec<Node>,
    index: HashMap<String, usize>,
    free_list: Vec<usize>,
    on_evict: Option<EvictCallback>,
}

impl LruCache {
    pub fn new(max_bytes: i64, on_evict: Option<EvictCallback>) -> Self {
        let mut nodes = Vec::with_capacity(16);
        nodes.push(Node {
            key: None,
            value: None,
            prev: NULL,
            next: TAIL,
        });
        nodes.push(Node {
            key: None,
            value: None,
            prev: HEAD,
            next: NULL,
        });

        Self {
            max_bytes,
            cur_bytes: 0,
            nodes,
            index: HashMap::new(),
            free_list: Vec::new(),
            on_evict,
        }
    }

    /// Inserts or updates `key`, then evicts cold entries until the budget
    /// holds again. Updates adjust the byte count in place and refresh
    /// recency; they never evict the updated entry itself.
    pub fn add(&mut self, key: &str, value: ByteView) {
        if self.max_bytes <= 0 {
            return;
        }

        if let Some(&idx) = self.index.get(key) {
            let old_len = self.nodes[idx].value.as_ref().map(ByteView::len).unwrap_or(0);
            self.cur_bytes += value.len() as i64 - old_len as i64;
            self.nodes[idx].value = Some(value);
            self.unlink(idx);
            self.link_after_head(idx);
        } else {
            self.cur_bytes += (key.len() + value.len()) as i64;
            let idx = self.alloc_node(key.to_string(), value);
            self.index.insert(key.to_string(), idx);
            self.link_after_head(idx);
        }

        // A sole oversized entry stays; everything colder goes.
        while self.cur_bytes > self.max_bytes && self.index.len() > 1 {
            self.remove_oldest();
        }
    }

    /// Looks up `key`, promoting it to most-recently-used on a hit.
    pub fn get(&mut self, key: &str) -> Option<ByteView> {
        let &idx = self.index.get(key)?;
        self.unlink(idx);
        self.link_after_head(idx);
        self.nodes[idx].value.clone()
    }

    /// Evicts the least-recently-used entry and fires the eviction callback.
    /// No-op on an empty store.
    pub fn remove_oldest(&mut self) {
        let idx = self.nodes[TAIL].prev;
        if idx == HEAD {
            return;
        }
        self.unlink(idx);
        let key = self.nodes[idx].key.take().expect("linked node has a key");
        let value = self.nodes[idx].value.take().expect("linked node has a value");
        self.index.remove(&key);
        self.cur_bytes -= (key.len() + value.len()) as i64;
        self.free_list.push(idx);
        if let Some(on_evict) = self.on_evict.as_mut() {
            on_evict(&key, &value);
        }
    }

    /// Number of resident entries.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Bytes currently charged against the budget.
    pub fn used_bytes(&self) -> i64 {
        self.cur_bytes
    }

    /// Links `idx` immediately after HEAD (marks it most-recently-used).
    fn link_after_head(&mut self, idx: usize) {
        let old_first = self.nodes[HEAD].next;
        self.nodes[idx].prev = HEAD;
        self.nodes[idx].next = old_first;
        self.nodes[HEAD].next = idx;
        self.nodes[old_first].prev = idx;
    }

    /// Detaches `idx` from its current position in the list.
    fn unlink(&mut self, idx: usize) {
        let prev = self.nodes[idx].prev;
        let next = self.nodes[idx].next;
        self.nodes[prev].next = next;
        self.nodes[next].prev = prev;
        self.nodes[idx].prev = NULL;
        self.nodes[idx].next = NULL;
    }

    /// Allocates a detached node, reusing freed slots when available.
    fn alloc_node(&mut self, key: String, value: ByteView) -> usize {
        if let Some(idx) = self.free_list.pop() {
            self.nodes[idx].key = Some(key);
            self.nodes[idx].value = Some(value);
            self.nodes[idx].prev = NULL;
            self.nodes[idx].next = NULL;
            idx
        } else {
            let idx = self.nodes.len();
            self.nodes.push(Node {
                key: Some(key),
                value: Some(value),
                prev: NULL,
                next: NULL,
            });
            idx
        }
    }
}
