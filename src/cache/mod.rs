//! Local Cache Module
//!
//! The per-node storage layer: an immutable byte-sequence handle (`ByteView`)
//! and a byte-budgeted LRU store (`LruCache`).
//!
//! ## Core Concepts
//! - **Byte accounting**: every entry costs `key.len() + value.len()` bytes
//!   against a fixed budget; the store evicts from the cold end to stay under it.
//! - **Recency**: a hit or an update moves the entry to the hot end of an
//!   arena-backed doubly-linked list.
//! - **Eviction callbacks**: callers may observe every evicted pair.
//!
//! `LruCache` is not concurrency-safe; the group layer guards it with a mutex.

pub mod lru;
pub mod view;

pub use lru::{EvictCallback, LruCache};
pub use view::ByteView;
