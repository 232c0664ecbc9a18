//! Group Module
//!
//! A `Group` is a named cache namespace tying the local LRU store, the
//! single-flight coalescer, an optional peer picker, and the user-supplied
//! data-source loader into one read path:
//!
//! caller -> `Group::get` -> LRU lookup -> on miss, single-flight ->
//! {owning peer over the transport, or the local loader} -> return.
//!
//! Only locally loaded values populate the LRU; values fetched from a peer
//! stay cached on the peer that owns them.
//!
//! Groups live in a process-wide index so the RPC layer can resolve them
//! by name.

pub mod cache;
pub mod group;
pub mod peers;
pub mod source;

pub use group::{destroy_group, get_group, new_group, Group};
pub use peers::{PeerFetcher, PeerPicker};
pub use source::{Loader, LoaderFn};
