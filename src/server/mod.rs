//! Node Server Module
//!
//! The control plane of one cache node. The server owns the peer topology
//! (consistent-hash ring + one HTTP client per peer), serves the internal
//! cache RPC, registers itself in the registry under a lease, and runs the
//! membership watcher that keeps the ring in step with the fleet.
//!
//! The server implements `PeerPicker` for the group layer; it never holds a
//! reference back to a group, so membership updates touch only server state.

pub mod client;
pub mod discovery;
pub mod handlers;
pub mod protocol;
pub mod service;

pub use client::Client;
pub use service::Server;

#[cfg(test)]
mod tests;
