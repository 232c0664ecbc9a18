//! Distributed In-Process Key-Value Cache Library
//!
//! This library crate defines the core modules that make up the cache fleet.
//! It serves as the foundation for the binary executable (`main.rs`).
//!
//! ## Architecture Modules
//! The system is composed of six loosely coupled subsystems:
//!
//! - **`cache`**: The per-node storage layer. A byte-budgeted LRU store with
//!   eviction callbacks, plus the immutable `ByteView` value wrapper.
//! - **`ring`**: The placement layer. A consistent-hash ring with virtual
//!   nodes, mapping every key to its owning peer with minimal re-mapping on
//!   membership change.
//! - **`flight`**: The coalescing layer. Collapses concurrent identical
//!   loads into a single execution whose result all callers share.
//! - **`group`**: The orchestration layer. A named namespace combining the
//!   store, the ring-backed peer picker, the coalescer, and the
//!   user-supplied authoritative loader into one read path.
//! - **`server`**: The control plane. Serves the peer-to-peer cache RPC,
//!   owns the topology, registers the node in the registry, and watches
//!   membership to keep the ring live.
//! - **`registry`**: The discovery layer. Lease-based service registration
//!   and prefix watches against an etcd-class metadata store, with an
//!   in-process implementation for tests and single-machine clusters.

pub mod cache;
pub mod error;
pub mod flight;
pub mod group;
pub mod registry;
pub mod ring;
pub mod server;
