//! Registry Module
//!
//! Service discovery and liveness against a strongly-consistent metadata
//! store. Each node publishes `<service>/<addr>` under a leased TTL and
//! keeps the lease alive for as long as it runs; peers learn the fleet by
//! taking a snapshot of the prefix and then watching it for put/delete
//! events.
//!
//! The store itself is an external collaborator, imported through the
//! [`Registry`] trait: `EtcdRegistry` speaks to a real etcd cluster, while
//! `MemoryRegistry` provides the same contract in-process for tests and
//! single-machine demos.

pub mod etcd;
pub mod memory;
pub mod types;

pub use etcd::EtcdRegistry;
pub use memory::MemoryRegistry;
pub use types::{Registry, RegistryEvent, DEFAULT_LEASE_TTL, DEFAULT_SERVICE};
