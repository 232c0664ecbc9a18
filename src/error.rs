//! Crate-wide error type for the cache data plane.
//!
//! The single-flight coalescer hands one load result to every waiting caller,
//! so the error must be `Clone`. Control-plane plumbing (registry sessions,
//! server startup) uses `anyhow::Result` instead and never leaks into here.

use thiserror::Error;

/// Errors surfaced by cache reads and topology configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
    /// A caller asked for the empty key.
    #[error("key is required")]
    EmptyKey,

    /// An RPC named a group this process has not created.
    #[error("group {0} not found")]
    GroupUnknown(String),

    /// The authoritative source has no value for this key.
    #[error("key {0} not found")]
    NotFound(String),

    /// The user loader failed for a reason other than a missing key.
    #[error("loader failed: {0}")]
    Loader(String),

    /// The transport could not obtain the value from the owning peer.
    /// Callers fall back to a local load on this error.
    #[error("peer {addr} unreachable: {reason}")]
    PeerUnreachable { addr: String, reason: String },

    /// The in-flight leader for this key was cancelled before producing
    /// a result. Retrying starts a fresh flight.
    #[error("in-flight load abandoned")]
    FlightAbandoned,

    /// An address failed `host:port` validation.
    #[error("invalid address {0}, expected host:port")]
    AddrInvalid(String),

    /// `start` was called on a server that is already running or stopped.
    #[error("server already started")]
    AlreadyStarted,
}

impl CacheError {
    pub fn peer_unreachable(addr: impl Into<String>, reason: impl ToString) -> Self {
        Self::PeerUnreachable {
            addr: addr.into(),
            reason: reason.to_string(),
        }
    }
}
