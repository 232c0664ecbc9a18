//! Consistent Hash Ring Module
//!
//! Deterministic key-to-owner placement for the peer fleet.
//!
//! ## Core Concepts
//! - **Virtual nodes**: each real node contributes `replicas` points to the
//!   ring, smoothing the key distribution across an uneven fleet.
//! - **Minimal re-mapping**: when a node joins or leaves, only the keys whose
//!   clockwise-nearest point changed move to a new owner.
//! - **Pluggable hash**: any `bytes -> u32` function; CRC32 by default.

pub mod hashring;

pub use hashring::{HashRing, RingHashFn, DEFAULT_REPLICAS};

#[cfg(test)]
mod tests;
