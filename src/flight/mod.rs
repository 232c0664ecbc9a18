//! Single-Flight Module
//!
//! De-duplicates concurrent identical work. When several tasks ask for the
//! same key at once, one of them (the leader) runs the work while the rest
//! wait and share the leader's result. Nothing is cached here: the entry is
//! dropped the moment the leader finishes, so a later caller starts a fresh
//! flight.

pub mod coalescer;

pub use coalescer::Flight;

#[cfg(test)]
mod tests;
