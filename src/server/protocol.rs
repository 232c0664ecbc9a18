//! Cache Transport Protocol
//!
//! The internal RPC is one HTTP route: `GET {ENDPOINT_CACHE}/:group?key=k`.
//! A 200 response carries the raw value bytes (`application/octet-stream`);
//! errors map onto plain-text HTTP statuses. The front-end API exposes the
//! same query shape under `/api`.

use serde::{Deserialize, Serialize};

/// Internal endpoint for peer-to-peer value fetches.
pub const ENDPOINT_CACHE: &str = "/_cache";

/// Public endpoint of the optional front-end API.
pub const ENDPOINT_API: &str = "/api";

/// Query string carrying the cache key; query encoding keeps arbitrary
/// key bytes out of the URL path.
#[derive(Debug, Serialize, Deserialize)]
pub struct KeyQuery {
    pub key: String,
}

/// URL of a peer's fetch endpoint for `group`.
pub fn peer_url(addr: &str, group: &str) -> String {
    format!("http://{}{}/{}", addr, ENDPOINT_CACHE, group)
}
