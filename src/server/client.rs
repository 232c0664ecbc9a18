use std::time::Duration;

use futures::future::BoxFuture;
use reqwest::StatusCode;

use super::protocol::{peer_url, KeyQuery};
use crate::error::CacheError;
use crate::group::PeerFetcher;

/// Per-call deadline for a peer fetch.
const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP client for one remote peer.
///
/// Transport failures and unexpected statuses surface as
/// [`CacheError::PeerUnreachable`], which the group layer treats as a cue
/// to load locally instead.
pub struct Client {
    addr: String,
    http: reqwest::Client,
}

impl Client {
    pub fn new(addr: &str) -> Self {
        Self {
            addr: addr.to_string(),
            http: reqwest::Client::new(),
        }
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }
}

impl PeerFetcher for Client {
    fn fetch<'a>(
        &'a self,
        group: &'a str,
        key: &'a str,
    ) -> BoxFuture<'a, Result<Vec<u8>, CacheError>> {
        Box::pin(async move {
            let response = self
                .http
                .get(peer_url(&self.addr, group))
                .query(&KeyQuery {
                    key: key.to_string(),
                })
                .timeout(FETCH_TIMEOUT)
                .send()
                .await
                .map_err(|e| CacheError::peer_unreachable(&self.addr, e))?;

            match response.status() {
                StatusCode::OK => {
                    let body = response
                        .bytes()
                        .await
                        .map_err(|e| CacheError::peer_unreachable(&self.addr, e))?;
                    Ok(body.to_vec())
                }
                StatusCode::NOT_FOUND => Err(CacheError::NotFound(key.to_string())),
                status => Err(CacheError::peer_unreachable(
                    &self.addr,
                    format!("unexpected status {}", status),
                )),
            }
        })
    }
}
