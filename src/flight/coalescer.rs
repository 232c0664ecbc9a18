use std::collections::HashMap;
use std::future::Future;

use parking_lot::Mutex;
use tokio::sync::broadcast;

use crate::error::CacheError;

/// Per-key coalescer for concurrent async work.
///
/// `work` guarantees that at most one future per key is in flight on this
/// node. The in-flight table maps each key to the broadcast channel its
/// waiters listen on; the entry is removed before the result is published,
/// so waiters holding a subscription still receive it while late arrivals
/// start over.
///
/// The table lock is never held across an `.await`.
pub struct Flight<T: Clone> {
    calls: Mutex<HashMap<String, broadcast::Sender<Result<T, CacheError>>>>,
}

/// Clears the in-flight entry if the leader is dropped before publishing,
/// closing the channel so waiters re-enter instead of hanging.
struct LeaderGuard<'a, T: Clone> {
    flight: &'a Flight<T>,
    key: &'a str,
    published: bool,
}

impl<T: Clone> Drop for LeaderGuard<'_, T> {
    fn drop(&mut self) {
        if !self.published {
            self.flight.calls.lock().remove(self.key);
        }
    }
}

impl<T: Clone> Flight<T> {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(HashMap::new()),
        }
    }

    /// Runs `work` for `key`, unless a flight for the same key is already in
    /// progress, in which case the caller waits for that flight's result.
    ///
    /// If the leader is cancelled before finishing, each waiter retries; one
    /// of them becomes the new leader and runs its own copy of the work.
    pub async fn work<F, Fut>(&self, key: &str, work: F) -> Result<T, CacheError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, CacheError>>,
    {
        loop {
            let waiter = {
                let mut calls = self.calls.lock();
                match calls.get(key) {
                    Some(tx) => Some(tx.subscribe()),
                    None => {
                        let (tx, _) = broadcast::channel(1);
                        calls.insert(key.to_string(), tx);
                        None
                    }
                }
            };

            let Some(mut rx) = waiter else {
                let mut guard = LeaderGuard {
                    flight: self,
                    key,
                    published: false,
                };
                let result = work().await;

                // Remove the entry first: a caller arriving from here on
                // belongs to a fresh flight.
                let tx = self.calls.lock().remove(key);
                guard.published = true;
                if let Some(tx) = tx {
                    // No waiters is fine; the leader keeps its own result.
                    let _ = tx.send(result.clone());
                }
                return result;
            };

            match rx.recv().await {
                Ok(result) => return result,
                // Leader dropped without publishing; contend for the lead.
                Err(_) => continue,
            }
        }
    }

    /// Number of keys currently in flight.
    pub fn in_flight(&self) -> usize {
        self.calls.lock().len()
    }
}

impl<T: Clone> Default for Flight<T> {
    fn default() -> Self {
        Self::new()
    }
}
