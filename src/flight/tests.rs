#[cfg(test)]
mod tests {
    use crate::error::CacheError;
    use crate::flight::coalescer::Flight;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_concurrent_callers_share_one_execution() {
        let flight = Arc::new(Flight::<u32>::new());
        let executions = Arc::new(AtomicUsize::new(0));
        let barrier = Arc::new(tokio::sync::Barrier::new(100));

        let mut handles = Vec::new();
        for _ in 0..100 {
            let flight = flight.clone();
            let executions = executions.clone();
            let barrier = barrier.clone();
            handles.push(tokio::spawn(async move {
                barrier.wait().await;
                flight
                    .work("k", || {
                        let executions = executions.clone();
                        async move {
                            executions.fetch_add(1, Ordering::SeqCst);
                            tokio::time::sleep(Duration::from_millis(100)).await;
                            Ok(42)
                        }
                    })
                    .await
            }));
        }

        for handle in handles {
            assert_eq!(handle.await.unwrap(), Ok(42));
        }
        assert_eq!(executions.load(Ordering::SeqCst), 1);
        assert_eq!(flight.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_completed_flight_is_forgotten() {
        let flight = Flight::<u32>::new();
        let executions = AtomicUsize::new(0);

        for _ in 0..2 {
            let result = flight
                .work("k", || async {
                    executions.fetch_add(1, Ordering::SeqCst);
                    Ok(7)
                })
                .await;
            assert_eq!(result, Ok(7));
        }

        // Results are not cached; each sequential call is a fresh flight.
        assert_eq!(executions.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_errors_are_shared_with_waiters() {
        let flight = Arc::new(Flight::<u32>::new());

        let leader = {
            let flight = flight.clone();
            tokio::spawn(async move {
                flight
                    .work("bad", || async {
                        tokio::time::sleep(Duration::from_millis(50)).await;
                        Err(CacheError::Loader("backend down".into()))
                    })
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        let waiter = flight
            .work("bad", || async { unreachable!("waiter must not execute") })
            .await;

        assert_eq!(waiter, Err(CacheError::Loader("backend down".into())));
        assert_eq!(leader.await.unwrap(), waiter);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_distinct_keys_fly_independently() {
        let flight = Arc::new(Flight::<String>::new());
        let mut handles = Vec::new();

        for i in 0..8 {
            let flight = flight.clone();
            handles.push(tokio::spawn(async move {
                let key = format!("key-{}", i);
                flight
                    .work(&key, || {
                        let key = key.clone();
                        async move {
                            tokio::time::sleep(Duration::from_millis(20)).await;
                            Ok(key)
                        }
                    })
                    .await
            }));
        }

        for (i, handle) in handles.into_iter().enumerate() {
            assert_eq!(handle.await.unwrap(), Ok(format!("key-{}", i)));
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_cancelled_leader_hands_over() {
        let flight = Arc::new(Flight::<u32>::new());

        let leader = {
            let flight = flight.clone();
            tokio::spawn(async move {
                flight
                    .work("k", || async {
                        tokio::time::sleep(Duration::from_secs(30)).await;
                        Ok(1)
                    })
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        let waiter = {
            let flight = flight.clone();
            tokio::spawn(async move { flight.work("k", || async { Ok(2) }).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        // Dropping the leader must not strand the waiter; it re-runs the
        // work itself and completes.
        leader.abort();
        assert_eq!(waiter.await.unwrap(), Ok(2));
        assert_eq!(flight.in_flight(), 0);
    }
}
