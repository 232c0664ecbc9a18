#[cfg(test)]
mod tests {
    use crate::error::CacheError;
    use crate::group::{new_group, Loader, LoaderFn, PeerFetcher, PeerPicker};
    use crate::registry::MemoryRegistry;
    use crate::server::client::Client;
    use crate::server::service::{valid_peer_addr, Server};
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    fn memory_server(addr: &str) -> Arc<Server> {
        Server::with_registry(addr, Arc::new(MemoryRegistry::new())).unwrap()
    }

    fn score_loader() -> Arc<dyn Loader> {
        Arc::new(LoaderFn::new(|key: String| async move {
            match key.as_str() {
                "Tom" => Ok(b"630".to_vec()),
                _ => Err(CacheError::NotFound(key)),
            }
        }))
    }

    async fn wait_until(deadline: Duration, mut condition: impl FnMut() -> bool) -> bool {
        let started = Instant::now();
        while started.elapsed() < deadline {
            if condition() {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(25)).await;
        }
        condition()
    }

    // ============================================================
    // ADDRESS VALIDATION
    // ============================================================

    #[test]
    fn test_addr_validation() {
        for addr in [
            "localhost:8001",
            "127.0.0.1:8001",
            "10.0.0.1:65535",
            "[::1]:8001",
        ] {
            assert!(valid_peer_addr(addr), "{} should be valid", addr);
        }

        for addr in [
            "",
            "8001",
            "localhost",
            "localhost:0",
            "localhost:65536",
            "localhost:port",
            "cache.internal:8001",
            "::1:8001",
            "10.0.0.1:",
        ] {
            assert!(!valid_peer_addr(addr), "{} should be invalid", addr);
        }
    }

    #[test]
    fn test_new_server_rejects_bad_addr() {
        assert_eq!(
            Server::with_registry("nonsense", Arc::new(MemoryRegistry::new())).err(),
            Some(CacheError::AddrInvalid("nonsense".to_string()))
        );
    }

    // ============================================================
    // TOPOLOGY
    // ============================================================

    #[test]
    fn test_set_peers_overwrites_topology() {
        let server = memory_server("127.0.0.1:18021");
        server
            .set_peers(["127.0.0.1:18021", "127.0.0.1:18022"])
            .unwrap();
        assert_eq!(
            server.peer_addrs(),
            vec!["127.0.0.1:18021".to_string(), "127.0.0.1:18022".to_string()]
        );

        server.set_peers(["127.0.0.1:18023"]).unwrap();
        assert_eq!(server.peer_addrs(), vec!["127.0.0.1:18023".to_string()]);
    }

    #[test]
    fn test_set_peers_rejects_bad_addr() {
        let server = memory_server("127.0.0.1:18024");
        assert_eq!(
            server.set_peers(["127.0.0.1:18025", "bogus"]).err(),
            Some(CacheError::AddrInvalid("bogus".to_string()))
        );
    }

    #[test]
    fn test_pick_peer_excludes_self_and_empty_ring() {
        let server = memory_server("127.0.0.1:18026");

        // Empty ring: everything loads locally.
        assert!(server.pick_peer("any").is_none());

        server
            .set_peers(["127.0.0.1:18026", "127.0.0.1:18027"])
            .unwrap();

        let (mut local, mut remote) = (0, 0);
        for i in 0..200 {
            match server.pick_peer(&format!("key-{}", i)) {
                Some(_) => remote += 1,
                None => local += 1,
            }
        }
        // Two nodes with 50 virtual points each split the space; both
        // outcomes must occur and self is never returned as a fetcher.
        assert!(local > 0, "no key resolved to the local node");
        assert!(remote > 0, "no key resolved to the remote peer");
    }

    #[test]
    fn test_add_and_remove_peer_are_idempotent() {
        let server = memory_server("127.0.0.1:18028");
        assert!(server.add_peer("127.0.0.1:18029").unwrap());
        assert!(!server.add_peer("127.0.0.1:18029").unwrap());

        server.remove_peer("127.0.0.1:18029");
        server.remove_peer("127.0.0.1:18029");
        assert!(!server.has_peer("127.0.0.1:18029"));
    }

    // ============================================================
    // LIFECYCLE
    // ============================================================

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_double_start_fails_and_stop_clears_topology() {
        let server = memory_server("127.0.0.1:18031");

        let running = {
            let server = server.clone();
            tokio::spawn(async move { server.start().await })
        };
        assert!(wait_until(Duration::from_secs(2), || server.has_peer("127.0.0.1:18031")).await);

        let second = server.clone().start().await;
        assert!(second.is_err(), "second start must be rejected");

        server.stop();
        running.await.unwrap().unwrap();
        assert!(server.peer_addrs().is_empty());

        // Stopping twice is a no-op.
        server.stop();
    }

    // ============================================================
    // TRANSPORT ROUND TRIP
    // ============================================================

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_client_fetches_value_over_http() {
        let addr = "127.0.0.1:18051";
        let server = memory_server(addr);
        let group = new_group("scores-http", 1024, score_loader());
        group.register_peers(server.clone());

        let running = {
            let server = server.clone();
            tokio::spawn(async move { server.start().await })
        };
        assert!(wait_until(Duration::from_secs(2), || server.has_peer(addr)).await);

        let client = Client::new(addr);
        assert_eq!(client.fetch("scores-http", "Tom").await.unwrap(), b"630");
        assert_eq!(
            client.fetch("scores-http", "Nobody").await,
            Err(CacheError::NotFound("Nobody".to_string()))
        );
        assert!(matches!(
            client.fetch("no-such-group", "Tom").await,
            Err(CacheError::NotFound(_))
        ));

        server.stop();
        running.await.unwrap().unwrap();
    }

    // ============================================================
    // MEMBERSHIP LIVENESS
    // ============================================================

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_ring_follows_registrations() {
        let registry = Arc::new(MemoryRegistry::new());
        let addr_a = "127.0.0.1:18041";
        let addr_b = "127.0.0.1:18042";
        let server_a = Server::with_registry(addr_a, registry.clone()).unwrap();
        let server_b = Server::with_registry(addr_b, registry.clone()).unwrap();

        let running_a = {
            let server = server_a.clone();
            tokio::spawn(async move { server.start().await })
        };
        let running_b = {
            let server = server_b.clone();
            tokio::spawn(async move { server.start().await })
        };

        // Each node must learn about the other within two seconds.
        assert!(wait_until(Duration::from_secs(2), || server_a.has_peer(addr_b)).await);
        assert!(wait_until(Duration::from_secs(2), || server_b.has_peer(addr_a)).await);

        // B revokes; A drops it from the ring.
        server_b.stop();
        running_b.await.unwrap().unwrap();
        assert!(wait_until(Duration::from_secs(2), || !server_a.has_peer(addr_b)).await);
        assert!(server_a.has_peer(addr_a));

        server_a.stop();
        running_a.await.unwrap().unwrap();
    }
}
