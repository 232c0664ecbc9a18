#[cfg(test)]
mod tests {
    use crate::ring::hashring::HashRing;

    /// Hash that reads the input as a decimal number, making placement
    /// arithmetic visible in the tests below.
    fn identity_ring(replicas: usize) -> HashRing {
        HashRing::new(
            replicas,
            Some(Box::new(|data: &[u8]| {
                std::str::from_utf8(data)
                    .expect("test keys are utf-8")
                    .parse()
                    .expect("test keys are numeric")
            })),
        )
    }

    #[test]
    fn test_placement_with_identity_hash() {
        let mut ring = identity_ring(3);
        // Virtual points: 02/12/22, 04/14/24, 06/16/26.
        ring.register(["6", "4", "2"]);
        assert_eq!(ring.points(), &[2, 4, 6, 12, 14, 16, 22, 24, 26]);

        for (key, owner) in [("2", "2"), ("11", "2"), ("23", "4"), ("27", "2")] {
            assert_eq!(ring.get(key), Some(owner), "key {}", key);
        }

        // A new node takes over the keys its points now cover.
        ring.register(["8"]);
        assert_eq!(ring.points(), &[2, 4, 6, 8, 12, 14, 16, 18, 22, 24, 26, 28]);
        for (key, owner) in [("2", "2"), ("11", "2"), ("23", "4"), ("27", "8")] {
            assert_eq!(ring.get(key), Some(owner), "key {}", key);
        }
    }

    #[test]
    fn test_empty_ring_has_no_owner() {
        let ring = HashRing::new(3, None);
        assert!(ring.is_empty());
        assert_eq!(ring.get("anything"), None);
    }

    #[test]
    fn test_register_then_destroy_restores_ring() {
        let mut ring = HashRing::new(50, None);
        ring.register(["10.0.0.1:8001", "10.0.0.2:8001"]);

        let points_before = ring.points().to_vec();
        let keys: Vec<String> = (0..64).map(|i| format!("key-{}", i)).collect();
        let owners_before: Vec<_> = keys.iter().map(|k| ring.get(k).map(str::to_string)).collect();

        ring.register(["10.0.0.3:8001"]);
        ring.destroy(["10.0.0.3:8001"]);

        assert_eq!(ring.points(), points_before.as_slice());
        let owners_after: Vec<_> = keys.iter().map(|k| ring.get(k).map(str::to_string)).collect();
        assert_eq!(owners_after, owners_before);
    }

    #[test]
    fn test_placement_is_stable_for_fixed_membership() {
        let mut ring = HashRing::new(50, None);
        ring.register(["a:1", "b:1", "c:1"]);

        for i in 0..256 {
            let key = format!("stable-{}", i);
            let first = ring.get(&key).map(str::to_string);
            let second = ring.get(&key).map(str::to_string);
            assert_eq!(first, second);
        }
    }

    #[test]
    fn test_duplicate_register_is_idempotent() {
        let mut ring = HashRing::new(50, None);
        ring.register(["a:1", "b:1"]);
        let points = ring.points().to_vec();

        ring.register(["a:1"]);
        assert_eq!(ring.points(), points.as_slice());
        assert_eq!(ring.nodes(), vec!["a:1".to_string(), "b:1".to_string()]);
    }

    #[test]
    fn test_destroy_unknown_node_is_noop() {
        let mut ring = HashRing::new(50, None);
        ring.register(["a:1"]);
        let points = ring.points().to_vec();

        ring.destroy(["nobody:9"]);
        assert_eq!(ring.points(), points.as_slice());
    }

    #[test]
    fn test_minimal_remapping_on_membership_change() {
        let mut ring = HashRing::new(50, None);
        ring.register(["a:1", "b:1", "c:1"]);

        let keys: Vec<String> = (0..512).map(|i| format!("key-{}", i)).collect();
        let before: Vec<_> = keys.iter().map(|k| ring.get(k).unwrap().to_string()).collect();

        ring.register(["d:1"]);
        let moved = keys
            .iter()
            .zip(&before)
            .filter(|(k, owner)| ring.get(k).unwrap() != owner.as_str())
            .count();

        // Every key that moved must have moved onto the new node.
        for (key, owner) in keys.iter().zip(&before) {
            let now = ring.get(key).unwrap();
            assert!(now == owner.as_str() || now == "d:1");
        }
        // Roughly a quarter of the space re-maps; anything over half means
        // the ring reshuffled instead of splitting.
        assert!(moved < keys.len() / 2, "{} of {} keys moved", moved, keys.len());
    }
}
