//! Integration tests for the B+Tree public API.
//!
//! These exercise whole-tree behavior across many operations; per-module
//! edge cases live in the unit tests next to the code.

use branchdb::index::BPlusTree;
use branchdb::Error;

/// Deterministic pseudo-random key sequence (simple LCG).
fn random_keys(n: usize, seed: u64) -> Vec<u64> {
    let mut keys = Vec::with_capacity(n);
    let mut x = seed;
    for _ in 0..n {
        x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
        keys.push(x >> 33);
    }
    keys
}

#[test]
fn test_order_invariant_across_orders() {
    // In-order traversal yields strictly ascending keys with no duplicates,
    // regardless of order and insertion pattern.
    for order in [3, 4, 5, 8, 17] {
        let mut tree = BPlusTree::new(order).unwrap();
        for k in random_keys(2000, order as u64) {
            tree.insert(k, k);
        }
        tree.check_invariants().unwrap();

        let keys: Vec<u64> = tree.iter().map(|(k, _)| *k).collect();
        assert!(
            keys.windows(2).all(|w| w[0] < w[1]),
            "order {}: traversal not strictly ascending",
            order
        );
        assert_eq!(keys.len(), tree.len());
    }
}

#[test]
fn test_balance_invariant_under_churn() {
    let mut tree = BPlusTree::new(4).unwrap();
    let keys = random_keys(1000, 7);

    for (i, &k) in keys.iter().enumerate() {
        tree.insert(k, k);
        // Remove an older key every third insert.
        if i % 3 == 2 {
            tree.remove(&keys[i / 2]);
        }
    }

    // check_invariants verifies uniform leaf depth along with the rest.
    tree.check_invariants().unwrap();
}

#[test]
fn test_roundtrip_for_live_keys() {
    let mut keys = random_keys(1500, 99);
    keys.sort_unstable();
    keys.dedup();

    let mut tree = BPlusTree::new(6).unwrap();
    for &k in &keys {
        tree.insert(k, k.wrapping_mul(3));
    }
    // Remove every other key; the rest must still round-trip.
    for &k in keys.iter().step_by(2) {
        assert_eq!(tree.remove(&k), Some(k.wrapping_mul(3)));
    }

    for (i, &k) in keys.iter().enumerate() {
        if i % 2 == 0 {
            assert_eq!(tree.get(&k), None, "removed key {} resurfaced", k);
        } else {
            assert_eq!(tree.get(&k), Some(&k.wrapping_mul(3)), "live key {} lost", k);
        }
    }
    tree.check_invariants().unwrap();
}

#[test]
fn test_deletion_completeness() {
    let mut tree = BPlusTree::new(4).unwrap();
    for k in 0..100u32 {
        tree.insert(k, k);
    }

    for k in 0..100u32 {
        let before = tree.len();
        assert_eq!(tree.remove(&k), Some(k));
        assert_eq!(tree.get(&k), None);
        assert_eq!(tree.len(), before - 1);
    }
}

#[test]
fn test_idempotent_upsert() {
    let mut tree = BPlusTree::new(4).unwrap();
    tree.insert(7, "first");
    let len_before = tree.len();

    assert_eq!(tree.insert(7, "second"), Some("first"));
    assert_eq!(tree.len(), len_before);
    assert_eq!(tree.get(&7), Some(&"second"));

    let entries: Vec<u32> = tree.iter().map(|(k, _)| *k).collect();
    assert_eq!(entries, vec![7]);
}

#[test]
fn test_range_matches_full_traversal_subset() {
    let mut tree = BPlusTree::new(5).unwrap();
    for k in random_keys(800, 3) {
        tree.insert(k % 10_000, k);
    }

    let full: Vec<u64> = tree.iter().map(|(k, _)| *k).collect();
    for (low, high) in [(0u64, 10_000), (2_500, 7_500), (9_999, 10_000), (5_000, 5_000)] {
        let ranged: Vec<u64> = tree.range(low..high).map(|(k, _)| *k).collect();
        let expected: Vec<u64> = full.iter().copied().filter(|k| (low..high).contains(k)).collect();
        assert_eq!(ranged, expected, "range {}..{}", low, high);
    }
}

#[test]
fn test_invalid_order_is_fatal_at_construction() {
    let result = BPlusTree::<u32, u32>::new(2);
    match result {
        Err(Error::InvalidConfiguration(2)) => {}
        _ => panic!("expected InvalidConfiguration(2)"),
    }
}

#[test]
fn test_sequential_then_reverse_deletion() {
    let mut tree = BPlusTree::new(3).unwrap();
    for k in 0..256u32 {
        tree.insert(k, k);
    }

    // Delete from the top down, forcing merges along the right edge.
    for k in (0..256u32).rev() {
        assert_eq!(tree.remove(&k), Some(k));
        tree.check_invariants().unwrap();
    }
    assert!(tree.is_empty());
}

#[test]
fn test_large_tree_against_model() {
    let mut tree = BPlusTree::new(8).unwrap();
    let mut model = std::collections::BTreeMap::new();

    for k in random_keys(5000, 42) {
        let k = k % 2000; // force plenty of upserts
        tree.insert(k, k + 1);
        model.insert(k, k + 1);
    }
    for k in random_keys(2500, 43) {
        let k = k % 2000;
        assert_eq!(tree.remove(&k), model.remove(&k), "key {}", k);
    }

    tree.check_invariants().unwrap();
    assert_eq!(tree.len(), model.len());

    let tree_pairs: Vec<(u64, u64)> = tree.iter().map(|(k, v)| (*k, *v)).collect();
    let model_pairs: Vec<(u64, u64)> = model.into_iter().collect();
    assert_eq!(tree_pairs, model_pairs);
}
