//! Configuration constants for branchdb.

/// Smallest legal B+Tree order.
///
/// An order-3 tree is the minimum that still splits and merges meaningfully:
/// internal nodes route between 2 and 3 children, leaves hold 1 or 2 entries.
/// Anything below 3 cannot satisfy the occupancy invariants and is rejected
/// at construction with `Error::InvalidConfiguration`.
pub const MIN_ORDER: usize = 3;

/// Default order used by the engine layer.
///
/// 64 keeps the tree shallow without making node shifts expensive: a
/// three-level tree at this order already addresses ~250k entries.
pub const DEFAULT_ORDER: usize = 64;

/// Maximum number of keys a node of the given order may hold.
#[inline]
pub const fn max_keys(order: usize) -> usize {
    order - 1
}

/// Minimum number of keys a non-root node of the given order must hold.
///
/// `⌈order/2⌉ - 1` for both leaves (entries) and internal nodes (separator
/// keys); the root is exempt.
#[inline]
pub const fn min_keys(order: usize) -> usize {
    order.div_ceil(2) - 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_min_order_is_three() {
        assert_eq!(MIN_ORDER, 3);
    }

    #[test]
    fn test_occupancy_bounds() {
        // order 3: 1..=2 keys, order 4: 1..=3, order 5: 2..=4
        assert_eq!((min_keys(3), max_keys(3)), (1, 2));
        assert_eq!((min_keys(4), max_keys(4)), (1, 3));
        assert_eq!((min_keys(5), max_keys(5)), (2, 4));
    }

    #[test]
    fn test_split_halves_satisfy_minimum() {
        // An overflowing leaf holds `order` entries; the split moves the
        // upper ceil(order/2) right. Both halves must meet the minimum.
        for order in MIN_ORDER..=128 {
            let moved = order.div_ceil(2);
            let kept = order - moved;
            assert!(kept >= min_keys(order), "order {}", order);
            assert!(moved >= min_keys(order), "order {}", order);
        }
    }
}
