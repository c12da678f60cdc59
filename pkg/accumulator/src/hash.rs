use std::sync::OnceLock;

use crate::{hash_merge, keccak_to_field, Element};

/// The tallest tree supported
///
/// A height of 32 allows for over 4 billion commitments, far more than any deployment needs
pub const MAX_HEIGHT: usize = 32;

const ZERO_VALUE_SEED: &[u8] = b"shielded-pool";

/// The value of an empty leaf
///
/// This is `keccak256("shielded-pool") mod p`. The ledger fills its tree with the same value,
/// so it must never change.
#[must_use]
pub fn zero_value() -> Element {
    empty_tree_hash(0)
}

/// The root hash of an empty tree with a given height
///
/// Defined recursively:
///  - `empty_tree_hash(0) = zero_value()`
///  - `empty_tree_hash(n) = hash_merge([empty_tree_hash(n - 1), empty_tree_hash(n - 1)])`
///
/// ```rust
/// # use accumulator::*;
/// let one = empty_tree_hash(1);
/// assert_eq!(one, hash_merge([zero_value(), zero_value()]));
/// ```
///
/// # Panics
///
/// Panics if `height` is greater than [`MAX_HEIGHT`]
#[must_use]
pub fn empty_tree_hash(height: usize) -> Element {
    assert!(
        height <= MAX_HEIGHT,
        "height {height} exceeds the maximum of {MAX_HEIGHT}"
    );

    zeros()[height]
}

fn zeros() -> &'static [Element] {
    static CACHE: OnceLock<Vec<Element>> = OnceLock::new();

    CACHE.get_or_init(|| {
        let mut zeros = Vec::with_capacity(MAX_HEIGHT + 1);
        let mut current = keccak_to_field(ZERO_VALUE_SEED);
        zeros.push(current);

        for _ in 0..MAX_HEIGHT {
            current = hash_merge([current, current]);
            zeros.push(current);
        }

        zeros
    })
}
