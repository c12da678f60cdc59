use zk_primitives::Element;

use crate::MAX_HEIGHT;

/// An error produced while building or querying a [`MerkleTree`]
///
/// [`MerkleTree`]: crate::MerkleTree
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The requested height is zero or larger than [`MAX_HEIGHT`]
    #[error("unsupported tree height {0}, expected 1..={max}", max = MAX_HEIGHT)]
    UnsupportedHeight(usize),

    /// Every leaf position is already occupied
    #[error("tree of height {height} is full ({capacity} leaves)")]
    TreeFull {
        /// The height of the tree
        height: usize,
        /// The number of leaves the tree can hold
        capacity: u64,
    },

    /// A path was requested for a leaf that hasn't been inserted
    #[error("no leaf at index {index}, the tree has {len} leaves")]
    IndexOutOfRange {
        /// The requested index
        index: u64,
        /// The number of leaves in the tree
        len: u64,
    },

    /// A commitment event was not the next leaf in insertion order
    #[error("out-of-order commitment event: expected index {expected}, got {actual}")]
    OutOfOrder {
        /// The index the next event must have
        expected: u64,
        /// The index the event actually had
        actual: u64,
    },

    /// The locally computed root doesn't match the root reported by the ledger
    #[error("tree desync: ledger root is {expected}, local root is {actual}")]
    Desync {
        /// The root reported by the ledger
        expected: Element,
        /// The root of the local tree
        actual: Element,
    },
}

/// Shorthand for results with an accumulator [`Error`]
pub type Result<T, E = Error> = core::result::Result<T, E>;
