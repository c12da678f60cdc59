use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::{Element, Error, MerkleTree, Result};

/// The persistent form of a [`MerkleTree`]
///
/// Only the height and the leaves are stored, every other node is recomputed on restore
///
/// ```rust
/// # use accumulator::*;
/// let tree = MerkleTree::rebuild(6, [1, 2, 3].map(Element::new)).unwrap();
///
/// let bytes = borsh::to_vec(&tree.snapshot()).unwrap();
/// let snapshot: Snapshot = borsh::from_slice(&bytes).unwrap();
///
/// let restored = MerkleTree::from_snapshot(snapshot).unwrap();
/// assert_eq!(restored.root(), tree.root());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct Snapshot {
    /// The height of the tree
    pub height: u32,
    /// Every inserted leaf, in insertion order
    pub leaves: Vec<Element>,
}

impl MerkleTree {
    /// Capture the state of this tree
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            height: u32::try_from(self.height).unwrap_or(u32::MAX),
            leaves: self.leaves().to_vec(),
        }
    }

    /// Restore a tree from a [`Snapshot`]
    pub fn from_snapshot(snapshot: Snapshot) -> Result<Self> {
        let Snapshot { height, leaves } = snapshot;
        let height = usize::try_from(height).map_err(|_| Error::UnsupportedHeight(usize::MAX))?;

        Self::rebuild(height, leaves)
    }
}
