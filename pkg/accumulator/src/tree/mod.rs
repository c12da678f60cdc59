use std::collections::HashMap;

use crate::{empty_tree_hash, Element, Error, Result, MAX_HEIGHT};

mod insert;
mod path;
mod rebuild;
mod snapshot;

pub use path::Path;
pub use snapshot::Snapshot;

#[cfg(any(test, feature = "proptest"))]
pub mod proptest;

#[cfg(test)]
mod tests;

/// A fixed-height, append-only Merkle tree
///
/// ```rust
/// # use accumulator::*;
/// let mut tree = MerkleTree::new(5).unwrap();
///
/// tree.insert(Element::new(1)).unwrap();
/// tree.insert(Element::new(2)).unwrap();
///
/// assert_eq!(tree.len(), 2);
/// assert_eq!(tree.index_of(Element::new(2)), Some(1));
/// ```
#[derive(Debug, Clone)]
pub struct MerkleTree {
    height: usize,
    /// `layers[0]` holds the leaves, `layers[height]` holds the root once anything is inserted
    ///
    /// Each layer only stores the non-empty prefix, positions past the end are empty subtrees
    layers: Vec<Vec<Element>>,
    /// First index at which each commitment was inserted
    positions: HashMap<Element, u64>,
}

impl PartialEq for MerkleTree {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.height == other.height && self.root() == other.root()
    }
}

impl Eq for MerkleTree {}

impl MerkleTree {
    /// Create an empty tree of the given height
    ///
    /// ```rust
    /// # use accumulator::*;
    /// let tree = MerkleTree::new(5).unwrap();
    /// assert_eq!(tree.root(), empty_tree_hash(5));
    ///
    /// assert!(MerkleTree::new(0).is_err());
    /// ```
    pub fn new(height: usize) -> Result<Self> {
        if height == 0 || height > MAX_HEIGHT {
            return Err(Error::UnsupportedHeight(height));
        }

        Ok(Self {
            height,
            layers: vec![Vec::new(); height + 1],
            positions: HashMap::new(),
        })
    }

    /// The height of the tree, i.e. the length of every [`Path`]
    #[inline]
    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    /// The number of leaves the tree can hold (`2^height`)
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> u64 {
        1 << self.height
    }

    /// The number of inserted leaves
    #[inline]
    #[must_use]
    pub fn len(&self) -> u64 {
        self.leaves().len() as u64
    }

    /// Whether nothing has been inserted
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.leaves().is_empty()
    }

    /// The inserted leaves, in insertion order
    #[inline]
    #[must_use]
    pub fn leaves(&self) -> &[Element] {
        &self.layers[0]
    }

    /// The leaf at `index`, if it has been inserted
    #[inline]
    #[must_use]
    pub fn leaf(&self, index: u64) -> Option<Element> {
        let index = usize::try_from(index).ok()?;
        self.leaves().get(index).copied()
    }

    /// The index at which `commitment` was first inserted
    #[inline]
    #[must_use]
    pub fn index_of(&self, commitment: Element) -> Option<u64> {
        self.positions.get(&commitment).copied()
    }

    /// The current root
    ///
    /// Roots are recomputed on every insert, so this is a lookup
    ///
    /// ```rust
    /// # use accumulator::*;
    /// let mut tree = MerkleTree::new(3).unwrap();
    /// let empty_root = tree.root();
    ///
    /// tree.insert(Element::new(1)).unwrap();
    /// assert_ne!(tree.root(), empty_root);
    /// ```
    #[inline]
    #[must_use]
    pub fn root(&self) -> Element {
        self.layers[self.height]
            .first()
            .copied()
            .unwrap_or_else(|| empty_tree_hash(self.height))
    }

    /// The node at `position` of `level`, or the matching empty subtree hash
    fn node(&self, level: usize, position: usize) -> Element {
        self.layers[level]
            .get(position)
            .copied()
            .unwrap_or_else(|| empty_tree_hash(level))
    }
}
