use core::iter::zip;

use serde::{Deserialize, Serialize};

use crate::{empty_tree_hash, Element, Error, MerkleTree, Result};

/// A Merkle path proving that a leaf sits at a particular index of a [`MerkleTree`]
///
/// `path_elements[l]` is the sibling at level `l` (level 0 is the leaf level), and
/// `path_indices[l]` is bit `l` of the leaf index: `false` if the node on the path is the left
/// child at that level, `true` if it is the right child. This is exactly the private witness the
/// verifier's inclusion check consumes.
///
/// ```rust
/// # use accumulator::*;
/// let mut tree = MerkleTree::new(4).unwrap();
/// tree.insert_batch([10, 11, 12].map(Element::new)).unwrap();
///
/// let path = tree.path(2).unwrap();
///
/// assert_eq!(path.index(), 2);
/// assert_eq!(path.path_indices()[..2], [false, true]);
/// assert!(path.proves(Element::new(12), tree.root()));
/// assert!(!path.proves(Element::new(11), tree.root()));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Path {
    path_elements: Vec<Element>,
    path_indices: Vec<bool>,
}

impl Path {
    /// A path to index 0 of an empty tree
    ///
    /// Zero-amount padding notes are never checked against the root, but still need a
    /// well-formed path of the right length
    ///
    /// ```rust
    /// # use accumulator::*;
    /// let path = Path::empty(5);
    /// assert_eq!(path.compute_root(zero_value()), empty_tree_hash(5));
    /// ```
    #[must_use]
    pub fn empty(height: usize) -> Self {
        Self {
            path_elements: (0..height).map(empty_tree_hash).collect(),
            path_indices: vec![false; height],
        }
    }

    /// The siblings from the leaf level upwards
    #[inline]
    #[must_use]
    pub fn path_elements(&self) -> &[Element] {
        &self.path_elements
    }

    /// The left/right indicators from the leaf level upwards
    #[inline]
    #[must_use]
    pub fn path_indices(&self) -> &[bool] {
        &self.path_indices
    }

    /// The number of levels in this path
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.path_elements.len()
    }

    /// Whether this path has no levels
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.path_elements.is_empty()
    }

    /// The leaf index encoded by [`Path::path_indices`]
    #[must_use]
    pub fn index(&self) -> u64 {
        self.path_indices
            .iter()
            .enumerate()
            .filter(|(_, is_right)| **is_right)
            .fold(0, |index, (level, _)| index | (1 << level))
    }

    /// Compute the root of the tree this path came from, assuming `leaf` is at its index
    ///
    /// Internally, this calls [`zk_primitives::compute_merkle_root`]
    #[must_use]
    pub fn compute_root(&self, leaf: Element) -> Element {
        let levels = zip(
            self.path_elements.iter().copied(),
            self.path_indices.iter().copied(),
        );

        zk_primitives::compute_merkle_root(leaf, levels)
    }

    /// Whether this path proves that `leaf` is in a tree with root `root`
    #[inline]
    #[must_use]
    pub fn proves(&self, leaf: Element, root: Element) -> bool {
        self.compute_root(leaf) == root
    }
}

impl MerkleTree {
    /// Generate the [`Path`] for the leaf at `index`
    ///
    /// Fails if `index` hasn't been inserted yet
    ///
    /// ```rust
    /// # use accumulator::*;
    /// let mut tree = MerkleTree::new(5).unwrap();
    /// tree.insert(Element::new(1)).unwrap();
    ///
    /// assert!(tree.path(0).is_ok());
    /// assert!(tree.path(1).is_err());
    /// ```
    pub fn path(&self, index: u64) -> Result<Path> {
        let out_of_range = || Error::IndexOutOfRange {
            index,
            len: self.len(),
        };

        let mut position = usize::try_from(index).map_err(|_| out_of_range())?;
        if position >= self.leaves().len() {
            return Err(out_of_range());
        }

        let mut path_elements = Vec::with_capacity(self.height);
        let mut path_indices = Vec::with_capacity(self.height);

        for level in 0..self.height {
            let is_right = position % 2 == 1;
            let sibling = match is_right {
                false => position + 1,
                true => position - 1,
            };

            path_elements.push(self.node(level, sibling));
            path_indices.push(is_right);
            position /= 2;
        }

        Ok(Path {
            path_elements,
            path_indices,
        })
    }
}
