use core::ops::Range;

use crate::{hash_merge, Element, Error, MerkleTree, Result};

impl MerkleTree {
    /// Append a commitment at the next free position, returning its index
    ///
    /// ```rust
    /// # use accumulator::*;
    /// let mut tree = MerkleTree::new(1).unwrap();
    ///
    /// assert_eq!(tree.insert(Element::new(10)).unwrap(), 0);
    /// assert_eq!(tree.insert(Element::new(11)).unwrap(), 1);
    ///
    /// // a tree of height 1 only has room for 2 leaves
    /// assert!(tree.insert(Element::new(12)).is_err());
    /// ```
    pub fn insert(&mut self, commitment: Element) -> Result<u64> {
        let range = self.insert_batch([commitment])?;
        Ok(range.start)
    }

    /// Append several commitments, returning the range of indices they were given
    ///
    /// Hashes are only recomputed once for the whole batch, so this is much faster than repeated
    /// calls to [`MerkleTree::insert`]. Either every commitment is inserted, or (if the batch
    /// doesn't fit) none of them are.
    ///
    /// ```rust
    /// # use accumulator::*;
    /// let mut a = MerkleTree::new(4).unwrap();
    /// let mut b = MerkleTree::new(4).unwrap();
    ///
    /// let range = a.insert_batch([1, 2, 3].map(Element::new)).unwrap();
    /// assert_eq!(range, 0..3);
    ///
    /// for i in 1..=3 {
    ///     b.insert(Element::new(i)).unwrap();
    /// }
    ///
    /// assert_eq!(a.root(), b.root());
    /// ```
    pub fn insert_batch<I>(&mut self, commitments: I) -> Result<Range<u64>>
    where
        I: IntoIterator<Item = Element>,
    {
        let commitments: Vec<Element> = commitments.into_iter().collect();
        let start = self.len();
        let end = start + commitments.len() as u64;

        if end > self.capacity() {
            return Err(Error::TreeFull {
                height: self.height,
                capacity: self.capacity(),
            });
        }

        for (index, commitment) in (start..end).zip(&commitments) {
            self.positions.entry(*commitment).or_insert(index);
        }

        let first_new = self.layers[0].len();
        self.layers[0].extend(commitments);
        self.recalculate_hashes(first_new);

        Ok(start..end)
    }

    /// Recompute every node whose subtree contains a leaf at or after `first_changed`
    pub(super) fn recalculate_hashes(&mut self, first_changed: usize) {
        let mut changed = first_changed;

        for level in 0..self.height {
            let parent_start = changed / 2;
            let parent_end = (self.layers[level].len() + 1) / 2;

            self.layers[level + 1].truncate(parent_start);

            for parent in parent_start..parent_end {
                let left = self.node(level, 2 * parent);
                let right = self.node(level, 2 * parent + 1);
                self.layers[level + 1].push(hash_merge([left, right]));
            }

            changed = parent_start;
        }
    }
}
