use tracing::{debug, warn};

use crate::{Element, Error, MerkleTree, Result};

impl MerkleTree {
    /// Reconstruct a tree from the complete, ordered log of inserted commitments
    ///
    /// The order of `commitments` must be the order in which the ledger inserted them. The
    /// resulting root should then be compared to the ledger's root with
    /// [`MerkleTree::verify_root`].
    ///
    /// ```rust
    /// # use accumulator::*;
    /// let commitments = [1, 2, 3, 4, 5].map(Element::new);
    ///
    /// let mut incremental = MerkleTree::new(5).unwrap();
    /// for commitment in commitments {
    ///     incremental.insert(commitment).unwrap();
    /// }
    ///
    /// let rebuilt = MerkleTree::rebuild(5, commitments).unwrap();
    /// assert_eq!(rebuilt.root(), incremental.root());
    /// ```
    pub fn rebuild<I>(height: usize, commitments: I) -> Result<Self>
    where
        I: IntoIterator<Item = Element>,
    {
        let mut tree = Self::new(height)?;
        tree.insert_batch(commitments)?;

        debug!(height, leaves = tree.len(), root = %tree.root(), "rebuilt merkle tree");

        Ok(tree)
    }

    /// Append `(index, commitment)` events, which must continue exactly where the tree ends
    ///
    /// Events are validated before anything is inserted, so an out-of-order log leaves the tree
    /// untouched. Returns the number of leaves appended.
    ///
    /// ```rust
    /// # use accumulator::*;
    /// let mut tree = MerkleTree::new(5).unwrap();
    ///
    /// tree.append_ordered([(0, Element::new(1)), (1, Element::new(2))]).unwrap();
    ///
    /// // index 3 skips index 2
    /// let error = tree.append_ordered([(3, Element::new(4))]).unwrap_err();
    /// assert_eq!(error, Error::OutOfOrder { expected: 2, actual: 3 });
    /// assert_eq!(tree.len(), 2);
    /// ```
    pub fn append_ordered<I>(&mut self, events: I) -> Result<usize>
    where
        I: IntoIterator<Item = (u64, Element)>,
    {
        let mut expected = self.len();
        let mut commitments = Vec::new();

        for (index, commitment) in events {
            if index != expected {
                warn!(expected, actual = index, "rejecting out-of-order commitment event");
                return Err(Error::OutOfOrder {
                    expected,
                    actual: index,
                });
            }

            commitments.push(commitment);
            expected += 1;
        }

        let count = commitments.len();
        self.insert_batch(commitments)?;

        Ok(count)
    }

    /// Check the local root against the root reported by the ledger
    ///
    /// A mismatch means a missed event, a reordering, or a tampered log. It is never safe to
    /// generate paths from a tree that fails this check.
    ///
    /// ```rust
    /// # use accumulator::*;
    /// let tree = MerkleTree::rebuild(5, [Element::new(1)]).unwrap();
    ///
    /// assert!(tree.verify_root(tree.root()).is_ok());
    /// assert!(tree.verify_root(Element::new(1)).is_err());
    /// ```
    pub fn verify_root(&self, expected: Element) -> Result<()> {
        let actual = self.root();

        if actual != expected {
            warn!(%expected, %actual, leaves = self.len(), "merkle root mismatch");
            return Err(Error::Desync { expected, actual });
        }

        Ok(())
    }
}
