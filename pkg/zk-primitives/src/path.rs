use crate::{hash_merge, Element};

/// Compute the root of a Merkle tree from a leaf and its authentication path
///
/// `path` yields `(sibling, is_right)` pairs ordered from the leaf up to (but not including) the
/// root. `is_right` is the path index bit for that level: `false` means the current node is the
/// left child (so the sibling is on the right), `true` means the current node is the right child.
///
/// ```text
///          C
///        /   \
///       A     B
///      / \   / \
///     0   1 2   3
/// ```
/// To prove that `2` is at index 2 (binary `10`):
/// ```rust
/// # use zk_primitives::*;
/// let a = hash_merge([Element::new(0), Element::new(1)]);
/// let b = hash_merge([Element::new(2), Element::new(3)]);
/// let c = hash_merge([a, b]);
///
/// let path = [
///     (Element::new(3), false), // bit 0 of the index: `2` is a left child
///     (a, true),                // bit 1 of the index: `B` is a right child
/// ];
///
/// assert_eq!(compute_merkle_root(Element::new(2), path), c);
/// assert_ne!(compute_merkle_root(Element::new(5), path), c);
/// ```
pub fn compute_merkle_root<I: IntoIterator<Item = (Element, bool)>>(
    leaf: Element,
    path: I,
) -> Element {
    path.into_iter()
        .fold(leaf, |node, (sibling, is_right)| match is_right {
            false => hash_merge([node, sibling]),
            true => hash_merge([sibling, node]),
        })
}
