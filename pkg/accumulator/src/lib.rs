#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::match_bool)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::doc_markdown)]
#![deny(missing_docs)]

//! # Accumulator
//!
//! A fixed-height, append-only Merkle [`MerkleTree`] over note commitments.
//!
//! The ledger keeps the same tree on-chain. A client either inserts commitments as it learns
//! about them, or [rebuilds][MerkleTree::rebuild] the whole tree from the ordered log of
//! commitment events, and then [checks][MerkleTree::verify_root] the result against the root the
//! ledger reports.
//!
//! ```rust
//! # use accumulator::*;
//! let mut tree = MerkleTree::new(5).unwrap();
//!
//! let index = tree.insert(Element::new(1)).unwrap();
//! assert_eq!(index, 0);
//!
//! let path = tree.path(index).unwrap();
//! assert_eq!(path.compute_root(Element::new(1)), tree.root());
//! ```
//!
//! ## Structure
//!
//! Leaf `i` lives at position `i` of the bottom layer. Empty positions hold the zero value, and
//! an empty subtree of height `h` hashes to [`empty_tree_hash(h)`][empty_tree_hash]. Each parent
//! is `hash_merge([left, right])`, where the left child is the one with the even index. Because
//! leaves are never moved or removed, the root is a function of the ordered leaf sequence only.

mod error;
mod hash;
mod tree;

pub use error::{Error, Result};
pub use hash::{empty_tree_hash, zero_value, MAX_HEIGHT};
pub use tree::{MerkleTree, Path, Snapshot};
pub use zk_primitives::*;
