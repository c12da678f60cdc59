use poseidon_circuit::poseidon::primitives::{ConstantLength, Hash, P128Pow5T3};
use sha3::{Digest, Keccak256};

use crate::{Base, Element};

/// Identifies the hash parameters used by [`hash_merge`]
///
/// The ledger reports the domain it was deployed with, and clients refuse to build transactions
/// when the two disagree.
pub const HASH_DOMAIN: &str = "poseidon-bn254-p128pow5t3";

/// Hash a fixed number of elements together
///
/// Every hash in the pool goes through this function:
///  - public keys: `hash_merge([spending_key])`
///  - commitments: `hash_merge([amount, owner, blinding])`
///  - tree nodes: `hash_merge([left, right])`
///  - nullifiers: `hash_merge([commitment, index, signature])`
///
/// ```rust
/// # use zk_primitives::*;
/// let a = hash_merge([Element::new(1), Element::new(2)]);
/// let b = hash_merge([Element::new(1), Element::new(3)]);
///
/// assert_ne!(a, b);
/// ```
/// The operand order matters:
/// ```rust
/// # use zk_primitives::*;
/// let a = Element::new(1);
/// let b = Element::new(2);
///
/// assert_ne!(hash_merge([a, b]), hash_merge([b, a]));
/// ```
#[inline]
#[must_use]
pub fn hash_merge<const N: usize>(elements: [Element; N]) -> Element {
    type H<const N: usize> = Hash<Base, P128Pow5T3<Base>, ConstantLength<N>, 3, 2>;

    let hash = H::<N>::init().hash(elements.map(Element::to_base));
    Element::from_base(hash)
}

/// Hash a slice of bytes
///
/// The bytes are split into 16 byte chunks, each of which becomes an [`Element`], and the
/// elements are folded together with [`hash_merge`]
///
/// ```rust
/// # use zk_primitives::*;
/// assert_ne!(hash_bytes(&[1, 2, 3, 4]), hash_bytes(&[1, 2, 3, 5]));
/// ```
#[inline]
#[must_use]
pub fn hash_bytes(bytes: &[u8]) -> Element {
    bytes
        .chunks(core::mem::size_of::<u128>())
        .map(chunk_to_element)
        .fold(Element::BYTE_HASH_IV, |left, right| {
            hash_merge([left, right])
        })
}

/// Keccak-256 of `bytes`, reduced modulo the field
///
/// This is how values that are defined outside the field (the tree's zero value, the hash of the
/// external data) are brought into it
///
/// ```rust
/// # use zk_primitives::*;
/// let element = keccak_to_field(b"hello");
/// assert!(element.is_canonical());
/// ```
#[must_use]
pub fn keccak_to_field(bytes: &[u8]) -> Element {
    let digest: [u8; 32] = Keccak256::digest(bytes).into();
    let mut element = Element::from_be_bytes(digest);
    element.canonicalize();
    element
}

/// Convert a chunk of at most 16 bytes into an [`Element`], padding the low bytes with zeroes
fn chunk_to_element(bytes: &[u8]) -> Element {
    let mut padded = [0; 16];
    for (slot, byte) in padded.iter_mut().zip(bytes) {
        *slot = *byte;
    }
    u128::from_be_bytes(padded).into()
}
