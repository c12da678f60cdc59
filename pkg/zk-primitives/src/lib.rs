#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::match_bool)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::doc_markdown)]
#![deny(missing_docs)]

//! The hash domain shared by every part of the shielded pool
//!
//! Commitments, nullifiers, Merkle tree nodes, and public keys are all computed with
//! [`hash_merge`], a Poseidon hash over the BN254 scalar field. The external verifier uses the
//! exact same parameters, so nothing in this crate may change without a matching change on the
//! verifier side.

mod element;
mod hash;
mod path;

pub use element::Element;
pub use hash::{hash_bytes, hash_merge, keccak_to_field, HASH_DOMAIN};
pub use path::compute_merkle_root;

/// The base element used by cryptographic operations
///
/// This is (roughly) an integer modulo `p` where `p` is [`Element::MODULUS`]
pub type Base = poseidon_circuit::Bn256Fr;
