use borsh::{BorshDeserialize, BorshSerialize};
use rand::{rngs::OsRng, CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use zk_primitives::{hash_merge, Element};

use crate::{encryption, Error, Keypair, Result};

const FIELD_LEN: usize = Element::RANDOM_BYTES;

/// The length of a decrypted note payload: amount then blinding, 31 big-endian bytes each
pub const PAYLOAD_LEN: usize = 2 * FIELD_LEN;

/// A private record of value
///
/// A note is either a fresh output, which has no `index` yet, or a materialized input, whose
/// commitment has been inserted into the tree at `index`
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
pub struct Note {
    /// The value held by the note
    pub amount: u128,
    /// The public key of the owner
    pub owner: Element,
    /// Random salt that hides the amount and owner inside the commitment
    pub blinding: Element,
    /// The position of the commitment in the tree, once it has been inserted
    pub index: Option<u64>,
}

impl Note {
    /// A fresh output note with a random blinding
    #[must_use]
    pub fn new(amount: u128, owner: Element) -> Self {
        Self::new_with_rng(amount, owner, OsRng)
    }

    /// A fresh output note with a blinding drawn from `rng`
    #[must_use]
    pub fn new_with_rng<R: RngCore + CryptoRng>(amount: u128, owner: Element, rng: R) -> Self {
        Self {
            amount,
            owner,
            blinding: Element::secure_random(rng),
            index: None,
        }
    }

    /// A zero-amount placeholder used to pad inputs and outputs
    #[must_use]
    pub fn zero(owner: Element) -> Self {
        Self::new(0, owner)
    }

    /// The same note, marked as inserted at `index`
    #[must_use]
    pub fn with_index(self, index: u64) -> Self {
        Self {
            index: Some(index),
            ..self
        }
    }

    /// Whether this note carries no value
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.amount == 0
    }

    /// `hash_merge([amount, owner, blinding])`
    ///
    /// ```rust
    /// # use notes::*;
    /// let owner = Keypair::from_seed(&[1; 32]).public_key();
    /// let note = Note::new(5, owner);
    ///
    /// assert_eq!(note.commitment(), note.clone().with_index(3).commitment());
    /// assert_ne!(note.commitment(), Note::new(5, owner).commitment());
    /// ```
    #[must_use]
    pub fn commitment(&self) -> Element {
        hash_merge([Element::from(self.amount), self.owner, self.blinding])
    }

    /// `hash_merge([commitment, index, signature])`, where the signature comes from
    /// [`Keypair::sign`]
    ///
    /// A zero-amount note without an index uses index 0. Fails if `keypair` doesn't own the note,
    /// has no spending key, or if a note with value has no index.
    ///
    /// ```rust
    /// # use notes::*;
    /// let keypair = Keypair::from_seed(&[1; 32]);
    /// let note = Note::new(5, keypair.public_key());
    ///
    /// assert_eq!(note.nullifier(&keypair), Err(Error::MissingIndex));
    ///
    /// let note = note.with_index(0);
    /// assert_eq!(note.nullifier(&keypair.view_only()), Err(Error::MissingSpendingKey));
    /// assert!(note.nullifier(&keypair).is_ok());
    /// ```
    pub fn nullifier(&self, keypair: &Keypair) -> Result<Element> {
        if keypair.public_key() != self.owner {
            return Err(Error::NotOwner {
                owner: self.owner,
                public_key: keypair.public_key(),
            });
        }

        let index = match (self.index, self.is_zero()) {
            (Some(index), _) => index,
            (None, true) => 0,
            (None, false) => return Err(Error::MissingIndex),
        };

        let commitment = self.commitment();
        let signature = keypair.sign(commitment, index)?;

        Ok(hash_merge([commitment, Element::from(index), signature]))
    }

    /// The plaintext sent to the owner: amount then blinding, 31 big-endian bytes each
    #[must_use]
    pub fn to_payload(&self) -> [u8; PAYLOAD_LEN] {
        let mut payload = [0; PAYLOAD_LEN];
        let (amount, blinding) = payload.split_at_mut(FIELD_LEN);

        let amount_bytes = self.amount.to_be_bytes();
        amount[FIELD_LEN - amount_bytes.len()..].copy_from_slice(&amount_bytes);

        // blindings are always drawn from 31 bytes, a note that doesn't fit can't be sent
        if let Some(bytes) = self.blinding.to_be_array::<FIELD_LEN>() {
            blinding.copy_from_slice(&bytes);
        }

        payload
    }

    /// Parse a payload produced by [`Note::to_payload`]
    fn from_payload(payload: &[u8], owner: Element, index: Option<u64>) -> Result<Self> {
        if payload.len() != PAYLOAD_LEN {
            return Err(Error::Decryption);
        }

        let (amount, blinding) = payload.split_at(FIELD_LEN);

        let amount = Element::from_be_slice(amount).ok_or(Error::Decryption)?;
        let amount = u128::try_from(amount).map_err(|_| Error::Decryption)?;
        let blinding = Element::from_be_slice(blinding).ok_or(Error::Decryption)?;

        Ok(Self {
            amount,
            owner,
            blinding,
            index,
        })
    }

    /// Encrypt this note's payload to the x25519 key `encryption_key`
    pub fn encrypt(&self, encryption_key: &[u8]) -> Result<Vec<u8>> {
        self.encrypt_with_rng(encryption_key, OsRng)
    }

    /// [`Note::encrypt`] with an explicit random number generator
    pub fn encrypt_with_rng<R: RngCore + CryptoRng>(
        &self,
        encryption_key: &[u8],
        rng: R,
    ) -> Result<Vec<u8>> {
        if self.blinding.to_be_array::<FIELD_LEN>().is_none() {
            return Err(Error::Encryption("blinding does not fit in 31 bytes"));
        }

        encryption::encrypt(&self.to_payload(), encryption_key, rng)
    }

    /// Decrypt a note sent to `keypair`, reporting why it failed
    ///
    /// The owner of the resulting note is `keypair`'s public key, and `index` is where the
    /// matching commitment was inserted (if known)
    pub fn decrypt(ciphertext: &[u8], keypair: &Keypair, index: Option<u64>) -> Result<Self> {
        let payload = encryption::decrypt(ciphertext, keypair.encryption_secret())?;
        Self::from_payload(&payload, keypair.public_key(), index)
    }

    /// Try to decrypt a note while scanning events
    ///
    /// Most ciphertexts on the ledger belong to someone else, so failure is the normal case and
    /// isn't an error
    #[must_use]
    pub fn decode(ciphertext: &[u8], keypair: &Keypair, index: Option<u64>) -> Option<Self> {
        Self::decrypt(ciphertext, keypair, index).ok()
    }
}

#[cfg(any(test, feature = "proptest"))]
mod proptest_impls {
    use ::proptest::prelude::*;

    use super::*;

    impl Arbitrary for Note {
        type Parameters = ();
        type Strategy = BoxedStrategy<Self>;

        fn arbitrary_with((): Self::Parameters) -> Self::Strategy {
            (any::<u128>(), any::<Element>(), any::<[u8; FIELD_LEN]>(), any::<Option<u64>>())
                .prop_map(|(amount, owner, blinding, index)| Note {
                    amount,
                    owner,
                    blinding: Element::from_be_slice(&blinding).unwrap_or_default(),
                    index,
                })
                .boxed()
        }
    }
}
