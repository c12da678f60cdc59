use core::fmt;

use blake2b_simd::Params as Blake2bParams;
use rand::{rngs::OsRng, RngCore};
use x25519_dalek::{PublicKey, StaticSecret};
use zk_primitives::{hash_merge, Element};

use crate::{Error, Result};

mod address;

pub use address::Address;

const SPENDING_KEY_PERSONALISATION: &[u8; 16] = b"ShieldedPool_Spk";
const ENCRYPTION_KEY_PERSONALISATION: &[u8; 16] = b"ShieldedPool_Enc";

/// The keys that own, spend, and receive notes
///
/// The spending key is a field element, and the public key is its Poseidon hash. Note payloads
/// are encrypted with a separate x25519 pair, so a [view-only][Keypair::view_only] copy can scan
/// for incoming notes without being able to spend them.
///
/// ```rust
/// # use notes::*;
/// let keypair = Keypair::from_seed(&[1; 32]);
/// let again = Keypair::from_seed(&[1; 32]);
///
/// assert_eq!(keypair.public_key(), again.public_key());
/// assert_eq!(keypair.address(), again.address());
/// ```
#[derive(Clone)]
pub struct Keypair {
    spending_key: Option<Element>,
    public_key: Element,
    encryption_secret: StaticSecret,
    encryption_public_key: PublicKey,
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keypair")
            .field("public_key", &self.public_key)
            .field("view_only", &self.spending_key.is_none())
            .finish_non_exhaustive()
    }
}

impl Keypair {
    /// Derive a keypair from a 32-byte seed
    ///
    /// The spending key and the encryption secret are BLAKE2b hashes of the seed under different
    /// personalisations. The spending key is 31 bytes long, so it is always a canonical field
    /// element.
    #[must_use]
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        let spending_key = blake2b(SPENDING_KEY_PERSONALISATION, Element::RANDOM_BYTES, seed);
        let spending_key = Element::from_be_slice(&spending_key).unwrap_or_default();

        let encryption_secret = blake2b(ENCRYPTION_KEY_PERSONALISATION, 32, seed);
        let mut secret_bytes = [0u8; 32];
        secret_bytes.copy_from_slice(&encryption_secret);

        Self::from_parts(spending_key, StaticSecret::from(secret_bytes))
    }

    /// Generate a keypair from a seed drawn from the OS random number generator
    #[must_use]
    pub fn random() -> Self {
        let mut seed = [0u8; 32];
        OsRng.fill_bytes(&mut seed);
        Self::from_seed(&seed)
    }

    fn from_parts(spending_key: Element, encryption_secret: StaticSecret) -> Self {
        Self {
            spending_key: Some(spending_key),
            public_key: hash_merge([spending_key]),
            encryption_public_key: PublicKey::from(&encryption_secret),
            encryption_secret,
        }
    }

    /// A copy of this keypair without the spending key
    ///
    /// It can still decrypt and recognise incoming notes, but asking it for a nullifier fails
    ///
    /// ```rust
    /// # use notes::*;
    /// let keypair = Keypair::from_seed(&[1; 32]);
    /// let view_only = keypair.view_only();
    ///
    /// assert_eq!(view_only.address(), keypair.address());
    /// assert_eq!(view_only.sign(Element::ONE, 0), Err(Error::MissingSpendingKey));
    /// ```
    #[must_use]
    pub fn view_only(&self) -> Self {
        Self {
            spending_key: None,
            ..self.clone()
        }
    }

    /// Whether this keypair can spend notes
    #[must_use]
    pub fn can_spend(&self) -> bool {
        self.spending_key.is_some()
    }

    /// The spending key, if this keypair holds one
    #[must_use]
    pub fn spending_key(&self) -> Option<Element> {
        self.spending_key
    }

    /// The public key notes are committed to
    #[must_use]
    pub fn public_key(&self) -> Element {
        self.public_key
    }

    /// The x25519 key note payloads are encrypted to
    #[must_use]
    pub fn encryption_public_key(&self) -> PublicKey {
        self.encryption_public_key
    }

    /// The x25519 secret used to decrypt incoming payloads
    #[must_use]
    pub fn encryption_secret(&self) -> &StaticSecret {
        &self.encryption_secret
    }

    /// The address other wallets send notes to
    #[must_use]
    pub fn address(&self) -> Address {
        Address::new(self.public_key, self.encryption_public_key.to_bytes())
    }

    /// `hash_merge([spending_key, commitment, index])`, which binds a nullifier to the key that
    /// owns the note
    pub fn sign(&self, commitment: Element, index: u64) -> Result<Element> {
        let spending_key = self.spending_key.ok_or(Error::MissingSpendingKey)?;
        Ok(hash_merge([spending_key, commitment, Element::from(index)]))
    }
}

fn blake2b(personal: &[u8], len: usize, seed: &[u8]) -> Vec<u8> {
    Blake2bParams::new()
        .hash_length(len)
        .personal(personal)
        .hash(seed)
        .as_bytes()
        .to_vec()
}
