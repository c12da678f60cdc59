use chacha20poly1305::{
    aead::{Aead, KeyInit, Payload},
    ChaCha20Poly1305,
};
use hkdf::Hkdf;
use rand::{CryptoRng, RngCore};
use sha2::Sha256;
use x25519_dalek::{PublicKey, StaticSecret};

use crate::{Error, Result};

/// The first byte of every ciphertext produced by [`encrypt`]
pub const CIPHERTEXT_VERSION: u8 = 1;

const KEY_LEN: usize = 32;
const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;
const HEADER_LEN: usize = 1 + KEY_LEN + NONCE_LEN;

const KDF_INFO: &[u8] = b"shielded-pool-note-v1";

/// Encrypt `payload` to the owner of the x25519 public key `recipient`
///
/// A fresh ephemeral key is generated for every call. The output is laid out as
/// `version || ephemeral public key || nonce || ciphertext || tag`, and the version and
/// ephemeral key are authenticated along with the payload.
///
/// ```rust
/// # use notes::*;
/// let keypair = Keypair::from_seed(&[3; 32]);
/// let recipient = keypair.encryption_public_key();
///
/// let ciphertext = encrypt(b"hello", recipient.as_bytes(), rand::rngs::OsRng).unwrap();
/// assert_eq!(ciphertext[0], CIPHERTEXT_VERSION);
///
/// let plaintext = decrypt(&ciphertext, keypair.encryption_secret()).unwrap();
/// assert_eq!(plaintext, b"hello");
/// ```
pub fn encrypt<R: RngCore + CryptoRng>(payload: &[u8], recipient: &[u8], mut rng: R) -> Result<Vec<u8>> {
    let recipient: [u8; KEY_LEN] = recipient
        .try_into()
        .map_err(|_| Error::Encryption("recipient key is not 32 bytes"))?;
    let recipient = PublicKey::from(recipient);

    let ephemeral = StaticSecret::random_from_rng(&mut rng);
    let ephemeral_public = PublicKey::from(&ephemeral);

    let shared = ephemeral.diffie_hellman(&recipient);
    if !shared.was_contributory() {
        return Err(Error::Encryption("recipient key is a low-order point"));
    }

    let key = derive_key(shared.as_bytes()).ok_or(Error::Encryption("key derivation failed"))?;

    let mut nonce = [0u8; NONCE_LEN];
    rng.fill_bytes(&mut nonce);

    let mut out = Vec::with_capacity(HEADER_LEN + payload.len() + TAG_LEN);
    out.push(CIPHERTEXT_VERSION);
    out.extend_from_slice(ephemeral_public.as_bytes());

    let cipher = ChaCha20Poly1305::new(&key.into());
    let sealed = cipher
        .encrypt(
            &nonce.into(),
            Payload {
                msg: payload,
                aad: &out,
            },
        )
        .map_err(|_| Error::Encryption("aead failure"))?;

    out.extend_from_slice(&nonce);
    out.extend_from_slice(&sealed);

    Ok(out)
}

/// Decrypt a ciphertext produced by [`encrypt`] with the recipient's x25519 secret
///
/// Every failure (wrong key, truncation, tampering, unknown version) is reported as
/// [`Error::Decryption`]
pub fn decrypt(ciphertext: &[u8], secret: &StaticSecret) -> Result<Vec<u8>> {
    if ciphertext.len() < HEADER_LEN + TAG_LEN {
        return Err(Error::Decryption);
    }

    let (aad, rest) = ciphertext.split_at(1 + KEY_LEN);
    let (nonce, sealed) = rest.split_at(NONCE_LEN);

    let (&version, ephemeral_public) = aad.split_first().ok_or(Error::Decryption)?;
    if version != CIPHERTEXT_VERSION {
        return Err(Error::Decryption);
    }

    let ephemeral_public: [u8; KEY_LEN] = ephemeral_public
        .try_into()
        .map_err(|_| Error::Decryption)?;
    let nonce: [u8; NONCE_LEN] = nonce.try_into().map_err(|_| Error::Decryption)?;

    let shared = secret.diffie_hellman(&PublicKey::from(ephemeral_public));
    let key = derive_key(shared.as_bytes()).ok_or(Error::Decryption)?;

    let cipher = ChaCha20Poly1305::new(&key.into());
    cipher
        .decrypt(&nonce.into(), Payload { msg: sealed, aad })
        .map_err(|_| Error::Decryption)
}

fn derive_key(shared: &[u8; 32]) -> Option<[u8; 32]> {
    let hk = Hkdf::<Sha256>::new(None, shared);

    let mut key = [0u8; 32];
    hk.expand(KDF_INFO, &mut key).ok()?;
    Some(key)
}
