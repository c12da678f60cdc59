use core::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use zk_primitives::Element;

use crate::Error;

const ADDRESS_BYTES: usize = 64;

/// Where notes are sent: the owner's public key and their x25519 encryption key
///
/// Addresses are written as `0x` followed by 128 hex characters, the 32 big-endian bytes of the
/// public key then the 32 bytes of the encryption key
///
/// ```rust
/// # use notes::*;
/// let address = Keypair::from_seed(&[2; 32]).address();
///
/// let string = address.to_string();
/// assert_eq!(string.len(), 130);
/// assert_eq!(string.parse::<Address>().unwrap(), address);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address {
    public_key: Element,
    encryption_key: [u8; 32],
}

impl Address {
    /// Create an address from its parts
    #[must_use]
    pub fn new(public_key: Element, encryption_key: [u8; 32]) -> Self {
        Self {
            public_key,
            encryption_key,
        }
    }

    /// The public key that notes sent to this address are committed to
    #[must_use]
    pub fn public_key(&self) -> Element {
        self.public_key
    }

    /// The x25519 key that note payloads are encrypted to
    #[must_use]
    pub fn encryption_key(&self) -> &[u8; 32] {
        &self.encryption_key
    }

    /// The raw 64 byte form of the address
    #[must_use]
    pub fn to_bytes(&self) -> [u8; ADDRESS_BYTES] {
        let mut bytes = [0; ADDRESS_BYTES];
        let (public_key, encryption_key) = bytes.split_at_mut(32);
        public_key.copy_from_slice(&self.public_key.to_be_bytes());
        encryption_key.copy_from_slice(&self.encryption_key);
        bytes
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.to_bytes()))
    }
}

impl FromStr for Address {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.strip_prefix("0x").unwrap_or(s);

        if s.len() != ADDRESS_BYTES * 2 {
            return Err(Error::InvalidAddress(format!(
                "expected {} hex characters, got {}",
                ADDRESS_BYTES * 2,
                s.len()
            )));
        }

        let mut bytes = [0u8; ADDRESS_BYTES];
        hex::decode_to_slice(s, &mut bytes).map_err(|e| Error::InvalidAddress(e.to_string()))?;

        let (public_key, encryption_key) = bytes.split_at(32);
        let public_key = Element::from_be_slice(public_key)
            .filter(Element::is_canonical)
            .ok_or_else(|| Error::InvalidAddress("public key is not a field element".into()))?;

        let mut key = [0u8; 32];
        key.copy_from_slice(encryption_key);

        Ok(Self::new(public_key, key))
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
