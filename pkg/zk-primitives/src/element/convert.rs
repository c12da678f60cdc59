use core::{num::TryFromIntError, str::FromStr};

use ethnum::U256;

use crate::Element;

macro_rules! from_int_impls {
    ($t:ty) => {
        impl From<$t> for Element {
            #[inline]
            fn from(value: $t) -> Self {
                Element(U256::from(value))
            }
        }

        impl TryFrom<Element> for $t {
            type Error = TryFromIntError;

            #[inline]
            fn try_from(value: Element) -> Result<Self, Self::Error> {
                <$t>::try_from(value.0)
            }
        }
    };
}

from_int_impls!(u8);
from_int_impls!(u32);
from_int_impls!(u64);
from_int_impls!(u128);

impl From<bool> for Element {
    #[inline]
    fn from(value: bool) -> Self {
        match value {
            false => Self::ZERO,
            true => Self::ONE,
        }
    }
}

impl FromStr for Element {
    type Err = <U256 as FromStr>::Err;

    /// Parse a hex string, with or without a `0x` prefix
    #[inline]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        Ok(Self(U256::from_str_radix(s, 16)?))
    }
}

impl From<U256> for Element {
    fn from(value: U256) -> Self {
        Self(value)
    }
}

impl From<Element> for U256 {
    fn from(value: Element) -> Self {
        value.0
    }
}

impl Element {
    /// The big-endian bytes of this element
    ///
    /// ```rust
    /// # use zk_primitives::*;
    /// let mut expected = [0; 32];
    /// expected[31] = 1;
    /// assert_eq!(Element::ONE.to_be_bytes(), expected);
    /// ```
    #[inline]
    #[must_use]
    pub fn to_be_bytes(self) -> [u8; 32] {
        self.0.to_be_bytes()
    }

    /// The little-endian bytes of this element
    #[inline]
    #[must_use]
    pub fn to_le_bytes(self) -> [u8; 32] {
        self.0.to_le_bytes()
    }

    /// Read an element from big-endian bytes
    #[inline]
    #[must_use]
    pub fn from_be_bytes(bytes: [u8; 32]) -> Self {
        Self(U256::from_be_bytes(bytes))
    }

    /// Read an element from little-endian bytes
    #[inline]
    #[must_use]
    pub fn from_le_bytes(bytes: [u8; 32]) -> Self {
        Self(U256::from_le_bytes(bytes))
    }

    /// Read an element from at most 32 big-endian bytes, left-padding with zeroes
    ///
    /// Returns `None` if `bytes` is longer than 32 bytes
    ///
    /// ```rust
    /// # use zk_primitives::*;
    /// assert_eq!(Element::from_be_slice(&[1, 0]), Some(Element::new(256)));
    /// assert_eq!(Element::from_be_slice(&[0; 33]), None);
    /// ```
    #[must_use]
    pub fn from_be_slice(bytes: &[u8]) -> Option<Self> {
        let offset = 32usize.checked_sub(bytes.len())?;
        let mut padded = [0; 32];
        padded.get_mut(offset..)?.copy_from_slice(bytes);
        Some(Self::from_be_bytes(padded))
    }

    /// Write the low `N` big-endian bytes of this element
    ///
    /// Returns `None` if the element does not fit in `N` bytes
    ///
    /// ```rust
    /// # use zk_primitives::*;
    /// assert_eq!(Element::new(256).to_be_array::<2>(), Some([1, 0]));
    /// assert_eq!(Element::new(256).to_be_array::<1>(), None);
    /// ```
    #[must_use]
    pub fn to_be_array<const N: usize>(self) -> Option<[u8; N]> {
        let bytes = self.to_be_bytes();
        let (high, low) = bytes.split_at(32usize.checked_sub(N)?);

        if high.iter().any(|byte| *byte != 0) {
            return None;
        }

        low.try_into().ok()
    }
}
