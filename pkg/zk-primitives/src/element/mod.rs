use ethnum::U256;

mod convert;
mod field;
mod fmt;

#[cfg(feature = "borsh")]
mod borsh_impls;

#[cfg(feature = "rand")]
mod rand_impls;

#[cfg(feature = "serde")]
mod serde;

/// A 256-bit unsigned integer that is (almost always) a member of the BN254 scalar field
///
/// An [`Element`] can hold any `U256`, but every value produced by hashing, and every value the
/// verifier accepts, is reduced modulo [`Element::MODULUS`]. Use [`Element::canonicalize`] to
/// reduce a value that came from outside the field.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Hash)]
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Element(#[cfg_attr(feature = "serde", serde(with = "serde"))] pub(crate) U256);

impl Element {
    /// The additive identity
    pub const ZERO: Self = Self(U256::ZERO);

    /// The multiplicative identity
    pub const ONE: Self = Self(U256::ONE);

    /// The [`Element`] used as the initialization vector when hashing bytes
    pub(crate) const BYTE_HASH_IV: Self = Self(U256::new(2));

    /// Create a new [`Element`] from a u64
    #[inline]
    #[must_use]
    pub fn new(i: u64) -> Self {
        Self(U256::from(i))
    }

    /// The underlying 256-bit integer
    #[inline]
    #[must_use]
    pub fn to_u256(self) -> U256 {
        self.0
    }

    /// Big-endian hex encoding, without a `0x` prefix, always 64 characters
    #[inline]
    #[must_use]
    pub fn to_hex(self) -> String {
        hex::encode(self.to_be_bytes())
    }

    /// Whether this element is zero
    #[inline]
    #[must_use]
    pub fn is_zero(self) -> bool {
        self == Self::ZERO
    }
}

#[cfg(any(test, feature = "proptest"))]
pub mod proptest {
    use super::Element;
    use ::proptest::{arbitrary::StrategyFor, prelude::*, strategy::Map};
    use ethnum::U256;

    /// Arbitrary elements are always canonical, since that is all the pool ever produces
    impl Arbitrary for Element {
        type Strategy = Map<StrategyFor<[u8; 32]>, fn([u8; 32]) -> Self>;
        type Parameters = ();

        fn arbitrary_with((): Self::Parameters) -> Self::Strategy {
            any::<[u8; 32]>().prop_map(|array| {
                let mut element = Self(U256::from_be_bytes(array));
                element.canonicalize();
                element
            })
        }
    }
}
