use ethnum::{uint, U256};
use ff::PrimeField;

use crate::{Base, Element};

impl Element {
    /// The modulus of the BN254 scalar field
    pub const MODULUS: Element = Element(uint!(
        "0x30644e72e131a029b85045b68181585d2833e84879b9709143e1f593f0000001"
    ));

    /// Convert this [`Element`] to its [`Base`] representation
    ///
    /// Non-canonical elements are reduced by the conversion
    #[inline]
    #[must_use]
    pub fn to_base(self) -> Base {
        Base::from_raw(le_bytes_to_limbs(self.0.to_le_bytes()))
    }

    /// Create an [`Element`] from a [`Base`]
    #[inline]
    #[must_use]
    pub fn from_base(base: Base) -> Element {
        Self(U256::from_le_bytes(base.to_repr()))
    }

    /// Reduce this element modulo [`Element::MODULUS`]
    ///
    /// Canonical elements are unchanged by a round trip through [`Base`]
    #[inline]
    pub fn canonicalize(&mut self) {
        self.0 %= Self::MODULUS.0;
    }

    /// Whether this element is already reduced
    #[inline]
    #[must_use]
    pub fn is_canonical(&self) -> bool {
        self.0 < Self::MODULUS.0
    }

    /// Addition in the field
    #[inline]
    #[must_use]
    pub fn field_add(self, other: Element) -> Element {
        Self::from_base(self.to_base() + other.to_base())
    }

    /// Subtraction in the field, wrapping around the modulus
    ///
    /// ```rust
    /// # use zk_primitives::*;
    /// let minus_one = Element::ZERO.field_sub(Element::ONE);
    /// assert_eq!(minus_one.field_add(Element::ONE), Element::ZERO);
    /// ```
    #[inline]
    #[must_use]
    pub fn field_sub(self, other: Element) -> Element {
        Self::from_base(self.to_base() - other.to_base())
    }

    /// Map a signed integer into the field, so that `-x` becomes `p - x`
    ///
    /// This is how signed external amounts become public signals
    ///
    /// ```rust
    /// # use zk_primitives::*;
    /// assert_eq!(Element::from_i128(5), Element::new(5));
    /// assert_eq!(Element::from_i128(-5).field_add(Element::new(5)), Element::ZERO);
    /// ```
    #[must_use]
    pub fn from_i128(value: i128) -> Element {
        let magnitude = Element::from(value.unsigned_abs());
        match value.is_negative() {
            false => magnitude,
            true => Element::ZERO.field_sub(magnitude),
        }
    }
}

impl From<Base> for Element {
    fn from(value: Base) -> Self {
        Element::from_base(value)
    }
}

impl From<Element> for Base {
    fn from(value: Element) -> Self {
        value.to_base()
    }
}

fn le_bytes_to_limbs(bytes: [u8; 32]) -> [u64; 4] {
    let mut limbs = [0u64; 4];
    for (limb, chunk) in limbs.iter_mut().zip(bytes.chunks_exact(8)) {
        let mut buf = [0u8; 8];
        buf.copy_from_slice(chunk);
        *limb = u64::from_le_bytes(buf);
    }
    limbs
}
