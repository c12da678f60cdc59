use rand::{CryptoRng, RngCore};

use crate::Element;

impl Element {
    /// The number of random bytes drawn by [`Element::secure_random`]
    pub const RANDOM_BYTES: usize = 31;

    /// Generate a uniformly random element from 31 bytes of a cryptographically secure RNG
    ///
    /// 248 bits always fit below the modulus, so the result is canonical without any reduction
    /// bias
    ///
    /// ```rust
    /// # use zk_primitives::*;
    /// let element = Element::secure_random(rand::rngs::OsRng);
    /// assert!(element.is_canonical());
    /// ```
    #[must_use]
    pub fn secure_random<R: RngCore + CryptoRng>(mut rng: R) -> Self {
        let mut bytes = [0u8; 32];
        if let Some(low) = bytes.get_mut(32 - Self::RANDOM_BYTES..) {
            rng.fill_bytes(low);
        }
        Self::from_be_bytes(bytes)
    }
}
