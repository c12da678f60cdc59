use crate::ExtData;

/// Encodes finalized [`ExtData`] for relay to a second domain
///
/// The builder treats the output as opaque bytes
pub trait Bridge: Send + Sync {
    /// The bytes handed to the cross-domain messenger
    fn encode(&self, ext_data: &ExtData) -> Vec<u8>;
}

/// A [`Bridge`] that passes the borsh encoding through unchanged
///
/// ```rust
/// # use tx_builder::*;
/// let ext_data = ExtData { l1_fee: 3, ..ExtData::default() };
/// assert_eq!(BorshBridge.encode(&ext_data), ext_data.to_bytes());
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct BorshBridge;

impl Bridge for BorshBridge {
    fn encode(&self, ext_data: &ExtData) -> Vec<u8> {
        ext_data.to_bytes()
    }
}
