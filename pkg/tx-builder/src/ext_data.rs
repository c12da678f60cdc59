use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use zk_primitives::{keccak_to_field, Element};

/// Public metadata that travels next to the proof
///
/// The builder never interprets `recipient` or `relayer`, they are passed to the ledger as-is.
/// The proof commits to all of it through [`ExtData::hash`].
#[derive(
    Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
pub struct ExtData {
    /// Where withdrawn value is sent on the ledger, empty for none
    pub recipient: Vec<u8>,
    /// The signed external amount: positive for a deposit, negative for a withdrawal
    pub ext_amount: i128,
    /// Who submits the transaction and collects `fee`, empty for none
    pub relayer: Vec<u8>,
    /// The fee paid to the relayer out of the pool
    pub fee: u128,
    /// The encrypted payload of each output, in output order
    pub encrypted_outputs: Vec<Vec<u8>>,
    /// Whether the withdrawal is relayed to a second domain through the bridge
    pub is_l1_withdrawal: bool,
    /// The fee for relaying to the second domain
    pub l1_fee: u128,
}

impl ExtData {
    /// `keccak256(borsh(self)) mod p`, the public signal binding this data to the proof
    ///
    /// ```rust
    /// # use tx_builder::*;
    /// let a = ExtData { fee: 1, ..ExtData::default() };
    /// let b = ExtData { fee: 2, ..ExtData::default() };
    ///
    /// assert_ne!(a.hash(), b.hash());
    /// assert!(a.hash().is_canonical());
    /// ```
    #[must_use]
    pub fn hash(&self) -> Element {
        keccak_to_field(&self.to_bytes())
    }

    /// The borsh encoding of this data
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        #[allow(clippy::expect_used)]
        borsh::to_vec(self).expect("serializing to a Vec never fails")
    }
}
