use crate::ReservationId;

/// An error produced while handling keys, notes, or the note store
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The payload could not be encrypted for the recipient
    #[error("encryption failed: {0}")]
    Encryption(&'static str),

    /// The ciphertext was malformed, corrupted, or not addressed to this key
    #[error("decryption failed")]
    Decryption,

    /// A view-only keypair was asked to sign
    #[error("keypair has no spending key")]
    MissingSpendingKey,

    /// The keypair does not own the note it was asked to nullify
    #[error("note is owned by {owner}, not {public_key}")]
    NotOwner {
        /// The owner recorded in the note
        owner: zk_primitives::Element,
        /// The public key of the keypair that was used
        public_key: zk_primitives::Element,
    },

    /// A note with a non-zero amount has not been inserted into the tree yet
    #[error("note has no index, it must be inserted before it can be spent")]
    MissingIndex,

    /// An address string could not be parsed
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// No note in the store belongs to this reservation
    #[error("unknown reservation {0}")]
    UnknownReservation(ReservationId),
}

/// Shorthand for results with a notes [`Error`]
pub type Result<T, E = Error> = core::result::Result<T, E>;
