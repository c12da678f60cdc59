use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use zk_primitives::Element;

use crate::{ExtData, LedgerParameters, Proof, PublicSignals};

/// Errors returned by collaborators, surfaced to the caller as their `Display` text
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A commitment inserted into the ledger's tree, with the encrypted payload of its note
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitmentEvent {
    /// The inserted commitment
    pub commitment: Element,
    /// The leaf index the ledger inserted it at
    pub index: u64,
    /// The note payload, encrypted to its owner
    pub encrypted_output: Vec<u8>,
}

/// Everything the ledger needs to verify and apply a transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    /// The proof produced by the [`Prover`](crate::Prover)
    pub proof: Proof,
    /// The public signals the proof was made against
    pub signals: PublicSignals,
    /// The metadata committed to by `signals.ext_data_hash`
    pub ext_data: ExtData,
    /// The bridge encoding of `ext_data`, for withdrawals relayed to a second domain
    pub bridge_payload: Option<Vec<u8>>,
}

/// The ledger's acknowledgement of a submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    /// An identifier for the submitted transaction, opaque to the builder
    pub id: String,
}

/// Why a submission failed
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    /// The ledger looked at the transaction and refused it, none of its effects were applied
    #[error("{0}")]
    Rejected(String),

    /// The submission may or may not have reached the ledger
    #[error(transparent)]
    Other(BoxError),
}

/// The on-chain pool: roots, nullifier flags, and transaction verification
#[async_trait]
pub trait Ledger: Send + Sync {
    /// The parameters the pool was deployed with
    async fn parameters(&self) -> Result<LedgerParameters, BoxError>;

    /// The latest root of the commitment tree
    async fn current_root(&self) -> Result<Element, BoxError>;

    /// Whether `root` is one of the recent roots the ledger still accepts proofs against
    async fn is_known_root(&self, root: Element) -> Result<bool, BoxError>;

    /// Whether `nullifier` has already been spent
    async fn is_spent(&self, nullifier: Element) -> Result<bool, BoxError>;

    /// Verify and apply a transaction
    async fn submit(&self, submission: &Submission) -> Result<Receipt, SubmitError>;
}

/// The ordered log of commitment events
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Every event with `index >= from_index`, in insertion order
    async fn commitments(&self, from_index: u64) -> Result<Vec<CommitmentEvent>, BoxError>;
}
