#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::match_bool)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::doc_markdown)]
#![deny(missing_docs)]

//! # Transaction builder
//!
//! Turns a request ("deposit 1 unit", "send 5 to this address", "withdraw 3 to this account")
//! into the witness a prover needs, and drives the result through proving and submission.
//!
//! Every build runs the same pipeline:
//!
//!  1. **validate**: external amounts are checked against the configured bounds
//!  2. **sync**: the local tree catches up with the ledger's commitment log, and owned notes are
//!     discovered by trial decryption
//!  3. **collect inputs**: unspent notes are selected and reserved
//!  4. **resolve proofs**: each input is located in the tree, checked against the ledger's
//!     spent flags, and given a Merkle path
//!  5. **build outputs**: recipient, change, and padding notes are created
//!  6. **assemble witness**: nullifiers, commitments, encrypted payloads, and public signals
//!
//! The result is a [`PreparedTransaction`]. Handing it to
//! [`TransactionBuilder::prove_and_submit`] moves its inputs from reserved to in flight, after
//! which only [`TransactionBuilder::confirm`] or [`TransactionBuilder::fail`] can settle them.
//!
//! Every error carries the [`Stage`] it happened in, so callers know whether any notes are still
//! held.

mod bridge;
mod builder;
mod config;
mod error;
mod ext_data;
mod ledger;
mod prover;
mod sync;
mod witness;

#[cfg(any(test, feature = "test-api"))]
pub mod test;

pub use bridge::{Bridge, BorshBridge};
pub use builder::{
    select_inputs, Collaborators, Payment, PreparedTransaction, Submitted, TransactionBuilder,
    TxRequest,
};
pub use config::{Config, LedgerParameters, ONE_UNIT};
pub use error::{Error, ErrorKind, Result, Stage, StaleReason};
pub use ext_data::ExtData;
pub use ledger::{BoxError, CommitmentEvent, EventSource, Ledger, Receipt, SubmitError, Submission};
pub use prover::{Proof, Prover, ProverService};
pub use sync::SyncReport;
pub use witness::{InputWitness, OutputWitness, PublicSignals, WitnessBundle};
