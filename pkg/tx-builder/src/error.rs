use core::fmt;

use notes::ReservationId;
use zk_primitives::Element;

/// Where in the pipeline an error happened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Checking local configuration against itself and the ledger
    Configure,
    /// Checking request amounts against the configured bounds
    Validate,
    /// Catching the local tree up with the ledger
    Sync,
    /// Selecting and reserving input notes
    CollectInputs,
    /// Locating inputs in the tree and checking they are unspent
    ResolveProofs,
    /// Creating recipient, change, and padding notes
    BuildOutputs,
    /// Computing nullifiers, commitments, payloads, and public signals
    AssembleWitness,
    /// Waiting for the prover
    Prove,
    /// Handing the proof to the ledger
    Submit,
    /// Confirming or failing an in-flight transaction
    Finalize,
}

impl Stage {
    /// Whether any notes can still be reserved when an error happens at this stage
    ///
    /// Before proving, reservations are released as soon as the build is dropped. From proving
    /// onwards, notes stay in flight until they are explicitly confirmed or failed.
    #[must_use]
    pub fn holds_in_flight_notes(self) -> bool {
        matches!(self, Stage::Prove | Stage::Submit)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Configure => "configure",
            Stage::Validate => "validate",
            Stage::Sync => "sync",
            Stage::CollectInputs => "collect inputs",
            Stage::ResolveProofs => "resolve proofs",
            Stage::BuildOutputs => "build outputs",
            Stage::AssembleWitness => "assemble witness",
            Stage::Prove => "prove",
            Stage::Submit => "submit",
            Stage::Finalize => "finalize",
        };

        f.write_str(name)
    }
}

/// Why an input note can no longer be spent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StaleReason {
    /// The commitment isn't in the tree rebuilt from the ledger's log
    NotInTree,
    /// The commitment is in the tree, but not where the note says it is
    IndexMismatch {
        /// The index recorded in the note
        recorded: Option<u64>,
        /// The index found in the tree
        found: u64,
    },
    /// The ledger has already seen the nullifier
    AlreadySpent,
}

impl fmt::Display for StaleReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StaleReason::NotInTree => f.write_str("commitment is not in the tree"),
            StaleReason::IndexMismatch {
                recorded: Some(recorded),
                found,
            } => write!(f, "note is recorded at index {recorded}, tree has it at {found}"),
            StaleReason::IndexMismatch {
                recorded: None,
                found,
            } => write!(f, "note has no index, tree has it at {found}"),
            StaleReason::AlreadySpent => f.write_str("nullifier is already spent"),
        }
    }
}

/// What went wrong
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ErrorKind {
    /// A local parameter disagrees with the ledger's deployment
    #[error("config mismatch on {field}: local {local}, ledger {ledger}")]
    ConfigMismatch {
        /// The parameter that differs
        field: &'static str,
        /// The local value
        local: String,
        /// The ledger's value
        ledger: String,
    },

    /// The local configuration is unusable on its own
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// The local tree doesn't match the ledger, even after a full rebuild
    #[error("tree desync: ledger root is {expected}, local root is {actual}")]
    TreeDesync {
        /// The root the ledger reported
        expected: Element,
        /// The root of the local tree
        actual: Element,
    },

    /// Any other tree failure
    #[error("tree error: {0}")]
    Tree(accumulator::Error),

    /// An input note can't be spent any more
    #[error("stale note {commitment}: {reason}")]
    StaleNote {
        /// The commitment of the note
        commitment: Element,
        /// Why it is stale
        reason: StaleReason,
    },

    /// No selection of unspent notes covers the amount
    #[error("insufficient funds: need {required}, can spend {available}")]
    InsufficientFunds {
        /// The amount the inputs must cover
        required: u128,
        /// The most that a permitted number of inputs can cover
        available: u128,
    },

    /// An external amount is outside the ledger's bounds, or overflows
    #[error("{what} of {amount} is out of range: {bound}")]
    AmountOutOfRange {
        /// Which amount
        what: &'static str,
        /// The requested amount
        amount: u128,
        /// The bound that was violated
        bound: String,
    },

    /// A payload couldn't be encrypted
    #[error("encryption failed: {0}")]
    Encryption(notes::Error),

    /// A payload couldn't be decrypted
    #[error("decryption failed: {0}")]
    Decryption(notes::Error),

    /// The keypair can't spend
    #[error("keypair has no spending key")]
    MissingSpendingKey,

    /// Any other note failure
    #[error("note error: {0}")]
    Note(notes::Error),

    /// There are more recipients than output slots
    #[error("{requested} outputs are needed, but only {available} are available")]
    TooManyOutputs {
        /// The number of outputs needed
        requested: usize,
        /// The configured output count
        available: usize,
    },

    /// An assembled witness failed its own consistency checks
    #[error("invalid witness: {0}")]
    InvalidWitness(String),

    /// The prover failed
    #[error("prover failed: {0}")]
    Prover(String),

    /// A call to the ledger failed
    #[error("ledger error: {0}")]
    Ledger(String),

    /// Fetching commitment events failed
    #[error("event source error: {0}")]
    EventSource(String),

    /// The ledger refused the transaction
    #[error("transaction rejected: {0}")]
    Rejected(String),

    /// There is no in-flight transaction with this id
    #[error("unknown reservation {0}")]
    UnknownReservation(ReservationId),
}

impl ErrorKind {
    /// Attach the stage this happened in
    #[must_use]
    pub fn at(self, stage: Stage) -> Error {
        Error { stage, kind: self }
    }
}

impl From<accumulator::Error> for ErrorKind {
    fn from(error: accumulator::Error) -> Self {
        match error {
            accumulator::Error::Desync { expected, actual } => {
                ErrorKind::TreeDesync { expected, actual }
            }
            other => ErrorKind::Tree(other),
        }
    }
}

impl From<notes::Error> for ErrorKind {
    fn from(error: notes::Error) -> Self {
        match error {
            notes::Error::Encryption(_) => ErrorKind::Encryption(error),
            notes::Error::Decryption => ErrorKind::Decryption(error),
            notes::Error::MissingSpendingKey => ErrorKind::MissingSpendingKey,
            notes::Error::UnknownReservation(id) => ErrorKind::UnknownReservation(id),
            other => ErrorKind::Note(other),
        }
    }
}

/// An [`ErrorKind`] and the [`Stage`] it happened in
///
/// ```rust
/// # use tx_builder::*;
/// let error = ErrorKind::InsufficientFunds { required: 10, available: 3 }.at(Stage::CollectInputs);
///
/// assert_eq!(error.stage(), Stage::CollectInputs);
/// assert!(error.is_recoverable());
/// assert_eq!(error.to_string(), "collect inputs: insufficient funds: need 10, can spend 3");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{stage}: {kind}")]
pub struct Error {
    stage: Stage,
    #[source]
    kind: ErrorKind,
}

impl Error {
    /// The stage the error happened in
    #[must_use]
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// What went wrong
    #[must_use]
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// Take the [`ErrorKind`], discarding the stage
    #[must_use]
    pub fn into_kind(self) -> ErrorKind {
        self.kind
    }

    /// Whether the caller can fix this by choosing different notes or amounts and trying again
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::StaleNote { .. }
                | ErrorKind::InsufficientFunds { .. }
                | ErrorKind::AmountOutOfRange { .. }
        )
    }

    /// Whether the local tree must be rebuilt before anything else is attempted
    #[must_use]
    pub fn requires_resync(&self) -> bool {
        matches!(self.kind, ErrorKind::TreeDesync { .. })
    }
}

/// Shorthand for results with a tx-builder [`Error`]
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Attach a [`Stage`] to any error that converts into an [`ErrorKind`]
pub(crate) trait AtStage<T> {
    fn at(self, stage: Stage) -> Result<T>;
}

impl<T, E: Into<ErrorKind>> AtStage<T> for core::result::Result<T, E> {
    fn at(self, stage: Stage) -> Result<T> {
        self.map_err(|error| error.into().at(stage))
    }
}

#[cfg(test)]
mod tests {
    use expect_test::expect;

    use super::*;

    #[test]
    fn messages_include_the_stage() {
        expect!["validate: withdrawal of 1 is out of range: minimum is 50"].assert_eq(
            &ErrorKind::AmountOutOfRange {
                what: "withdrawal",
                amount: 1,
                bound: "minimum is 50".into(),
            }
            .at(Stage::Validate)
            .to_string(),
        );

        expect!["resolve proofs: stale note 7: nullifier is already spent"].assert_eq(
            &ErrorKind::StaleNote {
                commitment: Element::new(7),
                reason: StaleReason::AlreadySpent,
            }
            .at(Stage::ResolveProofs)
            .to_string(),
        );

        expect!["configure: config mismatch on tree_height: local 20, ledger 5"].assert_eq(
            &ErrorKind::ConfigMismatch {
                field: "tree_height",
                local: "20".into(),
                ledger: "5".into(),
            }
            .at(Stage::Configure)
            .to_string(),
        );
    }

    #[test]
    fn desync_is_not_recoverable_but_requires_resync() {
        let error: Result<()> = Err(accumulator::Error::Desync {
            expected: Element::new(1),
            actual: Element::new(2),
        })
        .at(Stage::Sync);
        let error = error.unwrap_err();

        assert!(!error.is_recoverable());
        assert!(error.requires_resync());
        assert_eq!(error.stage(), Stage::Sync);
    }

    #[test]
    fn note_errors_map_to_their_kinds() {
        assert_eq!(
            ErrorKind::from(notes::Error::MissingSpendingKey),
            ErrorKind::MissingSpendingKey
        );
        assert_eq!(
            ErrorKind::from(notes::Error::Decryption),
            ErrorKind::Decryption(notes::Error::Decryption)
        );
        assert_eq!(
            ErrorKind::from(notes::Error::MissingIndex),
            ErrorKind::Note(notes::Error::MissingIndex)
        );
    }

    #[test]
    fn in_flight_stages() {
        assert!(!Stage::AssembleWitness.holds_in_flight_notes());
        assert!(Stage::Prove.holds_in_flight_notes());
        assert!(Stage::Submit.holds_in_flight_notes());
    }
}
