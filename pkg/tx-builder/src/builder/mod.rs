mod inputs;
mod outputs;
mod request;
mod select;
mod submit;

#[cfg(test)]
mod tests;

use std::{collections::HashMap, sync::Arc};

use accumulator::MerkleTree;
use notes::{InFlight, Keypair, Note, Reservation, ReservationId, SharedNoteStore};
use tracing::{debug, instrument};
use zk_primitives::Element;

use self::outputs::{plan_outputs, PlannedOutput};
pub(crate) use self::request::Amounts;
pub use self::{
    request::{Payment, TxRequest},
    select::select_inputs,
};
use crate::{
    error::AtStage, sync::TreeSync, Bridge, Config, ErrorKind, EventSource, ExtData, Ledger,
    OutputWitness, Prover, PublicSignals, Receipt, Result, Stage, SyncReport, WitnessBundle,
};

/// The external services a [`TransactionBuilder`] talks to
#[derive(Clone)]
pub struct Collaborators {
    /// Roots, nullifier flags, and submission
    pub ledger: Arc<dyn Ledger>,
    /// The ordered commitment log
    pub events: Arc<dyn EventSource>,
    /// Turns witnesses into proofs
    pub prover: Arc<dyn Prover>,
    /// Encodes ext data for withdrawals relayed to a second domain
    pub bridge: Arc<dyn Bridge>,
}

/// Builds, proves, and submits transactions for one keypair
///
/// The local tree is behind an async mutex: a build holds it from sync until every input has a
/// path, so concurrent builds see a consistent tree. Input selection goes through the shared
/// note store, so concurrent builds never select the same note.
pub struct TransactionBuilder {
    config: Config,
    keypair: Keypair,
    store: SharedNoteStore,
    collaborators: Collaborators,
    tree: tokio::sync::Mutex<MerkleTree>,
    in_flight: parking_lot::Mutex<HashMap<ReservationId, InFlight>>,
}

impl TransactionBuilder {
    /// Check `config` against itself and the ledger's deployment, and start with an empty tree
    ///
    /// Nothing is synced yet, the first [`build`](Self::build) or [`sync`](Self::sync) does that
    #[instrument(skip_all, fields(tree_height = config.tree_height))]
    pub async fn connect(
        config: Config,
        keypair: Keypair,
        store: SharedNoteStore,
        collaborators: Collaborators,
    ) -> Result<Self> {
        config.validate()?;

        let parameters = collaborators
            .ledger
            .parameters()
            .await
            .map_err(|error| ErrorKind::Ledger(error.to_string()).at(Stage::Configure))?;
        config.check_ledger(&parameters)?;

        let tree = MerkleTree::new(config.tree_height).at(Stage::Configure)?;

        debug!(public_key = %keypair.public_key(), "connected to ledger");

        Ok(Self {
            config,
            keypair,
            store,
            collaborators,
            tree: tokio::sync::Mutex::new(tree),
            in_flight: parking_lot::Mutex::new(HashMap::new()),
        })
    }

    /// The configuration this builder was connected with
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The keypair whose notes this builder spends
    #[must_use]
    pub fn keypair(&self) -> &Keypair {
        &self.keypair
    }

    /// The store holding this keypair's notes
    #[must_use]
    pub fn store(&self) -> &SharedNoteStore {
        &self.store
    }

    /// The total of every unspent note
    #[must_use]
    pub fn balance(&self) -> u128 {
        self.store.balance()
    }

    /// The local tree's root
    pub async fn root(&self) -> Element {
        self.tree.lock().await.root()
    }

    /// Catch the local tree up with the ledger and record any newly found notes
    pub async fn sync(&self) -> Result<SyncReport> {
        let mut tree = self.tree.lock().await;
        self.tree_sync().run(&mut tree).await.at(Stage::Sync)
    }

    /// Rebuild the local tree from the start of the commitment log
    ///
    /// For recovering after a [`ErrorKind::TreeDesync`]
    pub async fn resync(&self) -> Result<SyncReport> {
        let mut tree = self.tree.lock().await;
        self.tree_sync().rebuild(&mut tree).await.at(Stage::Sync)
    }

    /// Turn `request` into a witness, holding its input notes until the result is submitted or
    /// dropped
    ///
    /// Amounts and the number of payments are checked before anything else, so a request outside
    /// the configured bounds never touches the tree, the store, or the ledger.
    #[instrument(
        skip_all,
        fields(
            deposit = request.deposit,
            withdraw = request.withdraw,
            fee = request.fee,
            recipients = request.recipients.len(),
        )
    )]
    pub async fn build(&self, request: &TxRequest) -> Result<PreparedTransaction> {
        let amounts = request.amounts(&self.config).at(Stage::Validate)?;

        let mut tree = self.tree.lock().await;
        self.tree_sync().run(&mut tree).await.at(Stage::Sync)?;

        let max_inputs = self.config.max_inputs();
        let reservation = self
            .store
            .reserve_with(|unspent| select_inputs(unspent, amounts.required, max_inputs))
            .at(Stage::CollectInputs)?;

        let input_count = self
            .config
            .input_count_for(reservation.notes().len())
            .ok_or(ErrorKind::InsufficientFunds {
                required: amounts.required,
                available: 0,
            })
            .at(Stage::CollectInputs)?;

        let inputs = self
            .resolve_inputs(&tree, reservation.notes(), input_count)
            .await?;
        let root = tree.root();
        drop(tree);

        let input_total = reservation
            .notes()
            .iter()
            .fold(0u128, |total, note| total.saturating_add(note.amount));
        let change = amounts
            .change(input_total)
            .ok_or(ErrorKind::InsufficientFunds {
                required: amounts.required,
                available: input_total,
            })
            .at(Stage::BuildOutputs)?;

        let outputs = plan_outputs(
            &request.recipients,
            change,
            &self.keypair,
            self.config.output_count,
        )
        .at(Stage::BuildOutputs)?;

        let witness =
            assemble(root, inputs, &outputs, request, amounts).at(Stage::AssembleWitness)?;
        witness.validate().at(Stage::AssembleWitness)?;

        let owned_outputs = outputs
            .into_iter()
            .filter(|output| output.is_owned_by(&self.keypair) && !output.note.is_zero())
            .map(|output| output.note)
            .collect();

        debug!(
            reservation = %reservation.id(),
            inputs = reservation.notes().len(),
            change,
            "built transaction"
        );

        Ok(PreparedTransaction {
            witness,
            reservation,
            owned_outputs,
        })
    }

    fn tree_sync(&self) -> TreeSync<'_> {
        TreeSync {
            ledger: self.collaborators.ledger.as_ref(),
            events: self.collaborators.events.as_ref(),
            keypair: &self.keypair,
            store: &self.store,
        }
    }
}

fn assemble(
    root: Element,
    inputs: Vec<crate::InputWitness>,
    outputs: &[PlannedOutput],
    request: &TxRequest,
    amounts: Amounts,
) -> core::result::Result<WitnessBundle, ErrorKind> {
    let outputs = outputs
        .iter()
        .map(|output| OutputWitness::new(&output.note, &output.encryption_key))
        .collect::<core::result::Result<Vec<_>, _>>()?;

    let ext_data = ExtData {
        recipient: request.recipient.clone(),
        ext_amount: amounts.ext_amount,
        relayer: request.relayer.clone(),
        fee: request.fee,
        encrypted_outputs: outputs.iter().map(|output| output.encrypted.clone()).collect(),
        is_l1_withdrawal: request.is_l1_withdrawal,
        l1_fee: request.l1_fee,
    };

    Ok(WitnessBundle {
        root,
        inputs,
        outputs,
        public_amount: amounts.public_amount,
        ext_data_hash: ext_data.hash(),
        ext_data,
    })
}

/// A built transaction, waiting to be proven
///
/// Its input notes stay reserved until it is handed to
/// [`TransactionBuilder::prove_and_submit`]. Dropping it releases them.
#[derive(Debug)]
#[must_use = "dropping a prepared transaction releases its inputs"]
pub struct PreparedTransaction {
    witness: WitnessBundle,
    reservation: Reservation,
    owned_outputs: Vec<Note>,
}

impl PreparedTransaction {
    /// Everything the prover needs
    pub fn witness(&self) -> &WitnessBundle {
        &self.witness
    }

    /// The values the verifier sees
    pub fn public_signals(&self) -> PublicSignals {
        self.witness.public_signals()
    }

    /// The reservation holding the inputs
    pub fn reservation_id(&self) -> ReservationId {
        self.reservation.id()
    }

    /// The notes that become pending-spent on submission
    pub fn inputs(&self) -> &[Note] {
        self.reservation.notes()
    }

    /// The non-zero outputs owned by the sender, which become pending-unconfirmed on submission
    pub fn outputs(&self) -> &[Note] {
        &self.owned_outputs
    }

    /// Give up on the transaction and release its inputs
    pub fn abandon(self) {
        self.reservation.release();
    }
}

/// A transaction the ledger accepted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submitted {
    /// The notes still waiting for [`TransactionBuilder::confirm`]
    pub in_flight: InFlight,
    /// The ledger's receipt
    pub receipt: Receipt,
}
