//! Test doubles for the ledger and prover, and fixtures wiring them to a builder


use std::sync::Arc;

use accumulator::MerkleTree;
use notes::{Keypair, Note, SharedNoteStore};
use zk_primitives::Element;

pub use self::{
    ledger::{MockLedger, ROOT_HISTORY},
    prover::MockProver,
};
use crate::{
    BorshBridge, Collaborators, Config, ExtData, InputWitness, LedgerParameters, OutputWitness,
    TransactionBuilder, WitnessBundle, ONE_UNIT,
};

/// The default configuration on a height-5 tree
pub fn test_config() -> Config {
    Config {
        tree_height: 5,
        ..Config::default()
    }
}

/// A valid deposit of [`ONE_UNIT`] with no real inputs
#[allow(clippy::missing_panics_doc)]
pub fn sample_witness() -> WitnessBundle {
    let keypair = Keypair::from_seed(&[1; 32]);
    let own_key = keypair.encryption_public_key().to_bytes();
    let height = test_config().tree_height;

    let inputs = vec![
        InputWitness::padding(height).unwrap(),
        InputWitness::padding(height).unwrap(),
    ];
    let outputs = vec![
        OutputWitness::new(&Note::new(ONE_UNIT, keypair.public_key()), &own_key).unwrap(),
        OutputWitness::new(&Note::zero(keypair.public_key()), &own_key).unwrap(),
    ];

    let ext_data = ExtData {
        ext_amount: i128::try_from(ONE_UNIT).unwrap(),
        encrypted_outputs: outputs.iter().map(|output| output.encrypted.clone()).collect(),
        ..ExtData::default()
    };

    WitnessBundle {
        root: MerkleTree::new(height).unwrap().root(),
        inputs,
        outputs,
        public_amount: Element::from(ONE_UNIT),
        ext_data_hash: ext_data.hash(),
        ext_data,
    }
}

/// One keypair with its own store, wired to a shared mock ledger and prover
pub struct Harness {
    /// The configuration builders connect with
    pub config: Config,
    /// The pool
    pub ledger: Arc<MockLedger>,
    /// The prover every builder uses
    pub prover: MockProver,
    /// The keypair whose notes are spent
    pub keypair: Keypair,
    /// The store for `keypair`
    pub store: SharedNoteStore,
}

impl Harness {
    /// A fresh pool deployed with [`test_config`]
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    /// A fresh pool deployed with `config`
    pub fn with_config(config: Config) -> Self {
        let ledger = Arc::new(MockLedger::new(LedgerParameters::from(&config)));

        Self {
            config,
            ledger,
            prover: MockProver::default(),
            keypair: Keypair::from_seed(&[1; 32]),
            store: SharedNoteStore::default(),
        }
    }

    /// Another participant on the same pool, with their own keypair and store
    pub fn participant(&self, seed: u8) -> Self {
        Self {
            config: self.config.clone(),
            ledger: Arc::clone(&self.ledger),
            prover: self.prover.clone(),
            keypair: Keypair::from_seed(&[seed; 32]),
            store: SharedNoteStore::default(),
        }
    }

    /// Use `prover` for builders created from now on
    pub fn with_prover(self, prover: MockProver) -> Self {
        Self { prover, ..self }
    }

    /// The mock ledger, prover, and a borsh bridge
    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            ledger: self.ledger.clone(),
            events: self.ledger.clone(),
            prover: Arc::new(self.prover.clone()),
            bridge: Arc::new(BorshBridge),
        }
    }

    /// Connect a builder for `keypair`
    #[allow(clippy::missing_panics_doc)]
    pub async fn builder(&self) -> TransactionBuilder {
        TransactionBuilder::connect(
            self.config.clone(),
            self.keypair.clone(),
            self.store.clone(),
            self.collaborators(),
        )
        .await
        .unwrap()
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}
