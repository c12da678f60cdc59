use accumulator::MerkleTree;
use notes::Note;
use tracing::warn;

use super::TransactionBuilder;
use crate::{error::AtStage, ErrorKind, InputWitness, Result, Stage, StaleReason};

impl TransactionBuilder {
    /// Give every selected note a Merkle path, then pad with zero inputs up to `count`
    ///
    /// A note that is missing from the tree, sits at another index, or is already nullified on
    /// the ledger is stale. The tree has just been synced, so the store is corrected before the
    /// error is returned: a missing note is discarded, a misplaced one is recorded again at the
    /// index the tree holds it at, and a nullified one is marked spent. A retry then selects
    /// from what is actually spendable.
    pub(super) async fn resolve_inputs(
        &self,
        tree: &MerkleTree,
        notes: &[Note],
        count: usize,
    ) -> Result<Vec<InputWitness>> {
        let stage = Stage::ResolveProofs;
        let mut inputs = Vec::with_capacity(count);

        for note in notes {
            let commitment = note.commitment();
            let stale = |reason: StaleReason| ErrorKind::StaleNote { commitment, reason }.at(stage);

            let Some(index) = tree.index_of(commitment) else {
                warn!(%commitment, "selected note isn't in the synced tree, discarding it");
                self.store.discard(commitment);
                return Err(stale(StaleReason::NotInTree));
            };

            if note.index != Some(index) {
                warn!(%commitment, recorded = ?note.index, found = index, "selected note was recorded at the wrong index");
                self.store.discard(commitment);
                self.store.insert(note.clone().with_index(index));
                return Err(stale(StaleReason::IndexMismatch {
                    recorded: note.index,
                    found: index,
                }));
            }

            let path = tree.path(index).at(stage)?;
            let input = InputWitness::new(note, &self.keypair, path).at(stage)?;

            let spent = self
                .collaborators
                .ledger
                .is_spent(input.nullifier)
                .await
                .map_err(|error| ErrorKind::Ledger(error.to_string()).at(stage))?;

            if spent {
                warn!(%commitment, "selected note was already spent, marking it");
                self.store.mark_spent(commitment);
                return Err(stale(StaleReason::AlreadySpent));
            }

            inputs.push(input);
        }

        while inputs.len() < count {
            inputs.push(InputWitness::padding(tree.height()).at(stage)?);
        }

        Ok(inputs)
    }
}
