use accumulator::MerkleTree;
use notes::{Keypair, Note, SharedNoteStore};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use zk_primitives::Element;

use crate::{CommitmentEvent, ErrorKind, EventSource, Ledger};

/// What a sync changed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    /// Leaves appended to the local tree
    pub appended: usize,
    /// Owned notes found among the new events
    pub discovered: usize,
    /// Whether the tree had to be rebuilt from the start of the log
    pub rebuilt: bool,
    /// The local root after the sync
    pub root: Element,
}

/// The state needed to keep a tree in step with the ledger and recognise owned notes
pub(crate) struct TreeSync<'a> {
    pub ledger: &'a dyn Ledger,
    pub events: &'a dyn EventSource,
    pub keypair: &'a Keypair,
    pub store: &'a SharedNoteStore,
}

impl TreeSync<'_> {
    /// Append new events, then check the root against the ledger
    ///
    /// The events go into a copy of the tree, which replaces `tree` only once its root is
    /// accepted. Owned notes are recorded after that, never from an unverified log. If the
    /// events can't be appended, or the resulting root is neither the ledger's current root nor
    /// one it still accepts, the tree is rebuilt from the whole log once. A second mismatch is a
    /// [`ErrorKind::TreeDesync`] and leaves both `tree` and the store untouched.
    pub async fn run(&self, tree: &mut MerkleTree) -> Result<SyncReport, ErrorKind> {
        let events = self.fetch(tree.len()).await?;

        let mut candidate = tree.clone();
        let appended =
            match candidate.append_ordered(events.iter().map(|e| (e.index, e.commitment))) {
                Ok(appended) => appended,
                Err(error) => {
                    warn!(%error, "commitment log doesn't continue the local tree, rebuilding");
                    return self.rebuild(tree).await;
                }
            };

        if !self.root_is_accepted(candidate.root()).await? {
            warn!(root = %candidate.root(), "local root is not known to the ledger, rebuilding");
            return self.rebuild(tree).await;
        }

        *tree = candidate;
        let discovered = self.scan(&events).await?;

        debug!(appended, discovered, root = %tree.root(), "synced");

        Ok(SyncReport {
            appended,
            discovered,
            rebuilt: false,
            root: tree.root(),
        })
    }

    /// Throw the tree away and rebuild it from index 0
    pub async fn rebuild(&self, tree: &mut MerkleTree) -> Result<SyncReport, ErrorKind> {
        let events = self.fetch(0).await?;

        let mut rebuilt = MerkleTree::new(tree.height())?;
        let appended = rebuilt.append_ordered(events.iter().map(|e| (e.index, e.commitment)))?;

        if !self.root_is_accepted(rebuilt.root()).await? {
            return Err(ErrorKind::TreeDesync {
                expected: self.current_root().await?,
                actual: rebuilt.root(),
            });
        }

        *tree = rebuilt;
        let discovered = self.scan(&events).await?;

        info!(leaves = appended, discovered, root = %tree.root(), "rebuilt tree from the ledger's log");

        Ok(SyncReport {
            appended,
            discovered,
            rebuilt: true,
            root: tree.root(),
        })
    }

    /// Record every event whose payload decrypts to a note matching its commitment
    ///
    /// A newly recorded note whose nullifier the ledger has already seen is marked spent, so a
    /// wallet restored into an empty store doesn't count notes it spent long ago. Without a
    /// spending key the nullifier can't be derived and the note stays unspent.
    async fn scan(&self, events: &[CommitmentEvent]) -> Result<usize, ErrorKind> {
        let found: Vec<Note> = events
            .iter()
            .filter_map(|event| {
                let note = Note::decode(&event.encrypted_output, self.keypair, Some(event.index))?;
                (note.commitment() == event.commitment).then_some(note)
            })
            .filter(|note| self.store.insert(note.clone()))
            .collect();

        for note in &found {
            let Ok(nullifier) = note.nullifier(self.keypair) else {
                continue;
            };

            let spent = self
                .ledger
                .is_spent(nullifier)
                .await
                .map_err(|error| ErrorKind::Ledger(error.to_string()))?;

            if spent {
                debug!(commitment = %note.commitment(), "discovered note was already spent");
                self.store.mark_spent(note.commitment());
            }
        }

        Ok(found.len())
    }

    async fn root_is_accepted(&self, root: Element) -> Result<bool, ErrorKind> {
        if root == self.current_root().await? {
            return Ok(true);
        }

        self.is_known_root(root).await
    }

    async fn fetch(&self, from_index: u64) -> Result<Vec<CommitmentEvent>, ErrorKind> {
        self.events
            .commitments(from_index)
            .await
            .map_err(|error| ErrorKind::EventSource(error.to_string()))
    }

    async fn current_root(&self) -> Result<Element, ErrorKind> {
        self.ledger
            .current_root()
            .await
            .map_err(|error| ErrorKind::Ledger(error.to_string()))
    }

    async fn is_known_root(&self, root: Element) -> Result<bool, ErrorKind> {
        self.ledger
            .is_known_root(root)
            .await
            .map_err(|error| ErrorKind::Ledger(error.to_string()))
    }
}
