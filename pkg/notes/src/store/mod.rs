use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;
use zk_primitives::Element;

use crate::{Error, Note, Result};

mod reservation;

pub use reservation::{InFlight, Reservation, SharedNoteStore};


/// Identifies one transaction build's claim on a set of notes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ReservationId(pub u64);

impl core::fmt::Display for ReservationId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Where a note is in its lifecycle, from this wallet's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoteState {
    /// Inserted on the ledger and available to spend
    Unspent,
    /// Selected as an input by a build that hasn't been submitted yet
    Reserved(ReservationId),
    /// An input of a submitted transaction that hasn't confirmed yet
    PendingSpent(ReservationId),
    /// Nullified on the ledger
    Spent,
    /// An output of a submitted transaction whose commitment hasn't been seen yet
    PendingUnconfirmed(ReservationId),
}

#[derive(Debug, Clone)]
struct Entry {
    note: Note,
    state: NoteState,
}

/// The notes owned by one wallet, keyed by commitment
///
/// Every state change goes through a handful of transitions:
///  - [`NoteStore::insert`] records a note found while scanning
///  - reserving (via [`SharedNoteStore::reserve_with`]) moves `Unspent -> Reserved`
///  - releasing moves `Reserved -> Unspent`
///  - [`Reservation::into_in_flight`] moves `Reserved -> PendingSpent` and records the outputs
///  - [`NoteStore::confirm`] moves `PendingSpent -> Spent`
///  - [`NoteStore::fail`] moves `PendingSpent -> Unspent` and forgets the outputs
///  - [`NoteStore::discard`] forgets a note the tree doesn't hold
///
/// Most callers share a store between builds with [`SharedNoteStore`]
#[derive(Debug, Default)]
pub struct NoteStore {
    entries: HashMap<Element, Entry>,
    next_reservation: u64,
}

impl NoteStore {
    /// An empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an owned note found on the ledger, returning whether anything changed
    ///
    /// Zero-amount notes are ignored, they have nothing to spend. A note that was waiting as an
    /// unconfirmed output becomes [`NoteState::Unspent`].
    pub fn insert(&mut self, note: Note) -> bool {
        if note.is_zero() || note.index.is_none() {
            return false;
        }

        let commitment = note.commitment();

        match self.entries.get_mut(&commitment) {
            Some(entry) => match entry.state {
                NoteState::PendingUnconfirmed(_) => {
                    entry.note = note;
                    entry.state = NoteState::Unspent;
                    true
                }
                _ => false,
            },
            None => {
                self.entries.insert(
                    commitment,
                    Entry {
                        note,
                        state: NoteState::Unspent,
                    },
                );
                true
            }
        }
    }

    /// The note with this commitment, if it is known
    #[must_use]
    pub fn get(&self, commitment: Element) -> Option<&Note> {
        self.entries.get(&commitment).map(|entry| &entry.note)
    }

    /// The state of the note with this commitment, if it is known
    #[must_use]
    pub fn state(&self, commitment: Element) -> Option<NoteState> {
        self.entries.get(&commitment).map(|entry| entry.state)
    }

    /// Every note that can be spent, ordered by index
    #[must_use]
    pub fn unspent(&self) -> Vec<Note> {
        let mut notes: Vec<Note> = self
            .entries
            .values()
            .filter(|entry| entry.state == NoteState::Unspent)
            .map(|entry| entry.note.clone())
            .collect();

        notes.sort_by_key(|note| note.index);
        notes
    }

    /// The total amount of every unspent note
    #[must_use]
    pub fn balance(&self) -> u128 {
        self.entries
            .values()
            .filter(|entry| entry.state == NoteState::Unspent)
            .fold(0u128, |total, entry| total.saturating_add(entry.note.amount))
    }

    /// Record that the ledger has already nullified this note
    ///
    /// Returns whether the note was known
    pub fn mark_spent(&mut self, commitment: Element) -> bool {
        match self.entries.get_mut(&commitment) {
            Some(entry) => {
                entry.state = NoteState::Spent;
                true
            }
            None => false,
        }
    }

    /// Forget a note that turned out not to be in the tree where it was recorded
    ///
    /// Only unspent and reserved notes can be discarded, a note that is part of a submitted
    /// transaction is settled by [`NoteStore::confirm`] or [`NoteStore::fail`]. Returns whether
    /// the note was removed.
    pub fn discard(&mut self, commitment: Element) -> bool {
        let removable = matches!(
            self.state(commitment),
            Some(NoteState::Unspent | NoteState::Reserved(_))
        );

        if removable {
            self.entries.remove(&commitment);
            debug!(%commitment, "discarded note");
        }

        removable
    }

    /// The submitted transaction has confirmed, its inputs are now spent
    pub fn confirm(&mut self, id: ReservationId) -> Result<()> {
        let mut found = false;

        for entry in self.entries.values_mut() {
            match entry.state {
                NoteState::PendingSpent(pending) if pending == id => {
                    entry.state = NoteState::Spent;
                    found = true;
                }
                NoteState::PendingUnconfirmed(pending) if pending == id => found = true,
                _ => {}
            }
        }

        match found {
            true => {
                debug!(%id, "confirmed transaction");
                Ok(())
            }
            false => Err(Error::UnknownReservation(id)),
        }
    }

    /// The submitted transaction failed, its inputs can be spent again
    pub fn fail(&mut self, id: ReservationId) -> Result<()> {
        let before = self.entries.len();
        let mut restored = 0;

        self.entries.retain(|_, entry| match entry.state {
            NoteState::PendingUnconfirmed(pending) => pending != id,
            _ => true,
        });

        for entry in self.entries.values_mut() {
            if entry.state == NoteState::PendingSpent(id) {
                entry.state = NoteState::Unspent;
                restored += 1;
            }
        }

        let forgotten = before - self.entries.len();
        if restored == 0 && forgotten == 0 {
            return Err(Error::UnknownReservation(id));
        }

        debug!(%id, restored, forgotten, "failed transaction");
        Ok(())
    }

    fn next_reservation_id(&mut self) -> ReservationId {
        let id = ReservationId(self.next_reservation);
        self.next_reservation += 1;
        id
    }

    fn reserve(&mut self, id: ReservationId, commitments: &[Element]) {
        for commitment in commitments {
            if let Some(entry) = self.entries.get_mut(commitment) {
                entry.state = NoteState::Reserved(id);
            }
        }
    }

    fn release(&mut self, id: ReservationId) {
        for entry in self.entries.values_mut() {
            if entry.state == NoteState::Reserved(id) {
                entry.state = NoteState::Unspent;
            }
        }
    }

    fn mark_pending(&mut self, id: ReservationId, outputs: &[Note]) {
        for entry in self.entries.values_mut() {
            if entry.state == NoteState::Reserved(id) {
                entry.state = NoteState::PendingSpent(id);
            }
        }

        for note in outputs.iter().filter(|note| !note.is_zero()) {
            self.entries.entry(note.commitment()).or_insert_with(|| Entry {
                note: note.clone(),
                state: NoteState::PendingUnconfirmed(id),
            });
        }
    }
}
