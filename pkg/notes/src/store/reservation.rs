use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};
use serde::{Deserialize, Serialize};
use tracing::debug;
use zk_primitives::Element;

use super::{NoteStore, ReservationId};
use crate::{Note, Result};

/// A [`NoteStore`] shared between concurrent transaction builds
#[derive(Debug, Clone, Default)]
pub struct SharedNoteStore {
    inner: Arc<Mutex<NoteStore>>,
}

impl SharedNoteStore {
    /// Wrap a store so it can be shared
    #[must_use]
    pub fn new(store: NoteStore) -> Self {
        Self {
            inner: Arc::new(Mutex::new(store)),
        }
    }

    /// Lock the store for direct access
    pub fn lock(&self) -> MutexGuard<'_, NoteStore> {
        self.inner.lock()
    }

    /// Atomically choose and reserve inputs
    ///
    /// `select` sees every unspent note and returns the ones to reserve. Selection and
    /// reservation happen under one lock, so two builds can never reserve the same note.
    ///
    /// ```rust
    /// # use notes::*;
    /// let keypair = Keypair::from_seed(&[1; 32]);
    /// let store = SharedNoteStore::default();
    /// store.insert(Note::new(10, keypair.public_key()).with_index(0));
    ///
    /// let reservation = store
    ///     .reserve_with(|unspent| Ok::<_, ()>(unspent.to_vec()))
    ///     .unwrap();
    /// assert_eq!(store.lock().unspent().len(), 0);
    ///
    /// // dropping an unsubmitted reservation releases it
    /// drop(reservation);
    /// assert_eq!(store.lock().unspent().len(), 1);
    /// ```
    pub fn reserve_with<F, E>(&self, select: F) -> Result<Reservation, E>
    where
        F: FnOnce(&[Note]) -> Result<Vec<Note>, E>,
    {
        let mut store = self.inner.lock();

        let unspent = store.unspent();
        let notes = select(&unspent)?;

        let id = store.next_reservation_id();
        let commitments: Vec<Element> = notes.iter().map(Note::commitment).collect();
        store.reserve(id, &commitments);

        debug!(%id, inputs = notes.len(), "reserved notes");

        Ok(Reservation {
            id,
            notes,
            store: self.clone(),
            armed: true,
        })
    }

    /// See [`NoteStore::insert`]
    pub fn insert(&self, note: Note) -> bool {
        self.inner.lock().insert(note)
    }

    /// See [`NoteStore::mark_spent`]
    pub fn mark_spent(&self, commitment: Element) -> bool {
        self.inner.lock().mark_spent(commitment)
    }

    /// See [`NoteStore::discard`]
    pub fn discard(&self, commitment: Element) -> bool {
        self.inner.lock().discard(commitment)
    }

    /// See [`NoteStore::confirm`]
    pub fn confirm(&self, id: ReservationId) -> Result<()> {
        self.inner.lock().confirm(id)
    }

    /// See [`NoteStore::fail`]
    pub fn fail(&self, id: ReservationId) -> Result<()> {
        self.inner.lock().fail(id)
    }

    /// See [`NoteStore::balance`]
    #[must_use]
    pub fn balance(&self) -> u128 {
        self.inner.lock().balance()
    }
}

/// Input notes held by one build
///
/// Dropping a reservation that was never handed to [`Reservation::into_in_flight`] returns its
/// notes to [`NoteState::Unspent`](super::NoteState::Unspent)
#[derive(Debug)]
#[must_use = "dropping a reservation releases its notes"]
pub struct Reservation {
    id: ReservationId,
    notes: Vec<Note>,
    store: SharedNoteStore,
    armed: bool,
}

impl Reservation {
    /// The id of this reservation
    pub fn id(&self) -> ReservationId {
        self.id
    }

    /// The reserved notes, in the order `select` returned them
    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    /// Release the notes now
    pub fn release(self) {
        drop(self);
    }

    /// Mark the reserved notes as spent by a submitted transaction that produced `outputs`
    ///
    /// After this, only [`SharedNoteStore::confirm`] or [`SharedNoteStore::fail`] change the
    /// state of these notes
    pub fn into_in_flight(mut self, outputs: &[Note]) -> InFlight {
        self.armed = false;

        self.store.lock().mark_pending(self.id, outputs);
        debug!(id = %self.id, outputs = outputs.len(), "reservation in flight");

        InFlight {
            id: self.id,
            inputs: self.notes.iter().map(Note::commitment).collect(),
            outputs: outputs
                .iter()
                .filter(|note| !note.is_zero())
                .map(Note::commitment)
                .collect(),
        }
    }
}

impl Drop for Reservation {
    fn drop(&mut self) {
        if self.armed {
            self.store.lock().release(self.id);
            debug!(id = %self.id, "released reservation");
        }
    }
}

/// The record of a submitted transaction that hasn't been confirmed or failed yet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InFlight {
    /// The reservation the inputs were held under
    pub id: ReservationId,
    /// Commitments of the spent inputs
    pub inputs: Vec<Element>,
    /// Commitments of the owned, non-zero outputs
    pub outputs: Vec<Element>,
}
