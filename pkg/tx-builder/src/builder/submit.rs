use notes::{InFlight, ReservationId};
use tracing::{info, instrument, warn};

use super::{PreparedTransaction, Submitted, TransactionBuilder};
use crate::{ErrorKind, Result, Stage, SubmitError, Submission};

impl TransactionBuilder {
    /// Prove a prepared transaction and hand it to the ledger
    ///
    /// The inputs move from reserved to in flight before the prover is called. If the prover
    /// fails or the ledger rejects the transaction, the in-flight record is failed and the inputs
    /// can be spent again. Any other submission error leaves the record in flight, because the
    /// ledger may still apply the transaction: settle it with [`confirm`](Self::confirm) or
    /// [`fail`](Self::fail) once its outcome is known.
    #[instrument(skip_all, fields(reservation = %prepared.reservation.id()))]
    pub async fn prove_and_submit(&self, prepared: PreparedTransaction) -> Result<Submitted> {
        let PreparedTransaction {
            witness,
            reservation,
            owned_outputs,
        } = prepared;

        let in_flight = reservation.into_in_flight(&owned_outputs);
        let id = in_flight.id;
        self.in_flight.lock().insert(id, in_flight.clone());

        let proof = match self.collaborators.prover.prove(&witness).await {
            Ok(proof) => proof,
            Err(error) => {
                self.fail_quietly(id);
                return Err(ErrorKind::Prover(error.to_string()).at(Stage::Prove));
            }
        };

        let ext_data = witness.ext_data.clone();
        let bridge_payload = ext_data
            .is_l1_withdrawal
            .then(|| self.collaborators.bridge.encode(&ext_data));

        let submission = Submission {
            proof,
            signals: witness.public_signals(),
            ext_data,
            bridge_payload,
        };

        match self.collaborators.ledger.submit(&submission).await {
            Ok(receipt) => {
                info!(%id, receipt = %receipt.id, "transaction submitted");
                Ok(Submitted { in_flight, receipt })
            }
            Err(SubmitError::Rejected(reason)) => {
                self.fail_quietly(id);
                Err(ErrorKind::Rejected(reason).at(Stage::Submit))
            }
            Err(SubmitError::Other(error)) => {
                warn!(%id, %error, "submission outcome unknown, notes stay in flight");
                Err(ErrorKind::Ledger(error.to_string()).at(Stage::Submit))
            }
        }
    }

    /// Every submitted transaction that hasn't been confirmed or failed yet
    #[must_use]
    pub fn in_flight(&self) -> Vec<InFlight> {
        let mut records: Vec<InFlight> = self.in_flight.lock().values().cloned().collect();
        records.sort_by_key(|record| record.id);
        records
    }

    /// The transaction is final on the ledger, its inputs are spent
    pub fn confirm(&self, id: ReservationId) -> Result<()> {
        self.settle(id, true)
    }

    /// The transaction will never be applied, its inputs can be spent again and its outputs are
    /// forgotten
    pub fn fail(&self, id: ReservationId) -> Result<()> {
        self.settle(id, false)
    }

    fn settle(&self, id: ReservationId, confirmed: bool) -> Result<()> {
        if self.in_flight.lock().remove(&id).is_none() {
            return Err(ErrorKind::UnknownReservation(id).at(Stage::Finalize));
        }

        let result = match confirmed {
            true => self.store.confirm(id),
            false => self.store.fail(id),
        };

        match result {
            // a transaction with no inputs whose outputs were already synced leaves nothing in
            // the store to settle
            Ok(()) | Err(notes::Error::UnknownReservation(_)) => Ok(()),
            Err(error) => Err(ErrorKind::from(error).at(Stage::Finalize)),
        }
    }

    fn fail_quietly(&self, id: ReservationId) {
        if let Err(error) = self.fail(id) {
            warn!(%id, %error, "failed to release in-flight notes");
        }
    }
}
