use std::sync::Arc;

use async_trait::async_trait;
use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use tokio::{
    sync::{mpsc, oneshot},
    task::JoinHandle,
};
use tracing::{debug, warn};

use crate::{BoxError, WitnessBundle};

/// An opaque proof artifact
#[derive(
    Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
pub struct Proof(pub Vec<u8>);

/// Produces a proof for a witness
///
/// A prover that finds the witness invalid should say why, the error text is surfaced to the
/// caller unchanged
#[async_trait]
pub trait Prover: Send + Sync + 'static {
    /// Prove `witness`
    async fn prove(&self, witness: &WitnessBundle) -> Result<Proof, BoxError>;
}

struct ProveRequest {
    witness: WitnessBundle,
    respond: oneshot::Sender<Result<Proof, String>>,
}

/// Runs a [`Prover`] on its own task, addressed through a request channel
///
/// Requests are handled one at a time, in the order they arrive. Dropping the service closes the
/// channel, and the task exits once it has answered every queued request.
pub struct ProverService {
    sender: mpsc::Sender<ProveRequest>,
    handle: JoinHandle<()>,
}

impl ProverService {
    /// Start `prover` on a new tokio task, with room for `queue` pending requests
    ///
    /// Must be called from within a tokio runtime
    #[must_use]
    pub fn spawn<P: Prover>(prover: P, queue: usize) -> Self {
        let (sender, receiver) = mpsc::channel(queue.max(1));
        let handle = tokio::spawn(worker(Arc::new(prover), receiver));

        Self { sender, handle }
    }

    /// Whether the worker task is still running
    #[must_use]
    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }
}

async fn worker<P: Prover>(prover: Arc<P>, mut receiver: mpsc::Receiver<ProveRequest>) {
    while let Some(ProveRequest { witness, respond }) = receiver.recv().await {
        let result = prover
            .prove(&witness)
            .await
            .map_err(|error| error.to_string());

        if let Err(error) = &result {
            warn!(%error, "prover failed");
        }

        if respond.send(result).is_err() {
            debug!("prove request was abandoned before it finished");
        }
    }

    debug!("prover service stopped");
}

#[async_trait]
impl Prover for ProverService {
    async fn prove(&self, witness: &WitnessBundle) -> Result<Proof, BoxError> {
        let (respond, response) = oneshot::channel();
        let request = ProveRequest {
            witness: witness.clone(),
            respond,
        };

        self.sender
            .send(request)
            .await
            .map_err(|_| "prover service has stopped")?;

        let result = response
            .await
            .map_err(|_| "prover service dropped the request")?;

        result.map_err(BoxError::from)
    }
}
