use notes::{Keypair, Note};

use super::Payment;
use crate::ErrorKind;

/// An output note and the key its payload is encrypted to
#[derive(Debug, Clone)]
pub(crate) struct PlannedOutput {
    pub note: Note,
    pub encryption_key: [u8; 32],
}

impl PlannedOutput {
    /// Whether the sender owns this output
    pub fn is_owned_by(&self, keypair: &Keypair) -> bool {
        self.note.owner == keypair.public_key()
    }
}

/// Lay out exactly `output_count` outputs
///
/// Payments come first in request order, then the change note if there is any change, then
/// zero-amount notes owned by the sender until the count is reached.
pub(crate) fn plan_outputs(
    payments: &[Payment],
    change: u128,
    keypair: &Keypair,
    output_count: usize,
) -> Result<Vec<PlannedOutput>, ErrorKind> {
    let requested = payments.len() + usize::from(change > 0);
    if requested > output_count {
        return Err(ErrorKind::TooManyOutputs {
            requested,
            available: output_count,
        });
    }

    let own_key = keypair.encryption_public_key().to_bytes();

    let mut outputs: Vec<PlannedOutput> = payments
        .iter()
        .map(|payment| PlannedOutput {
            note: Note::new(payment.amount, payment.address.public_key()),
            encryption_key: *payment.address.encryption_key(),
        })
        .collect();

    if change > 0 {
        outputs.push(PlannedOutput {
            note: Note::new(change, keypair.public_key()),
            encryption_key: own_key,
        });
    }

    outputs.resize_with(output_count, || PlannedOutput {
        note: Note::zero(keypair.public_key()),
        encryption_key: own_key,
    });

    Ok(outputs)
}
