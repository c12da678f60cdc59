use std::collections::HashSet;

use accumulator::Path;
use notes::{Keypair, Note};
use serde::{Deserialize, Serialize};
use zk_primitives::{hash_merge, Element};

use crate::{ErrorKind, ExtData};

/// The private data for one input note
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputWitness {
    /// The note's amount
    pub amount: u128,
    /// The spending key of the note's owner
    pub spending_key: Element,
    /// The note's blinding
    pub blinding: Element,
    /// The note's leaf index, 0 for padding
    pub index: u64,
    /// The note's commitment
    pub commitment: Element,
    /// The Merkle path from the note's leaf to the root
    pub path: Path,
    /// The nullifier revealed by spending this note
    pub nullifier: Element,
}

impl InputWitness {
    /// The witness for spending `note` with `keypair`
    ///
    /// A note without an index is treated as index 0, which is only valid for zero-amount notes
    pub fn new(note: &Note, keypair: &Keypair, path: Path) -> Result<Self, notes::Error> {
        let nullifier = note.nullifier(keypair)?;
        let spending_key = keypair
            .spending_key()
            .ok_or(notes::Error::MissingSpendingKey)?;

        Ok(Self {
            amount: note.amount,
            spending_key,
            blinding: note.blinding,
            index: note.index.unwrap_or(0),
            commitment: note.commitment(),
            path,
            nullifier,
        })
    }

    /// A zero-amount input owned by a throwaway keypair
    ///
    /// Its path is never checked against the root, so it is the path to index 0 of an empty tree
    pub fn padding(height: usize) -> Result<Self, notes::Error> {
        let keypair = Keypair::random();
        Self::new(&Note::zero(keypair.public_key()), &keypair, Path::empty(height))
    }
}

/// The private data for one output note
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputWitness {
    /// The note's amount
    pub amount: u128,
    /// The public key of the note's owner
    pub owner: Element,
    /// The note's blinding
    pub blinding: Element,
    /// The note's commitment
    pub commitment: Element,
    /// The note's payload, encrypted to its owner
    pub encrypted: Vec<u8>,
}

impl OutputWitness {
    /// The witness for creating `note`, with its payload encrypted to `encryption_key`
    pub fn new(note: &Note, encryption_key: &[u8]) -> Result<Self, notes::Error> {
        Ok(Self {
            amount: note.amount,
            owner: note.owner,
            blinding: note.blinding,
            commitment: note.commitment(),
            encrypted: note.encrypt(encryption_key)?,
        })
    }
}

/// The values the verifier sees
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicSignals {
    /// The root the inputs are proven against
    pub root: Element,
    /// `ext_amount - fee` as a field element, which equals `sum(outputs) - sum(inputs)`
    pub public_amount: Element,
    /// [`ExtData::hash`]
    pub ext_data_hash: Element,
    /// One nullifier per input, in input order
    pub input_nullifiers: Vec<Element>,
    /// One commitment per output, in output order
    pub output_commitments: Vec<Element>,
}

/// Everything a prover needs for one transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WitnessBundle {
    /// The tree root every input is proven against
    pub root: Element,
    /// The inputs, padded to a configured input count
    pub inputs: Vec<InputWitness>,
    /// The outputs, padded to the configured output count
    pub outputs: Vec<OutputWitness>,
    /// See [`PublicSignals::public_amount`]
    pub public_amount: Element,
    /// The metadata passed through to the ledger
    pub ext_data: ExtData,
    /// [`ExtData::hash`] of `ext_data`
    pub ext_data_hash: Element,
}

impl WitnessBundle {
    /// The public half of the witness
    #[must_use]
    pub fn public_signals(&self) -> PublicSignals {
        PublicSignals {
            root: self.root,
            public_amount: self.public_amount,
            ext_data_hash: self.ext_data_hash,
            input_nullifiers: self.inputs.iter().map(|input| input.nullifier).collect(),
            output_commitments: self.outputs.iter().map(|output| output.commitment).collect(),
        }
    }

    /// The sum of the input amounts
    #[must_use]
    pub fn input_total(&self) -> u128 {
        self.inputs
            .iter()
            .fold(0u128, |total, input| total.saturating_add(input.amount))
    }

    /// The sum of the output amounts
    #[must_use]
    pub fn output_total(&self) -> u128 {
        self.outputs
            .iter()
            .fold(0u128, |total, output| total.saturating_add(output.amount))
    }

    /// Re-derive every value the verifier checks
    ///
    /// A witness that fails here would only be rejected later by the prover or the ledger, so a
    /// failure is a defect in whatever assembled it
    pub fn validate(&self) -> Result<(), ErrorKind> {
        let invalid = |reason: String| Err(ErrorKind::InvalidWitness(reason));

        if self.inputs.is_empty() || self.outputs.is_empty() {
            return invalid("a transaction needs at least one input and one output".into());
        }

        let mut nullifiers = HashSet::new();
        let mut input_sum = Element::ZERO;

        for (i, input) in self.inputs.iter().enumerate() {
            let public_key = hash_merge([input.spending_key]);
            let commitment = hash_merge([Element::from(input.amount), public_key, input.blinding]);
            if commitment != input.commitment {
                return invalid(format!("input {i} commitment does not match its note"));
            }

            let index = Element::from(input.index);
            let signature = hash_merge([input.spending_key, commitment, index]);
            if hash_merge([commitment, index, signature]) != input.nullifier {
                return invalid(format!("input {i} nullifier does not match its note"));
            }

            if !nullifiers.insert(input.nullifier) {
                return invalid(format!("input {i} repeats a nullifier"));
            }

            // only inputs with value are checked against the root
            if input.amount != 0
                && (input.path.index() != input.index || !input.path.proves(commitment, self.root))
            {
                return invalid(format!("input {i} path does not lead to the root"));
            }

            input_sum = input_sum.field_add(Element::from(input.amount));
        }

        let mut output_sum = Element::ZERO;

        for (i, output) in self.outputs.iter().enumerate() {
            let commitment =
                hash_merge([Element::from(output.amount), output.owner, output.blinding]);
            if commitment != output.commitment {
                return invalid(format!("output {i} commitment does not match its note"));
            }

            output_sum = output_sum.field_add(Element::from(output.amount));
        }

        if input_sum.field_add(self.public_amount) != output_sum {
            return invalid("inputs plus public amount do not equal outputs".into());
        }

        let expected_public_amount = i128::try_from(self.ext_data.fee)
            .ok()
            .and_then(|fee| self.ext_data.ext_amount.checked_sub(fee))
            .map(Element::from_i128);
        if expected_public_amount != Some(self.public_amount) {
            return invalid("public amount does not match ext_amount - fee".into());
        }

        if self.ext_data.hash() != self.ext_data_hash {
            return invalid("ext data hash does not match ext data".into());
        }

        let encrypted = self.outputs.iter().map(|output| &output.encrypted);
        if !encrypted.eq(self.ext_data.encrypted_outputs.iter()) {
            return invalid("ext data does not carry the output payloads in order".into());
        }

        Ok(())
    }
}
