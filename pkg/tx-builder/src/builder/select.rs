use notes::Note;

use crate::ErrorKind;

/// Choose the notes to spend for a transaction that needs `required` from its inputs
///
/// Notes are taken largest first, with ties broken by the lower leaf index, until their total
/// covers `required`. This keeps the input count as small as possible. Nothing is selected when
/// `required` is 0.
///
/// ```rust
/// # use tx_builder::*;
/// # use notes::{Keypair, Note};
/// let owner = Keypair::from_seed(&[1; 32]).public_key();
/// let unspent = [
///     Note::new(3, owner).with_index(0),
///     Note::new(9, owner).with_index(1),
///     Note::new(5, owner).with_index(2),
/// ];
///
/// let selected = select_inputs(&unspent, 12, 2).unwrap();
/// let amounts: Vec<_> = selected.iter().map(|note| note.amount).collect();
/// assert_eq!(amounts, [9, 5]);
/// ```
pub fn select_inputs(
    unspent: &[Note],
    required: u128,
    max_inputs: usize,
) -> Result<Vec<Note>, ErrorKind> {
    if required == 0 {
        return Ok(Vec::new());
    }

    let mut candidates: Vec<&Note> = unspent.iter().filter(|note| !note.is_zero()).collect();
    candidates.sort_by(|a, b| b.amount.cmp(&a.amount).then(a.index.cmp(&b.index)));

    let mut selected = Vec::new();
    let mut total = 0u128;

    for note in candidates.iter().take(max_inputs) {
        selected.push((*note).clone());
        total = total.saturating_add(note.amount);

        if total >= required {
            return Ok(selected);
        }
    }

    Err(ErrorKind::InsufficientFunds {
        required,
        available: total,
    })
}
