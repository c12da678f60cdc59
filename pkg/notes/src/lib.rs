#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::match_bool)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::doc_markdown)]
#![deny(missing_docs)]

//! # Notes
//!
//! Keys, notes, and the local record of which notes a wallet owns.
//!
//! A [`Note`] is a private record of value owned by a [`Keypair`]. Only its [commitment][Note::commitment]
//! is ever published, and only its [nullifier][Note::nullifier] is revealed when it is spent. The
//! note itself travels to its owner encrypted under their x25519 encryption key.
//!
//! ```rust
//! # use notes::*;
//! let alice = Keypair::from_seed(&[1; 32]);
//!
//! let note = Note::new(100, alice.public_key());
//! let ciphertext = note.encrypt(alice.encryption_public_key().as_bytes()).unwrap();
//!
//! let received = Note::decode(&ciphertext, &alice, Some(7)).unwrap();
//! assert_eq!(received.commitment(), note.commitment());
//! assert!(received.nullifier(&alice).is_ok());
//! ```

mod encryption;
mod error;
mod keys;
mod note;
mod store;

pub use encryption::{decrypt, encrypt, CIPHERTEXT_VERSION};
pub use error::{Error, Result};
pub use keys::{Address, Keypair};
pub use note::{Note, PAYLOAD_LEN};
pub use store::{InFlight, NoteState, NoteStore, Reservation, ReservationId, SharedNoteStore};
pub use zk_primitives::Element;
