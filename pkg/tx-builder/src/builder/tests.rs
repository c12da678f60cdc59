use std::sync::atomic::Ordering;

use notes::{Keypair, Note, NoteState};

use super::*;
use crate::{
    test::{Harness, MockProver},
    StaleReason, ONE_UNIT,
};

fn amounts(witness: &WitnessBundle) -> (Vec<u128>, Vec<u128>) {
    (
        witness.inputs.iter().map(|input| input.amount).collect(),
        witness.outputs.iter().map(|output| output.amount).collect(),
    )
}

#[tokio::test]
async fn deposit_without_notes() {
    let harness = Harness::new();
    let builder = harness.builder().await;

    let prepared = builder.build(&TxRequest::deposit(ONE_UNIT)).await.unwrap();
    let witness = prepared.witness();

    assert_eq!(amounts(witness), (vec![0, 0], vec![ONE_UNIT, 0]));
    assert_eq!(witness.public_amount, Element::from(ONE_UNIT));
    assert_eq!(witness.input_total() + ONE_UNIT, witness.output_total());
    assert_eq!(witness.ext_data.ext_amount, i128::try_from(ONE_UNIT).unwrap());
    assert_eq!(witness.ext_data.encrypted_outputs.len(), 2);
    assert!(prepared.inputs().is_empty());
    assert_eq!(prepared.outputs().len(), 1);
    assert_eq!(prepared.outputs()[0].amount, ONE_UNIT);
}

#[tokio::test]
async fn out_of_range_amounts_fail_before_any_work() {
    let harness = Harness::new();
    let builder = harness.builder().await;

    let below_minimum = TxRequest::withdraw(harness.config.min_withdraw - 1, vec![1]);
    let error = builder.build(&below_minimum).await.unwrap_err();
    assert_eq!(error.stage(), Stage::Validate);
    assert!(matches!(error.kind(), ErrorKind::AmountOutOfRange { what: "withdrawal", .. }));
    assert!(error.is_recoverable());

    let above_maximum = TxRequest::deposit(harness.config.max_deposit + 1);
    let error = builder.build(&above_maximum).await.unwrap_err();
    assert!(matches!(error.kind(), ErrorKind::AmountOutOfRange { what: "deposit", .. }));

    assert_eq!(harness.ledger.event_fetches(), 0);
    assert_eq!(harness.prover.calls().load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn deposit_then_transfer_then_withdraw() {
    let alice = Harness::new();
    let bob = alice.participant(2);
    let builder = alice.builder().await;

    // deposit
    let prepared = builder.build(&TxRequest::deposit(ONE_UNIT)).await.unwrap();
    let submitted = builder.prove_and_submit(prepared).await.unwrap();
    assert_eq!(alice.ledger.len(), 2);

    let report = builder.sync().await.unwrap();
    assert_eq!(report.appended, 2);
    assert_eq!(report.discovered, 1);
    assert!(!report.rebuilt);
    assert_eq!(report.root, builder.root().await);
    builder.confirm(submitted.in_flight.id).unwrap();
    assert_eq!(builder.balance(), ONE_UNIT);

    // transfer 0.3 to bob
    let request = TxRequest::transfer(bob.keypair.address(), ONE_UNIT * 3 / 10);
    let prepared = builder.build(&request).await.unwrap();
    assert_eq!(
        amounts(prepared.witness()),
        (vec![ONE_UNIT, 0], vec![ONE_UNIT * 3 / 10, ONE_UNIT * 7 / 10])
    );
    assert_eq!(prepared.witness().public_amount, Element::ZERO);

    let submitted = builder.prove_and_submit(prepared).await.unwrap();
    assert_eq!(submitted.in_flight.inputs.len(), 1);
    assert_eq!(submitted.in_flight.outputs.len(), 1);
    assert_eq!(builder.balance(), 0);

    builder.confirm(submitted.in_flight.id).unwrap();
    builder.sync().await.unwrap();
    assert_eq!(builder.balance(), ONE_UNIT * 7 / 10);
    assert!(builder.in_flight().is_empty());

    let bob_builder = bob.builder().await;
    let report = bob_builder.sync().await.unwrap();
    assert_eq!(report.discovered, 1);
    assert_eq!(bob_builder.balance(), ONE_UNIT * 3 / 10);

    // bob withdraws through a relayer
    let fee = ONE_UNIT / 100;
    let request = TxRequest::withdraw(ONE_UNIT / 5, b"bob-account".to_vec())
        .with_relayer(b"relayer".to_vec(), fee);
    let prepared = bob_builder.build(&request).await.unwrap();
    let change = ONE_UNIT * 3 / 10 - ONE_UNIT / 5 - fee;
    assert_eq!(amounts(prepared.witness()).1, [change, 0]);

    let submitted = bob_builder.prove_and_submit(prepared).await.unwrap();
    bob_builder.confirm(submitted.in_flight.id).unwrap();
    bob_builder.sync().await.unwrap();
    assert_eq!(bob_builder.balance(), change);

    let submissions = alice.ledger.submissions();
    let withdrawal = &submissions[2];
    assert_eq!(withdrawal.ext_data.ext_amount, -i128::try_from(ONE_UNIT / 5).unwrap());
    assert_eq!(withdrawal.ext_data.recipient, b"bob-account");
    assert_eq!(
        withdrawal.signals.public_amount,
        Element::from_i128(-i128::try_from(ONE_UNIT / 5 + fee).unwrap())
    );
    assert_eq!(withdrawal.bridge_payload, None);
    assert_eq!(alice.prover.calls().load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn note_missing_from_the_tree_is_stale_and_discarded() {
    let harness = Harness::new();
    let builder = harness.builder().await;

    let real = harness.ledger.fund(&harness.keypair, ONE_UNIT / 2);
    let ghost = Note::new(ONE_UNIT, harness.keypair.public_key()).with_index(7);
    harness.store.insert(ghost.clone());

    let request = TxRequest::withdraw(ONE_UNIT / 4, vec![1]);
    let error = builder.build(&request).await.unwrap_err();

    assert_eq!(error.stage(), Stage::ResolveProofs);
    assert_eq!(
        error.kind(),
        &ErrorKind::StaleNote {
            commitment: ghost.commitment(),
            reason: StaleReason::NotInTree
        }
    );
    assert!(error.is_recoverable());
    assert_eq!(harness.store.lock().state(ghost.commitment()), None);
    assert_eq!(builder.balance(), ONE_UNIT / 2);

    let prepared = builder.build(&request).await.unwrap();
    assert_eq!(prepared.inputs(), [real]);
}

#[tokio::test]
async fn note_at_another_index_is_stale_and_moved() {
    let harness = Harness::new();
    let builder = harness.builder().await;

    harness.ledger.fund(&Keypair::from_seed(&[9; 32]), ONE_UNIT);
    let note = harness.ledger.fund(&harness.keypair, ONE_UNIT);
    harness.store.insert(note.clone().with_index(0));

    let request = TxRequest::withdraw(ONE_UNIT, vec![1]);
    let error = builder.build(&request).await.unwrap_err();

    assert_eq!(
        error.kind(),
        &ErrorKind::StaleNote {
            commitment: note.commitment(),
            reason: StaleReason::IndexMismatch {
                recorded: Some(0),
                found: 1
            }
        }
    );

    let prepared = builder.build(&request).await.unwrap();
    assert_eq!(prepared.inputs(), [note]);
}

#[tokio::test]
async fn spent_note_is_stale_and_marked() {
    let harness = Harness::new();
    let builder = harness.builder().await;

    let note = harness.ledger.fund(&harness.keypair, ONE_UNIT);
    builder.sync().await.unwrap();
    harness.ledger.spend(note.nullifier(&harness.keypair).unwrap());

    let error = builder
        .build(&TxRequest::withdraw(ONE_UNIT, vec![1]))
        .await
        .unwrap_err();

    assert!(matches!(
        error.kind(),
        ErrorKind::StaleNote {
            reason: StaleReason::AlreadySpent,
            ..
        }
    ));
    assert_eq!(
        harness.store.lock().state(note.commitment()),
        Some(NoteState::Spent)
    );
    assert_eq!(builder.balance(), 0);
}

#[tokio::test]
async fn insufficient_funds() {
    let harness = Harness::new();
    let builder = harness.builder().await;
    harness.ledger.fund(&harness.keypair, ONE_UNIT / 2);

    let error = builder
        .build(&TxRequest::withdraw(ONE_UNIT, vec![1]))
        .await
        .unwrap_err();

    assert_eq!(error.stage(), Stage::CollectInputs);
    assert_eq!(
        error.kind(),
        &ErrorKind::InsufficientFunds {
            required: ONE_UNIT,
            available: ONE_UNIT / 2
        }
    );
    assert!(error.is_recoverable());
}

#[tokio::test]
async fn many_small_notes_use_the_larger_input_count() {
    let harness = Harness::new();
    let builder = harness.builder().await;

    for _ in 0..3 {
        harness.ledger.fund(&harness.keypair, ONE_UNIT * 4 / 10);
    }

    let prepared = builder
        .build(&TxRequest::withdraw(ONE_UNIT, vec![1]))
        .await
        .unwrap();

    assert_eq!(prepared.inputs().len(), 3);
    assert_eq!(prepared.witness().inputs.len(), 16);
    assert_eq!(prepared.witness().input_total(), ONE_UNIT * 12 / 10);
    assert_eq!(amounts(prepared.witness()).1, [ONE_UNIT * 2 / 10, 0]);
}

#[tokio::test]
async fn too_many_outputs_releases_inputs() {
    let harness = Harness::new();
    let builder = harness.builder().await;
    harness.ledger.fund(&harness.keypair, ONE_UNIT);

    let request = TxRequest::transfer(Keypair::from_seed(&[2; 32]).address(), ONE_UNIT / 4)
        .pay(Keypair::from_seed(&[3; 32]).address(), ONE_UNIT / 4);
    let error = builder.build(&request).await.unwrap_err();

    assert_eq!(error.stage(), Stage::BuildOutputs);
    assert_eq!(
        error.kind(),
        &ErrorKind::TooManyOutputs {
            requested: 3,
            available: 2
        }
    );
    assert_eq!(builder.balance(), ONE_UNIT);
}

#[tokio::test]
async fn more_payments_than_outputs_fail_before_any_work() {
    let harness = Harness::new();
    let builder = harness.builder().await;

    let request = TxRequest::transfer(Keypair::from_seed(&[2; 32]).address(), 1)
        .pay(Keypair::from_seed(&[3; 32]).address(), 1)
        .pay(Keypair::from_seed(&[4; 32]).address(), 1);
    let error = builder.build(&request).await.unwrap_err();

    assert_eq!(error.stage(), Stage::Validate);
    assert_eq!(
        error.kind(),
        &ErrorKind::TooManyOutputs {
            requested: 3,
            available: 2
        }
    );
    assert_eq!(harness.ledger.event_fetches(), 0);
}

#[tokio::test]
async fn dropping_a_prepared_transaction_releases_inputs() {
    let harness = Harness::new();
    let builder = harness.builder().await;
    harness.ledger.fund(&harness.keypair, ONE_UNIT);

    let prepared = builder
        .build(&TxRequest::withdraw(ONE_UNIT, vec![1]))
        .await
        .unwrap();
    assert_eq!(builder.balance(), 0);

    prepared.abandon();
    assert_eq!(builder.balance(), ONE_UNIT);
}

#[tokio::test]
async fn view_only_keypair_cannot_spend() {
    let harness = Harness::new();
    let owner = harness.keypair.clone();
    let harness = Harness {
        keypair: owner.view_only(),
        ..harness
    };
    let builder = harness.builder().await;
    harness.ledger.fund(&owner, ONE_UNIT);

    let error = builder
        .build(&TxRequest::withdraw(ONE_UNIT, vec![1]))
        .await
        .unwrap_err();

    assert_eq!(error.stage(), Stage::ResolveProofs);
    assert_eq!(error.kind(), &ErrorKind::MissingSpendingKey);
}

#[tokio::test]
async fn config_mismatch_is_caught_on_connect() {
    let harness = Harness::new();
    let config = Config {
        output_count: 3,
        ..harness.config.clone()
    };

    let result = TransactionBuilder::connect(
        config,
        harness.keypair.clone(),
        harness.store.clone(),
        harness.collaborators(),
    )
    .await;
    let Err(error) = result else {
        panic!("connect should fail");
    };

    assert_eq!(error.stage(), Stage::Configure);
    assert_eq!(
        error.kind(),
        &ErrorKind::ConfigMismatch {
            field: "output_count",
            local: "3".into(),
            ledger: "2".into()
        }
    );
}

#[tokio::test]
async fn sync_is_incremental() {
    let harness = Harness::new();
    let builder = harness.builder().await;

    harness.ledger.fund(&harness.keypair, ONE_UNIT);
    assert_eq!(builder.sync().await.unwrap().appended, 1);

    harness.ledger.fund(&Keypair::from_seed(&[2; 32]), ONE_UNIT);
    harness.ledger.fund(&harness.keypair, ONE_UNIT);
    let report = builder.sync().await.unwrap();

    assert_eq!(report.appended, 2);
    assert_eq!(report.discovered, 1);
    assert!(!report.rebuilt);
    assert_eq!(builder.balance(), 2 * ONE_UNIT);

    let report = builder.sync().await.unwrap();
    assert_eq!((report.appended, report.discovered), (0, 0));
}

#[tokio::test]
async fn corrupted_log_is_a_desync() {
    let harness = Harness::new();
    let builder = harness.builder().await;

    harness.ledger.fund(&harness.keypair, ONE_UNIT);
    harness.ledger.fund(&harness.keypair, ONE_UNIT);
    harness.ledger.corrupt_event(1, Element::new(99));

    let error = builder.sync().await.unwrap_err();
    assert_eq!(error.stage(), Stage::Sync);
    assert!(error.requires_resync());
    assert!(matches!(error.kind(), ErrorKind::TreeDesync { .. }));

    // the log can't be trusted, so every later sync fails the same way
    let error = builder.sync().await.unwrap_err();
    assert!(error.requires_resync());
    let error = builder.resync().await.unwrap_err();
    assert!(error.requires_resync());

    // nothing from the unverified log reaches the store
    assert_eq!(builder.balance(), 0);
}

#[tokio::test]
async fn prover_failure_returns_inputs() {
    let harness = Harness::new().with_prover(MockProver::failing("constraint not satisfied"));
    let builder = harness.builder().await;
    let note = harness.ledger.fund(&harness.keypair, ONE_UNIT);

    let prepared = builder
        .build(&TxRequest::withdraw(ONE_UNIT, vec![1]))
        .await
        .unwrap();
    let error = builder.prove_and_submit(prepared).await.unwrap_err();

    assert_eq!(error.stage(), Stage::Prove);
    assert_eq!(
        error.kind(),
        &ErrorKind::Prover("constraint not satisfied".into())
    );
    assert!(builder.in_flight().is_empty());
    assert_eq!(
        harness.store.lock().state(note.commitment()),
        Some(NoteState::Unspent)
    );
    assert!(harness.ledger.submissions().is_empty());
}

#[tokio::test]
async fn rejection_returns_inputs() {
    let harness = Harness::new();
    let builder = harness.builder().await;
    harness.ledger.fund(&harness.keypair, ONE_UNIT);
    harness.ledger.reject_next("pool is paused");

    let prepared = builder
        .build(&TxRequest::withdraw(ONE_UNIT / 2, vec![1]))
        .await
        .unwrap();
    let error = builder.prove_and_submit(prepared).await.unwrap_err();

    assert_eq!(error.stage(), Stage::Submit);
    assert_eq!(error.kind(), &ErrorKind::Rejected("pool is paused".into()));
    assert!(builder.in_flight().is_empty());
    assert_eq!(builder.balance(), ONE_UNIT);

    // the change note never existed
    assert_eq!(harness.store.lock().unspent().len(), 1);
}

#[tokio::test]
async fn unknown_outcome_stays_in_flight() {
    let harness = Harness::new();
    let builder = harness.builder().await;
    let note = harness.ledger.fund(&harness.keypair, ONE_UNIT);
    harness.ledger.fail_next("connection reset");

    let prepared = builder
        .build(&TxRequest::withdraw(ONE_UNIT, vec![1]))
        .await
        .unwrap();
    let id = prepared.reservation_id();
    let error = builder.prove_and_submit(prepared).await.unwrap_err();

    assert_eq!(error.stage(), Stage::Submit);
    assert!(error.stage().holds_in_flight_notes());
    assert_eq!(error.kind(), &ErrorKind::Ledger("connection reset".into()));

    let in_flight = builder.in_flight();
    assert_eq!(in_flight.len(), 1);
    assert_eq!(in_flight[0].inputs, [note.commitment()]);
    assert_eq!(
        harness.store.lock().state(note.commitment()),
        Some(NoteState::PendingSpent(id))
    );

    builder.fail(id).unwrap();
    assert_eq!(builder.balance(), ONE_UNIT);

    let error = builder.fail(id).unwrap_err();
    assert_eq!(error.stage(), Stage::Finalize);
    assert_eq!(error.kind(), &ErrorKind::UnknownReservation(id));
}

#[tokio::test]
async fn relayed_withdrawal_carries_the_bridge_payload() {
    let harness = Harness::new();
    let builder = harness.builder().await;
    harness.ledger.fund(&harness.keypair, ONE_UNIT);

    let request = TxRequest::withdraw(ONE_UNIT, b"l1-account".to_vec()).to_l1(7);
    let prepared = builder.build(&request).await.unwrap();
    builder.prove_and_submit(prepared).await.unwrap();

    let submissions = harness.ledger.submissions();
    let submission = &submissions[0];
    assert!(submission.ext_data.is_l1_withdrawal);
    assert_eq!(submission.ext_data.l1_fee, 7);
    assert_eq!(
        submission.bridge_payload.as_deref(),
        Some(submission.ext_data.to_bytes().as_slice())
    );
}

#[tokio::test]
async fn concurrent_builds_never_share_inputs() {
    let harness = Harness::new();
    let builder = harness.builder().await;
    harness.ledger.fund(&harness.keypair, ONE_UNIT);
    harness.ledger.fund(&harness.keypair, ONE_UNIT);

    let request = TxRequest::withdraw(ONE_UNIT, vec![1]);
    let (first, second, third) = tokio::join!(
        builder.build(&request),
        builder.build(&request),
        builder.build(&request),
    );

    let mut built = vec![];
    let mut failed = vec![];
    for result in [first, second, third] {
        match result {
            Ok(prepared) => built.push(prepared),
            Err(error) => failed.push(error),
        }
    }

    assert_eq!(built.len(), 2);
    assert_ne!(built[0].inputs(), built[1].inputs());
    assert_eq!(failed.len(), 1);
    assert!(matches!(
        failed[0].kind(),
        ErrorKind::InsufficientFunds { .. }
    ));
}
