use expect_test::expect;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use test_strategy::proptest;

use super::*;
use crate::hash_merge;

fn commitments(count: usize) -> Vec<Element> {
    let mut rng = ChaCha20Rng::seed_from_u64(7);
    (0..count).map(|_| Element::secure_random(&mut rng)).collect()
}

#[test]
fn incremental_and_rebuilt_roots_agree() {
    let leaves = commitments(5);

    let mut tree = MerkleTree::new(5).unwrap();
    for (expected_index, leaf) in leaves.iter().enumerate() {
        assert_eq!(tree.insert(*leaf).unwrap(), expected_index as u64);
    }

    let rebuilt = MerkleTree::rebuild(5, leaves.clone()).unwrap();

    assert_eq!(rebuilt.root(), tree.root());
    assert_eq!(tree.index_of(leaves[3]), Some(3));

    for index in 0..5 {
        let path = tree.path(index).unwrap();
        assert_eq!(path, rebuilt.path(index).unwrap());
        assert!(path.proves(leaves[index as usize], tree.root()));
    }
}

#[test]
fn rebuild_is_deterministic() {
    let leaves = commitments(9);

    let a = MerkleTree::rebuild(6, leaves.clone()).unwrap();
    let b = MerkleTree::rebuild(6, leaves).unwrap();

    assert_eq!(a.root(), b.root());
    assert_eq!(a, b);
}

#[test]
fn root_depends_on_order() {
    let leaves = commitments(4);
    let mut swapped = leaves.clone();
    swapped.swap(1, 2);

    let a = MerkleTree::rebuild(4, leaves).unwrap();
    let b = MerkleTree::rebuild(4, swapped).unwrap();

    assert_ne!(a.root(), b.root());
}

#[test]
fn single_leaf_root_matches_manual_hashing() {
    let leaf = Element::new(42);
    let tree = MerkleTree::rebuild(3, [leaf]).unwrap();

    let expected = (0..3).fold(leaf, |node, level| hash_merge([node, empty_tree_hash(level)]));

    assert_eq!(tree.root(), expected);
}

#[test]
fn full_tree_rejects_insert_and_batch_is_atomic() {
    let mut tree = MerkleTree::new(2).unwrap();
    tree.insert_batch(commitments(3)).unwrap();
    let root = tree.root();

    let error = tree.insert_batch(commitments(2)).unwrap_err();
    assert_eq!(
        error,
        Error::TreeFull {
            height: 2,
            capacity: 4
        }
    );
    assert_eq!(tree.len(), 3);
    assert_eq!(tree.root(), root);

    tree.insert(Element::new(1)).unwrap();
    expect!["tree of height 2 is full (4 leaves)"]
        .assert_eq(&tree.insert(Element::new(2)).unwrap_err().to_string());
}

#[test]
fn append_ordered_continues_from_the_end() {
    let leaves = commitments(6);
    let mut tree = MerkleTree::rebuild(5, leaves[..2].to_vec()).unwrap();

    let appended = tree
        .append_ordered((2..).zip(leaves[2..].iter().copied()))
        .unwrap();

    assert_eq!(appended, 4);
    assert_eq!(tree.root(), MerkleTree::rebuild(5, leaves).unwrap().root());
}

#[test]
fn append_ordered_rejects_replayed_event() {
    let leaves = commitments(3);
    let mut tree = MerkleTree::rebuild(5, leaves.clone()).unwrap();
    let root = tree.root();

    let error = tree.append_ordered([(1, leaves[1])]).unwrap_err();

    assert_eq!(
        error,
        Error::OutOfOrder {
            expected: 3,
            actual: 1
        }
    );
    assert_eq!(tree.root(), root);
}

#[test]
fn missing_event_is_detected_as_desync() {
    let leaves = commitments(5);
    let ledger = MerkleTree::rebuild(5, leaves.clone()).unwrap();

    let mut missing = leaves;
    missing.remove(2);
    let local = MerkleTree::rebuild(5, missing).unwrap();

    let error = local.verify_root(ledger.root()).unwrap_err();
    assert_eq!(
        error,
        Error::Desync {
            expected: ledger.root(),
            actual: local.root()
        }
    );
}

#[test]
fn duplicate_commitment_keeps_first_index() {
    let leaf = Element::new(5);
    let tree = MerkleTree::rebuild(3, [leaf, Element::new(6), leaf]).unwrap();

    assert_eq!(tree.len(), 3);
    assert_eq!(tree.index_of(leaf), Some(0));
}

#[test]
fn heights_at_the_limits() {
    assert!(MerkleTree::new(1).is_ok());
    assert!(MerkleTree::new(MAX_HEIGHT).is_ok());
    assert_eq!(
        MerkleTree::new(MAX_HEIGHT + 1).unwrap_err(),
        Error::UnsupportedHeight(MAX_HEIGHT + 1)
    );

    let tree = MerkleTree::new(MAX_HEIGHT).unwrap();
    assert_eq!(tree.capacity(), 1 << 32);
    assert_eq!(tree.root(), empty_tree_hash(MAX_HEIGHT));
}

#[proptest]
fn split_inserts_match_rebuild(tree: MerkleTree, #[strategy(0usize..40)] split: usize) {
    let leaves = tree.leaves().to_vec();
    let split = split.min(leaves.len());

    let mut incremental = MerkleTree::new(tree.height()).unwrap();
    incremental.insert_batch(leaves[..split].to_vec()).unwrap();
    for leaf in &leaves[split..] {
        incremental.insert(*leaf).unwrap();
    }

    assert_eq!(incremental.root(), tree.root());
}
