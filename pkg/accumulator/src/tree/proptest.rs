use ::proptest::{collection::vec, prelude::*};

use crate::{Element, MerkleTree};

impl Arbitrary for MerkleTree {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with((): Self::Parameters) -> Self::Strategy {
        (1usize..=8, vec(any::<Element>(), 0..40))
            .prop_map(|(height, mut leaves)| {
                leaves.truncate(1 << height);
                MerkleTree::rebuild(height, leaves).unwrap()
            })
            .boxed()
    }
}
