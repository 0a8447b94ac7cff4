use proptest::prelude::*;
use village_crypto::hash_text;
use village_governance::{hash_proposal, ProposalBatch};
use village_types::{Address, Amount};

fn arb_calls() -> impl Strategy<Value = Vec<([u8; 20], u128, Vec<u8>)>> {
    prop::collection::vec(
        (prop::array::uniform20(0u8..), 0u128..1_000_000, prop::collection::vec(0u8.., 0..16)),
        1..6,
    )
}

fn split(calls: Vec<([u8; 20], u128, Vec<u8>)>) -> (Vec<Address>, Vec<Amount>, Vec<Vec<u8>>) {
    let mut targets = Vec::new();
    let mut values = Vec::new();
    let mut calldatas = Vec::new();
    for (t, v, d) in calls {
        targets.push(Address::new(t));
        values.push(Amount::new(v));
        calldatas.push(d);
    }
    (targets, values, calldatas)
}

proptest! {
    /// Recomputing the id from the same tuple always yields the same id.
    #[test]
    fn proposal_id_is_deterministic(calls in arb_calls(), description in ".{0,64}") {
        let (targets, values, calldatas) = split(calls);
        let description_hash = hash_text(&description);
        let batch = ProposalBatch::new(targets.clone(), values.clone(), calldatas.clone()).unwrap();
        prop_assert_eq!(
            batch.id(&description_hash),
            hash_proposal(&targets, &values, &calldatas, &hash_text(&description))
        );
    }

    /// A different description always yields a different id.
    #[test]
    fn description_is_part_of_the_id(calls in arb_calls(), a in "[a-z]{1,16}", b in "[A-Z]{1,16}") {
        let (targets, values, calldatas) = split(calls);
        prop_assert_ne!(
            hash_proposal(&targets, &values, &calldatas, &hash_text(&a)),
            hash_proposal(&targets, &values, &calldatas, &hash_text(&b))
        );
    }
}
