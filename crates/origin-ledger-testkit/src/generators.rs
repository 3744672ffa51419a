//! Proptest generators for property-based testing.

use proptest::prelude::*;

use origin_ledger_core::{
    Address, AddressPrefix, ChildIndex, Direction, ExtendedKey, HARDENED_OFFSET,
};
use origin_ledger_requests::{PublishMeasurement, SplitPart};

use crate::fixtures::{begin, end};

/// Generate master key entropy.
pub fn seed() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 16..=64)
}

/// Generate a master key.
pub fn extended_key() -> impl Strategy<Value = ExtendedKey> {
    seed().prop_filter_map("seed yields no valid key", |seed| {
        ExtendedKey::from_entropy(&seed).ok()
    })
}

/// Generate a non-hardened child index.
pub fn child_index() -> impl Strategy<Value = u32> {
    0..HARDENED_OFFSET
}

/// Generate a derivation path of up to `max_len` steps.
pub fn path(max_len: usize) -> impl Strategy<Value = Vec<ChildIndex>> {
    prop::collection::vec(
        prop_oneof![
            child_index().prop_map(ChildIndex::Normal),
            child_index().prop_map(ChildIndex::Hardened),
        ],
        0..=max_len,
    )
}

/// Generate an address under `prefix`.
pub fn address(prefix: AddressPrefix) -> impl Strategy<Value = Address> {
    extended_key().prop_map(move |key| key.address(prefix))
}

pub fn direction() -> impl Strategy<Value = Direction> {
    prop_oneof![Just(Direction::Production), Just(Direction::Consumption)]
}

pub fn sector() -> impl Strategy<Value = String> {
    prop_oneof![Just("DK1".to_owned()), Just("DK2".to_owned())]
}

/// Generate a metered amount in Wh.
pub fn amount() -> impl Strategy<Value = u64> {
    1u64..=10_000_000
}

/// Generate between 1 and `max_parts` amounts summing to `total`.
pub fn amounts_summing_to(total: u64, max_parts: usize) -> impl Strategy<Value = Vec<u64>> {
    prop::collection::vec(0..=total, 0..max_parts.max(1)).prop_map(move |mut cuts| {
        cuts.sort_unstable();
        let mut parts = Vec::with_capacity(cuts.len() + 1);
        let mut last = 0;
        for cut in cuts {
            parts.push(cut - last);
            last = cut;
        }
        parts.push(total - last);
        parts
    })
}

/// Parameters for generating a publish request.
#[derive(Debug, Clone)]
pub struct MeasurementParams {
    pub key: ExtendedKey,
    pub amount: u64,
    pub hour: u32,
    pub sector: String,
    pub direction: Direction,
}

impl Arbitrary for MeasurementParams {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (extended_key(), child_index(), amount(), 0u32..24 * 365, sector(), direction())
            .prop_filter_map(
                "meter index yields no valid key",
                |(master, index, amount, hour, sector, direction)| {
                    let key = master.derive(index).ok()?;
                    Some(MeasurementParams {
                        key,
                        amount,
                        hour,
                        sector,
                        direction,
                    })
                },
            )
            .boxed()
    }
}

/// Build a publish request from parameters.
pub fn publish_from_params(params: &MeasurementParams) -> PublishMeasurement {
    PublishMeasurement::new(
        params.key.clone(),
        params.amount,
        begin(params.hour),
        end(params.hour),
        params.sector.clone(),
        params.direction,
    )
}

/// Split parts for `amounts`, at addresses derived from `owner`.
pub fn split_parts(owner: &ExtendedKey, amounts: &[u64]) -> Vec<SplitPart> {
    amounts
        .iter()
        .enumerate()
        .filter_map(|(i, amount)| {
            let key = owner.derive(i as u32).ok()?;
            Some(SplitPart::new(key.address(AddressPrefix::Ggo), *amount))
        })
        .collect()
}
