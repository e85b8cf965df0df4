//! Property tests for delta-set triples and item deltas.

use proptest::prelude::*;
use xavyo_delta::{DeltaSetTriple, ItemDelta, ItemPath, MatchingRuleRegistry, Value};

fn value_set() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(0u8..16, 0..12)
}

fn to_values(raw: &[u8]) -> Vec<Value> {
    raw.iter().map(|v| Value::from(i64::from(*v))).collect()
}

proptest! {
    #[test]
    fn from_old_new_partitions(old in value_set(), new in value_set()) {
        let triple = DeltaSetTriple::from_old_new(&old, &new, |a, b| a == b);

        for v in triple.zero() {
            prop_assert!(old.contains(v) && new.contains(v));
        }
        for v in triple.plus() {
            prop_assert!(new.contains(v) && !old.contains(v));
        }
        for v in triple.minus() {
            prop_assert!(old.contains(v) && !new.contains(v));
        }
        for v in &old {
            prop_assert!(triple.zero().contains(v) || triple.minus().contains(v));
        }
        for v in &new {
            prop_assert!(triple.zero().contains(v) || triple.plus().contains(v));
        }
        for v in triple.zero() {
            prop_assert!(!triple.plus().contains(v) && !triple.minus().contains(v));
        }
        for v in triple.plus() {
            prop_assert!(!triple.minus().contains(v));
        }
    }

    #[test]
    fn merge_keeps_buckets_disjoint(
        a in (value_set(), value_set()),
        b in (value_set(), value_set()),
    ) {
        let left = DeltaSetTriple::from_old_new(&a.0, &a.1, |x, y| x == y);
        let right = DeltaSetTriple::from_old_new(&b.0, &b.1, |x, y| x == y);
        let merged = left.merge(&right);

        for v in merged.zero() {
            prop_assert!(!merged.plus().contains(v) && !merged.minus().contains(v));
        }
        for v in merged.plus() {
            prop_assert!(!merged.minus().contains(v));
        }
        for v in left.all_values().iter().chain(right.all_values().iter()) {
            prop_assert!(merged.all_values().contains(v));
        }
    }

    #[test]
    fn item_delta_triple_agrees_with_application(
        old in value_set(),
        add in value_set(),
        delete in value_set(),
    ) {
        let registry = MatchingRuleRegistry::new();
        let rule = registry.default_rule();
        let path: ItemPath = "attributes/value".parse().unwrap();
        let old_values = to_values(&old);
        let delta = ItemDelta::add(path, to_values(&add)).with_delete(to_values(&delete));

        let applied = delta.apply_to(&old_values, rule.as_ref());
        let triple = delta.to_triple(&old_values, rule.as_ref());
        let after = triple.non_negative_values();

        for v in &applied {
            prop_assert!(after.contains(v));
        }
        for v in triple.minus() {
            prop_assert!(!applied.contains(v) || to_values(&add).contains(v));
        }
    }
}
