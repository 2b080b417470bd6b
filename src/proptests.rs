use std::collections::BTreeMap;

use proptest::prelude::*;

use crate::HamtMap;

/// Operations applied to the map and the model alike.
#[derive(Debug, Clone)]
enum Action {
    Insert(i64, u64),
    Get(i64),
    Contains(i64),
}

/// Keys drawn from a narrow band (forcing updates) and from the full domain.
fn key_strategy() -> BoxedStrategy<i64> {
    prop_oneof![
        -16_i64..16,
        any::<i64>(),
    ]
    .boxed()
}

fn action_strategy() -> BoxedStrategy<Action> {
    prop_oneof![
        (key_strategy(), any::<u64>()).prop_map(|(key, value)| Action::Insert(key, value)),
        key_strategy().prop_map(Action::Get),
        key_strategy().prop_map(Action::Contains),
    ]
    .boxed()
}

/// Executes actions on both the map and a `BTreeMap` reference model.
struct Harness {
    map: HamtMap<i64, u64>,
    model: BTreeMap<i64, u64>,
}

impl Harness {
    fn new(map: HamtMap<i64, u64>) -> Self {
        Harness {
            map,
            model: BTreeMap::new(),
        }
    }

    fn apply(&mut self, action: &Action) {
        match *action {
            Action::Insert(key, value) => {
                self.map.insert(key, value);
                self.model.insert(key, value);
                assert_eq!(self.map.len(), self.model.len());
            }
            Action::Get(key) => {
                assert_eq!(self.map.get(&key), self.model.get(&key).copied());
            }
            Action::Contains(key) => {
                assert_eq!(self.map.contains_key(&key), self.model.contains_key(&key));
            }
        }
    }

    /// Full agreement check: size, per-key lookups, and iteration as a multiset.
    fn check_consistency(&self) {
        assert_eq!(self.map.len(), self.model.len());

        for (key, value) in &self.model {
            assert_eq!(self.map.get(key), Some(*value));
        }

        let mut pairs: Vec<(i64, u64)> = self.map.iter().map(|(k, v)| (*k, *v)).collect();
        pairs.sort();

        let expected: Vec<(i64, u64)> = self.model.iter().map(|(k, v)| (*k, *v)).collect();
        assert_eq!(pairs, expected);
    }
}

proptest! {
    #[test]
    fn prop_model_agreement(actions in prop::collection::vec(action_strategy(), 1..200)) {
        let mut harness = Harness::new(HamtMap::new());

        for action in &actions {
            harness.apply(action);
        }

        harness.check_consistency();
    }

    /// The same agreement must hold when every key collides into one bucket.
    #[test]
    fn prop_model_agreement_constant_hash(
        actions in prop::collection::vec(action_strategy(), 1..100),
    ) {
        let mut harness = Harness::new(HamtMap::with_hasher(|_| 42));

        for action in &actions {
            harness.apply(action);
        }

        harness.check_consistency();
    }

    /// The last inserted value for a key always wins.
    #[test]
    fn prop_round_trip(
        pairs in prop::collection::vec((any::<i64>(), any::<u64>()), 1..100),
    ) {
        let mut map = HamtMap::new();
        let mut model = BTreeMap::new();

        for &(key, value) in &pairs {
            map.insert(key, value);
            model.insert(key, value);
        }

        for (key, value) in &model {
            prop_assert_eq!(map.get(key), Some(*value));
        }
    }

    /// The length equals the number of distinct keys ever inserted.
    #[test]
    fn prop_size_law(keys in prop::collection::vec(-32_i64..32, 1..200)) {
        let mut map = HamtMap::new();

        for &key in &keys {
            map.insert(key, 0);
        }

        let mut distinct = keys.clone();
        distinct.sort();
        distinct.dedup();

        prop_assert_eq!(map.len(), distinct.len());
    }
}
