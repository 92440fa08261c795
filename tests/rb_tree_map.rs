use std::collections::BTreeMap;

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rbtree_arena::{Corruption, Error, InsertResult, RbTreeMap, RemoveResult};

/// The number of operations to perform in each proptest case.
const TEST_SIZE: usize = 2_000;

/// Keys drawn from a range smaller than `TEST_SIZE` so that collisions happen.
fn key_strategy() -> impl Strategy<Value = i64> {
    -1_000i64..1_000i64
}

fn value_strategy() -> impl Strategy<Value = i64> {
    any::<i64>()
}

/// Asserts the arena bookkeeping that must hold after every operation.
fn assert_accounting<K: Ord, V>(map: &RbTreeMap<K, V>) {
    assert_eq!(map.len() + map.free_slots(), map.capacity());
    assert_eq!(map.validate(), Ok(()));
}

// ─── Operations enum for driving randomized tests ────────────────────────────

#[derive(Debug, Clone)]
enum MapOp {
    Insert(i64, i64),
    Remove(i64),
    Get(i64),
    ContainsKey(i64),
    FirstKeyValue,
    LastKeyValue,
    PopFirst,
    PopLast,
}

fn map_op_strategy() -> impl Strategy<Value = MapOp> {
    prop_oneof![
        5 => (key_strategy(), value_strategy()).prop_map(|(k, v)| MapOp::Insert(k, v)),
        3 => key_strategy().prop_map(MapOp::Remove),
        2 => key_strategy().prop_map(MapOp::Get),
        1 => key_strategy().prop_map(MapOp::ContainsKey),
        1 => Just(MapOp::FirstKeyValue),
        1 => Just(MapOp::LastKeyValue),
        1 => Just(MapOp::PopFirst),
        1 => Just(MapOp::PopLast),
    ]
}

// ─── Model-based tests ───────────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(20))]

    /// Replays a random sequence of operations on both `RbTreeMap` and
    /// `BTreeMap` and asserts identical results at every step.
    #[test]
    fn map_ops_match_btreemap(ops in proptest::collection::vec(map_op_strategy(), TEST_SIZE)) {
        let mut rb_map: RbTreeMap<i64, i64> = RbTreeMap::new();
        let mut bt_map: BTreeMap<i64, i64> = BTreeMap::new();

        for op in &ops {
            match op {
                MapOp::Insert(k, v) => {
                    let rb_result = rb_map.insert(*k, *v).unwrap();
                    // Rejecting duplicates is `entry().or_insert()` on the model.
                    let expected = if bt_map.contains_key(k) {
                        InsertResult::AlreadyPresent
                    } else {
                        bt_map.insert(*k, *v);
                        InsertResult::Inserted
                    };
                    prop_assert_eq!(rb_result, expected, "insert({}, {})", k, v);
                }
                MapOp::Remove(k) => {
                    let rb_result = rb_map.remove(k).removed();
                    let bt_result = bt_map.remove(k);
                    prop_assert_eq!(rb_result, bt_result, "remove({})", k);
                }
                MapOp::Get(k) => {
                    prop_assert_eq!(rb_map.get(k), bt_map.get(k), "get({})", k);
                }
                MapOp::ContainsKey(k) => {
                    prop_assert_eq!(rb_map.contains_key(k), bt_map.contains_key(k), "contains_key({})", k);
                }
                MapOp::FirstKeyValue => {
                    prop_assert_eq!(rb_map.first_key_value(), bt_map.first_key_value(), "first_key_value");
                }
                MapOp::LastKeyValue => {
                    prop_assert_eq!(rb_map.last_key_value(), bt_map.last_key_value(), "last_key_value");
                }
                MapOp::PopFirst => {
                    prop_assert_eq!(rb_map.pop_first(), bt_map.pop_first(), "pop_first");
                }
                MapOp::PopLast => {
                    prop_assert_eq!(rb_map.pop_last(), bt_map.pop_last(), "pop_last");
                }
            }
            prop_assert_eq!(rb_map.len(), bt_map.len(), "len mismatch after {:?}", op);
            prop_assert_eq!(rb_map.len() + rb_map.free_slots(), rb_map.capacity());
        }

        prop_assert_eq!(rb_map.validate(), Ok(()));
        prop_assert!(rb_map.iter().eq(bt_map.iter()));
    }

    /// Distinct inserts followed by removes of present and absent keys keep
    /// iteration strictly increasing and every invariant intact.
    #[test]
    fn inserts_then_removes_stay_sorted(
        keys in proptest::collection::btree_set(key_strategy(), 0..500),
        removals in proptest::collection::vec(key_strategy(), 0..500),
    ) {
        let mut map = RbTreeMap::new();
        for &k in &keys {
            prop_assert_eq!(map.insert(k, k).unwrap(), InsertResult::Inserted);
        }
        let mut removed = 0;
        for k in &removals {
            let present = map.contains_key(k);
            let result = map.remove(k);
            prop_assert_eq!(result.is_removed(), present);
            removed += usize::from(present);
            prop_assert_eq!(map.validate(), Ok(()));
        }

        prop_assert_eq!(map.len(), keys.len() - removed);
        prop_assert_eq!(map.capacity(), keys.len());
        let collected: Vec<i64> = map.keys().copied().collect();
        prop_assert!(collected.windows(2).all(|w| w[0] < w[1]));
    }

    /// Iteration in both directions matches `BTreeMap`.
    #[test]
    fn iter_matches_btreemap(entries in proptest::collection::vec((key_strategy(), value_strategy()), 1..TEST_SIZE)) {
        let mut rb_map = RbTreeMap::new();
        let mut bt_map = BTreeMap::new();
        for &(k, v) in &entries {
            rb_map.insert(k, v).unwrap();
            bt_map.entry(k).or_insert(v);
        }

        prop_assert_eq!(rb_map.iter().len(), bt_map.len());
        prop_assert!(rb_map.iter().eq(bt_map.iter()));
        prop_assert!(rb_map.iter().rev().eq(bt_map.iter().rev()));
        prop_assert!(rb_map.keys().eq(bt_map.keys()));
        prop_assert!(rb_map.values().eq(bt_map.values()));

        // Alternate ends until the two cursors meet.
        let mut rb_iter = rb_map.iter();
        let mut bt_iter = bt_map.iter();
        loop {
            let front = (rb_iter.next(), bt_iter.next());
            prop_assert_eq!(front.0, front.1);
            let back = (rb_iter.next_back(), bt_iter.next_back());
            prop_assert_eq!(back.0, back.1);
            if front.0.is_none() || back.0.is_none() {
                break;
            }
        }
    }

    /// Mutating values through `get_mut` is visible to later lookups.
    #[test]
    fn get_mut_updates_in_place(
        entries in proptest::collection::vec((key_strategy(), value_strategy()), TEST_SIZE / 2),
        keys_to_mutate in proptest::collection::vec(key_strategy(), 100),
    ) {
        let mut rb_map = RbTreeMap::new();
        let mut bt_map = BTreeMap::new();
        for &(k, v) in &entries {
            rb_map.insert(k, v).unwrap();
            bt_map.entry(k).or_insert(v);
        }
        for k in &keys_to_mutate {
            if let Some(v) = rb_map.get_mut(k) {
                *v = v.wrapping_add(1);
            }
            if let Some(v) = bt_map.get_mut(k) {
                *v = v.wrapping_add(1);
            }
        }
        prop_assert!(rb_map.iter().eq(bt_map.iter()));
    }

    /// `clear` empties the map, keeps every slot and allows reuse.
    #[test]
    fn clear_recycles_all_slots(entries in proptest::collection::vec((key_strategy(), value_strategy()), TEST_SIZE / 2)) {
        let mut map = RbTreeMap::new();
        for &(k, v) in &entries {
            map.insert(k, v).unwrap();
        }
        let capacity = map.capacity();
        map.clear();
        prop_assert!(map.is_empty());
        prop_assert_eq!(map.iter().next(), None);
        prop_assert_eq!(map.capacity(), capacity);
        prop_assert_eq!(map.free_slots(), capacity);
        prop_assert_eq!(map.validate(), Ok(()));

        for &(k, v) in &entries {
            map.insert(k, v).unwrap();
        }
        prop_assert_eq!(map.capacity(), capacity);
        prop_assert_eq!(map.validate(), Ok(()));
    }

    /// A dump/load round trip keeps contents, shape and freelist.
    #[test]
    fn dump_load_round_trip(
        entries in proptest::collection::vec((key_strategy(), value_strategy()), 0..TEST_SIZE / 2),
        removals in proptest::collection::vec(key_strategy(), 0..TEST_SIZE / 4),
    ) {
        let mut map = RbTreeMap::new();
        for &(k, v) in &entries {
            map.insert(k, v).unwrap();
        }
        for k in &removals {
            let _ = map.remove(k);
        }

        let bytes = map.dump();
        let loaded = RbTreeMap::<i64, i64>::load(&bytes).unwrap();
        prop_assert_eq!(&loaded, &map);
        prop_assert_eq!(loaded.capacity(), map.capacity());
        prop_assert_eq!(loaded.free_slots(), map.free_slots());
        prop_assert_eq!(loaded.validate(), Ok(()));
        // Identical arena layout dumps to identical bytes.
        prop_assert_eq!(loaded.dump(), bytes);
    }
}

// ─── Scenarios ───────────────────────────────────────────────────────────────

#[test]
fn scenario_inserts_iterate_in_order() {
    let mut map = RbTreeMap::new();
    for k in [1, 5, 3, 8, 2] {
        assert_eq!(map.insert(k, ()), Ok(InsertResult::Inserted));
    }
    assert_eq!(map.keys().copied().collect::<Vec<_>>(), [1, 2, 3, 5, 8]);
    assert_accounting(&map);
}

#[test]
fn scenario_remove_middle_of_three() {
    let mut map = RbTreeMap::new();
    for k in [10, 20, 30] {
        map.insert(k, k).unwrap();
    }
    assert_eq!(map.remove(&20), RemoveResult::Removed(20));
    assert_eq!(map.keys().copied().collect::<Vec<_>>(), [10, 30]);
    assert_accounting(&map);
}

#[test]
fn scenario_drain_and_reuse_slot() {
    let mut map = RbTreeMap::new();
    for k in 1..=7 {
        map.insert(k, k).unwrap();
    }
    assert_eq!(map.capacity(), 7);
    for k in [4, 1, 7, 2, 6, 3, 5] {
        assert_eq!(map.remove(&k).into_result(), Ok(k));
        assert_accounting(&map);
    }
    assert!(map.is_empty());
    assert_eq!(map.iter().next(), None);
    assert_eq!(map.free_slots(), 7);

    map.insert(42, 42).unwrap();
    assert_eq!(map.capacity(), 7);
    assert_eq!(map.free_slots(), 6);
    assert_accounting(&map);
}

#[test]
fn scenario_duplicate_key_is_rejected() {
    let mut map = RbTreeMap::new();
    assert_eq!(map.insert(5, "a").and_then(InsertResult::into_result), Ok(()));
    assert_eq!(
        map.insert(5, "b").and_then(InsertResult::into_result),
        Err(Error::KeyAlreadyExists)
    );
    assert_eq!(map.get(&5), Some(&"a"));
    assert_eq!(map.len(), 1);
    assert_eq!(map.capacity(), 1);
}

#[test]
fn remove_missing_key_is_not_found() {
    let mut map = RbTreeMap::new();
    map.insert(1, 1).unwrap();
    assert_eq!(map.remove(&2).into_result(), Err(Error::KeyNotFound));
    assert_eq!(map.remove_entry(&2), None);
    assert_eq!(map.len(), 1);
    assert_eq!(map.free_slots(), 0);
}

#[test]
fn oversized_reserve_is_out_of_memory() {
    let mut map: RbTreeMap<u64, u64> = RbTreeMap::new();
    map.insert(1, 1).unwrap();
    assert_eq!(map.reserve(usize::MAX), Err(Error::OutOfMemory));
    assert_eq!(map.capacity(), 1);
    assert_eq!(map.get(&1), Some(&1));
    map.reserve(64).unwrap();
    assert_eq!(map.capacity(), 1);
}

#[test]
fn sequential_inserts_stay_shallow() {
    let mut map = RbTreeMap::new();
    for k in 0..10_000u32 {
        map.insert(k, k).unwrap();
    }
    assert_accounting(&map);
    for k in (0..10_000u32).step_by(2) {
        assert_eq!(map.remove(&k), RemoveResult::Removed(k));
    }
    assert_accounting(&map);
    assert_eq!(map.keys().copied().collect::<Vec<_>>(), (1..10_000).step_by(2).collect::<Vec<_>>());
}

#[test]
fn borrowed_lookups() {
    let mut map = RbTreeMap::new();
    map.insert(String::from("pear"), 1).unwrap();
    map.insert(String::from("apple"), 2).unwrap();
    assert_eq!(map.get("apple"), Some(&2));
    assert!(map.contains_key("pear"));
    assert_eq!(map["pear"], 1);
    assert_eq!(map.remove("apple"), RemoveResult::Removed(2));
    assert_eq!(map.get_key_value("pear"), Some((&String::from("pear"), &1)));
}

// ─── Serialized blob ─────────────────────────────────────────────────────────

#[test]
fn dump_header_layout() {
    let mut map: RbTreeMap<u32, u16> = RbTreeMap::new();
    for k in [3, 1, 2] {
        map.insert(k, 0).unwrap();
    }
    map.remove(&1).removed().unwrap();
    let bytes = map.dump();
    let word = |i: usize| u64::from_le_bytes(bytes[i * 8..(i + 1) * 8].try_into().unwrap());
    assert_eq!(word(0), 2);
    assert_eq!(word(1), 3);
    assert!(word(2) < 3);
    assert!(word(3) < 3);
    assert_eq!(bytes.len(), 32 + 3 * (4 + 2 + 1 + 24));
}

#[test]
fn load_failure_leaves_map_untouched() {
    let mut map: RbTreeMap<u64, u64> = RbTreeMap::new();
    for k in 0..10 {
        map.insert(k, k * k).unwrap();
    }
    let before = map.clone();

    let mut bytes = map.dump();
    bytes.truncate(bytes.len() - 1);
    assert!(matches!(
        map.restore(&bytes),
        Err(Error::CorruptSerializedData(Corruption::LengthMismatch { .. }))
    ));
    assert_eq!(map, before);

    assert!(matches!(
        map.restore(&bytes[..16]),
        Err(Error::CorruptSerializedData(Corruption::TruncatedHeader { .. }))
    ));
    assert_eq!(map, before);
}

#[test]
fn restore_replaces_contents() {
    let mut source: RbTreeMap<u8, u8> = RbTreeMap::new();
    for k in 0..5 {
        source.insert(k, k).unwrap();
    }
    let mut target: RbTreeMap<u8, u8> = RbTreeMap::new();
    target.insert(200, 200).unwrap();
    target.restore(&source.dump()).unwrap();
    assert_eq!(target, source);

    // The restored freelist and arena keep working.
    target.remove(&0).removed().unwrap();
    target.insert(9, 9).unwrap();
    assert_eq!(target.capacity(), 5);
    assert_accounting(&target);
}

#[test]
fn loaded_blob_with_broken_colors_fails_validation() {
    let mut map: RbTreeMap<u32, u32> = RbTreeMap::new();
    for k in 0..3 {
        map.insert(k, k).unwrap();
    }
    let mut bytes = map.dump();
    // Paint every node red; sizes and bounds are still fine.
    let colors = 32 + 3 * (4 + 4);
    bytes[colors..colors + 3].fill(0);
    let loaded = RbTreeMap::<u32, u32>::load(&bytes).unwrap();
    assert!(matches!(loaded.validate(), Err(Error::InvariantViolation(_))));
}
