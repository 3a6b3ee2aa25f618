//! Integration tests exercising the toolkit components together.
//!
//! The scenarios mirror real call sites: ingest dynamic data, index it by
//! a discriminant, narrow candidates with a guard, and hand consumers a
//! frozen view they cannot corrupt.

use std::collections::BTreeMap;

use shapework::{
    brand, deep_freeze, filter_by_value, key_by_discriminant, key_by_discriminant_strict,
    merge_union, unbrand, Branded, Frozen, Guard, Key, TransformError, Value,
};

fn catalog() -> Vec<Value> {
    let json = serde_json::json!([
        {"kind": "circle", "radius": 2.0},
        {"kind": "rect", "w": 1.0, "h": 4.0},
        {"kind": "circle", "radius": 3.5},
    ]);
    json.as_array()
        .unwrap()
        .iter()
        .cloned()
        .map(Value::from)
        .collect()
}

#[test]
fn json_catalog_to_frozen_index() {
    let items = catalog();

    // Duplicate "circle" resolves last-write-wins under the default policy.
    let keyed = key_by_discriminant(&items, "kind").unwrap();
    assert_eq!(keyed.len(), 2);
    assert_eq!(keyed[&Key::from("circle")], items[2]);
    assert_eq!(keyed[&Key::from("rect")], items[1]);

    // The strict policy refuses the same input.
    assert_eq!(
        key_by_discriminant_strict(&items, "kind").unwrap_err(),
        TransformError::DuplicateDiscriminant {
            key: Key::from("circle")
        }
    );

    // Freeze the index; reads work, writes are rejected, nothing changes.
    let index = Value::map(keyed);
    let frozen = deep_freeze(&index);
    let map = frozen.as_map().unwrap();

    assert!(map.get(&Key::from("circle")).is_some());
    assert!(map.insert(Key::from("square"), Frozen::Null).is_err());
    assert!(map.remove(&Key::from("rect")).is_err());
    assert_eq!(frozen, index);
}

#[test]
fn guard_narrows_what_the_filter_kept() {
    let settings: BTreeMap<Key, Value> = [
        (Key::from("retries"), Value::from(3i64)),
        (Key::from("host"), Value::from("localhost")),
        (Key::from("timeout"), Value::from(30i64)),
        (Key::from("verbose"), Value::from(false)),
    ]
    .into_iter()
    .collect();

    let numeric = filter_by_value(&settings, |v| matches!(v, Value::Int(_)));
    assert_eq!(numeric.len(), 2);

    // The probe is the only place that knows what "numeric" means; the
    // guard's verdict cannot drift from it.
    let as_int = Guard::from_probe(|v: &Value| match v {
        Value::Int(i) => Some(*i),
        _ => None,
    });

    for value in numeric.values() {
        assert!(as_int.check(value));
        assert!(as_int.narrow(value).is_some());
    }
    assert!(!as_int.check(&settings[&Key::from("host")]));
}

#[test]
fn merged_shape_admits_every_alternative() {
    let v1: BTreeMap<Key, Value> = [
        (Key::from("id"), Value::from(1i64)),
        (Key::from("name"), Value::from("legacy")),
    ]
    .into_iter()
    .collect();
    let v2: BTreeMap<Key, Value> = [
        (Key::from("id"), Value::from("uuid-1")),
        (Key::from("tags"), Value::seq(vec![Value::from("a")])),
    ]
    .into_iter()
    .collect();

    let merged = merge_union(&[v1, v2]);

    // "id" changed type across versions; the merged slot records both.
    assert!(merged[&Key::from("id")].admits(&Value::from(1i64)));
    assert!(merged[&Key::from("id")].admits(&Value::from("uuid-1")));
    assert!(!merged[&Key::from("id")].admits(&Value::from(2i64)));
    assert_eq!(merged.len(), 3);
}

#[test]
fn branded_ids_stay_distinct_but_serialize_raw() {
    enum ShapeId {}
    enum OwnerId {}

    let shape: Branded<u32, ShapeId> = brand(7);
    let owner: Branded<u32, OwnerId> = brand(7);

    // Same raw value, same wire form, distinct Rust types.
    assert_eq!(
        serde_json::to_string(&shape).unwrap(),
        serde_json::to_string(&owner).unwrap()
    );
    assert_eq!(unbrand(shape), unbrand(owner));
}

#[test]
fn frozen_cyclic_index_is_safe_to_share() {
    // A node that lists its own container, a common registry shape.
    let registry = Value::map(BTreeMap::new());
    let node = Value::map_from([
        (Key::from("name"), Value::from("root")),
        (Key::from("registry"), registry.clone()),
    ]);
    registry
        .as_map()
        .unwrap()
        .borrow_mut()
        .insert(Key::from("root"), node.clone());

    let frozen = deep_freeze(&registry);
    let root = frozen.as_map().unwrap().get(&Key::from("root")).unwrap();
    let back = root.as_map().unwrap().get(&Key::from("registry")).unwrap();

    // The cycle closed onto the same frozen wrapper.
    assert!(back.ptr_eq(&frozen));

    // And no handle along the cycle accepts writes.
    assert!(back
        .as_map()
        .unwrap()
        .insert(Key::from("other"), Frozen::Null)
        .is_err());
}
