//! transform
//!
//! Pure structural transforms over mappings and sequences.
//!
//! Four independent operations, none of which mutate their input:
//!
//! - [`filter_by_value`] - keep the entries of a mapping whose value
//!   satisfies a predicate
//! - [`merge_union`] - merge alternative shapes of the same slot into one
//!   mapping whose values record every possibility
//! - [`pairs_to_map`] - build a mapping from explicit pairs, last
//!   occurrence of a key winning
//! - [`key_by_discriminant`] - index a variant set by its discriminant
//!   field (with [`key_by`] as the typed companion)
//!
//! Duplicate-key policy is uniform: accumulation-by-fold semantics, so the
//! last write wins. `key_by_discriminant` additionally offers a strict
//! variant that rejects duplicates instead.

use std::collections::BTreeMap;

use thiserror::Error;
use tracing::debug;

use crate::value::{Key, Value};

/// Errors from the structural transforms.
#[derive(Debug, Error, PartialEq)]
pub enum TransformError {
    /// A mapping key was not a permitted key type (string or number).
    #[error("invalid map key: {kind} is not a permitted key type")]
    InvalidKey { kind: &'static str },

    /// Two items carried the same discriminant value (strict mode only).
    #[error("duplicate discriminant '{key}'")]
    DuplicateDiscriminant { key: Key },

    /// An item was missing the discriminant field.
    #[error("item {index} is missing discriminant field '{field}'")]
    MissingDiscriminant { field: String, index: usize },

    /// An item in a variant sequence was not a mapping.
    #[error("expected a mapping at item {index}, found {kind}")]
    ExpectedMap { index: usize, kind: &'static str },
}

/// Keep the entries of `map` whose value satisfies `predicate`.
///
/// The output preserves the input's key order and leaves values unchanged;
/// the input is not mutated.
///
/// # Example
///
/// ```
/// use std::collections::BTreeMap;
/// use shapework::filter_by_value;
///
/// let scores: BTreeMap<&str, i64> =
///     [("ada", 92), ("bob", 41), ("eve", 77)].into_iter().collect();
///
/// let passing = filter_by_value(&scores, |s| *s >= 60);
/// assert_eq!(passing.keys().collect::<Vec<_>>(), vec![&"ada", &"eve"]);
/// ```
pub fn filter_by_value<K, V>(
    map: &BTreeMap<K, V>,
    predicate: impl Fn(&V) -> bool,
) -> BTreeMap<K, V>
where
    K: Ord + Clone,
    V: Clone,
{
    map.iter()
        .filter(|(_, value)| predicate(value))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

/// The set of values a merged key admits.
///
/// Produced by [`merge_union`]. Holds every distinct value observed for a
/// key, in first-seen order; never collapses disagreeing values into one.
#[derive(Debug, Clone, PartialEq)]
pub struct Union<V>(Vec<V>);

impl<V> Default for Union<V> {
    fn default() -> Self {
        Union(Vec::new())
    }
}

impl<V> Union<V> {
    /// The admitted values, in first-seen order.
    pub fn variants(&self) -> &[V] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<V: PartialEq> Union<V> {
    fn push_distinct(&mut self, value: V) {
        if !self.0.contains(&value) {
            self.0.push(value);
        }
    }

    /// Whether this union admits the candidate value.
    pub fn admits(&self, candidate: &V) -> bool {
        self.0.contains(candidate)
    }
}

/// Merge alternative shapes of the same slot.
///
/// The result's key set is the union of every input's key set. Where
/// shapes disagree on a key's value, both values are recorded: value
/// union, never overwrite. A key absent from a shape contributes nothing
/// for that shape.
///
/// # Example
///
/// ```
/// use std::collections::BTreeMap;
/// use shapework::{merge_union, Key, Value};
///
/// let numeric: BTreeMap<Key, Value> =
///     [(Key::from("a"), Value::from(1i64)), (Key::from("c"), Value::from("x"))]
///         .into_iter()
///         .collect();
/// let textual: BTreeMap<Key, Value> =
///     [(Key::from("a"), Value::from("s")), (Key::from("b"), Value::from(true))]
///         .into_iter()
///         .collect();
///
/// let merged = merge_union(&[numeric, textual]);
/// assert!(merged[&Key::from("a")].admits(&Value::from(1i64)));
/// assert!(merged[&Key::from("a")].admits(&Value::from("s")));
/// assert!(merged[&Key::from("b")].admits(&Value::from(true)));
/// ```
pub fn merge_union<K, V>(shapes: &[BTreeMap<K, V>]) -> BTreeMap<K, Union<V>>
where
    K: Ord + Clone,
    V: PartialEq + Clone,
{
    let mut merged: BTreeMap<K, Union<V>> = BTreeMap::new();
    for shape in shapes {
        for (key, value) in shape {
            merged
                .entry(key.clone())
                .or_default()
                .push_distinct(value.clone());
        }
    }
    merged
}

/// Build a mapping from explicit key/value pairs.
///
/// If a key occurs more than once, the last occurrence wins. Keys must be
/// of a permitted key type (see [`Key::from_value`]).
///
/// # Errors
///
/// `TransformError::InvalidKey` if any pair's key is not key-typed.
pub fn pairs_to_map(
    pairs: impl IntoIterator<Item = (Value, Value)>,
) -> Result<BTreeMap<Key, Value>, TransformError> {
    let mut map = BTreeMap::new();
    for (key, value) in pairs {
        let key = Key::from_value(&key).ok_or(TransformError::InvalidKey { kind: key.kind() })?;
        map.insert(key, value);
    }
    Ok(map)
}

/// Index a typed sequence by a key extracted from each item.
///
/// Last-write-wins on duplicate keys, consistent with [`pairs_to_map`].
pub fn key_by<T, K: Ord>(
    items: impl IntoIterator<Item = T>,
    key_fn: impl Fn(&T) -> K,
) -> BTreeMap<K, T> {
    let mut keyed = BTreeMap::new();
    for item in items {
        let key = key_fn(&item);
        keyed.insert(key, item);
    }
    keyed
}

#[derive(Clone, Copy)]
enum DuplicatePolicy {
    LastWins,
    Reject,
}

/// Index a variant sequence by its discriminant field.
///
/// Every item must be a mapping carrying `field` with a key-typed value.
/// Duplicate discriminants resolve last-write-wins; use
/// [`key_by_discriminant_strict`] to reject them instead.
///
/// # Example
///
/// ```
/// use shapework::{key_by_discriminant, Key, Value};
///
/// let apple = Value::map_from([(Key::from("kind"), Value::from("apple"))]);
/// let banana = Value::map_from([(Key::from("kind"), Value::from("banana"))]);
///
/// let keyed = key_by_discriminant(&[apple.clone(), banana], "kind").unwrap();
/// assert_eq!(keyed[&Key::from("apple")], apple);
/// ```
///
/// # Errors
///
/// - `TransformError::ExpectedMap` if an item is not a mapping.
/// - `TransformError::MissingDiscriminant` if an item lacks `field`.
/// - `TransformError::InvalidKey` if a discriminant value is not key-typed.
pub fn key_by_discriminant(
    items: &[Value],
    field: &str,
) -> Result<BTreeMap<Key, Value>, TransformError> {
    key_by_field(items, field, DuplicatePolicy::LastWins)
}

/// Like [`key_by_discriminant`], but fails fast on duplicate discriminants.
///
/// # Errors
///
/// All of [`key_by_discriminant`]'s errors, plus
/// `TransformError::DuplicateDiscriminant` when two items carry the same
/// discriminant value.
pub fn key_by_discriminant_strict(
    items: &[Value],
    field: &str,
) -> Result<BTreeMap<Key, Value>, TransformError> {
    key_by_field(items, field, DuplicatePolicy::Reject)
}

fn key_by_field(
    items: &[Value],
    field: &str,
    policy: DuplicatePolicy,
) -> Result<BTreeMap<Key, Value>, TransformError> {
    let field_key = Key::Str(field.to_string());
    let mut keyed = BTreeMap::new();

    for (index, item) in items.iter().enumerate() {
        let map = item.as_map().ok_or(TransformError::ExpectedMap {
            index,
            kind: item.kind(),
        })?;
        let entries = map.borrow();
        let discriminant =
            entries
                .get(&field_key)
                .ok_or_else(|| TransformError::MissingDiscriminant {
                    field: field.to_string(),
                    index,
                })?;
        let key = Key::from_value(discriminant).ok_or(TransformError::InvalidKey {
            kind: discriminant.kind(),
        })?;

        if keyed.insert(key.clone(), item.clone()).is_some() {
            match policy {
                DuplicatePolicy::Reject => {
                    return Err(TransformError::DuplicateDiscriminant { key })
                }
                DuplicatePolicy::LastWins => {
                    debug!(%key, "duplicate discriminant overwritten");
                }
            }
        }
    }

    Ok(keyed)
}
