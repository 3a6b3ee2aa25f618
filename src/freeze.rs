//! freeze
//!
//! Deep, identity-preserving freezing of value graphs.
//!
//! [`deep_freeze`] walks a [`Value`] graph and returns a [`Frozen`] view of
//! it: every reachable container becomes a read-only wrapper whose mutating
//! entry points uniformly fail with [`MutationRejected`]; primitives and
//! callables pass through unchanged (primitives are already immutable,
//! callables are opaque leaves and are never entered).
//!
//! The traversal keys a visited map by container identity, so shared nodes
//! freeze to the *same* wrapper and cyclic graphs terminate with their
//! sharing intact: freezing `a -> b -> a` yields a frozen `a` whose
//! `b.a` is identical (by pointer) to the frozen root. The visited map is
//! local to each call.
//!
//! The input graph is never mutated; freezing only wraps.
//!
//! # Example
//!
//! ```
//! use shapework::{deep_freeze, Frozen, Key, Value};
//!
//! let config = Value::map_from([
//!     (Key::from("retries"), Value::from(3i64)),
//!     (Key::from("hosts"), Value::seq(vec![Value::from("a"), Value::from("b")])),
//! ]);
//!
//! let frozen = deep_freeze(&config);
//! let Frozen::Map(map) = &frozen else { unreachable!() };
//!
//! assert_eq!(map.get(&Key::from("retries")), Some(Frozen::Int(3)));
//! assert!(map.insert(Key::from("retries"), Frozen::Int(9)).is_err());
//! assert_eq!(frozen, config);
//! ```

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use thiserror::Error;
use tracing::trace;

use crate::value::{Key, NativeFn, Value};

/// A write was attempted through a frozen handle.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("mutation rejected: {target} is part of a frozen graph")]
pub struct MutationRejected {
    target: &'static str,
}

impl MutationRejected {
    fn map() -> Self {
        Self { target: "mapping" }
    }

    fn seq() -> Self {
        Self { target: "sequence" }
    }
}

/// A read-only mapping node of a frozen graph.
///
/// The interior `RefCell` exists only so cyclic graphs can be tied off
/// during freezing; nothing mutates it afterwards, and no public method
/// exposes it writably.
pub struct FrozenMap {
    entries: RefCell<BTreeMap<Key, Frozen>>,
}

impl FrozenMap {
    /// Look up a key, cloning out the frozen value.
    pub fn get(&self, key: &Key) -> Option<Frozen> {
        self.entries.borrow().get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// The keys, in map order.
    pub fn keys(&self) -> Vec<Key> {
        self.entries.borrow().keys().cloned().collect()
    }

    /// All entries, in map order.
    pub fn entries(&self) -> Vec<(Key, Frozen)> {
        self.entries
            .borrow()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Rejected: frozen mappings do not accept inserts.
    pub fn insert(&self, _key: Key, _value: Frozen) -> Result<(), MutationRejected> {
        Err(MutationRejected::map())
    }

    /// Rejected: frozen mappings do not accept removals.
    pub fn remove(&self, _key: &Key) -> Result<(), MutationRejected> {
        Err(MutationRejected::map())
    }

    /// Rejected: frozen mappings do not accept clearing.
    pub fn clear(&self) -> Result<(), MutationRejected> {
        Err(MutationRejected::map())
    }
}

/// A read-only sequence node of a frozen graph.
pub struct FrozenSeq {
    items: RefCell<Vec<Frozen>>,
}

impl FrozenSeq {
    /// Look up an index, cloning out the frozen value.
    pub fn get(&self, index: usize) -> Option<Frozen> {
        self.items.borrow().get(index).cloned()
    }

    pub fn len(&self) -> usize {
        self.items.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.borrow().is_empty()
    }

    /// All items, in order.
    pub fn to_vec(&self) -> Vec<Frozen> {
        self.items.borrow().clone()
    }

    /// Rejected: frozen sequences do not accept appends.
    pub fn push(&self, _value: Frozen) -> Result<(), MutationRejected> {
        Err(MutationRejected::seq())
    }

    /// Rejected: frozen sequences do not accept writes.
    pub fn set(&self, _index: usize, _value: Frozen) -> Result<(), MutationRejected> {
        Err(MutationRejected::seq())
    }

    /// Rejected: frozen sequences do not accept clearing.
    pub fn clear(&self) -> Result<(), MutationRejected> {
        Err(MutationRejected::seq())
    }
}

/// A node of a frozen graph.
///
/// Mirrors [`Value`]; containers are shared so identity survives freezing.
#[derive(Clone)]
pub enum Frozen {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Seq(Rc<FrozenSeq>),
    Map(Rc<FrozenMap>),
    Func(NativeFn),
}

impl Frozen {
    /// The frozen mapping, if this is a mapping node.
    pub fn as_map(&self) -> Option<&Rc<FrozenMap>> {
        match self {
            Frozen::Map(map) => Some(map),
            _ => None,
        }
    }

    /// The frozen sequence, if this is a sequence node.
    pub fn as_seq(&self) -> Option<&Rc<FrozenSeq>> {
        match self {
            Frozen::Seq(seq) => Some(seq),
            _ => None,
        }
    }

    /// Whether two frozen nodes are the same shared container or callable.
    ///
    /// Non-container nodes are never identical, only equal.
    pub fn ptr_eq(&self, other: &Frozen) -> bool {
        match (self, other) {
            (Frozen::Seq(a), Frozen::Seq(b)) => Rc::ptr_eq(a, b),
            (Frozen::Map(a), Frozen::Map(b)) => Rc::ptr_eq(a, b),
            (Frozen::Func(a), Frozen::Func(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// Freeze a value graph.
///
/// Returns a [`Frozen`] view over `value`. The original graph is left
/// untouched and remains mutable through its own handles; the frozen view
/// is a wrap-time snapshot of the graph's structure.
pub fn deep_freeze(value: &Value) -> Frozen {
    let mut visited: HashMap<usize, Frozen> = HashMap::new();
    freeze_node(value, &mut visited)
}

fn freeze_node(value: &Value, visited: &mut HashMap<usize, Frozen>) -> Frozen {
    match value {
        Value::Null => Frozen::Null,
        Value::Bool(b) => Frozen::Bool(*b),
        Value::Int(i) => Frozen::Int(*i),
        Value::Float(f) => Frozen::Float(*f),
        Value::Str(s) => Frozen::Str(s.clone()),
        // Callables are opaque leaves: passed through, never entered.
        Value::Func(f) => Frozen::Func(f.clone()),
        Value::Seq(cell) => {
            let id = Rc::as_ptr(cell) as usize;
            if let Some(already) = visited.get(&id) {
                trace!(node = id, "reusing frozen wrapper for shared sequence");
                return already.clone();
            }

            let seq = Rc::new(FrozenSeq {
                items: RefCell::new(Vec::new()),
            });
            // Registered before recursing so cycles resolve to this wrapper.
            visited.insert(id, Frozen::Seq(seq.clone()));

            for item in cell.borrow().iter() {
                let frozen = freeze_node(item, visited);
                seq.items.borrow_mut().push(frozen);
            }
            Frozen::Seq(seq)
        }
        Value::Map(cell) => {
            let id = Rc::as_ptr(cell) as usize;
            if let Some(already) = visited.get(&id) {
                trace!(node = id, "reusing frozen wrapper for shared mapping");
                return already.clone();
            }

            let map = Rc::new(FrozenMap {
                entries: RefCell::new(BTreeMap::new()),
            });
            visited.insert(id, Frozen::Map(map.clone()));

            for (key, item) in cell.borrow().iter() {
                let frozen = freeze_node(item, visited);
                map.entries.borrow_mut().insert(key.clone(), frozen);
            }
            Frozen::Map(map)
        }
    }
}

/// Structural equality between a frozen view and a value graph.
///
/// Comparing cyclic graphs is unsupported and does not terminate.
impl PartialEq<Value> for Frozen {
    fn eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Frozen::Null, Value::Null) => true,
            (Frozen::Bool(a), Value::Bool(b)) => a == b,
            (Frozen::Int(a), Value::Int(b)) => a == b,
            (Frozen::Float(a), Value::Float(b)) => a == b,
            (Frozen::Str(a), Value::Str(b)) => a == b,
            (Frozen::Func(a), Value::Func(b)) => Rc::ptr_eq(a, b),
            (Frozen::Seq(a), Value::Seq(b)) => {
                let items = a.items.borrow();
                let source = b.borrow();
                items.len() == source.len()
                    && items.iter().zip(source.iter()).all(|(f, v)| f == v)
            }
            (Frozen::Map(a), Value::Map(b)) => {
                let entries = a.entries.borrow();
                let source = b.borrow();
                entries.len() == source.len()
                    && entries
                        .iter()
                        .zip(source.iter())
                        .all(|((fk, fv), (vk, vv))| fk == vk && fv == vv)
            }
            _ => false,
        }
    }
}

impl PartialEq for Frozen {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Frozen::Null, Frozen::Null) => true,
            (Frozen::Bool(a), Frozen::Bool(b)) => a == b,
            (Frozen::Int(a), Frozen::Int(b)) => a == b,
            (Frozen::Float(a), Frozen::Float(b)) => a == b,
            (Frozen::Str(a), Frozen::Str(b)) => a == b,
            (Frozen::Func(a), Frozen::Func(b)) => Rc::ptr_eq(a, b),
            (Frozen::Seq(a), Frozen::Seq(b)) => {
                Rc::ptr_eq(a, b) || *a.items.borrow() == *b.items.borrow()
            }
            (Frozen::Map(a), Frozen::Map(b)) => {
                Rc::ptr_eq(a, b) || *a.entries.borrow() == *b.entries.borrow()
            }
            _ => false,
        }
    }
}

// Depth-limited like Value's Debug, so frozen cycles render as `Seq(..)` /
// `Map(..)` instead of recursing without bound.
impl std::fmt::Debug for Frozen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fmt_frozen(self, f, 0)
    }
}

fn fmt_frozen(node: &Frozen, f: &mut std::fmt::Formatter<'_>, depth: usize) -> std::fmt::Result {
    match node {
        Frozen::Null => write!(f, "Null"),
        Frozen::Bool(b) => write!(f, "Bool({b})"),
        Frozen::Int(i) => write!(f, "Int({i})"),
        Frozen::Float(x) => write!(f, "Float({x})"),
        Frozen::Str(s) => write!(f, "Str({s:?})"),
        Frozen::Seq(seq) => {
            if depth >= crate::value::MAX_DEBUG_DEPTH {
                return write!(f, "Seq(..)");
            }
            match seq.items.try_borrow() {
                Ok(items) => {
                    write!(f, "Seq([")?;
                    for (i, item) in items.iter().enumerate() {
                        if i > 0 {
                            write!(f, ", ")?;
                        }
                        fmt_frozen(item, f, depth + 1)?;
                    }
                    write!(f, "])")
                }
                Err(_) => write!(f, "Seq(<borrowed>)"),
            }
        }
        Frozen::Map(map) => {
            if depth >= crate::value::MAX_DEBUG_DEPTH {
                return write!(f, "Map(..)");
            }
            match map.entries.try_borrow() {
                Ok(entries) => {
                    write!(f, "Map({{")?;
                    for (i, (key, item)) in entries.iter().enumerate() {
                        if i > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{key:?}: ")?;
                        fmt_frozen(item, f, depth + 1)?;
                    }
                    write!(f, "}})")
                }
                Err(_) => write!(f, "Map(<borrowed>)"),
            }
        }
        Frozen::Func(_) => write!(f, "Func(<native>)"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_graph() -> Value {
        Value::map_from([
            (Key::from("name"), Value::from("root")),
            (
                Key::from("children"),
                Value::seq(vec![Value::from(1i64), Value::from(2i64)]),
            ),
        ])
    }

    #[test]
    fn frozen_graph_is_structurally_equal_to_source() {
        let graph = sample_graph();
        let frozen = deep_freeze(&graph);
        assert_eq!(frozen, graph);
    }

    #[test]
    fn primitives_pass_through_unchanged() {
        assert_eq!(deep_freeze(&Value::Null), Frozen::Null);
        assert_eq!(deep_freeze(&Value::from(true)), Frozen::Bool(true));
        assert_eq!(deep_freeze(&Value::from("x")), Frozen::Str("x".to_string()));
    }

    #[test]
    fn callables_pass_through_by_identity() {
        let func = Value::func(|args| args.first().cloned().unwrap_or(Value::Null));
        let frozen = deep_freeze(&func);
        assert_eq!(frozen, func);

        // Still callable through the frozen handle.
        let Frozen::Func(f) = frozen else {
            unreachable!()
        };
        assert_eq!(f(&[Value::from(5i64)]), Value::from(5i64));
    }

    #[test]
    fn mutation_is_rejected_on_every_node_type() {
        let graph = sample_graph();
        let frozen = deep_freeze(&graph);

        let map = frozen.as_map().unwrap();
        assert_eq!(
            map.insert(Key::from("name"), Frozen::Null),
            Err(MutationRejected::map())
        );
        assert_eq!(map.remove(&Key::from("name")), Err(MutationRejected::map()));
        assert_eq!(map.clear(), Err(MutationRejected::map()));

        let children = map.get(&Key::from("children")).unwrap();
        let seq = children.as_seq().unwrap().clone();
        assert_eq!(seq.push(Frozen::Int(3)), Err(MutationRejected::seq()));
        assert_eq!(seq.set(0, Frozen::Int(9)), Err(MutationRejected::seq()));
        assert_eq!(seq.clear(), Err(MutationRejected::seq()));

        // Nothing changed underneath.
        assert_eq!(frozen, graph);
        assert_eq!(seq.len(), 2);
    }

    #[test]
    fn source_graph_is_not_mutated_by_freezing() {
        let graph = sample_graph();
        let frozen = deep_freeze(&graph);

        // The source stays writable through its own handles.
        graph
            .as_map()
            .unwrap()
            .borrow_mut()
            .insert(Key::from("extra"), Value::from(9i64));

        assert_eq!(graph.as_map().unwrap().borrow().len(), 3);
        // The frozen view is a snapshot taken at wrap time.
        assert_eq!(frozen.as_map().unwrap().len(), 2);
    }

    #[test]
    fn cyclic_graph_terminates_and_preserves_identity() {
        // a -> b -> a
        let a = Value::map(BTreeMap::new());
        let b = Value::map_from([(Key::from("a"), a.clone())]);
        a.as_map()
            .unwrap()
            .borrow_mut()
            .insert(Key::from("b"), b.clone());

        let frozen_a = deep_freeze(&a);

        let frozen_b = frozen_a.as_map().unwrap().get(&Key::from("b")).unwrap();
        let back = frozen_b.as_map().unwrap().get(&Key::from("a")).unwrap();

        assert!(back.ptr_eq(&frozen_a));
    }

    #[test]
    fn shared_substructure_freezes_to_one_wrapper() {
        let shared = Value::seq(vec![Value::from(1i64)]);
        let graph = Value::seq(vec![shared.clone(), shared]);

        let frozen = deep_freeze(&graph);
        let seq = frozen.as_seq().unwrap();

        assert!(seq.get(0).unwrap().ptr_eq(&seq.get(1).unwrap()));
    }

    #[test]
    fn self_referential_sequence_terminates() {
        let seq = Value::seq(vec![Value::from(0i64)]);
        seq.as_seq().unwrap().borrow_mut().push(seq.clone());

        let frozen = deep_freeze(&seq);
        let inner = frozen.as_seq().unwrap().get(1).unwrap();
        assert!(inner.ptr_eq(&frozen));
    }

    #[test]
    fn debug_output_terminates_on_frozen_cycles() {
        let a = Value::map(BTreeMap::new());
        let b = Value::map_from([(Key::from("a"), a.clone())]);
        a.as_map()
            .unwrap()
            .borrow_mut()
            .insert(Key::from("b"), b);

        let frozen = deep_freeze(&a);
        let rendered = format!("{frozen:?}");
        assert!(rendered.starts_with("Map({"));
        assert!(rendered.contains("Map(..)"));
    }

    #[test]
    fn separate_freezes_do_not_share_wrappers() {
        let graph = sample_graph();
        let first = deep_freeze(&graph);
        let second = deep_freeze(&graph);

        assert_eq!(first, second);
        assert!(!first.ptr_eq(&second));
    }
}
