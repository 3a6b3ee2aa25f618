//! value
//!
//! Dynamic value graphs for the structural transforms and [`crate::freeze`].
//!
//! [`Value`] is a small dynamic model in the spirit of `serde_json::Value`,
//! with two additions the transforms need:
//!
//! - containers are shared (`Rc<RefCell<..>>`), so a graph can contain
//!   shared substructure and cycles;
//! - a [`Value::Func`] leaf holds an opaque callable that traversals pass
//!   through without entering.
//!
//! Mappings are ordered (`BTreeMap` keyed by [`Key`]) so every operation
//! over them is deterministic.
//!
//! # JSON interop
//!
//! Any `serde_json::Value` converts into a `Value` losslessly. The reverse
//! direction ([`Value::to_json`]) fails on callables and on cyclic graphs;
//! integer keys render as their decimal string, matching how dynamic
//! property keys stringify.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashSet};
use std::rc::Rc;

use thiserror::Error;

/// Errors from converting a [`Value`] graph to JSON.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValueError {
    /// The graph contains a callable leaf, which has no JSON form.
    #[error("graph contains an opaque callable with no JSON representation")]
    OpaqueCallable,

    /// The graph contains a reference cycle.
    #[error("graph contains a reference cycle")]
    CyclicGraph,
}

/// A mapping key: a string or an integer.
///
/// Finite floats coerce through [`Key::from_value`]: integral floats in
/// i64 range become [`Key::Int`], the rest become their canonical decimal
/// string. Nothing else is a key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Key {
    Int(i64),
    Str(String),
}

impl Key {
    /// Convert a value to a key, if it is of a key-permitted type.
    ///
    /// Returns `None` for null, booleans, non-finite floats, containers,
    /// and callables.
    pub fn from_value(value: &Value) -> Option<Key> {
        match value {
            Value::Str(s) => Some(Key::Str(s.clone())),
            Value::Int(i) => Some(Key::Int(*i)),
            Value::Float(f) if f.is_finite() => {
                // `i64::MAX as f64` rounds up to 2^63, which is not an
                // i64; the upper bound must be exclusive or 2^63 would
                // saturate onto i64::MAX and collide with a real int key.
                if f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64 {
                    Some(Key::Int(*f as i64))
                } else {
                    Some(Key::Str(f.to_string()))
                }
            }
            _ => None,
        }
    }
}

impl std::fmt::Display for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Key::Int(i) => write!(f, "{i}"),
            Key::Str(s) => write!(f, "{s}"),
        }
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Key::Str(s.to_string())
    }
}

impl From<String> for Key {
    fn from(s: String) -> Self {
        Key::Str(s)
    }
}

impl From<i64> for Key {
    fn from(i: i64) -> Self {
        Key::Int(i)
    }
}

/// An opaque callable embedded in a value graph.
pub type NativeFn = Rc<dyn Fn(&[Value]) -> Value>;

/// A node in a dynamic value graph.
#[derive(Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Seq(Rc<RefCell<Vec<Value>>>),
    Map(Rc<RefCell<BTreeMap<Key, Value>>>),
    Func(NativeFn),
}

impl Value {
    /// Build a sequence node.
    pub fn seq(items: Vec<Value>) -> Value {
        Value::Seq(Rc::new(RefCell::new(items)))
    }

    /// Build a mapping node from an ordered map.
    pub fn map(entries: BTreeMap<Key, Value>) -> Value {
        Value::Map(Rc::new(RefCell::new(entries)))
    }

    /// Build a mapping node from key/value pairs.
    ///
    /// Later pairs overwrite earlier pairs with the same key.
    pub fn map_from(entries: impl IntoIterator<Item = (Key, Value)>) -> Value {
        Value::map(entries.into_iter().collect())
    }

    /// Build a callable leaf.
    pub fn func(f: impl Fn(&[Value]) -> Value + 'static) -> Value {
        Value::Func(Rc::new(f))
    }

    /// The shared sequence cell, if this is a sequence node.
    pub fn as_seq(&self) -> Option<&Rc<RefCell<Vec<Value>>>> {
        match self {
            Value::Seq(cell) => Some(cell),
            _ => None,
        }
    }

    /// The shared mapping cell, if this is a mapping node.
    pub fn as_map(&self) -> Option<&Rc<RefCell<BTreeMap<Key, Value>>>> {
        match self {
            Value::Map(cell) => Some(cell),
            _ => None,
        }
    }

    /// Short name of this node's kind, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::Seq(_) => "sequence",
            Value::Map(_) => "mapping",
            Value::Func(_) => "callable",
        }
    }

    /// Convert this graph to JSON.
    ///
    /// Non-finite floats render as `null` (the usual stringification rule
    /// for dynamic data); integer keys render as decimal strings.
    ///
    /// # Errors
    ///
    /// - `ValueError::OpaqueCallable` if any reachable leaf is a callable.
    /// - `ValueError::CyclicGraph` if the graph contains a cycle. Shared
    ///   acyclic substructure is fine and simply duplicates in the output.
    pub fn to_json(&self) -> Result<serde_json::Value, ValueError> {
        let mut path = HashSet::new();
        self.to_json_inner(&mut path)
    }

    fn to_json_inner(&self, path: &mut HashSet<usize>) -> Result<serde_json::Value, ValueError> {
        match self {
            Value::Null => Ok(serde_json::Value::Null),
            Value::Bool(b) => Ok(serde_json::Value::Bool(*b)),
            Value::Int(i) => Ok(serde_json::Value::from(*i)),
            Value::Float(f) => Ok(serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null)),
            Value::Str(s) => Ok(serde_json::Value::String(s.clone())),
            Value::Func(_) => Err(ValueError::OpaqueCallable),
            Value::Seq(cell) => {
                let ptr = Rc::as_ptr(cell) as usize;
                if !path.insert(ptr) {
                    return Err(ValueError::CyclicGraph);
                }
                let items = cell.borrow();
                let mut out = Vec::with_capacity(items.len());
                for item in items.iter() {
                    out.push(item.to_json_inner(path)?);
                }
                drop(items);
                path.remove(&ptr);
                Ok(serde_json::Value::Array(out))
            }
            Value::Map(cell) => {
                let ptr = Rc::as_ptr(cell) as usize;
                if !path.insert(ptr) {
                    return Err(ValueError::CyclicGraph);
                }
                let entries = cell.borrow();
                let mut out = serde_json::Map::with_capacity(entries.len());
                for (key, value) in entries.iter() {
                    out.insert(key.to_string(), value.to_json_inner(path)?);
                }
                drop(entries);
                path.remove(&ptr);
                Ok(serde_json::Value::Object(out))
            }
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::Str(s),
            serde_json::Value::Array(items) => {
                Value::seq(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => {
                Value::map_from(map.into_iter().map(|(k, v)| (Key::Str(k), Value::from(v))))
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

/// Structural equality for data, pointer identity for callables.
///
/// Comparing cyclic graphs is unsupported and does not terminate.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Seq(a), Value::Seq(b)) => Rc::ptr_eq(a, b) || *a.borrow() == *b.borrow(),
            (Value::Map(a), Value::Map(b)) => Rc::ptr_eq(a, b) || *a.borrow() == *b.borrow(),
            (Value::Func(a), Value::Func(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// Debug output is depth-limited so cyclic graphs render as `Seq(..)` /
/// `Map(..)` past this depth instead of recursing without bound.
pub(crate) const MAX_DEBUG_DEPTH: usize = 8;

impl std::fmt::Debug for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fmt_node(self, f, 0)
    }
}

fn fmt_node(value: &Value, f: &mut std::fmt::Formatter<'_>, depth: usize) -> std::fmt::Result {
    match value {
        Value::Null => write!(f, "Null"),
        Value::Bool(b) => write!(f, "Bool({b})"),
        Value::Int(i) => write!(f, "Int({i})"),
        Value::Float(x) => write!(f, "Float({x})"),
        Value::Str(s) => write!(f, "Str({s:?})"),
        Value::Seq(cell) => {
            if depth >= MAX_DEBUG_DEPTH {
                return write!(f, "Seq(..)");
            }
            match cell.try_borrow() {
                Ok(items) => {
                    write!(f, "Seq([")?;
                    for (i, item) in items.iter().enumerate() {
                        if i > 0 {
                            write!(f, ", ")?;
                        }
                        fmt_node(item, f, depth + 1)?;
                    }
                    write!(f, "])")
                }
                Err(_) => write!(f, "Seq(<borrowed>)"),
            }
        }
        Value::Map(cell) => {
            if depth >= MAX_DEBUG_DEPTH {
                return write!(f, "Map(..)");
            }
            match cell.try_borrow() {
                Ok(entries) => {
                    write!(f, "Map({{")?;
                    for (i, (key, item)) in entries.iter().enumerate() {
                        if i > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{key:?}: ")?;
                        fmt_node(item, f, depth + 1)?;
                    }
                    write!(f, "}})")
                }
                Err(_) => write!(f, "Map(<borrowed>)"),
            }
        }
        Value::Func(_) => write!(f, "Func(<native>)"),
    }
}
