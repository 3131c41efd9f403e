//! Dynamic value model
//!
//! Actual and expected operands are represented as `Value` trees. Container
//! variants (`List`, `Map`, `Record`, `Custom`) are backed by shared handles:
//! cloning a handle shares the underlying storage, which gives every container
//! a stable identity (the allocation address) and makes self-referential
//! structures constructible. The comparer chain keys its cycle guard on that
//! identity.

use crate::compare::EqualityComparer;
use crate::error::ToleranceError;
use crate::state::ComparisonState;
use crate::tolerance::Tolerance;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, RwLock, RwLockReadGuard};
use std::time::Duration;

// ============================================================================
// CONTAINER HANDLES
// ============================================================================

/// Read a lock, recovering the guard if a writer panicked mid-update.
fn read_lock<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Shared, ordered collection of values.
///
/// Clones share storage, so `list.push(Value::List(list.clone()))` builds a
/// list that contains itself.
#[derive(Debug, Clone, Default)]
pub struct ListHandle(Arc<RwLock<Vec<Value>>>);

impl ListHandle {
    pub fn new(items: Vec<Value>) -> Self {
        Self(Arc::new(RwLock::new(items)))
    }

    pub fn push(&self, item: Value) {
        self.0
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(item);
    }

    pub fn len(&self) -> usize {
        read_lock(&self.0).len()
    }

    pub fn is_empty(&self) -> bool {
        read_lock(&self.0).is_empty()
    }

    /// Shallow copy of the current items. Element handles still share storage.
    pub fn snapshot(&self) -> Vec<Value> {
        read_lock(&self.0).clone()
    }

    pub(crate) fn identity(&self) -> usize {
        Arc::as_ptr(&self.0) as *const () as usize
    }
}

/// Shared dictionary with string keys.
#[derive(Debug, Clone, Default)]
pub struct MapHandle(Arc<RwLock<BTreeMap<String, Value>>>);

impl MapHandle {
    pub fn new(entries: BTreeMap<String, Value>) -> Self {
        Self(Arc::new(RwLock::new(entries)))
    }

    pub fn insert(&self, key: impl Into<String>, value: Value) {
        self.0
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        read_lock(&self.0).get(key).cloned()
    }

    pub fn len(&self) -> usize {
        read_lock(&self.0).len()
    }

    pub fn is_empty(&self) -> bool {
        read_lock(&self.0).is_empty()
    }

    pub fn snapshot(&self) -> BTreeMap<String, Value> {
        read_lock(&self.0).clone()
    }

    pub(crate) fn identity(&self) -> usize {
        Arc::as_ptr(&self.0) as *const () as usize
    }
}

/// Shared record: an object with named fields.
///
/// Structurally identical to `MapHandle` but compared by the fallback
/// member-by-member comparer rather than the dictionary comparer, mirroring
/// the object/dictionary distinction in failure messages.
#[derive(Debug, Clone, Default)]
pub struct RecordHandle(Arc<RwLock<BTreeMap<String, Value>>>);

impl RecordHandle {
    pub fn new(fields: BTreeMap<String, Value>) -> Self {
        Self(Arc::new(RwLock::new(fields)))
    }

    pub fn set(&self, field: impl Into<String>, value: Value) {
        self.0
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(field.into(), value);
    }

    pub fn get(&self, field: &str) -> Option<Value> {
        read_lock(&self.0).get(field).cloned()
    }

    pub fn snapshot(&self) -> BTreeMap<String, Value> {
        read_lock(&self.0).clone()
    }

    pub(crate) fn identity(&self) -> usize {
        Arc::as_ptr(&self.0) as *const () as usize
    }
}

// ============================================================================
// CUSTOM STRUCTURAL EQUALITY
// ============================================================================

/// Externally-defined structural equality.
///
/// The comparer chain tries `a.structural_eq(b)` and `b.structural_eq(a)` and
/// accepts either direction, since the two implementations are not guaranteed
/// to be symmetry-aware. Implementations may recurse back into the supplied
/// comparer for member comparisons.
pub trait Equatable: fmt::Debug + Send + Sync {
    /// Decide structural equality against `other`.
    fn structural_eq(
        &self,
        other: &Value,
        comparer: &EqualityComparer,
        tolerance: &Tolerance,
        state: &ComparisonState,
    ) -> Result<bool, ToleranceError>;

    /// Display form used in failure messages.
    fn describe(&self) -> String;
}

// ============================================================================
// VALUE
// ============================================================================

/// Discriminator for `Value` variants, used in error messages and the
/// kind-mismatch comparer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Null,
    Bool,
    Int,
    Float,
    Str,
    Duration,
    Tuple,
    List,
    Map,
    Record,
    Custom,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Null => "null",
            ValueKind::Bool => "bool",
            ValueKind::Int => "int",
            ValueKind::Float => "float",
            ValueKind::Str => "string",
            ValueKind::Duration => "duration",
            ValueKind::Tuple => "tuple",
            ValueKind::List => "list",
            ValueKind::Map => "map",
            ValueKind::Record => "record",
            ValueKind::Custom => "custom",
        };
        write!(f, "{}", name)
    }
}

/// A dynamically-typed operand for comparison and constraint evaluation.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Duration(Duration),
    Tuple(Vec<Value>),
    List(ListHandle),
    Map(MapHandle),
    Record(RecordHandle),
    Custom(Arc<dyn Equatable>),
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Bool,
            Value::Int(_) => ValueKind::Int,
            Value::Float(_) => ValueKind::Float,
            Value::Str(_) => ValueKind::Str,
            Value::Duration(_) => ValueKind::Duration,
            Value::Tuple(_) => ValueKind::Tuple,
            Value::List(_) => ValueKind::List,
            Value::Map(_) => ValueKind::Map,
            Value::Record(_) => ValueKind::Record,
            Value::Custom(_) => ValueKind::Custom,
        }
    }

    /// Allocation identity for container variants; `None` for scalars.
    /// Scalars cannot participate in reference cycles.
    pub fn identity(&self) -> Option<usize> {
        match self {
            Value::List(handle) => Some(handle.identity()),
            Value::Map(handle) => Some(handle.identity()),
            Value::Record(handle) => Some(handle.identity()),
            Value::Custom(inner) => Some(Arc::as_ptr(inner) as *const () as usize),
            _ => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Value::Int(_) | Value::Float(_))
    }

    /// Numeric view. `Some` only for `Int` and `Float`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(n) => Some(*n as f64),
            Value::Float(n) => Some(*n),
            _ => None,
        }
    }

    /// Build a list value from anything convertible.
    pub fn list<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        Value::List(ListHandle::new(items.into_iter().map(Into::into).collect()))
    }

    /// Build a map value from key/value pairs.
    pub fn map<I, K, T>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, T)>,
        K: Into<String>,
        T: Into<Value>,
    {
        Value::Map(MapHandle::new(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        ))
    }

    /// Build a record value from field/value pairs.
    pub fn record<I, K, T>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, T)>,
        K: Into<String>,
        T: Into<Value>,
    {
        Value::Record(RecordHandle::new(
            fields
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        ))
    }
}

// ============================================================================
// CONVERSIONS
// ============================================================================

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(v as f64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<Duration> for Value {
    fn from(v: Duration) -> Self {
        Value::Duration(v)
    }
}

impl From<ListHandle> for Value {
    fn from(v: ListHandle) -> Self {
        Value::List(v)
    }
}

impl From<MapHandle> for Value {
    fn from(v: MapHandle) -> Self {
        Value::Map(v)
    }
}

impl From<RecordHandle> for Value {
    fn from(v: RecordHandle) -> Self {
        Value::Record(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(inner) => inner.into(),
            None => Value::Null,
        }
    }
}

impl<A: Into<Value>, B: Into<Value>> From<(A, B)> for Value {
    fn from((a, b): (A, B)) -> Self {
        Value::Tuple(vec![a.into(), b.into()])
    }
}

impl<A: Into<Value>, B: Into<Value>, C: Into<Value>> From<(A, B, C)> for Value {
    fn from((a, b, c): (A, B, C)) -> Self {
        Value::Tuple(vec![a.into(), b.into(), c.into()])
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::list(items)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_handles_share_storage() {
        let list = ListHandle::new(vec![Value::Int(1)]);
        let alias = list.clone();
        alias.push(Value::Int(2));
        assert_eq!(list.len(), 2);
        assert_eq!(list.identity(), alias.identity());
    }

    #[test]
    fn test_distinct_lists_have_distinct_identity() {
        let a = ListHandle::new(vec![]);
        let b = ListHandle::new(vec![]);
        assert_ne!(a.identity(), b.identity());
    }

    #[test]
    fn test_scalars_have_no_identity() {
        assert!(Value::Int(1).identity().is_none());
        assert!(Value::Str("x".into()).identity().is_none());
        assert!(Value::Null.identity().is_none());
    }

    #[test]
    fn test_self_referential_list_is_constructible() {
        let list = ListHandle::new(vec![]);
        list.push(Value::List(list.clone()));
        assert_eq!(list.len(), 1);
        match &list.snapshot()[0] {
            Value::List(inner) => assert_eq!(inner.identity(), list.identity()),
            other => panic!("expected list, got {:?}", other.kind()),
        }
    }

    #[test]
    fn test_tuple_conversion() {
        let v: Value = (1, "a").into();
        match v {
            Value::Tuple(slots) => {
                assert_eq!(slots.len(), 2);
                assert!(matches!(slots[0], Value::Int(1)));
                assert!(matches!(&slots[1], Value::Str(s) if s == "a"));
            }
            other => panic!("expected tuple, got {:?}", other.kind()),
        }
    }

    #[test]
    fn test_numeric_view() {
        assert_eq!(Value::Int(3).as_f64(), Some(3.0));
        assert_eq!(Value::Float(1.5).as_f64(), Some(1.5));
        assert_eq!(Value::Str("3".into()).as_f64(), None);
    }

    #[test]
    fn test_option_conversion() {
        let some: Value = Some(5i64).into();
        let none: Value = Option::<i64>::None.into();
        assert!(matches!(some, Value::Int(5)));
        assert!(matches!(none, Value::Null));
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(Value::Int(1).kind().to_string(), "int");
        assert_eq!(Value::list([1, 2]).kind().to_string(), "list");
    }
}
