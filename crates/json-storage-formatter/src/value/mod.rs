//! In-memory value model.
//!
//! `Value` covers everything the codec knows how to store: the JSON
//! primitives plus the absent marker, symbols, dates, regular expressions,
//! errors, functions, and the four container shapes (arrays, plain
//! structures, maps and sets).
//!
//! Containers are reference counted. `Clone` on a `Value` is therefore cheap
//! and *shares* nested containers; use [`crate::clone::clone`] to get a copy
//! backed by fresh storage at every level. Mutation goes through the
//! `*_mut` accessors, which copy on write.

mod containers;
mod function;
mod pattern;

use std::sync::Arc;

use chrono::{DateTime, SubsecRound, Utc};

pub use containers::{MapValue, Object, SetValue};
pub use function::{Function, NativeFn};
pub use pattern::Pattern;

/// An error object. Only the message survives a store round trip.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ErrorValue {
    pub message: String,
}

impl ErrorValue {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum Value {
    /// The absent value, distinct from `Null`.
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    /// A symbol, identified by its description.
    Symbol(String),
    /// An instant with millisecond precision, the precision dates are stored
    /// with. Build it with [`Value::date`] or `From<DateTime<Utc>>`, which
    /// drop anything finer.
    Date(DateTime<Utc>),
    Regex(Pattern),
    Error(ErrorValue),
    Function(Function),
    Array(Arc<Vec<Value>>),
    Object(Arc<Object>),
    Map(Arc<MapValue>),
    Set(Arc<SetValue>),
}

impl Value {
    pub fn array(items: impl IntoIterator<Item = Value>) -> Self {
        Value::Array(Arc::new(items.into_iter().collect()))
    }

    pub fn object<K: Into<String>>(entries: impl IntoIterator<Item = (K, Value)>) -> Self {
        Value::Object(Arc::new(
            entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        ))
    }

    pub fn map(entries: impl IntoIterator<Item = (Value, Value)>) -> Self {
        Value::Map(Arc::new(entries.into_iter().collect()))
    }

    pub fn set(members: impl IntoIterator<Item = Value>) -> Self {
        Value::Set(Arc::new(members.into_iter().collect()))
    }

    /// A date truncated to whole milliseconds.
    pub fn date(instant: DateTime<Utc>) -> Self {
        Value::Date(instant.trunc_subsecs(3))
    }

    pub fn regex(source: impl Into<String>, flags: impl Into<String>) -> Self {
        Value::Regex(Pattern::new(source, flags))
    }

    pub fn error(message: impl Into<String>) -> Self {
        Value::Error(ErrorValue::new(message))
    }

    pub fn symbol(description: impl Into<String>) -> Self {
        Value::Symbol(description.into())
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<&DateTime<Utc>> {
        match self {
            Value::Date(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_pattern(&self) -> Option<&Pattern> {
        match self {
            Value::Regex(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_error(&self) -> Option<&ErrorValue> {
        match self {
            Value::Error(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&Function> {
        match self {
            Value::Function(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items.as_slice()),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(obj) => Some(&**obj),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&MapValue> {
        match self {
            Value::Map(map) => Some(&**map),
            _ => None,
        }
    }

    pub fn as_set(&self) -> Option<&SetValue> {
        match self {
            Value::Set(set) => Some(&**set),
            _ => None,
        }
    }

    pub fn as_array_mut(&mut self) -> Option<&mut Vec<Value>> {
        match self {
            Value::Array(items) => Some(Arc::make_mut(items)),
            _ => None,
        }
    }

    pub fn as_object_mut(&mut self) -> Option<&mut Object> {
        match self {
            Value::Object(obj) => Some(Arc::make_mut(obj)),
            _ => None,
        }
    }

    pub fn as_map_mut(&mut self) -> Option<&mut MapValue> {
        match self {
            Value::Map(map) => Some(Arc::make_mut(map)),
            _ => None,
        }
    }

    pub fn as_set_mut(&mut self) -> Option<&mut SetValue> {
        match self {
            Value::Set(set) => Some(Arc::make_mut(set)),
            _ => None,
        }
    }

    /// Looks up `key` when `self` is a plain structure.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_object().and_then(|obj| obj.get(key))
    }

    /// True when both values are the *same* container (or function)
    /// instance rather than merely equal ones.
    pub fn same_container(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Array(a), Value::Array(b)) => Arc::ptr_eq(a, b),
            (Value::Object(a), Value::Object(b)) => Arc::ptr_eq(a, b),
            (Value::Map(a), Value::Map(b)) => Arc::ptr_eq(a, b),
            (Value::Set(a), Value::Set(b)) => Arc::ptr_eq(a, b),
            (Value::Function(a), Value::Function(b)) => Function::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Key equality used by maps and sets.
    ///
    /// Scalars compare by value with `NaN` equal to itself and `-0` equal to
    /// `+0`. Containers and functions compare by identity.
    pub fn same_value_zero(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => a == b || (a.is_nan() && b.is_nan()),
            (Value::Array(_), _)
            | (Value::Object(_), _)
            | (Value::Map(_), _)
            | (Value::Set(_), _)
            | (Value::Function(_), _) => self.same_container(other),
            _ => self == other,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(d: DateTime<Utc>) -> Self {
        Value::date(d)
    }
}

impl From<Pattern> for Value {
    fn from(p: Pattern) -> Self {
        Value::Regex(p)
    }
}

impl From<ErrorValue> for Value {
    fn from(e: ErrorValue) -> Self {
        Value::Error(e)
    }
}

impl From<Function> for Value {
    fn from(f: Function) -> Self {
        Value::Function(f)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(Arc::new(items))
    }
}

impl From<Object> for Value {
    fn from(obj: Object) -> Self {
        Value::Object(Arc::new(obj))
    }
}

impl From<MapValue> for Value {
    fn from(map: MapValue) -> Self {
        Value::Map(Arc::new(map))
    }
}

impl From<SetValue> for Value {
    fn from(set: SetValue) -> Self {
        Value::Set(Arc::new(set))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Undefined, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rust_clone_shares_containers() {
        let inner = Value::array([Value::from(1)]);
        let outer = Value::object([("inner", inner)]);
        let copy = outer.clone();
        assert!(copy.same_container(&outer));
        assert!(copy
            .get("inner")
            .unwrap()
            .same_container(outer.get("inner").unwrap()));
    }

    #[test]
    fn mutation_copies_on_write() {
        let original = Value::array([Value::from(1), Value::from(2)]);
        let mut edited = original.clone();
        edited.as_array_mut().unwrap().push(Value::from(3));
        assert_eq!(original.as_array().unwrap().len(), 2);
        assert_eq!(edited.as_array().unwrap().len(), 3);
        assert!(!edited.same_container(&original));
    }

    #[test]
    fn same_value_zero_semantics() {
        assert!(Value::from(f64::NAN).same_value_zero(&Value::from(f64::NAN)));
        assert!(Value::from(0.0).same_value_zero(&Value::from(-0.0)));
        assert!(Value::from("a").same_value_zero(&Value::from("a")));
        let a = Value::array([]);
        let b = Value::array([]);
        assert_eq!(a, b);
        assert!(!a.same_value_zero(&b));
        assert!(a.same_value_zero(&a.clone()));
    }

    #[test]
    fn dates_keep_whole_milliseconds() {
        use chrono::TimeZone;

        let fine = Utc.timestamp_nanos(1_500_000);
        let expected = Utc.timestamp_millis_opt(1).unwrap();
        assert_eq!(Value::from(fine), Value::Date(expected));
        assert_eq!(Value::date(fine).as_date(), Some(&expected));
        let before_epoch = Utc.timestamp_nanos(-1_500_000);
        assert_eq!(
            Value::date(before_epoch),
            Value::Date(Utc.timestamp_millis_opt(-2).unwrap())
        );
    }

    #[test]
    fn option_maps_none_to_undefined() {
        assert_eq!(Value::from(None::<bool>), Value::Undefined);
        assert_eq!(Value::from(Some("x")), Value::from("x"));
    }
}
