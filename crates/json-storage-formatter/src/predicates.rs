//! Type predicates and the one-shot node classifier the codec dispatches on.

use crate::value::Value;

/// `Null` or `Undefined`.
pub fn is_nil(value: &Value) -> bool {
    matches!(value, Value::Null | Value::Undefined)
}

pub fn is_number(value: &Value) -> bool {
    matches!(value, Value::Number(_))
}

pub fn is_boolean(value: &Value) -> bool {
    matches!(value, Value::Bool(_))
}

pub fn is_string(value: &Value) -> bool {
    matches!(value, Value::String(_))
}

pub fn is_date(value: &Value) -> bool {
    matches!(value, Value::Date(_))
}

pub fn is_regex(value: &Value) -> bool {
    matches!(value, Value::Regex(_))
}

pub fn is_function(value: &Value) -> bool {
    matches!(value, Value::Function(_))
}

/// Nil, number, boolean, string or symbol.
pub fn is_primitive(value: &Value) -> bool {
    is_nil(value)
        || is_number(value)
        || is_boolean(value)
        || is_string(value)
        || matches!(value, Value::Symbol(_))
}

/// The shape of a node as far as clone, encode and decode are concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Primitive,
    Sequence,
    MapLike,
    SetLike,
    Date,
    Regex,
    Callable,
    ErrorValue,
    PlainStructure,
}

impl Kind {
    pub fn of(value: &Value) -> Kind {
        match value {
            Value::Undefined
            | Value::Null
            | Value::Bool(_)
            | Value::Number(_)
            | Value::String(_)
            | Value::Symbol(_) => Kind::Primitive,
            Value::Date(_) => Kind::Date,
            Value::Regex(_) => Kind::Regex,
            Value::Error(_) => Kind::ErrorValue,
            Value::Function(_) => Kind::Callable,
            Value::Array(_) => Kind::Sequence,
            Value::Object(_) => Kind::PlainStructure,
            Value::Map(_) => Kind::MapLike,
            Value::Set(_) => Kind::SetLike,
        }
    }

    /// Kinds backed by shared storage.
    pub fn is_container(self) -> bool {
        matches!(
            self,
            Kind::Sequence | Kind::MapLike | Kind::SetLike | Kind::PlainStructure
        )
    }
}
