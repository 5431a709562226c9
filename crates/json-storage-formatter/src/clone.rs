//! Deep and shallow cloning of [`Value`] trees.
//!
//! Unlike `Clone::clone`, which shares nested containers, [`clone`] backs
//! every container it reaches with freshly allocated storage.

use std::convert::Infallible;
use std::sync::Arc;

use crate::error::FormatError;
use crate::predicates::{is_date, is_primitive};
use crate::value::{MapValue, Object, SetValue, Value};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CloneOptions {
    /// Copy only the outermost container; nested containers keep their
    /// identity and stay shared with the input.
    pub shallow: bool,
}

impl CloneOptions {
    pub fn shallow() -> Self {
        Self { shallow: true }
    }
}

/// Deep clone of `value`.
///
/// # Examples
///
/// ```
/// use json_storage_formatter::{clone, Value};
///
/// let original = Value::object([("list", Value::array([Value::from(1)]))]);
/// let copy = clone(&original);
///
/// assert_eq!(copy, original);
/// assert!(!copy.same_container(&original));
/// assert!(!copy.get("list").unwrap().same_container(original.get("list").unwrap()));
/// ```
pub fn clone(value: &Value) -> Value {
    clone_with(value, CloneOptions::default())
}

pub fn clone_with(value: &Value, options: CloneOptions) -> Value {
    let cloner = Cloner {
        shallow: options.shallow,
        guard: Unbounded,
    };
    match cloner.walk(value, 0) {
        Ok(copy) => copy,
        Err(never) => match never {},
    }
}

/// Deep clone that refuses to descend past `max_depth` nested containers.
pub(crate) fn clone_bounded(value: &Value, max_depth: usize) -> Result<Value, FormatError> {
    Cloner {
        shallow: false,
        guard: Bounded(max_depth),
    }
    .walk(value, 0)
}

/// Decides whether the walk may enter one more container level.
trait DepthGuard {
    type Error;

    fn descend(&self, depth: usize) -> Result<usize, Self::Error>;
}

struct Unbounded;

impl DepthGuard for Unbounded {
    type Error = Infallible;

    fn descend(&self, depth: usize) -> Result<usize, Infallible> {
        Ok(depth + 1)
    }
}

struct Bounded(usize);

impl DepthGuard for Bounded {
    type Error = FormatError;

    fn descend(&self, depth: usize) -> Result<usize, FormatError> {
        let next = depth + 1;
        if next > self.0 {
            return Err(FormatError::DepthLimitExceeded { limit: self.0 });
        }
        Ok(next)
    }
}

struct Cloner<G> {
    shallow: bool,
    guard: G,
}

impl<G: DepthGuard> Cloner<G> {
    fn walk(&self, value: &Value, depth: usize) -> Result<Value, G::Error> {
        if is_primitive(value) || is_date(value) {
            return Ok(value.clone());
        }
        match value {
            Value::Array(items) => {
                let depth = self.descend(depth)?;
                let copy: Vec<Value> = if self.shallow {
                    items.iter().cloned().collect()
                } else {
                    items
                        .iter()
                        .map(|item| self.walk(item, depth))
                        .collect::<Result<_, _>>()?
                };
                Ok(Value::Array(Arc::new(copy)))
            }
            Value::Map(map) => {
                let depth = self.descend(depth)?;
                let mut copy = MapValue::with_capacity(map.len());
                for (key, val) in map.iter() {
                    if self.shallow {
                        copy.insert(key.clone(), val.clone());
                    } else {
                        copy.insert(self.walk(key, depth)?, self.walk(val, depth)?);
                    }
                }
                Ok(Value::Map(Arc::new(copy)))
            }
            Value::Set(set) => {
                let depth = self.descend(depth)?;
                let mut copy = SetValue::with_capacity(set.len());
                for member in set.iter() {
                    if self.shallow {
                        copy.insert(member.clone());
                    } else {
                        copy.insert(self.walk(member, depth)?);
                    }
                }
                Ok(Value::Set(Arc::new(copy)))
            }
            // Patterns are rebuilt from their source even when shallow.
            Value::Regex(pattern) => Ok(Value::Regex(pattern.clone())),
            Value::Function(f) if self.shallow => Ok(Value::Function(f.clone())),
            Value::Function(f) => Ok(Value::Function(f.delegate())),
            Value::Error(err) => Ok(Value::error(err.message.clone())),
            Value::Object(obj) => {
                let depth = self.descend(depth)?;
                let copy: Object = if self.shallow {
                    (**obj).clone()
                } else {
                    let mut copy = Object::with_capacity(obj.len());
                    for (key, val) in obj.iter() {
                        copy.insert(key.clone(), self.walk(val, depth)?);
                    }
                    copy
                };
                Ok(Value::Object(Arc::new(copy)))
            }
            _ => Ok(value.clone()),
        }
    }

    fn descend(&self, depth: usize) -> Result<usize, G::Error> {
        self.guard.descend(depth)
    }
}
