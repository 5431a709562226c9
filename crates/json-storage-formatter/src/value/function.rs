use std::fmt;
use std::sync::Arc;

use crate::error::FormatError;

use super::Value;

/// A native callable body.
pub type NativeFn = Arc<dyn Fn(&[Value]) -> Value + Send + Sync>;

struct FunctionInner {
    source: Option<String>,
    body: Option<NativeFn>,
}

/// A function value.
///
/// A function carries up to two things: its source text, which is what gets
/// stored, and a native body, which is what runs. Either may be missing:
/// - without source text the function is *unreflectable* and is stored as an
///   error envelope;
/// - without a body the function is *inert*: it keeps its source text but
///   calling it fails with [`FormatError::NotCallable`]. Decoding produces
///   inert functions unless a compiler is supplied.
#[derive(Clone)]
pub struct Function {
    inner: Arc<FunctionInner>,
}

impl Function {
    /// A function with both source text and a native body.
    pub fn new<F>(source: impl Into<String>, body: F) -> Self
    where
        F: Fn(&[Value]) -> Value + Send + Sync + 'static,
    {
        Self::from_parts(Some(source.into()), Some(Arc::new(body)))
    }

    /// A native function whose source cannot be reflected.
    pub fn native<F>(body: F) -> Self
    where
        F: Fn(&[Value]) -> Value + Send + Sync + 'static,
    {
        Self::from_parts(None, Some(Arc::new(body)))
    }

    /// A function known only by its source text.
    pub fn inert(source: impl Into<String>) -> Self {
        Self::from_parts(Some(source.into()), None)
    }

    pub fn from_parts(source: Option<String>, body: Option<NativeFn>) -> Self {
        Self {
            inner: Arc::new(FunctionInner { source, body }),
        }
    }

    pub fn source(&self) -> Option<&str> {
        self.inner.source.as_deref()
    }

    pub fn body(&self) -> Option<&NativeFn> {
        self.inner.body.as_ref()
    }

    pub fn is_inert(&self) -> bool {
        self.inner.body.is_none()
    }

    pub fn call(&self, args: &[Value]) -> Result<Value, FormatError> {
        match &self.inner.body {
            Some(body) => Ok(body(args)),
            None => Err(FormatError::NotCallable),
        }
    }

    /// A new function instance that delegates to the same body.
    pub fn delegate(&self) -> Self {
        Self::from_parts(self.inner.source.clone(), self.inner.body.clone())
    }

    pub fn ptr_eq(a: &Function, b: &Function) -> bool {
        Arc::ptr_eq(&a.inner, &b.inner)
    }
}

/// Two functions are equal when they have the same source text and run the
/// same body (or both have none).
impl PartialEq for Function {
    fn eq(&self, other: &Self) -> bool {
        if Function::ptr_eq(self, other) {
            return true;
        }
        let same_body = match (&self.inner.body, &other.inner.body) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        };
        same_body && self.inner.source == other.inner.source
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("source", &self.inner.source)
            .field("inert", &self.is_inert())
            .finish()
    }
}
