//! Key ordering for plain structures.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

/// Comparator for plain-structure keys.
pub type KeyComparator = Arc<dyn Fn(&str, &str) -> Ordering + Send + Sync>;

/// How plain-structure keys are ordered in the output.
#[derive(Clone, Default)]
pub enum SortKeys {
    /// Keep the order the keys were inserted in.
    #[default]
    Insertion,
    /// Byte-wise ascending order.
    Alphabetical,
    Custom(KeyComparator),
}

impl SortKeys {
    /// Orders keys with `compare`, keeping equal keys in insertion order.
    ///
    /// `compare` must be a total order; an inconsistent comparator may panic
    /// while sorting.
    pub fn custom<F>(compare: F) -> Self
    where
        F: Fn(&str, &str) -> Ordering + Send + Sync + 'static,
    {
        SortKeys::Custom(Arc::new(compare))
    }

    pub fn is_insertion(&self) -> bool {
        matches!(self, SortKeys::Insertion)
    }

    /// Returns `keys` in output order.
    pub fn order<'a, I>(&self, keys: I) -> Vec<&'a str>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut keys: Vec<&'a str> = keys.into_iter().collect();
        match self {
            SortKeys::Insertion => {}
            SortKeys::Alphabetical => keys.sort_unstable(),
            SortKeys::Custom(compare) => keys.sort_by(|a, b| compare(*a, *b)),
        }
        keys
    }
}

impl From<bool> for SortKeys {
    fn from(sort: bool) -> Self {
        if sort {
            SortKeys::Alphabetical
        } else {
            SortKeys::Insertion
        }
    }
}

impl fmt::Debug for SortKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortKeys::Insertion => f.write_str("Insertion"),
            SortKeys::Alphabetical => f.write_str("Alphabetical"),
            SortKeys::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}
