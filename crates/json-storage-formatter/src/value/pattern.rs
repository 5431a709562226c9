use std::fmt;

use regex::{Regex, RegexBuilder};

use crate::error::FormatError;

/// A regular expression held as source text plus flags, e.g. `/ab+c/gi` is
/// `Pattern { source: "ab+c", flags: "gi" }`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Pattern {
    pub source: String,
    pub flags: String,
}

impl Pattern {
    pub fn new(source: impl Into<String>, flags: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            flags: flags.into(),
        }
    }

    pub fn has_flag(&self, flag: char) -> bool {
        self.flags.contains(flag)
    }

    /// Compiles the pattern with the `regex` crate.
    ///
    /// `i`, `m`, `s`, `x` and `u` map onto the matching builder switches.
    /// `g`, `y` and `d` only affect stateful matching and are ignored.
    pub fn compile(&self) -> Result<Regex, FormatError> {
        let mut builder = RegexBuilder::new(&self.source);
        builder
            .case_insensitive(self.has_flag('i'))
            .multi_line(self.has_flag('m'))
            .dot_matches_new_line(self.has_flag('s'))
            .ignore_whitespace(self.has_flag('x'));
        if self.has_flag('u') {
            builder.unicode(true);
        }
        builder.build().map_err(|e| FormatError::InvalidPattern {
            pattern: self.source.clone(),
            flags: self.flags.clone(),
            message: e.to_string(),
        })
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}/{}", self.source, self.flags)
    }
}
