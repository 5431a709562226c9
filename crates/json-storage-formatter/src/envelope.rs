//! The wire schema.
//!
//! Every value JSON cannot hold natively is stored as a two-field object:
//!
//! ```json
//! {"$t": "<tag>", "$v": <payload>}
//! ```
//!
//! | tag         | payload                                   |
//! |-------------|-------------------------------------------|
//! | `map`       | `[[key, value], ...]`, both sides encoded |
//! | `set`       | `[member, ...]`, each encoded             |
//! | `date`      | ISO-8601 string, millisecond precision    |
//! | `regex`     | `{"s": source, "f": flags}`               |
//! | `error`     | message string                            |
//! | `function`  | source text                               |
//! | `undefined` | none (`$v` is omitted)                    |
//!
//! An object whose `$t` is not one of these tags is an ordinary plain
//! structure.
//!
//! Dates use the `toISOString` layout: `YYYY-MM-DDTHH:MM:SS.sssZ` for years
//! 0 through 9999 and a signed six-digit year (`+010000-…`, `-000001-…`)
//! outside that range.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as Json};

use crate::error::FormatError;

pub const TAG_FIELD: &str = "$t";
pub const PAYLOAD_FIELD: &str = "$v";
pub const REGEX_SOURCE_FIELD: &str = "s";
pub const REGEX_FLAGS_FIELD: &str = "f";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    Map,
    Set,
    Date,
    Regex,
    Error,
    Function,
    Undefined,
}

impl Tag {
    pub const ALL: [Tag; 7] = [
        Tag::Map,
        Tag::Set,
        Tag::Date,
        Tag::Regex,
        Tag::Error,
        Tag::Function,
        Tag::Undefined,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Tag::Map => "map",
            Tag::Set => "set",
            Tag::Date => "date",
            Tag::Regex => "regex",
            Tag::Error => "error",
            Tag::Function => "function",
            Tag::Undefined => "undefined",
        }
    }

    pub fn from_name(name: &str) -> Option<Tag> {
        Tag::ALL.into_iter().find(|tag| tag.as_str() == name)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A borrowed view of an envelope found in a stored tree.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Envelope<'a> {
    pub tag: Tag,
    pub payload: Option<&'a Json>,
}

impl<'a> Envelope<'a> {
    /// Recognises `node` as an envelope by its tag field alone; other fields
    /// are ignored.
    pub fn read(node: &'a Json) -> Option<Self> {
        let obj = node.as_object()?;
        let tag = Tag::from_name(obj.get(TAG_FIELD)?.as_str()?)?;
        Some(Self {
            tag,
            payload: obj.get(PAYLOAD_FIELD),
        })
    }
}

/// Builds `{"$t": tag, "$v": payload}`, leaving `$v` out when there is no
/// payload.
pub fn envelope(tag: Tag, payload: Option<Json>) -> Json {
    let mut obj = Map::with_capacity(2);
    obj.insert(TAG_FIELD.to_owned(), Json::String(tag.as_str().to_owned()));
    if let Some(payload) = payload {
        obj.insert(PAYLOAD_FIELD.to_owned(), payload);
    }
    Json::Object(obj)
}

/// Date payload text, always with three fractional digits.
pub fn write_date(date: &DateTime<Utc>) -> String {
    let year = date.year();
    let rest = date.format("-%m-%dT%H:%M:%S%.3fZ");
    if (0..=9999).contains(&year) {
        format!("{year:04}{rest}")
    } else {
        let sign = if year < 0 { '-' } else { '+' };
        format!("{sign}{:06}{rest}", year.unsigned_abs())
    }
}

/// Parses a date payload: RFC 3339 text, or an expanded signed year such as
/// `+010000-01-01T00:00:00.000Z`.
pub fn read_date(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(date) = DateTime::parse_from_rfc3339(text) {
        return Some(date.with_timezone(&Utc));
    }
    let (negative, unsigned) = match text.as_bytes().first()? {
        b'+' => (false, &text[1..]),
        b'-' => (true, &text[1..]),
        _ => (false, text),
    };
    let (digits, rest) = unsigned.split_at(unsigned.find('-')?);
    if digits.len() < 4 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let year: i32 = digits.parse().ok()?;
    let year = if negative { -year } else { year };
    // 2000 is a leap year, so Feb 29 parses here and `with_year` rejects it
    // for years that lack one.
    let anchored =
        NaiveDateTime::parse_from_str(&format!("2000{rest}"), "%Y-%m-%dT%H:%M:%S%.fZ").ok()?;
    let naive = anchored.with_year(year)?;
    Some(Utc.from_utc_datetime(&naive))
}

/// Runtime kind names accepted by `exclude_types`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeName {
    String,
    Number,
    Bigint,
    Boolean,
    Symbol,
    Undefined,
    Function,
    Object,
}

impl TypeName {
    pub fn as_str(self) -> &'static str {
        match self {
            TypeName::String => "string",
            TypeName::Number => "number",
            TypeName::Bigint => "bigint",
            TypeName::Boolean => "boolean",
            TypeName::Symbol => "symbol",
            TypeName::Undefined => "undefined",
            TypeName::Function => "function",
            TypeName::Object => "object",
        }
    }

    /// Kind of an already encoded node. `null`, arrays, structures and
    /// envelopes are all `object`.
    pub fn of_encoded(node: &Json) -> TypeName {
        match node {
            Json::Bool(_) => TypeName::Boolean,
            Json::Number(_) => TypeName::Number,
            Json::String(_) => TypeName::String,
            Json::Null | Json::Array(_) | Json::Object(_) => TypeName::Object,
        }
    }
}

impl FromStr for TypeName {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "string" => Ok(TypeName::String),
            "number" => Ok(TypeName::Number),
            "bigint" => Ok(TypeName::Bigint),
            "boolean" => Ok(TypeName::Boolean),
            "symbol" => Ok(TypeName::Symbol),
            "undefined" => Ok(TypeName::Undefined),
            "function" => Ok(TypeName::Function),
            "object" => Ok(TypeName::Object),
            other => Err(FormatError::UnknownTypeName(other.to_owned())),
        }
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
