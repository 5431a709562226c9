//! Encoding values into storable envelope trees (`formatToStore`).

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Number, Value as Json};
use tracing::warn;

use crate::clone::clone_bounded;
use crate::envelope::{
    envelope, write_date, Tag, TypeName, REGEX_FLAGS_FIELD, REGEX_SOURCE_FIELD,
};
use crate::error::FormatError;
use crate::sort::SortKeys;
use crate::value::{Function, Object, Value};

/// Maximum container nesting accepted by the encoder and decoder.
pub const DEFAULT_MAX_DEPTH: usize = 512;

/// Decides whether a plain-structure key is kept: receives the structure
/// being encoded, the key and the already encoded value.
pub type Validator = Arc<dyn Fn(&Value, &str, &Json) -> bool + Send + Sync>;

#[derive(Clone)]
pub struct EncodeOptions {
    /// Drop plain-structure keys whose encoded value has one of these kinds.
    pub exclude_types: HashSet<TypeName>,
    /// Drop these plain-structure keys.
    pub exclude_keys: HashSet<String>,
    pub sort_keys: SortKeys,
    /// Replaces `exclude_types` and `exclude_keys` when set.
    pub validator: Option<Validator>,
    /// Return JSON text instead of a tree.
    pub stringify: bool,
    pub max_depth: usize,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            exclude_types: HashSet::new(),
            exclude_keys: HashSet::new(),
            sort_keys: SortKeys::Insertion,
            validator: None,
            stringify: false,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl EncodeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn exclude_types<I: IntoIterator<Item = TypeName>>(mut self, types: I) -> Self {
        self.exclude_types.extend(types);
        self
    }

    pub fn exclude_keys<I, K>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        self.exclude_keys.extend(keys.into_iter().map(Into::into));
        self
    }

    pub fn sort_keys(mut self, sort_keys: impl Into<SortKeys>) -> Self {
        self.sort_keys = sort_keys.into();
        self
    }

    pub fn validator<F>(mut self, validator: F) -> Self
    where
        F: Fn(&Value, &str, &Json) -> bool + Send + Sync + 'static,
    {
        self.validator = Some(Arc::new(validator));
        self
    }

    pub fn stringify(mut self, stringify: bool) -> Self {
        self.stringify = stringify;
        self
    }

    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

impl fmt::Debug for EncodeOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncodeOptions")
            .field("exclude_types", &self.exclude_types)
            .field("exclude_keys", &self.exclude_keys)
            .field("sort_keys", &self.sort_keys)
            .field("validator", &self.validator.as_ref().map(|_| ".."))
            .field("stringify", &self.stringify)
            .field("max_depth", &self.max_depth)
            .finish()
    }
}

/// Result of [`format_to_store`]: the tree, or its JSON text when
/// `stringify` was requested.
#[derive(Debug, Clone, PartialEq)]
pub enum Stored {
    Tree(Json),
    Text(String),
}

impl Stored {
    pub fn as_tree(&self) -> Option<&Json> {
        match self {
            Stored::Tree(tree) => Some(tree),
            Stored::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Stored::Text(text) => Some(text.as_str()),
            Stored::Tree(_) => None,
        }
    }

    /// JSON text of the stored value, serializing the tree if needed.
    pub fn into_text(self) -> Result<String, FormatError> {
        match self {
            Stored::Text(text) => Ok(text),
            Stored::Tree(tree) => Ok(serde_json::to_string(&tree)?),
        }
    }
}

/// Encodes `value` into a JSON-safe envelope tree.
///
/// # Examples
///
/// ```
/// use json_storage_formatter::{format_to_store, EncodeOptions, Value};
/// use serde_json::json;
///
/// let value = Value::map([(Value::from("a"), Value::from(1))]);
/// let stored = format_to_store(&value, &EncodeOptions::default()).unwrap();
/// assert_eq!(stored.as_tree(), Some(&json!({"$t": "map", "$v": [["a", 1]]})));
/// ```
pub fn format_to_store(value: &Value, options: &EncodeOptions) -> Result<Stored, FormatError> {
    let tree = StoreEncoder::with_options(options.clone()).encode(value)?;
    if options.stringify {
        Ok(Stored::Text(serde_json::to_string(&tree)?))
    } else {
        Ok(Stored::Tree(tree))
    }
}

/// Encodes `value` straight to JSON text, whatever `options.stringify` says.
pub fn format_to_store_string(
    value: &Value,
    options: &EncodeOptions,
) -> Result<String, FormatError> {
    let tree = StoreEncoder::with_options(options.clone()).encode(value)?;
    Ok(serde_json::to_string(&tree)?)
}

/// Envelope encoder. Holds the options for repeated use.
#[derive(Debug, Clone, Default)]
pub struct StoreEncoder {
    pub options: EncodeOptions,
}

impl StoreEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: EncodeOptions) -> Self {
        Self { options }
    }

    /// Encodes a private deep copy of `value`.
    pub fn encode(&self, value: &Value) -> Result<Json, FormatError> {
        let copy = clone_bounded(value, self.options.max_depth)?;
        self.write_any(&copy, 0)
    }

    fn write_any(&self, value: &Value, depth: usize) -> Result<Json, FormatError> {
        match value {
            Value::Undefined => Ok(envelope(Tag::Undefined, None)),
            Value::Null => Ok(Json::Null),
            Value::Bool(b) => Ok(Json::Bool(*b)),
            Value::Number(n) => Ok(number_to_json(*n)),
            Value::String(s) => Ok(Json::String(s.clone())),
            // Symbols have no JSON form.
            Value::Symbol(_) => Ok(Json::Null),
            Value::Array(items) => {
                let depth = self.descend(depth)?;
                let items = items
                    .iter()
                    .map(|item| self.write_any(item, depth))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Json::Array(items))
            }
            Value::Map(map) => {
                let depth = self.descend(depth)?;
                let mut pairs = Vec::with_capacity(map.len());
                for (key, val) in map.iter() {
                    pairs.push(Json::Array(vec![
                        self.write_any(key, depth)?,
                        self.write_any(val, depth)?,
                    ]));
                }
                Ok(envelope(Tag::Map, Some(Json::Array(pairs))))
            }
            Value::Set(set) => {
                let depth = self.descend(depth)?;
                let members = set
                    .iter()
                    .map(|member| self.write_any(member, depth))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(envelope(Tag::Set, Some(Json::Array(members))))
            }
            Value::Date(date) => Ok(envelope(Tag::Date, Some(Json::String(write_date(date))))),
            Value::Regex(pattern) => {
                let mut payload = Map::with_capacity(2);
                payload.insert(
                    REGEX_SOURCE_FIELD.to_owned(),
                    Json::String(pattern.source.clone()),
                );
                payload.insert(
                    REGEX_FLAGS_FIELD.to_owned(),
                    Json::String(pattern.flags.clone()),
                );
                Ok(envelope(Tag::Regex, Some(Json::Object(payload))))
            }
            Value::Function(f) => Ok(self.write_function(f)),
            Value::Error(err) => Ok(envelope(
                Tag::Error,
                Some(Json::String(err.message.clone())),
            )),
            Value::Object(obj) => {
                let depth = self.descend(depth)?;
                self.write_obj(value, obj, depth)
            }
        }
    }

    fn write_function(&self, f: &Function) -> Json {
        match f.source() {
            Some(source) => envelope(Tag::Function, Some(Json::String(source.to_owned()))),
            None => {
                warn!("function source is not available; storing an error envelope instead");
                envelope(
                    Tag::Error,
                    Some(Json::String(
                        "Could not serialize function: source text is not available".to_owned(),
                    )),
                )
            }
        }
    }

    fn write_obj(
        &self,
        container: &Value,
        obj: &Object,
        depth: usize,
    ) -> Result<Json, FormatError> {
        let keys = self.options.sort_keys.order(obj.keys().map(String::as_str));
        let mut out = Map::with_capacity(keys.len());
        for key in keys {
            let Some(val) = obj.get(key) else { continue };
            // JSON has no slot for a symbol-valued property.
            if matches!(val, Value::Symbol(_)) {
                continue;
            }
            let encoded = self.write_any(val, depth)?;
            if self.should_include(container, key, &encoded) {
                out.insert(key.to_owned(), encoded);
            }
        }
        Ok(Json::Object(out))
    }

    fn should_include(&self, container: &Value, key: &str, encoded: &Json) -> bool {
        if let Some(validator) = &self.options.validator {
            return validator(container, key, encoded);
        }
        let options = &self.options;
        if options.exclude_keys.is_empty() && options.exclude_types.is_empty() {
            return true;
        }
        !options.exclude_keys.contains(key)
            && !options.exclude_types.contains(&TypeName::of_encoded(encoded))
    }

    fn descend(&self, depth: usize) -> Result<usize, FormatError> {
        let next = depth + 1;
        if next > self.options.max_depth {
            return Err(FormatError::DepthLimitExceeded {
                limit: self.options.max_depth,
            });
        }
        Ok(next)
    }
}

/// Integral values become JSON integers, other finite values floats, and
/// non-finite values `null`.
fn number_to_json(n: f64) -> Json {
    const MAX_SAFE: f64 = 9_007_199_254_740_991.0;
    if n.fract() == 0.0 && n.abs() <= MAX_SAFE {
        if n == 0.0 {
            return Json::Number(Number::from(0));
        }
        return Json::Number(Number::from(n as i64));
    }
    Number::from_f64(n).map_or(Json::Null, Json::Number)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn tree(value: &Value) -> Json {
        StoreEncoder::new().encode(value).unwrap()
    }

    #[test]
    fn primitives_pass_through() {
        assert_eq!(tree(&Value::from(1)), json!(1));
        assert_eq!(tree(&Value::from("x")), json!("x"));
        assert_eq!(tree(&Value::from(true)), json!(true));
        assert_eq!(tree(&Value::Null), json!(null));
    }

    #[test]
    fn numbers_follow_json_rules() {
        assert_eq!(number_to_json(2.5), json!(2.5));
        assert_eq!(number_to_json(-0.0), json!(0));
        assert_eq!(number_to_json(1e300), json!(1e300));
        assert_eq!(number_to_json(f64::NAN), json!(null));
        assert_eq!(number_to_json(f64::INFINITY), json!(null));
    }

    #[test]
    fn undefined_is_wrapped() {
        assert_eq!(tree(&Value::Undefined), json!({"$t": "undefined"}));
    }

    #[test]
    fn date_uses_millisecond_iso() {
        let date = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(
            tree(&Value::from(date)),
            json!({"$t": "date", "$v": "2020-01-01T00:00:00.000Z"})
        );
    }

    #[test]
    fn date_outside_four_digit_years_is_signed() {
        let far = Utc.with_ymd_and_hms(10000, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(
            tree(&Value::from(far)),
            json!({"$t": "date", "$v": "+010000-01-01T00:00:00.000Z"})
        );
        let before = Utc.with_ymd_and_hms(-1, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(
            tree(&Value::from(before)),
            json!({"$t": "date", "$v": "-000001-01-01T00:00:00.000Z"})
        );
    }

    #[test]
    fn regex_payload_is_structured() {
        assert_eq!(
            tree(&Value::regex("a+b", "gi")),
            json!({"$t": "regex", "$v": {"s": "a+b", "f": "gi"}})
        );
    }

    #[test]
    fn map_pairs_encode_both_sides() {
        let key = Value::from(Utc.timestamp_millis_opt(0).unwrap());
        let value = Value::map([(key, Value::set([Value::Undefined]))]);
        assert_eq!(
            tree(&value),
            json!({"$t": "map", "$v": [[
                {"$t": "date", "$v": "1970-01-01T00:00:00.000Z"},
                {"$t": "set", "$v": [{"$t": "undefined"}]}
            ]]})
        );
    }

    #[test]
    fn functions_store_source_or_degrade_to_error() {
        let with_source = Value::from(Function::new("(a) => a", |args| {
            args.first().cloned().unwrap_or_default()
        }));
        assert_eq!(
            tree(&with_source),
            json!({"$t": "function", "$v": "(a) => a"})
        );
        let native = Value::from(Function::native(|_| Value::Null));
        let stored = tree(&native);
        assert_eq!(stored["$t"], json!("error"));
        assert!(stored["$v"]
            .as_str()
            .unwrap()
            .starts_with("Could not serialize function"));
    }

    #[test]
    fn symbols_are_null_in_arrays_and_dropped_from_structures() {
        let value = Value::object([
            ("sym", Value::symbol("s")),
            ("list", Value::array([Value::symbol("s")])),
        ]);
        assert_eq!(tree(&value), json!({"list": [null]}));
    }

    #[test]
    fn exclude_options_only_touch_structure_keys() {
        let value = Value::object([
            ("a", Value::from(1)),
            ("b", Value::from("two")),
            ("c", Value::array([Value::from(1), Value::from("x")])),
        ]);
        let options = EncodeOptions::new()
            .exclude_types([TypeName::String])
            .exclude_keys(["a"]);
        let stored = StoreEncoder::with_options(options).encode(&value).unwrap();
        assert_eq!(stored, json!({"c": [1, "x"]}));
    }

    #[test]
    fn validator_overrides_excludes() {
        let value = Value::object([("a", Value::from(1)), ("b", Value::from(2))]);
        let options = EncodeOptions::new()
            .exclude_keys(["a", "b"])
            .validator(|_, _, encoded| encoded.as_i64() == Some(2));
        let stored = StoreEncoder::with_options(options).encode(&value).unwrap();
        assert_eq!(stored, json!({"b": 2}));
    }

    #[test]
    fn depth_limit() {
        let value = Value::array([Value::array([Value::array([])])]);
        let options = EncodeOptions::new().max_depth(2);
        let err = StoreEncoder::with_options(options).encode(&value).unwrap_err();
        assert!(matches!(err, FormatError::DepthLimitExceeded { limit: 2 }));
        let options = EncodeOptions::new().max_depth(3);
        assert!(StoreEncoder::with_options(options).encode(&value).is_ok());
    }

    #[test]
    fn stored_text() {
        let stored = format_to_store(
            &Value::object([("b", Value::from(1)), ("a", Value::Undefined)]),
            &EncodeOptions::new().stringify(true),
        )
        .unwrap();
        assert_eq!(stored.as_text(), Some(r#"{"b":1,"a":{"$t":"undefined"}}"#));
        assert_eq!(stored.as_tree(), None);
    }
}
