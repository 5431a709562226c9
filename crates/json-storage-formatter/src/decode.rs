//! Rebuilding values from stored envelope trees (`formatFromStore`).

use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value as Json};
use tracing::{debug, warn};

use crate::encode::DEFAULT_MAX_DEPTH;
use crate::envelope::{read_date, Envelope, Tag, REGEX_FLAGS_FIELD, REGEX_SOURCE_FIELD};
use crate::error::FormatError;
use crate::sort::SortKeys;
use crate::value::{ErrorValue, Function, MapValue, Object, Pattern, SetValue, Value};

/// Turns stored function source text back into something callable.
///
/// Compiling stored source runs code that arrived with the data, so the
/// decoder only does it when the application hands it a compiler.
pub trait FunctionCompiler: Send + Sync {
    fn compile(&self, source: &str) -> Result<Function, FormatError>;
}

impl<F> FunctionCompiler for F
where
    F: Fn(&str) -> Result<Function, FormatError> + Send + Sync,
{
    fn compile(&self, source: &str) -> Result<Function, FormatError> {
        self(source)
    }
}

#[derive(Clone)]
pub struct DecodeOptions {
    /// Treat a string input as JSON text and parse it first.
    pub json_parse: bool,
    pub sort_keys: SortKeys,
    /// Without a compiler, function envelopes decode to inert functions.
    pub function_compiler: Option<Arc<dyn FunctionCompiler>>,
    pub max_depth: usize,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            json_parse: false,
            sort_keys: SortKeys::Insertion,
            function_compiler: None,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl DecodeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn json_parse(mut self, json_parse: bool) -> Self {
        self.json_parse = json_parse;
        self
    }

    pub fn sort_keys(mut self, sort_keys: impl Into<SortKeys>) -> Self {
        self.sort_keys = sort_keys.into();
        self
    }

    pub fn function_compiler(mut self, compiler: impl FunctionCompiler + 'static) -> Self {
        self.function_compiler = Some(Arc::new(compiler));
        self
    }

    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

impl fmt::Debug for DecodeOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecodeOptions")
            .field("json_parse", &self.json_parse)
            .field("sort_keys", &self.sort_keys)
            .field(
                "function_compiler",
                &self.function_compiler.as_ref().map(|_| ".."),
            )
            .field("max_depth", &self.max_depth)
            .finish()
    }
}

/// Rebuilds the value stored in `tree`.
///
/// With `json_parse` set and a string `tree`, the string is parsed as JSON
/// first; malformed text is the only input that makes decoding fail, apart
/// from exceeding `max_depth`. Without `json_parse` a string is just a
/// string.
///
/// # Examples
///
/// ```
/// use json_storage_formatter::{format_from_store, DecodeOptions, Value};
/// use serde_json::json;
///
/// let tree = json!({"$t": "set", "$v": [1, 2]});
/// let value = format_from_store(&tree, &DecodeOptions::default()).unwrap();
/// assert_eq!(value, Value::set([Value::from(1), Value::from(2)]));
/// ```
pub fn format_from_store(tree: &Json, options: &DecodeOptions) -> Result<Value, FormatError> {
    let decoder = StoreDecoder::with_options(options.clone());
    match tree {
        Json::String(text) if options.json_parse => decoder.decode_str(text),
        _ => decoder.decode(tree),
    }
}

/// Parses `text` as JSON and rebuilds the stored value.
pub fn format_from_str(text: &str, options: &DecodeOptions) -> Result<Value, FormatError> {
    StoreDecoder::with_options(options.clone()).decode_str(text)
}

/// Envelope decoder. Holds the options for repeated use.
#[derive(Debug, Clone, Default)]
pub struct StoreDecoder {
    pub options: DecodeOptions,
}

impl StoreDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: DecodeOptions) -> Self {
        Self { options }
    }

    pub fn decode(&self, tree: &Json) -> Result<Value, FormatError> {
        self.read_any(tree, 0)
    }

    pub fn decode_str(&self, text: &str) -> Result<Value, FormatError> {
        let tree: Json = serde_json::from_str(text)?;
        self.read_any(&tree, 0)
    }

    fn read_any(&self, node: &Json, depth: usize) -> Result<Value, FormatError> {
        match node {
            Json::Null => Ok(Value::Null),
            Json::Bool(b) => Ok(Value::Bool(*b)),
            Json::Number(n) => Ok(Value::Number(n.as_f64().unwrap_or(f64::NAN))),
            Json::String(s) => Ok(Value::String(s.clone())),
            Json::Array(items) => {
                let depth = self.descend(depth)?;
                let items = items
                    .iter()
                    .map(|item| self.read_any(item, depth))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Value::Array(Arc::new(items)))
            }
            Json::Object(obj) => {
                if let Some(env) = Envelope::read(node) {
                    if let Some(value) = self.read_envelope(env, depth)? {
                        return Ok(value);
                    }
                    debug!(
                        tag = %env.tag,
                        "malformed envelope payload; decoding as a plain structure"
                    );
                }
                let depth = self.descend(depth)?;
                self.read_obj(obj, depth)
            }
        }
    }

    /// `Ok(None)` when the payload does not fit the tag.
    fn read_envelope(
        &self,
        env: Envelope<'_>,
        depth: usize,
    ) -> Result<Option<Value>, FormatError> {
        let payload = env.payload;
        let value = match env.tag {
            Tag::Undefined => Some(Value::Undefined),
            Tag::Date => payload
                .and_then(Json::as_str)
                .and_then(read_date)
                .map(Value::date),
            Tag::Map => match payload {
                None => Some(Value::Map(Arc::new(MapValue::new()))),
                Some(Json::Array(pairs)) => self.read_map(pairs, self.descend(depth)?)?,
                Some(_) => None,
            },
            Tag::Set => match payload {
                None => Some(Value::Set(Arc::new(SetValue::new()))),
                Some(Json::Array(members)) => {
                    let depth = self.descend(depth)?;
                    let mut set = SetValue::with_capacity(members.len());
                    for member in members {
                        set.insert(self.read_any(member, depth)?);
                    }
                    Some(Value::Set(Arc::new(set)))
                }
                Some(_) => None,
            },
            Tag::Regex => payload.and_then(read_pattern).map(Value::Regex),
            Tag::Error => match payload {
                None | Some(Json::Null) => Some(Value::Error(ErrorValue::new(""))),
                Some(Json::String(message)) => {
                    Some(Value::Error(ErrorValue::new(message.clone())))
                }
                Some(_) => None,
            },
            Tag::Function => payload
                .and_then(Json::as_str)
                .map(|source| self.read_function(source)),
        };
        Ok(value)
    }

    fn read_map(&self, pairs: &[Json], depth: usize) -> Result<Option<Value>, FormatError> {
        let mut map = MapValue::with_capacity(pairs.len());
        for pair in pairs {
            let Some([key, val]) = pair.as_array().map(Vec::as_slice) else {
                return Ok(None);
            };
            map.insert(self.read_any(key, depth)?, self.read_any(val, depth)?);
        }
        Ok(Some(Value::Map(Arc::new(map))))
    }

    fn read_function(&self, source: &str) -> Value {
        let Some(compiler) = &self.options.function_compiler else {
            debug!("no function compiler configured; keeping function source inert");
            return Value::Function(Function::inert(source));
        };
        match compiler.compile(source) {
            Ok(f) => Value::Function(f),
            Err(e) => {
                warn!(error = %e, "stored function failed to compile");
                Value::Error(ErrorValue::new(format!("Could not compile function: {e}")))
            }
        }
    }

    fn read_obj(&self, obj: &Map<String, Json>, depth: usize) -> Result<Value, FormatError> {
        let keys = self.options.sort_keys.order(obj.keys().map(String::as_str));
        let mut out = Object::with_capacity(keys.len());
        for key in keys {
            if let Some(val) = obj.get(key) {
                out.insert(key.to_owned(), self.read_any(val, depth)?);
            }
        }
        Ok(Value::Object(Arc::new(out)))
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

fn read_pattern(payload: &Json) -> Option<Pattern> {
    let obj = payload.as_object()?;
    let source = obj.get(REGEX_SOURCE_FIELD)?.as_str()?;
    let flags = match obj.get(REGEX_FLAGS_FIELD) {
        None | Some(Json::Null) => "",
        Some(flags) => flags.as_str()?,
    };
    Some(Pattern::new(source, flags))
}
