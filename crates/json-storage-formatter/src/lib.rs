//! Lossless JSON storage for values JSON cannot represent on its own.
//!
//! Maps, sets, dates, regular expressions, errors, functions and the absent
//! value are wrapped in `{"$t": tag, "$v": payload}` envelopes (see
//! [`envelope`]) so that a value can go through any JSON-only channel and be
//! rebuilt on the other side.
//!
//! ```
//! use json_storage_formatter::{
//!     format_from_str, format_to_store_string, DecodeOptions, EncodeOptions, Value,
//! };
//!
//! let value = Value::object([
//!     ("tags", Value::set([Value::from("a"), Value::from("b")])),
//!     ("missing", Value::Undefined),
//! ]);
//! let text = format_to_store_string(&value, &EncodeOptions::default()).unwrap();
//! assert_eq!(
//!     text,
//!     r#"{"tags":{"$t":"set","$v":["a","b"]},"missing":{"$t":"undefined"}}"#
//! );
//! assert_eq!(format_from_str(&text, &DecodeOptions::default()).unwrap(), value);
//! ```

pub mod clone;
pub mod decode;
pub mod encode;
pub mod envelope;
pub mod error;
pub mod predicates;
pub mod profile;
pub mod sort;
pub mod value;

pub use clone::{clone, clone_with, CloneOptions};
pub use decode::{
    format_from_store, format_from_str, DecodeOptions, FunctionCompiler, StoreDecoder,
};
pub use encode::{
    format_to_store, format_to_store_string, EncodeOptions, Stored, StoreEncoder, Validator,
    DEFAULT_MAX_DEPTH,
};
pub use envelope::{Envelope, Tag, TypeName};
pub use error::FormatError;
pub use predicates::{
    is_boolean, is_date, is_function, is_nil, is_number, is_primitive, is_regex, is_string, Kind,
};
pub use profile::FormatProfile;
pub use sort::{KeyComparator, SortKeys};
pub use value::{ErrorValue, Function, MapValue, NativeFn, Object, Pattern, SetValue, Value};
