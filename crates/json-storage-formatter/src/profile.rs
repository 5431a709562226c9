//! Data-only codec settings that can live in a config file.
//!
//! Comparators, validators and function compilers are code and stay on
//! [`EncodeOptions`] / [`DecodeOptions`]; everything else can be loaded:
//!
//! ```
//! use json_storage_formatter::FormatProfile;
//!
//! let profile = FormatProfile::from_json_str(r#"{
//!     "exclude_keys": ["password"],
//!     "exclude_types": ["symbol"],
//!     "sort_keys": true
//! }"#).unwrap();
//! assert!(profile.encode_options().exclude_keys.contains("password"));
//! ```

use serde::{Deserialize, Serialize};

use crate::decode::DecodeOptions;
use crate::encode::{EncodeOptions, DEFAULT_MAX_DEPTH};
use crate::envelope::TypeName;
use crate::error::FormatError;
use crate::sort::SortKeys;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatProfile {
    pub exclude_keys: Vec<String>,
    pub exclude_types: Vec<TypeName>,
    /// Alphabetical key order on both encode and decode.
    pub sort_keys: bool,
    pub stringify: bool,
    pub json_parse: bool,
    pub max_depth: usize,
}

impl Default for FormatProfile {
    fn default() -> Self {
        Self {
            exclude_keys: Vec::new(),
            exclude_types: Vec::new(),
            sort_keys: false,
            stringify: false,
            json_parse: false,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl FormatProfile {
    pub fn from_json_str(text: &str) -> Result<Self, FormatError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn encode_options(&self) -> EncodeOptions {
        EncodeOptions::new()
            .exclude_keys(self.exclude_keys.iter().cloned())
            .exclude_types(self.exclude_types.iter().copied())
            .sort_keys(SortKeys::from(self.sort_keys))
            .stringify(self.stringify)
            .max_depth(self.max_depth)
    }

    pub fn decode_options(&self) -> DecodeOptions {
        DecodeOptions::new()
            .json_parse(self.json_parse)
            .sort_keys(SortKeys::from(self.sort_keys))
            .max_depth(self.max_depth)
    }
}
