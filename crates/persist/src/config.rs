use serde::{Deserialize, Serialize};

use crate::error::PersistError;

/// Limits applied while encoding and decoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    /// Maximum compound nesting (classes, lists, maps, arrays, enums) below the root.
    pub max_depth: usize,
    /// Largest text or type-identity length accepted on decode, in bytes.
    pub max_string_len: usize,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            max_depth: 64,
            max_string_len: 16 * 1024 * 1024,
        }
    }
}

impl CodecConfig {
    /// Parse a config from JSON; missing keys keep their defaults.
    pub fn from_json(text: &str) -> Result<Self, PersistError> {
        Ok(serde_json::from_str(text)?)
    }
}
