//! Title → cipher key lookup.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use vnscript_bytecode::CipherKey;

use crate::error::{ConfigError, ConfigResult};

/// Longest accepted key, in bytes.
pub const MAX_KEY_LEN: usize = 64;

/// Key table entry as written in the configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeySpec {
    /// Key bytes as hex, optionally separated by whitespace.
    pub key: String,
    /// First masked byte of each scenario.
    #[serde(default)]
    pub offset: usize,
    /// Number of masked bytes; the rest of the scenario when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub span: Option<usize>,
}

impl KeySpec {
    /// Describe an existing key.
    pub fn from_key(key: &CipherKey) -> Self {
        let hex: Vec<String> = key.bytes().iter().map(|byte| format!("{byte:02x}")).collect();
        Self {
            key: hex.join(" "),
            offset: key.offset(),
            span: key.span(),
        }
    }

    /// Decode into a cipher key.
    pub fn to_key(&self, title: &str) -> ConfigResult<CipherKey> {
        let bytes = parse_hex(&self.key).map_err(|reason| ConfigError::InvalidKey {
            title: title.to_string(),
            reason,
        })?;
        Ok(match self.span {
            Some(span) => CipherKey::windowed(bytes, self.offset, span),
            None => CipherKey::new(bytes, self.offset),
        })
    }
}

fn parse_hex(text: &str) -> Result<Vec<u8>, String> {
    let digits: Vec<u8> = text.bytes().filter(|b| !b.is_ascii_whitespace()).collect();
    if digits.len() % 2 != 0 {
        return Err("odd number of hex digits".to_string());
    }
    let len = digits.len() / 2;
    if len == 0 || len > MAX_KEY_LEN {
        return Err(format!("key must be 1..={MAX_KEY_LEN} bytes, got {len}"));
    }
    digits
        .chunks_exact(2)
        .map(|pair| {
            let pair = std::str::from_utf8(pair).map_err(|_| "non-ASCII hex digit".to_string())?;
            u8::from_str_radix(pair, 16).map_err(|_| format!("invalid hex byte '{pair}'"))
        })
        .collect()
}

/// Cipher keys indexed by title registration name, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyRing {
    keys: IndexMap<String, CipherKey>,
}

impl KeyRing {
    /// Empty key ring.
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode every entry of a key table.
    pub fn from_specs(specs: &IndexMap<String, KeySpec>) -> ConfigResult<Self> {
        let mut ring = Self::new();
        for (title, spec) in specs {
            ring.insert(title.clone(), spec.to_key(title)?);
        }
        Ok(ring)
    }

    /// Register a key, replacing any key for the same title.
    pub fn insert(&mut self, title: impl Into<String>, key: CipherKey) -> Option<CipherKey> {
        self.keys.insert(title.into(), key)
    }

    /// Key registered for `title`.
    pub fn get(&self, title: &str) -> Option<&CipherKey> {
        self.keys.get(title)
    }

    /// Key for `title`, or the identity key when the title is missing or unknown.
    pub fn select(&self, title: Option<&str>) -> CipherKey {
        match title {
            Some(title) => match self.keys.get(title) {
                Some(key) => {
                    debug!(title, "selected title cipher key");
                    key.clone()
                }
                None => {
                    warn!(title, "no cipher key registered for title, using identity");
                    CipherKey::identity()
                }
            },
            None => CipherKey::identity(),
        }
    }

    /// Registered titles in declaration order.
    pub fn titles(&self) -> impl Iterator<Item = &str> {
        self.keys.keys().map(String::as_str)
    }

    /// Number of registered keys.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether no key is registered.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
