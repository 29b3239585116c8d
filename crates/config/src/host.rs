//! Host configuration document.

use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::info;
use vnscript_bytecode::{Archive, CipherKey, ScenarioId, MAX_SCENARIO_ID};
use vnscript_machine::{EngineConfig, DEFAULT_CALL_STACK_LIMIT};

use crate::error::{ConfigError, ConfigResult};
use crate::keyring::{KeyRing, KeySpec};

const API_VERSION: &str = "vnscript/v1";
const KIND: &str = "HostConfig";

/// Configures how a host opens archives and starts the engine.
///
/// Loaded from YAML:
///
/// ```yaml
/// apiVersion: vnscript/v1
/// kind: HostConfig
/// title: "KEY\\Example"
/// entry: { scenario: 1, entrypoint: 0 }
/// callStackLimit: 256
/// keys:
///   "KEY\\Example": { key: "a8 28 fd 66", offset: 256, span: 257 }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostConfig {
    /// API version for compatibility checking.
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Kind must be "HostConfig".
    #[serde(default = "default_kind")]
    pub kind: String,

    /// Registration name of the title, used to select its cipher key.
    #[serde(default)]
    pub title: Option<String>,

    /// Where execution starts.
    #[serde(default)]
    pub entry: EntrySpec,

    /// Maximum call stack depth.
    #[serde(default = "default_call_stack_limit")]
    pub call_stack_limit: usize,

    /// Cipher keys by title registration name.
    #[serde(default)]
    pub keys: IndexMap<String, KeySpec>,
}

/// Entry point of the program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntrySpec {
    /// Entry scenario id.
    pub scenario: u16,
    /// Entrypoint inside the entry scenario.
    #[serde(default)]
    pub entrypoint: u8,
}

impl Default for EntrySpec {
    fn default() -> Self {
        Self {
            scenario: 1,
            entrypoint: 0,
        }
    }
}

fn default_api_version() -> String {
    API_VERSION.to_string()
}

fn default_kind() -> String {
    KIND.to_string()
}

fn default_call_stack_limit() -> usize {
    DEFAULT_CALL_STACK_LIMIT
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            api_version: default_api_version(),
            kind: default_kind(),
            title: None,
            entry: EntrySpec::default(),
            call_stack_limit: default_call_stack_limit(),
            keys: IndexMap::new(),
        }
    }
}

impl HostConfig {
    /// Configuration with defaults and no title.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a configuration from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_yaml(&content)?;
        info!(path = %path.display(), title = ?config.title, keys = config.keys.len(), "loaded host config");
        Ok(config)
    }

    /// Parse a configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> ConfigResult<Self> {
        let config: HostConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to YAML.
    pub fn to_yaml(&self) -> ConfigResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Validate schema, entry point and every key.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.api_version != API_VERSION {
            return Err(ConfigError::InvalidApiVersion(self.api_version.clone()));
        }
        if self.kind != KIND {
            return Err(ConfigError::InvalidKind(self.kind.clone()));
        }
        if self.entry.scenario > MAX_SCENARIO_ID {
            return Err(ConfigError::EntryOutOfRange(self.entry.scenario));
        }
        if self.call_stack_limit == 0 {
            return Err(ConfigError::InvalidCallStackLimit);
        }
        self.key_ring().map(|_| ())
    }

    /// Decode the key table.
    pub fn key_ring(&self) -> ConfigResult<KeyRing> {
        KeyRing::from_specs(&self.keys)
    }

    /// Cipher key for the configured title, identity when none applies.
    pub fn cipher_key(&self) -> ConfigResult<CipherKey> {
        Ok(self.key_ring()?.select(self.title.as_deref()))
    }

    /// Engine parameters derived from this configuration.
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            entry_scenario: ScenarioId::new(self.entry.scenario),
            entrypoint: self.entry.entrypoint,
            call_stack_limit: self.call_stack_limit,
        }
    }

    /// Open an archive with the title's cipher key.
    pub fn open_archive(&self, path: impl AsRef<Path>) -> ConfigResult<Archive> {
        let key = self.cipher_key()?;
        Ok(Archive::open(path, Some(key))?)
    }

    /// Builder method: set the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Builder method: register a key for a title.
    pub fn with_key(mut self, title: impl Into<String>, key: &CipherKey) -> Self {
        self.keys.insert(title.into(), KeySpec::from_key(key));
        self
    }

    /// Builder method: set the entry point.
    pub fn with_entry(mut self, scenario: u16, entrypoint: u8) -> Self {
        self.entry = EntrySpec {
            scenario,
            entrypoint,
        };
        self
    }

    /// Builder method: set the call stack limit.
    pub fn with_call_stack_limit(mut self, limit: usize) -> Self {
        self.call_stack_limit = limit;
        self
    }
}
