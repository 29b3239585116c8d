//! Host configuration for the scenario interpreter.
//!
//! A host describes, in one YAML document, which title it runs (and so which
//! cipher key applies to its archive), where execution starts, and how deep
//! the call stack may grow.
//!
//! ```ignore
//! use vnscript_config::HostConfig;
//!
//! let config = HostConfig::load("host.yaml")?;
//! let archive = config.open_archive("SEEN.TXT")?;
//! let engine = Engine::new(ModuleRegistry::standard()?, archive, config.engine_config())?;
//! ```

pub mod error;
pub mod host;
pub mod keyring;

pub use error::{ConfigError, ConfigResult};
pub use host::{EntrySpec, HostConfig};
pub use keyring::{KeyRing, KeySpec, MAX_KEY_LEN};

#[cfg(test)]
mod tests;
