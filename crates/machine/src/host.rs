//! Collaborator surface implemented by the embedding host.
//!
//! Rendering, audio and text layout live outside this crate. Operations reach
//! them through [`Host::side_effect`] with a name and positional [`Value`]s,
//! so the interpreter never depends on their implementations.

use serde::{Deserialize, Serialize};
use vnscript_bytecode::TextEncoding;

use crate::error::Result;

/// Value passed across the host boundary.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Value {
    /// Integer value.
    Int(i32),
    /// Raw string bytes in the scenario's text encoding.
    Str(Vec<u8>),
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Int(value)
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Self::Str(value)
    }
}

/// Callbacks the engine and operations invoke on the embedding host.
///
/// Side effects are not journaled: when an instruction fails after invoking
/// one, the machine state rolls back but the host has already observed the call.
pub trait Host {
    /// Perform a named side effect and optionally return a value.
    fn side_effect(&mut self, name: &str, args: &[Value]) -> Result<Option<Value>>;

    /// Raw text element reached by the engine.
    fn text(&mut self, text: &[u8], encoding: TextEncoding) -> Result<()> {
        let _ = (text, encoding);
        Ok(())
    }

    /// Line marker reached by the engine.
    fn line(&mut self, line: u16) {
        let _ = line;
    }
}

/// Host that ignores every callback.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullHost;

impl Host for NullHost {
    fn side_effect(&mut self, _name: &str, _args: &[Value]) -> Result<Option<Value>> {
        Ok(None)
    }
}
