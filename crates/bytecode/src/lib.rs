//! Scenario archives and instruction decoding.
//!
//! This crate covers everything between "bytes on disk" and a decoded
//! [`Scenario`]: the archive container, the per-title cipher, and the
//! instruction decoder. It never executes anything; see `vnscript-machine`
//! for the interpreter.
//!
//! # Architecture
//!
//! - [`cipher`] - Per-title XOR mask applied to every scenario byte range
//! - [`archive`] - Table of contents, lazy decode cache, [`ScenarioSource`]
//! - [`decode`] - Scenario blob → [`InstructionElement`] sequence
//! - [`encode`] - Exact inverse of the decoder, for tooling and fixtures
//! - [`element`] - Decoded element types ([`Command`], [`Argument`], [`Expr`])
//! - [`scenario`] - Decoded scenario with label and entrypoint tables
//! - [`format`] - Wire constants
//! - [`error`] - Error types for archive and decode failures
//!
//! # Load Path
//!
//! 1. [`Archive::open`] reads the header and table of contents
//! 2. [`Archive::scenario`] slices the byte range and applies the [`CipherKey`]
//! 3. [`decode::decode_scenario`] produces the element sequence
//! 4. The decoded [`Scenario`] is cached behind an [`std::sync::Arc`]
//!
//! # Example
//!
//! ```ignore
//! use vnscript_bytecode::{Archive, CipherKey, ScenarioId};
//!
//! let archive = Archive::open("SEEN.TXT", Some(CipherKey::identity()))?;
//! let scenario = archive.scenario(ScenarioId::new(42))?;
//! for element in scenario.elements() {
//!     println!("{element:?}");
//! }
//! ```

pub mod archive;
pub mod cipher;
pub mod decode;
pub mod element;
pub mod encode;
pub mod error;
pub mod format;
mod reader;
pub mod scenario;

pub use archive::{Archive, ArchiveWriter, ScenarioDescriptor, ScenarioSet, ScenarioSource};
pub use cipher::CipherKey;
pub use element::{
    Argument, BinaryOp, Command, Expr, InstructionElement, IntBank, IntVar, Marker, Payload,
    ScenarioId, TextEncoding, UnaryOp, MAX_OPCODE, MAX_SCENARIO_ID,
};
pub use error::{ArchiveError, DecodeError, DecodeFault, EncodeError, FormatFault, Result};
pub use scenario::Scenario;
