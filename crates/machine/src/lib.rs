//! Opcode dispatch and execution for decoded scenarios.
//!
//! # Architecture
//!
//! - [`opcode`] - Packed `(opcode, overload)` keys
//! - [`registry`] - Modules, opcode tables and dispatch
//! - [`operation`] - The [`Operation`] capability handlers implement
//! - [`machine`] - Journaled view of the state handed to operations
//! - [`engine`] - Instruction pointer, call stack and the step loop
//! - [`modules`] - Built-in `Jmp`, `Sys` and `Mem` modules
//! - [`host`] - Collaborator callbacks implemented by the embedding host
//! - [`eval`] - Integer expression evaluation
//! - [`operand`] - Argument decoding helpers for operations
//!
//! # Example
//!
//! ```ignore
//! use vnscript_machine::{Engine, EngineConfig, ModuleRegistry, NullHost, Status};
//!
//! let registry = ModuleRegistry::standard()?;
//! let mut engine = Engine::new(registry, archive, EngineConfig::default())?;
//! while engine.run(&mut NullHost, 1000)? == Status::Running {}
//! ```

pub mod engine;
pub mod error;
pub mod eval;
pub mod host;
pub mod machine;
pub mod modules;
pub mod opcode;
pub mod operand;
pub mod operation;
pub mod registry;
pub mod state;

pub use engine::{Engine, EngineConfig, Status, DEFAULT_CALL_STACK_LIMIT};
pub use error::{ExecutionError, RegistryError, Result};
pub use host::{Host, NullHost, Value};
pub use machine::{Machine, WaitReason};
pub use opcode::OpcodeKey;
pub use operation::{Handler, Operation};
pub use registry::{Module, ModuleRegistry, OperationAddress, OperationEntry};
pub use state::{InstructionPointer, MachineState};
