//! Errors raised while registering and executing operations.
//!
//! # Error Categories
//!
//! - **Dispatch errors**: [`ExecutionError::UndefinedOpcode`] (nothing bound to the key),
//!   [`ExecutionError::UnimplementedOpcode`] (a named placeholder is bound)
//! - **Control-flow errors**: [`ExecutionError::CallStackUnderflow`],
//!   [`ExecutionError::CallStackOverflow`], [`ExecutionError::UnknownLabel`],
//!   [`ExecutionError::UnknownEntrypoint`]
//! - **Operand errors**: [`ExecutionError::InvalidOperand`], [`ExecutionError::DivisionByZero`]
//! - **Collaborator errors**: [`ExecutionError::SideEffect`]
//! - **Load errors**: [`ExecutionError::Archive`], wrapping the archive's own taxonomy
//!
//! None of these is fatal to the process. When the engine returns one from a
//! step, the machine state is exactly what it was before the step began, and
//! the host decides whether to stop or skip the instruction.

use thiserror::Error;
use vnscript_bytecode::{ArchiveError, ScenarioId};

/// Execution result type alias.
pub type Result<T> = std::result::Result<T, ExecutionError>;

/// Failure while registering an operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// The opcode does not fit in the 24 bits of a packed key.
    #[error("opcode {opcode} exceeds 24 bits")]
    OpcodeOutOfRange {
        /// The rejected opcode.
        opcode: u32,
    },
}

/// Failure while executing one instruction.
#[derive(Debug, Error)]
pub enum ExecutionError {
    /// No operation is registered for the command's module and key.
    #[error("undefined opcode<{module_type}:{module_number}:{opcode}, {overload}>")]
    UndefinedOpcode {
        /// Module type of the command.
        module_type: u8,
        /// Module number of the command.
        module_number: u8,
        /// Opcode of the command.
        opcode: u32,
        /// Overload of the command.
        overload: u8,
    },

    /// The opcode is known but bound to a placeholder.
    #[error("unimplemented operation {name}")]
    UnimplementedOpcode {
        /// Diagnostic name of the placeholder.
        name: String,
    },

    /// A return was executed with an empty call stack.
    #[error("return with empty call stack")]
    CallStackUnderflow,

    /// A call would push the stack past its configured depth.
    #[error("call stack exceeds {limit} frames")]
    CallStackOverflow {
        /// Configured maximum depth.
        limit: usize,
    },

    /// A jump referenced a label the current scenario does not define.
    #[error("{scenario} has no label {label}")]
    UnknownLabel {
        /// Scenario that was searched.
        scenario: ScenarioId,
        /// Missing label.
        label: u32,
    },

    /// A cross-scenario transfer referenced an undeclared entrypoint.
    #[error("{scenario} has no entrypoint {entrypoint}")]
    UnknownEntrypoint {
        /// Target scenario.
        scenario: ScenarioId,
        /// Missing entrypoint.
        entrypoint: u8,
    },

    /// An argument is missing or has the wrong type for the operation.
    #[error("invalid operand: {message}")]
    InvalidOperand {
        /// What was expected and what was found.
        message: String,
    },

    /// Integer division or remainder by zero in an expression.
    #[error("division by zero")]
    DivisionByZero,

    /// A host collaborator rejected a side effect.
    #[error("side effect {name} failed: {message}")]
    SideEffect {
        /// Side-effect name passed to the host.
        name: String,
        /// Host-provided reason.
        message: String,
    },

    /// Loading a scenario failed.
    #[error(transparent)]
    Archive(#[from] ArchiveError),
}

impl ExecutionError {
    /// Shorthand for [`ExecutionError::InvalidOperand`].
    pub fn invalid_operand(message: impl Into<String>) -> Self {
        Self::InvalidOperand {
            message: message.into(),
        }
    }
}
