//! The single capability every opcode handler implements.

use vnscript_bytecode::Command;

use crate::error::Result;
use crate::machine::Machine;

/// Executes one decoded command against the machine.
///
/// Implemented for every `Fn(&mut Machine, &Command) -> Result<()>`, so plain
/// functions and closures can be registered directly.
pub trait Operation: Send + Sync {
    /// Run the operation.
    fn execute(&self, machine: &mut Machine<'_>, command: &Command) -> Result<()>;
}

impl<F> Operation for F
where
    F: Fn(&mut Machine<'_>, &Command) -> Result<()> + Send + Sync,
{
    fn execute(&self, machine: &mut Machine<'_>, command: &Command) -> Result<()> {
        self(machine, command)
    }
}

/// Function-pointer form used by the built-in modules.
pub type Handler = fn(&mut Machine<'_>, &Command) -> Result<()>;
