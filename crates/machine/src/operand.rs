//! Argument decoding helpers shared by the built-in modules.
//!
//! Every helper fails with [`ExecutionError::InvalidOperand`] naming the
//! command and argument position when the argument is missing or mistyped.

use vnscript_bytecode::{Argument, Command, Expr, IntVar, Payload, ScenarioId, MAX_SCENARIO_ID};

use crate::error::{ExecutionError, Result};
use crate::machine::Machine;

/// Argument at `index`.
pub fn operand(command: &Command, index: usize) -> Result<&Argument> {
    command.arguments.get(index).ok_or_else(|| {
        ExecutionError::invalid_operand(format!(
            "{command} expects at least {} arguments",
            index + 1
        ))
    })
}

fn mismatch(command: &Command, index: usize, expected: &str, found: &Argument) -> ExecutionError {
    ExecutionError::invalid_operand(format!(
        "{command} argument {index}: expected {expected}, found {found}"
    ))
}

/// Integer value of argument `index`.
pub fn operand_int(machine: &Machine<'_>, command: &Command, index: usize) -> Result<i32> {
    let argument = operand(command, index)?;
    match argument {
        Argument::Int(_) | Argument::IntVar(_) | Argument::Expr(_) => machine.int(argument),
        other => Err(mismatch(command, index, "integer", other)),
    }
}

/// Integer value of argument `index`, or `default` when the command has fewer arguments.
pub fn operand_int_or(machine: &Machine<'_>, command: &Command, index: usize, default: i32) -> Result<i32> {
    if index < command.arguments.len() {
        operand_int(machine, command, index)
    } else {
        Ok(default)
    }
}

/// Integer variable named by argument `index`.
pub fn operand_int_var(command: &Command, index: usize) -> Result<IntVar> {
    match operand(command, index)? {
        Argument::IntVar(var) | Argument::Expr(Expr::Var(var)) => Ok(*var),
        other => Err(mismatch(command, index, "integer variable", other)),
    }
}

/// String variable index named by argument `index`.
pub fn operand_str_var(command: &Command, index: usize) -> Result<u32> {
    match operand(command, index)? {
        Argument::StrVar(var) => Ok(*var),
        other => Err(mismatch(command, index, "string variable", other)),
    }
}

/// String value of argument `index`.
pub fn operand_string(machine: &Machine<'_>, command: &Command, index: usize) -> Result<Vec<u8>> {
    let argument = operand(command, index)?;
    match argument {
        Argument::Str(_) | Argument::StrVar(_) => machine.string(argument),
        other => Err(mismatch(command, index, "string", other)),
    }
}

/// Label named by argument `index`.
pub fn operand_label(command: &Command, index: usize) -> Result<u32> {
    match operand(command, index)? {
        Argument::Label(label) => Ok(*label),
        other => Err(mismatch(command, index, "label", other)),
    }
}

/// Scenario id computed from argument `index`.
pub fn operand_scenario(machine: &Machine<'_>, command: &Command, index: usize) -> Result<ScenarioId> {
    let value = operand_int(machine, command, index)?;
    u16::try_from(value)
        .ok()
        .filter(|id| *id <= MAX_SCENARIO_ID)
        .map(ScenarioId::new)
        .ok_or_else(|| {
            ExecutionError::invalid_operand(format!("{command}: scenario id {value} out of range"))
        })
}

/// Entrypoint computed from argument `index`, `0` when absent.
pub fn operand_entrypoint(machine: &Machine<'_>, command: &Command, index: usize) -> Result<u8> {
    let value = operand_int_or(machine, command, index, 0)?;
    u8::try_from(value).map_err(|_| {
        ExecutionError::invalid_operand(format!("{command}: entrypoint {value} out of range"))
    })
}

/// Items of the command's array payload.
pub fn payload_array(command: &Command) -> Result<&[Argument]> {
    match &command.payload {
        Some(Payload::Array(items)) => Ok(items),
        _ => Err(ExecutionError::invalid_operand(format!(
            "{command} expects an array payload"
        ))),
    }
}
