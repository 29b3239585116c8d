//! `Sys` module: termination and wait points.

use vnscript_bytecode::Command;

use super::{op, ModuleSpec};
use crate::error::{ExecutionError, Result};
use crate::machine::{Machine, WaitReason};
use crate::operand::operand_int;

pub const MODULE: ModuleSpec = ModuleSpec {
    module_type: 1,
    module_number: 4,
    name: "Sys",
    operations: &[
        op!(0, 0, "end", end),
        op!(17, 0, "pause", pause),
        op!(100, 0, "wait", wait),
        op!(300, 0, "title", unsupported),
    ],
};

fn end(machine: &mut Machine<'_>, _command: &Command) -> Result<()> {
    machine.halt();
    Ok(())
}

fn pause(machine: &mut Machine<'_>, _command: &Command) -> Result<()> {
    machine.wait(WaitReason::Input);
    Ok(())
}

fn wait(machine: &mut Machine<'_>, command: &Command) -> Result<()> {
    let value = operand_int(machine, command, 0)?;
    let milliseconds = u32::try_from(value).map_err(|_| {
        ExecutionError::invalid_operand(format!("{command}: negative wait {value}"))
    })?;
    machine.wait(WaitReason::Timer { milliseconds });
    Ok(())
}
