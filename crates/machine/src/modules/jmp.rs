//! `Jmp` module: labels, subroutines and scenario transfers.

use vnscript_bytecode::{Argument, Command};

use super::{op, ModuleSpec};
use crate::error::{ExecutionError, Result};
use crate::machine::Machine;
use crate::operand::{
    operand_entrypoint, operand_int, operand_label, operand_scenario, payload_array,
};

pub const MODULE: ModuleSpec = ModuleSpec {
    module_type: 0,
    module_number: 1,
    name: "Jmp",
    operations: &[
        op!(0, 0, "goto", goto),
        op!(1, 0, "goto_if", goto_if),
        op!(2, 0, "goto_unless", goto_unless),
        op!(3, 0, "goto_on", goto_on),
        op!(5, 0, "gosub", gosub),
        op!(6, 0, "gosub_if", gosub_if),
        op!(7, 0, "gosub_unless", gosub_unless),
        op!(10, 0, "ret", ret),
        op!(11, 0, "jump", jump),
        op!(12, 0, "farcall", farcall),
        op!(13, 0, "rtl", ret),
    ],
};

fn goto(machine: &mut Machine<'_>, command: &Command) -> Result<()> {
    machine.goto(operand_label(command, 0)?)
}

fn goto_if(machine: &mut Machine<'_>, command: &Command) -> Result<()> {
    let label = operand_label(command, 1)?;
    if operand_int(machine, command, 0)? != 0 {
        machine.goto(label)?;
    }
    Ok(())
}

fn goto_unless(machine: &mut Machine<'_>, command: &Command) -> Result<()> {
    let label = operand_label(command, 1)?;
    if operand_int(machine, command, 0)? == 0 {
        machine.goto(label)?;
    }
    Ok(())
}

/// Jump to the n-th label of the payload table; out-of-range values fall through.
fn goto_on(machine: &mut Machine<'_>, command: &Command) -> Result<()> {
    let selector = operand_int(machine, command, 0)?;
    let table = payload_array(command)?;
    let Some(entry) = usize::try_from(selector).ok().and_then(|i| table.get(i)) else {
        return Ok(());
    };
    match entry {
        Argument::Label(label) => machine.goto(*label),
        other => Err(ExecutionError::invalid_operand(format!(
            "{command}: jump table entry {selector} is {other}, expected a label"
        ))),
    }
}

fn gosub(machine: &mut Machine<'_>, command: &Command) -> Result<()> {
    machine.gosub(operand_label(command, 0)?)
}

fn gosub_if(machine: &mut Machine<'_>, command: &Command) -> Result<()> {
    let label = operand_label(command, 1)?;
    if operand_int(machine, command, 0)? != 0 {
        machine.gosub(label)?;
    }
    Ok(())
}

fn gosub_unless(machine: &mut Machine<'_>, command: &Command) -> Result<()> {
    let label = operand_label(command, 1)?;
    if operand_int(machine, command, 0)? == 0 {
        machine.gosub(label)?;
    }
    Ok(())
}

fn ret(machine: &mut Machine<'_>, _command: &Command) -> Result<()> {
    machine.ret();
    Ok(())
}

fn jump(machine: &mut Machine<'_>, command: &Command) -> Result<()> {
    let scenario = operand_scenario(machine, command, 0)?;
    let entrypoint = operand_entrypoint(machine, command, 1)?;
    machine.jump(scenario, entrypoint);
    Ok(())
}

fn farcall(machine: &mut Machine<'_>, command: &Command) -> Result<()> {
    let scenario = operand_scenario(machine, command, 0)?;
    let entrypoint = operand_entrypoint(machine, command, 1)?;
    machine.farcall(scenario, entrypoint);
    Ok(())
}
