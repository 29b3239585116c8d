//! `Mem` module: variable assignment.

use vnscript_bytecode::{Command, IntBank};

use super::{op, ModuleSpec};
use crate::error::{ExecutionError, Result};
use crate::machine::Machine;
use crate::operand::{operand_int, operand_int_var, operand_str_var, operand_string};

/// Largest number of variables a single `setrng` may touch.
pub const MAX_RANGE_FILL: u32 = 1 << 16;

pub const MODULE: ModuleSpec = ModuleSpec {
    module_type: 1,
    module_number: 11,
    name: "Mem",
    operations: &[
        op!(0, 0, "set", set),
        op!(1, 0, "set_str", set_str),
        op!(2, 0, "setrng", setrng),
        op!(3, 0, "add", add),
    ],
};

fn set(machine: &mut Machine<'_>, command: &Command) -> Result<()> {
    let var = operand_int_var(command, 0)?;
    let value = operand_int(machine, command, 1)?;
    machine.write_integer_variable(var.bank, var.index, value);
    Ok(())
}

fn set_str(machine: &mut Machine<'_>, command: &Command) -> Result<()> {
    let index = operand_str_var(command, 0)?;
    let value = operand_string(machine, command, 1)?;
    machine.write_string_variable(index, value);
    Ok(())
}

/// `setrng(bank, first, last, value)` fills `bank[first..=last]`.
fn setrng(machine: &mut Machine<'_>, command: &Command) -> Result<()> {
    let bank = operand_int(machine, command, 0)?;
    let first = operand_int(machine, command, 1)?;
    let last = operand_int(machine, command, 2)?;
    let value = operand_int(machine, command, 3)?;

    let bank = u8::try_from(bank)
        .map(IntBank)
        .map_err(|_| ExecutionError::invalid_operand(format!("{command}: bank {bank} out of range")))?;
    let (Ok(first), Ok(last)) = (u32::try_from(first), u32::try_from(last)) else {
        return Err(ExecutionError::invalid_operand(format!(
            "{command}: negative range {first}..={last}"
        )));
    };
    if last < first || last - first >= MAX_RANGE_FILL {
        return Err(ExecutionError::invalid_operand(format!(
            "{command}: invalid range {first}..={last}"
        )));
    }
    for index in first..=last {
        machine.write_integer_variable(bank, index, value);
    }
    Ok(())
}

fn add(machine: &mut Machine<'_>, command: &Command) -> Result<()> {
    let var = operand_int_var(command, 0)?;
    let delta = operand_int(machine, command, 1)?;
    let current = machine.read_integer_variable(var.bank, var.index);
    machine.write_integer_variable(var.bank, var.index, current.wrapping_add(delta));
    Ok(())
}
