//! Handler-facing view of the machine state.

use tracing::trace;
use vnscript_bytecode::{Argument, Expr, IntBank, IntVar, Scenario, ScenarioId, TextEncoding};

use crate::error::{ExecutionError, Result};
use crate::eval::evaluate;
use crate::host::{Host, Value};
use crate::state::{InstructionPointer, MachineState, Undo};

/// Why the engine stopped and handed control back to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WaitReason {
    /// Wait for the player to acknowledge (click or key press).
    Input,
    /// Wait for a fixed time.
    Timer {
        /// Requested delay.
        milliseconds: u32,
    },
}

/// Where a staged transfer lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Target {
    /// Already resolved element in the current scenario.
    Element(InstructionPointer),
    /// Entrypoint of a scenario that may not be loaded yet.
    Entrypoint { scenario: ScenarioId, entrypoint: u8 },
}

/// Control transfer requested by an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Transfer {
    Goto(Target),
    Call(Target),
    Return,
    Halt,
}

/// Everything an operation changed, handed back to the engine on success.
#[derive(Debug)]
pub(crate) struct Outcome {
    pub(crate) journal: Vec<Undo>,
    pub(crate) transfer: Option<Transfer>,
    pub(crate) wait: Option<WaitReason>,
}

/// View of [`MachineState`] handed to operations.
///
/// Variable writes are applied immediately and journaled so the engine can
/// undo them when the operation fails. Control transfers are only staged here;
/// the engine applies them after the operation returns `Ok`. Staging a second
/// transfer replaces the first.
pub struct Machine<'a> {
    state: &'a mut MachineState,
    host: &'a mut dyn Host,
    scenario: &'a Scenario,
    journal: Vec<Undo>,
    transfer: Option<Transfer>,
    wait: Option<WaitReason>,
}

impl<'a> Machine<'a> {
    pub(crate) fn new(state: &'a mut MachineState, host: &'a mut dyn Host, scenario: &'a Scenario) -> Self {
        Self {
            state,
            host,
            scenario,
            journal: Vec::new(),
            transfer: None,
            wait: None,
        }
    }

    /// Read-only access to the whole state.
    pub fn state(&self) -> &MachineState {
        self.state
    }

    /// Pointer of the instruction being executed.
    pub fn ip(&self) -> InstructionPointer {
        self.state.ip
    }

    /// Scenario the executing instruction belongs to.
    pub fn scenario(&self) -> &Scenario {
        self.scenario
    }

    /// Text encoding of the executing scenario.
    pub fn encoding(&self) -> TextEncoding {
        self.scenario.encoding()
    }

    pub fn read_integer_variable(&self, bank: IntBank, index: u32) -> i32 {
        self.state.int(IntVar { bank, index })
    }

    pub fn write_integer_variable(&mut self, bank: IntBank, index: u32, value: i32) {
        let var = IntVar { bank, index };
        let previous = self.state.set_int(var, value);
        self.journal.push(Undo::Int { var, previous });
    }

    pub fn read_string_variable(&self, index: u32) -> &[u8] {
        self.state.string(index)
    }

    pub fn write_string_variable(&mut self, index: u32, value: Vec<u8>) {
        let previous = self.state.set_string(index, value);
        self.journal.push(Undo::Str { index, previous });
    }

    /// Forward a named side effect to the host.
    pub fn invoke_side_effect(&mut self, name: &str, args: &[Value]) -> Result<Option<Value>> {
        trace!(name, args = args.len(), "side effect");
        self.host.side_effect(name, args)
    }

    /// Evaluate an expression against the current variables.
    pub fn eval(&self, expr: &Expr) -> Result<i32> {
        let state = &*self.state;
        evaluate(expr, &|var: IntVar| state.int(var))
    }

    /// Integer value of an argument (literal, variable or expression).
    pub fn int(&self, argument: &Argument) -> Result<i32> {
        match argument {
            Argument::Int(value) => Ok(*value),
            Argument::IntVar(var) => Ok(self.state.int(*var)),
            Argument::Expr(expr) => self.eval(expr),
            other => Err(ExecutionError::invalid_operand(format!(
                "expected integer, found {other}"
            ))),
        }
    }

    /// String value of an argument (literal or string variable).
    pub fn string(&self, argument: &Argument) -> Result<Vec<u8>> {
        match argument {
            Argument::Str(bytes) => Ok(bytes.clone()),
            Argument::StrVar(index) => Ok(self.state.string(*index).to_vec()),
            other => Err(ExecutionError::invalid_operand(format!(
                "expected string, found {other}"
            ))),
        }
    }

    /// Continue at `label` in the current scenario.
    pub fn goto(&mut self, label: u32) -> Result<()> {
        let target = self.label_target(label)?;
        self.transfer = Some(Transfer::Goto(target));
        Ok(())
    }

    /// Call the subroutine at `label`; the return address is the next element.
    pub fn gosub(&mut self, label: u32) -> Result<()> {
        let target = self.label_target(label)?;
        self.transfer = Some(Transfer::Call(target));
        Ok(())
    }

    /// Continue at an entrypoint of another scenario without a return address.
    pub fn jump(&mut self, scenario: ScenarioId, entrypoint: u8) {
        self.transfer = Some(Transfer::Goto(Target::Entrypoint { scenario, entrypoint }));
    }

    /// Call an entrypoint of another scenario.
    pub fn farcall(&mut self, scenario: ScenarioId, entrypoint: u8) {
        self.transfer = Some(Transfer::Call(Target::Entrypoint { scenario, entrypoint }));
    }

    /// Return to the innermost return address.
    pub fn ret(&mut self) {
        self.transfer = Some(Transfer::Return);
    }

    /// Terminate the program.
    pub fn halt(&mut self) {
        self.transfer = Some(Transfer::Halt);
    }

    /// Suspend after this instruction until the host resumes the engine.
    pub fn wait(&mut self, reason: WaitReason) {
        self.wait = Some(reason);
    }

    fn label_target(&self, label: u32) -> Result<Target> {
        let index = self
            .scenario
            .label(label)
            .ok_or(ExecutionError::UnknownLabel {
                scenario: self.scenario.id(),
                label,
            })?;
        Ok(Target::Element(InstructionPointer::new(self.scenario.id(), index)))
    }

    /// Undo every write made through this view.
    pub(crate) fn rollback(&mut self) {
        let journal = std::mem::take(&mut self.journal);
        self.state.undo(journal);
    }

    pub(crate) fn finish(self) -> Outcome {
        Outcome {
            journal: self.journal,
            transfer: self.transfer,
            wait: self.wait,
        }
    }
}
