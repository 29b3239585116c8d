//! Interpreter state that survives between steps.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use vnscript_bytecode::{IntBank, IntVar, ScenarioId};

/// Position of the next element to execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InstructionPointer {
    /// Scenario being executed.
    pub scenario: ScenarioId,
    /// Element index inside the scenario.
    pub index: usize,
}

impl InstructionPointer {
    /// Pointer to `index` in `scenario`.
    pub fn new(scenario: ScenarioId, index: usize) -> Self {
        Self { scenario, index }
    }

    /// The element after this one.
    pub fn next(self) -> Self {
        Self {
            index: self.index + 1,
            ..self
        }
    }
}

impl fmt::Display for InstructionPointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.scenario, self.index)
    }
}

/// Instruction pointer, call stack and variable memory.
///
/// Integer banks are sparse: variables that were never written read as `0`.
/// String variables that were never written read as empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineState {
    /// Next element to execute.
    pub ip: InstructionPointer,
    /// Return addresses, innermost last.
    pub call_stack: Vec<InstructionPointer>,
    /// Last line marker passed.
    pub line: Option<u16>,
    int_banks: BTreeMap<u8, BTreeMap<u32, i32>>,
    strings: BTreeMap<u32, Vec<u8>>,
}

impl MachineState {
    /// Fresh state positioned at `ip`.
    pub fn new(ip: InstructionPointer) -> Self {
        Self {
            ip,
            call_stack: Vec::new(),
            line: None,
            int_banks: BTreeMap::new(),
            strings: BTreeMap::new(),
        }
    }

    /// Value of an integer variable.
    pub fn int(&self, var: IntVar) -> i32 {
        self.int_banks
            .get(&var.bank.0)
            .and_then(|bank| bank.get(&var.index))
            .copied()
            .unwrap_or(0)
    }

    /// Value of a string variable.
    pub fn string(&self, index: u32) -> &[u8] {
        self.strings.get(&index).map(Vec::as_slice).unwrap_or_default()
    }

    /// Written variables of one bank in index order.
    pub fn bank(&self, bank: IntBank) -> impl Iterator<Item = (u32, i32)> + '_ {
        self.int_banks
            .get(&bank.0)
            .into_iter()
            .flat_map(|values| values.iter().map(|(index, value)| (*index, *value)))
    }

    pub(crate) fn set_int(&mut self, var: IntVar, value: i32) -> Option<i32> {
        self.int_banks.entry(var.bank.0).or_default().insert(var.index, value)
    }

    pub(crate) fn set_string(&mut self, index: u32, value: Vec<u8>) -> Option<Vec<u8>> {
        self.strings.insert(index, value)
    }

    /// Undo journaled writes, newest first.
    pub(crate) fn undo(&mut self, journal: Vec<Undo>) {
        for entry in journal.into_iter().rev() {
            match entry {
                Undo::Int { var, previous } => match previous {
                    Some(value) => {
                        self.set_int(var, value);
                    }
                    None => {
                        if let Some(bank) = self.int_banks.get_mut(&var.bank.0) {
                            bank.remove(&var.index);
                            if bank.is_empty() {
                                self.int_banks.remove(&var.bank.0);
                            }
                        }
                    }
                },
                Undo::Str { index, previous } => match previous {
                    Some(value) => {
                        self.strings.insert(index, value);
                    }
                    None => {
                        self.strings.remove(&index);
                    }
                },
            }
        }
    }
}

/// One reversible variable write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Undo {
    Int { var: IntVar, previous: Option<i32> },
    Str { index: u32, previous: Option<Vec<u8>> },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn start() -> MachineState {
        MachineState::new(InstructionPointer::new(ScenarioId::new(1), 0))
    }

    #[test]
    fn test_unset_variables_read_empty() {
        let state = start();
        assert_eq!(state.int(IntVar::new(3, 1000)), 0);
        assert_eq!(state.string(5), b"");
        assert_eq!(state.bank(IntBank(3)).count(), 0);
    }

    #[test]
    fn test_undo_restores_exact_state() {
        let mut state = start();
        state.set_int(IntVar::new(0, 1), 5);
        let before = state.clone();

        let journal = vec![
            Undo::Int {
                var: IntVar::new(0, 1),
                previous: state.set_int(IntVar::new(0, 1), 9),
            },
            Undo::Int {
                var: IntVar::new(2, 7),
                previous: state.set_int(IntVar::new(2, 7), 1),
            },
            Undo::Str {
                index: 0,
                previous: state.set_string(0, b"name".to_vec()),
            },
        ];
        assert_ne!(state, before);
        state.undo(journal);
        assert_eq!(state, before);
    }

    #[test]
    fn test_pointer_display() {
        let ip = InstructionPointer::new(ScenarioId::new(42), 7).next();
        assert_eq!(ip.to_string(), "scenario0042:8");
    }
}
