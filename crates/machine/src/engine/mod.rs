//! Execution engine.
//!
//! The engine owns the [`ModuleRegistry`], a [`ScenarioSource`] and the
//! [`MachineState`], and advances one element per [`Engine::step`].
//!
//! # Step Semantics
//!
//! - `Command` elements are dispatched through the registry. The pointer moves
//!   to the next element unless the operation staged a transfer.
//! - `Marker::Line` records the line and notifies the host; other markers are skipped.
//! - `RawData` is handed to [`Host::text`].
//! - Past the last element, a non-empty call stack returns implicitly; an empty
//!   one terminates the program.
//!
//! # Atomicity
//!
//! A step either completes or leaves the state exactly as it found it.
//! Variable writes are journaled by [`Machine`] and undone on failure, and
//! control transfers are resolved completely before any of them is applied.

use std::sync::Arc;

use tracing::{debug, info, instrument, trace};
use vnscript_bytecode::{Command, InstructionElement, Marker, Scenario, ScenarioId, ScenarioSource};

use crate::error::{ExecutionError, Result};
use crate::host::Host;
use crate::machine::{Machine, Target, Transfer, WaitReason};
use crate::registry::ModuleRegistry;
use crate::state::{InstructionPointer, MachineState};

/// Default maximum call stack depth.
pub const DEFAULT_CALL_STACK_LIMIT: usize = 256;

/// Engine start-up parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Scenario execution starts in.
    pub entry_scenario: ScenarioId,
    /// Entrypoint inside the entry scenario.
    pub entrypoint: u8,
    /// Maximum number of pending return addresses.
    pub call_stack_limit: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            entry_scenario: ScenarioId::new(1),
            entrypoint: 0,
            call_stack_limit: DEFAULT_CALL_STACK_LIMIT,
        }
    }
}

/// Engine status after a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    /// More instructions are ready to run.
    Running,
    /// An operation raised a wait point; call [`Engine::resume`] to continue.
    Waiting(WaitReason),
    /// The program ended.
    Terminated,
}

/// Interpreter for decoded scenarios.
pub struct Engine {
    registry: ModuleRegistry,
    source: Box<dyn ScenarioSource>,
    config: EngineConfig,
    entry: InstructionPointer,
    state: MachineState,
    status: Status,
    current: Option<Arc<Scenario>>,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .field("state", &self.state)
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

impl Engine {
    /// Create an engine positioned at the configured entry point.
    pub fn new(
        registry: ModuleRegistry,
        source: impl ScenarioSource + 'static,
        config: EngineConfig,
    ) -> Result<Self> {
        let source: Box<dyn ScenarioSource> = Box::new(source);
        let scenario = source.scenario(config.entry_scenario)?;
        let entry = entry_pointer(&scenario, config.entrypoint)?;
        info!(
            entry = %entry,
            modules = registry.modules().len(),
            call_stack_limit = config.call_stack_limit,
            "engine created"
        );
        Ok(Self {
            registry,
            source,
            config,
            entry,
            state: MachineState::new(entry),
            status: Status::Running,
            current: Some(scenario),
        })
    }

    /// Registry operations are dispatched through.
    pub fn registry(&self) -> &ModuleRegistry {
        &self.registry
    }

    /// Configuration the engine was created with.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Current machine state.
    pub fn state(&self) -> &MachineState {
        &self.state
    }

    /// Current status.
    pub fn status(&self) -> Status {
        self.status
    }

    /// Replace the machine state, e.g. when loading a saved game.
    pub fn restore(&mut self, state: MachineState) {
        debug!(ip = %state.ip, depth = state.call_stack.len(), "state restored");
        self.state = state;
        self.status = Status::Running;
    }

    /// Reinitialize the state at the entry point.
    pub fn reset(&mut self) {
        debug!(entry = %self.entry, "engine reset");
        self.state = MachineState::new(self.entry);
        self.status = Status::Running;
    }

    /// Clear a wait point.
    pub fn resume(&mut self) {
        if let Status::Waiting(reason) = self.status {
            trace!(?reason, "resumed");
            self.status = Status::Running;
        }
    }

    /// Move past the current element without executing it.
    ///
    /// Used by hosts that choose to skip an instruction that failed.
    pub fn skip_instruction(&mut self) {
        debug!(ip = %self.state.ip, "instruction skipped");
        self.state.ip = self.state.ip.next();
    }

    /// Execute one element.
    ///
    /// Returns the status without doing anything when the engine is waiting
    /// or terminated.
    #[instrument(level = "trace", skip_all, fields(ip = %self.state.ip))]
    pub fn step(&mut self, host: &mut dyn Host) -> Result<Status> {
        if self.status != Status::Running {
            return Ok(self.status);
        }
        let ip = self.state.ip;
        let scenario = self.scenario(ip.scenario)?;

        match scenario.element(ip.index) {
            None => self.fall_off_end(ip)?,
            Some(InstructionElement::Marker(Marker::Line(line))) => {
                host.line(*line);
                self.state.line = Some(*line);
                self.state.ip = ip.next();
            }
            Some(InstructionElement::Marker(_)) => self.state.ip = ip.next(),
            Some(InstructionElement::RawData(bytes)) => {
                host.text(bytes, scenario.encoding())?;
                self.state.ip = ip.next();
            }
            Some(InstructionElement::Command(command)) => {
                self.execute(&scenario, command, host)?;
            }
        }
        Ok(self.status)
    }

    /// Step until the engine stops running or `budget` elements were executed.
    #[instrument(skip_all, fields(budget = budget))]
    pub fn run(&mut self, host: &mut dyn Host, budget: usize) -> Result<Status> {
        for _ in 0..budget {
            if self.step(host)? != Status::Running {
                break;
            }
        }
        Ok(self.status)
    }

    fn execute(&mut self, scenario: &Scenario, command: &Command, host: &mut dyn Host) -> Result<()> {
        let mut machine = Machine::new(&mut self.state, host, scenario);
        if let Err(err) = self.registry.dispatch(&mut machine, command) {
            machine.rollback();
            return Err(err);
        }
        let outcome = machine.finish();

        let ip = self.state.ip;
        let applied = match outcome.transfer {
            None => {
                self.state.ip = ip.next();
                Ok(())
            }
            Some(Transfer::Goto(target)) => self.resolve(target).map(|target| {
                self.state.ip = target;
            }),
            Some(Transfer::Call(target)) => self.call(ip, target),
            Some(Transfer::Return) => self.ret(),
            Some(Transfer::Halt) => {
                self.status = Status::Terminated;
                Ok(())
            }
        };
        if let Err(err) = applied {
            self.state.undo(outcome.journal);
            return Err(err);
        }

        if let Some(reason) = outcome.wait {
            if self.status == Status::Running {
                self.status = Status::Waiting(reason);
            }
        }
        if self.status == Status::Terminated {
            info!(ip = %ip, "program ended");
        }
        Ok(())
    }

    fn call(&mut self, ip: InstructionPointer, target: Target) -> Result<()> {
        if self.state.call_stack.len() >= self.config.call_stack_limit {
            return Err(ExecutionError::CallStackOverflow {
                limit: self.config.call_stack_limit,
            });
        }
        let target = self.resolve(target)?;
        self.state.call_stack.push(ip.next());
        self.state.ip = target;
        Ok(())
    }

    fn ret(&mut self) -> Result<()> {
        let address = self
            .state
            .call_stack
            .pop()
            .ok_or(ExecutionError::CallStackUnderflow)?;
        self.state.ip = address;
        Ok(())
    }

    fn fall_off_end(&mut self, ip: InstructionPointer) -> Result<()> {
        if self.state.call_stack.is_empty() {
            info!(ip = %ip, "program ended");
            self.status = Status::Terminated;
            Ok(())
        } else {
            trace!(ip = %ip, "implicit return at end of scenario");
            self.ret()
        }
    }

    fn resolve(&mut self, target: Target) -> Result<InstructionPointer> {
        match target {
            Target::Element(ip) => Ok(ip),
            Target::Entrypoint {
                scenario,
                entrypoint,
            } => {
                let loaded = self.scenario(scenario)?;
                entry_pointer(&loaded, entrypoint)
            }
        }
    }

    fn scenario(&mut self, id: ScenarioId) -> Result<Arc<Scenario>> {
        if let Some(current) = &self.current {
            if current.id() == id {
                return Ok(Arc::clone(current));
            }
        }
        let scenario = self.source.scenario(id)?;
        debug!(%id, elements = scenario.len(), "scenario loaded");
        self.current = Some(Arc::clone(&scenario));
        Ok(scenario)
    }
}

fn entry_pointer(scenario: &Scenario, entrypoint: u8) -> Result<InstructionPointer> {
    let index = scenario
        .entrypoint(entrypoint)
        .ok_or(ExecutionError::UnknownEntrypoint {
            scenario: scenario.id(),
            entrypoint,
        })?;
    Ok(InstructionPointer::new(scenario.id(), index))
}
