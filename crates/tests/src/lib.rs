//! Integration test harness for the scenario interpreter.
//!
//! Builds real archives on disk, opens them through [`HostConfig`] the way an
//! embedding host would, and drives an [`Engine`] against a [`RecordingHost`]
//! that captures every host callback in order.

use std::path::{Path, PathBuf};
use std::sync::Once;

use tempfile::TempDir;
use tracing_subscriber::EnvFilter;
use vnscript_bytecode::{
    Argument, ArchiveWriter, CipherKey, Command, InstructionElement, IntVar, Marker, Scenario,
    ScenarioId, TextEncoding,
};
use vnscript_config::HostConfig;
use vnscript_machine::{
    Engine, ExecutionError, Host, MachineState, ModuleRegistry, Status, Value,
};

/// Install a test-friendly tracing subscriber once per process.
///
/// Honors `RUST_LOG`; defaults to `warn`.
pub fn init_test_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
            )
            .with_test_writer()
            .try_init();
    });
}

/// Callback observed by a [`RecordingHost`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    /// A line marker was reached.
    Line(u16),
    /// A raw text element was reached.
    Text(Vec<u8>),
    /// An operation invoked a side effect.
    SideEffect(String, Vec<Value>),
}

/// Host that records every callback and answers side effects with a fixed value.
#[derive(Debug, Default)]
pub struct RecordingHost {
    /// Events in the order they happened.
    pub events: Vec<HostEvent>,
    /// Value returned from every side effect.
    pub reply: Option<Value>,
}

impl RecordingHost {
    /// Text elements seen so far, decoded lossily as UTF-8.
    pub fn text(&self) -> Vec<String> {
        self.events
            .iter()
            .filter_map(|event| match event {
                HostEvent::Text(bytes) => Some(String::from_utf8_lossy(bytes).into_owned()),
                _ => None,
            })
            .collect()
    }
}

impl Host for RecordingHost {
    fn side_effect(&mut self, name: &str, args: &[Value]) -> Result<Option<Value>, ExecutionError> {
        self.events
            .push(HostEvent::SideEffect(name.to_string(), args.to_vec()));
        Ok(self.reply.clone())
    }

    fn text(&mut self, text: &[u8], _encoding: TextEncoding) -> Result<(), ExecutionError> {
        self.events.push(HostEvent::Text(text.to_vec()));
        Ok(())
    }

    fn line(&mut self, line: u16) {
        self.events.push(HostEvent::Line(line));
    }
}

/// An archive written to a temporary directory.
pub struct ArchiveFixture {
    dir: TempDir,
    path: PathBuf,
}

impl ArchiveFixture {
    /// Write `scenarios` into a fresh archive ciphered with `key`.
    ///
    /// # Panics
    ///
    /// Panics if the temporary directory or archive cannot be written.
    pub fn build(key: &CipherKey, scenarios: &[Scenario]) -> Self {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let path = dir.path().join("SEEN.TXT");
        let mut writer = ArchiveWriter::new(key.clone());
        for scenario in scenarios {
            writer
                .add_scenario(scenario)
                .expect("fixture scenario must encode");
        }
        writer.write_to(&path).expect("failed to write archive");
        Self { dir, path }
    }

    /// Path of the archive file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory holding the archive, for sibling files such as configs.
    pub fn dir(&self) -> &Path {
        self.dir.path()
    }
}

/// Engine plus recording host, opened from an archive through a host config.
pub struct TestHarness {
    /// Engine under test.
    pub engine: Engine,
    /// Host receiving callbacks.
    pub host: RecordingHost,
}

impl TestHarness {
    /// Open `archive` with `config` and the standard module registry.
    ///
    /// # Panics
    ///
    /// Panics if the archive cannot be opened or the entry point is missing.
    pub fn open(config: &HostConfig, archive: &Path) -> Self {
        init_test_logging();
        let archive = config
            .open_archive(archive)
            .expect("failed to open archive");
        let registry = ModuleRegistry::standard().expect("standard registry must build");
        let engine = Engine::new(registry, archive, config.engine_config())
            .expect("failed to create engine");
        Self {
            engine,
            host: RecordingHost::default(),
        }
    }

    /// Run until the engine stops or `budget` elements were executed.
    pub fn run(&mut self, budget: usize) -> Result<Status, ExecutionError> {
        self.engine.run(&mut self.host, budget)
    }

    /// Run, resuming every wait point, until the program terminates.
    ///
    /// # Panics
    ///
    /// Panics on an execution error or if the program does not terminate
    /// within `budget` elements.
    pub fn run_to_end(&mut self, budget: usize) -> usize {
        let mut waits = 0;
        for _ in 0..budget {
            match self.engine.step(&mut self.host).expect("execution failed") {
                Status::Terminated => return waits,
                Status::Waiting(_) => {
                    waits += 1;
                    self.engine.resume();
                }
                Status::Running => {}
            }
        }
        panic!("program did not terminate within {budget} elements");
    }

    /// Current machine state.
    pub fn state(&self) -> &MachineState {
        self.engine.state()
    }

    /// Integer variable value.
    pub fn int(&self, bank: u8, index: u32) -> i32 {
        self.engine.state().int(IntVar::new(bank, index))
    }
}

/// Shorthand constructors for fixture scenarios.
pub mod program {
    use super::*;

    /// Scenario in UTF-8 from a list of elements.
    pub fn scenario(id: u16, elements: Vec<InstructionElement>) -> Scenario {
        Scenario::new(ScenarioId::new(id), TextEncoding::Utf8, elements)
    }

    /// Command of the given module with positional arguments.
    pub fn command(module: (u8, u8), opcode: u32, arguments: Vec<Argument>) -> InstructionElement {
        Command::new(module.0, module.1, opcode, 0)
            .with_arguments(arguments)
            .into()
    }

    /// Jump module address.
    pub const JMP: (u8, u8) = (0, 1);
    /// System module address.
    pub const SYS: (u8, u8) = (1, 4);
    /// Memory module address.
    pub const MEM: (u8, u8) = (1, 11);

    pub fn line(line: u16) -> InstructionElement {
        Marker::Line(line).into()
    }

    pub fn entrypoint(entrypoint: u8) -> InstructionElement {
        Marker::Entrypoint(entrypoint).into()
    }

    pub fn label(label: u32) -> InstructionElement {
        Marker::Label(label).into()
    }

    pub fn text(text: &str) -> InstructionElement {
        InstructionElement::RawData(text.as_bytes().to_vec())
    }

    pub fn set(bank: u8, index: u32, value: i32) -> InstructionElement {
        command(
            MEM,
            0,
            vec![Argument::IntVar(IntVar::new(bank, index)), Argument::Int(value)],
        )
    }

    pub fn add(bank: u8, index: u32, value: i32) -> InstructionElement {
        command(
            MEM,
            3,
            vec![Argument::IntVar(IntVar::new(bank, index)), Argument::Int(value)],
        )
    }

    pub fn end() -> InstructionElement {
        command(SYS, 0, vec![])
    }

    pub fn pause() -> InstructionElement {
        command(SYS, 17, vec![])
    }

    pub fn gosub(label: u32) -> InstructionElement {
        command(JMP, 5, vec![Argument::Label(label)])
    }

    pub fn goto_if(condition: Argument, label: u32) -> InstructionElement {
        command(JMP, 1, vec![condition, Argument::Label(label)])
    }

    pub fn ret() -> InstructionElement {
        command(JMP, 10, vec![])
    }

    pub fn farcall(scenario: i32, entrypoint: i32) -> InstructionElement {
        command(JMP, 12, vec![Argument::Int(scenario), Argument::Int(entrypoint)])
    }

    pub fn jump(scenario: i32, entrypoint: i32) -> InstructionElement {
        command(JMP, 11, vec![Argument::Int(scenario), Argument::Int(entrypoint)])
    }
}
