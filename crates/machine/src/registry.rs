//! Module registry and per-module opcode tables.
//!
//! Operations are grouped into modules identified by `(module type, module
//! number)`. Each module owns a hash table keyed by [`OpcodeKey`], so a
//! dispatch costs two hash lookups regardless of how many operations exist.
//!
//! Registration is last-writer-wins: title-specific overrides are layered on
//! top of the base modules by registering the same key again. Every override
//! is logged at `warn` level.

use std::collections::HashMap;
use std::fmt;

use tracing::{debug, trace, warn};
use vnscript_bytecode::Command;

use crate::error::{ExecutionError, RegistryError, Result};
use crate::machine::Machine;
use crate::modules;
use crate::opcode::OpcodeKey;
use crate::operation::Operation;

/// Fully qualified operation address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OperationAddress {
    /// Module type.
    pub module_type: u8,
    /// Module number.
    pub module_number: u8,
    /// Opcode within the module.
    pub opcode: u32,
    /// Overload of the opcode.
    pub overload: u8,
}

impl OperationAddress {
    /// Address a command dispatches to.
    pub fn of(command: &Command) -> Self {
        Self {
            module_type: command.module_type,
            module_number: command.module_number,
            opcode: command.opcode,
            overload: command.overload,
        }
    }
}

impl fmt::Display for OperationAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "opcode<{}:{}:{}, {}>",
            self.module_type, self.module_number, self.opcode, self.overload
        )
    }
}

/// A named operation bound to one key of one module.
pub struct OperationEntry {
    name: String,
    key: OpcodeKey,
    implemented: bool,
    operation: Box<dyn Operation>,
}

impl OperationEntry {
    /// Diagnostic name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Key the entry is bound to.
    pub fn key(&self) -> OpcodeKey {
        self.key
    }

    /// `false` for placeholders bound with [`ModuleRegistry::register_unsupported`].
    pub fn is_implemented(&self) -> bool {
        self.implemented
    }
}

impl fmt::Debug for OperationEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationEntry")
            .field("name", &self.name)
            .field("key", &self.key)
            .field("implemented", &self.implemented)
            .finish_non_exhaustive()
    }
}

/// One module and its opcode table.
#[derive(Debug)]
pub struct Module {
    module_type: u8,
    module_number: u8,
    name: String,
    operations: HashMap<OpcodeKey, OperationEntry>,
}

impl Module {
    fn new(module_type: u8, module_number: u8) -> Self {
        Self {
            module_type,
            module_number,
            name: format!("mod<{module_type}:{module_number}>"),
            operations: HashMap::new(),
        }
    }

    /// Module type.
    pub fn module_type(&self) -> u8 {
        self.module_type
    }

    /// Module number.
    pub fn module_number(&self) -> u8 {
        self.module_number
    }

    /// Human-readable name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of bound operations, placeholders included.
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// Whether no operation is bound.
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Entry bound to `key`.
    pub fn get(&self, key: OpcodeKey) -> Option<&OperationEntry> {
        self.operations.get(&key)
    }

    /// Entries in ascending key order.
    pub fn entries(&self) -> Vec<&OperationEntry> {
        let mut entries: Vec<_> = self.operations.values().collect();
        entries.sort_by_key(|entry| entry.key);
        entries
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mod<{},{}:{}>", self.name, self.module_type, self.module_number)
    }
}

/// Placeholder bound by [`ModuleRegistry::register_unsupported`].
struct Unsupported {
    name: String,
}

impl Operation for Unsupported {
    fn execute(&self, _machine: &mut Machine<'_>, _command: &Command) -> Result<()> {
        Err(ExecutionError::UnimplementedOpcode {
            name: self.name.clone(),
        })
    }
}

/// Owner of every module and operation the engine can dispatch to.
///
/// Built explicitly by the host during start-up and moved into the engine.
#[derive(Debug, Default)]
pub struct ModuleRegistry {
    modules: HashMap<(u8, u8), Module>,
}

impl ModuleRegistry {
    /// Registry without any module.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry populated with the built-in `Jmp`, `Sys` and `Mem` modules.
    pub fn standard() -> std::result::Result<Self, RegistryError> {
        let mut registry = Self::new();
        modules::register_base(&mut registry)?;
        Ok(registry)
    }

    /// Name a module, creating it if needed.
    pub fn declare_module(&mut self, module_type: u8, module_number: u8, name: impl Into<String>) -> &mut Self {
        let module = self.module_entry(module_type, module_number);
        module.name = name.into();
        debug!(module = %module, "declared module");
        self
    }

    /// Bind a function or closure to an opcode.
    ///
    /// An empty `name` is replaced by `opcode<type:number:opcode, overload>`.
    /// Re-registering a key replaces the previous entry.
    pub fn register<F>(
        &mut self,
        module_type: u8,
        module_number: u8,
        opcode: u32,
        overload: u8,
        name: impl Into<String>,
        handler: F,
    ) -> std::result::Result<&mut Self, RegistryError>
    where
        F: Fn(&mut Machine<'_>, &Command) -> Result<()> + Send + Sync + 'static,
    {
        self.register_operation(module_type, module_number, opcode, overload, name, handler)
    }

    /// Bind any [`Operation`] implementation to an opcode.
    pub fn register_operation(
        &mut self,
        module_type: u8,
        module_number: u8,
        opcode: u32,
        overload: u8,
        name: impl Into<String>,
        operation: impl Operation + 'static,
    ) -> std::result::Result<&mut Self, RegistryError> {
        let key = OpcodeKey::pack(opcode, overload)?;
        let mut name = name.into();
        if name.is_empty() {
            name = format!("opcode<{module_type}:{module_number}:{opcode}, {overload}>");
        }
        self.insert(
            module_type,
            module_number,
            OperationEntry {
                name,
                key,
                implemented: true,
                operation: Box::new(operation),
            },
        );
        Ok(self)
    }

    /// Bind a placeholder that fails with [`ExecutionError::UnimplementedOpcode`].
    ///
    /// The placeholder is named `"name", opcode<type:Module(number):opcode, overload>`
    /// using the module's current name.
    pub fn register_unsupported(
        &mut self,
        module_type: u8,
        module_number: u8,
        opcode: u32,
        overload: u8,
        name: &str,
    ) -> std::result::Result<&mut Self, RegistryError> {
        let key = OpcodeKey::pack(opcode, overload)?;
        let module_name = &self.module_entry(module_type, module_number).name;
        let full_name =
            format!("\"{name}\", opcode<{module_type}:{module_name}({module_number}):{opcode}, {overload}>");
        self.insert(
            module_type,
            module_number,
            OperationEntry {
                name: full_name.clone(),
                key,
                implemented: false,
                operation: Box::new(Unsupported { name: full_name }),
            },
        );
        Ok(self)
    }

    fn module_entry(&mut self, module_type: u8, module_number: u8) -> &mut Module {
        self.modules
            .entry((module_type, module_number))
            .or_insert_with(|| Module::new(module_type, module_number))
    }

    fn insert(&mut self, module_type: u8, module_number: u8, entry: OperationEntry) {
        let module = self.module_entry(module_type, module_number);
        let key = entry.key;
        let name = entry.name.clone();
        if let Some(previous) = module.operations.insert(key, entry) {
            warn!(
                module = %module,
                key = %key,
                previous = %previous.name,
                replacement = %name,
                "operation replaced by later registration"
            );
        } else {
            trace!(module = %module, key = %key, name = %name, "registered operation");
        }
    }

    /// Module registered under `(module_type, module_number)`.
    pub fn module(&self, module_type: u8, module_number: u8) -> Option<&Module> {
        self.modules.get(&(module_type, module_number))
    }

    /// All modules in ascending `(type, number)` order.
    pub fn modules(&self) -> Vec<&Module> {
        let mut modules: Vec<_> = self.modules.values().collect();
        modules.sort_by_key(|module| (module.module_type, module.module_number));
        modules
    }

    /// Entry bound to an address, if any.
    pub fn lookup(&self, address: OperationAddress) -> Option<&OperationEntry> {
        let key = OpcodeKey::pack(address.opcode, address.overload).ok()?;
        self.modules
            .get(&(address.module_type, address.module_number))?
            .get(key)
    }

    /// Diagnostic name of the operation at `address`.
    pub fn operation_name(&self, address: OperationAddress) -> Option<&str> {
        self.lookup(address).map(OperationEntry::name)
    }

    /// Invoke the operation bound to `command`'s address.
    ///
    /// Fails with [`ExecutionError::UndefinedOpcode`] without invoking anything
    /// when no operation is bound.
    pub fn dispatch(&self, machine: &mut Machine<'_>, command: &Command) -> Result<()> {
        let address = OperationAddress::of(command);
        let entry = self
            .lookup(address)
            .ok_or(ExecutionError::UndefinedOpcode {
                module_type: address.module_type,
                module_number: address.module_number,
                opcode: address.opcode,
                overload: address.overload,
            })?;
        trace!(ip = %machine.ip(), operation = %entry.name, %command, "dispatch");
        entry.operation.execute(machine, command)
    }
}
