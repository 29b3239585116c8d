//! Built-in operation modules.
//!
//! - [`jmp`] - Flow control inside and across scenarios
//! - [`sys`] - Program termination and wait points
//! - [`mem`] - Variable assignment
//!
//! Each module lists its operations as an [`OpSpec`] table; a spec without a
//! handler is registered as an unsupported placeholder.

use crate::error::RegistryError;
use crate::operation::Handler;
use crate::registry::ModuleRegistry;

/// Static description of one built-in operation.
#[derive(Debug, Clone, Copy)]
pub struct OpSpec {
    /// Opcode within the module.
    pub opcode: u32,
    /// Overload of the opcode.
    pub overload: u8,
    /// Diagnostic name.
    pub name: &'static str,
    /// Implementation, `None` for known but unsupported opcodes.
    pub handler: Option<Handler>,
}

/// Identity and operation table of a built-in module.
#[derive(Debug, Clone, Copy)]
pub struct ModuleSpec {
    /// Module type.
    pub module_type: u8,
    /// Module number.
    pub module_number: u8,
    /// Module name.
    pub name: &'static str,
    /// Operation table.
    pub operations: &'static [OpSpec],
}

macro_rules! op {
    ($opcode:expr, $overload:expr, $name:literal, unsupported) => {
        $crate::modules::OpSpec {
            opcode: $opcode,
            overload: $overload,
            name: $name,
            handler: None,
        }
    };
    ($opcode:expr, $overload:expr, $name:literal, $handler:path) => {
        $crate::modules::OpSpec {
            opcode: $opcode,
            overload: $overload,
            name: $name,
            handler: Some($handler),
        }
    };
}
pub(crate) use op;

pub mod jmp;
pub mod mem;
pub mod sys;

/// Every built-in module.
pub const BASE_MODULES: [ModuleSpec; 3] = [jmp::MODULE, sys::MODULE, mem::MODULE];

/// Declare a module and register its operation table.
pub fn register_module(registry: &mut ModuleRegistry, spec: &ModuleSpec) -> Result<(), RegistryError> {
    registry.declare_module(spec.module_type, spec.module_number, spec.name);
    for op in spec.operations {
        match op.handler {
            Some(handler) => {
                registry.register(
                    spec.module_type,
                    spec.module_number,
                    op.opcode,
                    op.overload,
                    op.name,
                    handler,
                )?;
            }
            None => {
                registry.register_unsupported(
                    spec.module_type,
                    spec.module_number,
                    op.opcode,
                    op.overload,
                    op.name,
                )?;
            }
        }
    }
    Ok(())
}

/// Register every built-in module.
pub fn register_base(registry: &mut ModuleRegistry) -> Result<(), RegistryError> {
    for spec in &BASE_MODULES {
        register_module(registry, spec)?;
    }
    Ok(())
}
