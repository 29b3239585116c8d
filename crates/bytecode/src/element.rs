//! Decoded instruction elements.
//!
//! A scenario decodes into a flat sequence of [`InstructionElement`]s. Elements
//! are either commands dispatched through the module registry, markers that
//! annotate positions in the stream, or raw text passed through untouched.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Largest opcode number a command can carry (24 bits).
pub const MAX_OPCODE: u32 = 0x00FF_FFFF;

/// Largest scenario id an archive may index.
pub const MAX_SCENARIO_ID: u16 = 9999;

/// Identifier of one scenario inside an archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ScenarioId(pub u16);

impl ScenarioId {
    /// Create a scenario id.
    pub const fn new(id: u16) -> Self {
        Self(id)
    }

    /// Raw numeric id.
    pub const fn get(self) -> u16 {
        self.0
    }
}

impl fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "scenario{:04}", self.0)
    }
}

impl From<u16> for ScenarioId {
    fn from(id: u16) -> Self {
        Self(id)
    }
}

/// Text encoding declared by a scenario header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TextEncoding {
    /// Shift-JIS (code page 932), the encoding of most shipped titles.
    #[default]
    ShiftJis,
    /// UTF-8, used by fan translations and test fixtures.
    Utf8,
}

impl TextEncoding {
    pub(crate) fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::ShiftJis),
            1 => Some(Self::Utf8),
            _ => None,
        }
    }

    pub(crate) fn code(self) -> u8 {
        match self {
            Self::ShiftJis => 0,
            Self::Utf8 => 1,
        }
    }
}

/// Integer variable bank selector (`intA` is bank 0, `intB` bank 1, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IntBank(pub u8);

impl fmt::Display for IntBank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 < 26 {
            write!(f, "int{}", (b'A' + self.0) as char)
        } else {
            write!(f, "int#{}", self.0)
        }
    }
}

/// Reference to one integer variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IntVar {
    /// Bank the variable lives in.
    pub bank: IntBank,
    /// Index within the bank.
    pub index: u32,
}

impl IntVar {
    /// Create a variable reference.
    pub const fn new(bank: u8, index: u32) -> Self {
        Self {
            bank: IntBank(bank),
            index,
        }
    }
}

impl fmt::Display for IntVar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.bank, self.index)
    }
}

macro_rules! operator_table {
    ($(#[$meta:meta])* $name:ident { $($(#[$vmeta:meta])* $variant:ident = $code:literal => $sym:literal,)+ }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $($(#[$vmeta])* $variant,)+
        }

        impl $name {
            /// Decode an operator from its wire code.
            pub fn from_code(code: u8) -> Option<Self> {
                match code {
                    $($code => Some(Self::$variant),)+
                    _ => None,
                }
            }

            /// Wire code of this operator.
            pub fn code(self) -> u8 {
                match self {
                    $(Self::$variant => $code,)+
                }
            }

            /// Source-level symbol, used when printing expressions.
            pub fn symbol(self) -> &'static str {
                match self {
                    $(Self::$variant => $sym,)+
                }
            }
        }
    };
}

operator_table! {
    /// Unary expression operator.
    UnaryOp {
        /// Arithmetic negation.
        Neg = 0 => "-",
        /// Logical not (`0` becomes `1`, anything else `0`).
        Not = 1 => "!",
        /// Bitwise complement.
        BitNot = 2 => "~",
    }
}

operator_table! {
    /// Binary expression operator.
    BinaryOp {
        Add = 0 => "+",
        Sub = 1 => "-",
        Mul = 2 => "*",
        Div = 3 => "/",
        Mod = 4 => "%",
        BitAnd = 5 => "&",
        BitOr = 6 => "|",
        BitXor = 7 => "^",
        Shl = 8 => "<<",
        Shr = 9 => ">>",
        Eq = 10 => "==",
        Ne = 11 => "!=",
        Lt = 12 => "<",
        Le = 13 => "<=",
        Gt = 14 => ">",
        Ge = 15 => ">=",
        And = 16 => "&&",
        Or = 17 => "||",
    }
}

/// Integer expression tree used for arithmetic operands.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Expr {
    /// Integer constant.
    Const(i32),
    /// Direct variable read.
    Var(IntVar),
    /// Variable read with a computed index (`intA[expr]`).
    Indexed {
        /// Bank to read from.
        bank: IntBank,
        /// Index expression.
        index: Box<Expr>,
    },
    /// Unary operation.
    Unary(UnaryOp, Box<Expr>),
    /// Binary operation.
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Const(value) => write!(f, "{value}"),
            Expr::Var(var) => write!(f, "{var}"),
            Expr::Indexed { bank, index } => write!(f, "{bank}[{index}]"),
            Expr::Unary(op, operand) => write!(f, "{}({operand})", op.symbol()),
            Expr::Binary(op, lhs, rhs) => write!(f, "({lhs} {} {rhs})", op.symbol()),
        }
    }
}

/// Typed command argument.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Argument {
    /// Integer literal.
    Int(i32),
    /// Integer variable reference.
    IntVar(IntVar),
    /// String literal in the scenario's text encoding.
    Str(Vec<u8>),
    /// String variable reference.
    StrVar(u32),
    /// Arithmetic expression.
    Expr(Expr),
    /// Jump target inside the current scenario.
    Label(u32),
    /// Argument with a type tag this decoder does not know; kept verbatim.
    Opaque {
        /// Unrecognized type tag.
        tag: u8,
        /// Raw argument bytes.
        bytes: Vec<u8>,
    },
}

impl fmt::Display for Argument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Argument::Int(value) => write!(f, "{value}"),
            Argument::IntVar(var) => write!(f, "{var}"),
            Argument::Str(bytes) => write!(f, "{:?}", String::from_utf8_lossy(bytes)),
            Argument::StrVar(index) => write!(f, "strS[{index}]"),
            Argument::Expr(expr) => write!(f, "{expr}"),
            Argument::Label(label) => write!(f, "@{label}"),
            Argument::Opaque { tag, bytes } => write!(f, "<{tag:#04x}:{} bytes>", bytes.len()),
        }
    }
}

/// Trailing data attached to a command after its positional arguments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Payload {
    /// Free-form string data.
    Text(Vec<u8>),
    /// Ordered list of arguments (case tables, select options).
    Array(Vec<Argument>),
    /// Payload kind this decoder does not know; kept verbatim.
    Opaque {
        /// Unrecognized payload tag.
        tag: u8,
        /// Raw payload bytes.
        bytes: Vec<u8>,
    },
}

/// One encoded operation call.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Command {
    /// Module type (namespace family).
    pub module_type: u8,
    /// Module number within the type.
    pub module_number: u8,
    /// Opcode within the module, at most [`MAX_OPCODE`].
    pub opcode: u32,
    /// Overload selecting an argument-shape variant of the opcode.
    pub overload: u8,
    /// Positional arguments in declaration order.
    pub arguments: Vec<Argument>,
    /// Optional trailing payload.
    pub payload: Option<Payload>,
}

impl Command {
    /// Create a command without arguments.
    pub fn new(module_type: u8, module_number: u8, opcode: u32, overload: u8) -> Self {
        Self {
            module_type,
            module_number,
            opcode,
            overload,
            arguments: Vec::new(),
            payload: None,
        }
    }

    /// Builder-style helper to attach arguments.
    pub fn with_arguments(mut self, arguments: Vec<Argument>) -> Self {
        self.arguments = arguments;
        self
    }

    /// Builder-style helper to attach a payload.
    pub fn with_payload(mut self, payload: Payload) -> Self {
        self.payload = Some(payload);
        self
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "opcode<{}:{}:{}, {}>(",
            self.module_type, self.module_number, self.opcode, self.overload
        )?;
        for (i, argument) in self.arguments.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{argument}")?;
        }
        f.write_str(")")
    }
}

/// Position annotation inside the element stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Marker {
    /// Source line number of the following elements.
    Line(u16),
    /// Jump target addressed by `goto`/`gosub`.
    Label(u32),
    /// Scenario entry point addressed by `jump`/`farcall`.
    Entrypoint(u8),
}

/// One decoded element of a scenario.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InstructionElement {
    /// Operation dispatched through the module registry.
    Command(Command),
    /// Position annotation.
    Marker(Marker),
    /// Opaque bytes handed to the text collaborator.
    RawData(Vec<u8>),
}

impl From<Command> for InstructionElement {
    fn from(command: Command) -> Self {
        Self::Command(command)
    }
}

impl From<Marker> for InstructionElement {
    fn from(marker: Marker) -> Self {
        Self::Marker(marker)
    }
}
