//! Error types for archive reading and instruction decoding.
//!
//! # Error Categories
//!
//! - **Container errors**: [`ArchiveError::Io`], [`ArchiveError::Format`] are fatal
//!   to opening an archive.
//! - **Lookup errors**: [`ArchiveError::UnknownScenario`] is surfaced to the caller
//!   and leaves the archive usable.
//! - **Decode errors**: [`DecodeError`] is fatal to one scenario only. It always
//!   carries the byte offset inside the deciphered scenario where decoding stopped.

use std::path::PathBuf;

use thiserror::Error;

use crate::element::ScenarioId;

/// Archive result type alias.
pub type Result<T> = std::result::Result<T, ArchiveError>;

/// Reason a byte stream could not be decoded into instruction elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecodeFault {
    /// The scenario blob does not start with the scenario magic.
    #[error("bad scenario magic")]
    BadMagic,

    /// The scenario blob declares a version this decoder does not understand.
    #[error("unsupported scenario version {0}")]
    UnsupportedVersion(u16),

    /// The scenario blob declares an unknown text encoding.
    #[error("unknown text encoding {0}")]
    UnknownEncoding(u8),

    /// An element starts with a discriminant that is not part of the format.
    #[error("unknown element tag {0:#04x}")]
    UnknownElement(u8),

    /// A length field or fixed-size field would read past the end of its container.
    #[error("truncated: needed {needed} bytes, {available} available")]
    Truncated {
        /// Bytes the field required.
        needed: usize,
        /// Bytes left in the enclosing buffer.
        available: usize,
    },

    /// A typed argument declared a length that does not fit its type.
    #[error("argument tag {tag:#04x} has invalid length {len}")]
    ArgumentLength {
        /// Argument type tag.
        tag: u8,
        /// Declared payload length.
        len: usize,
    },

    /// An expression node uses an operator or node tag that is not defined.
    #[error("unknown expression {kind} {code:#04x}")]
    UnknownExpression {
        /// Which table the code was looked up in (`node`, `unary`, `binary`).
        kind: &'static str,
        /// The offending code.
        code: u8,
    },

    /// Expression trees nest deeper than the decoder allows.
    #[error("expression nesting exceeds {0} levels")]
    ExpressionTooDeep(usize),

    /// A sized region (command body, expression argument, array payload) was not
    /// consumed exactly.
    #[error("{0} trailing bytes inside a sized region")]
    TrailingBytes(usize),
}

/// Malformed element stream, reported with the offset at which decoding failed.
///
/// The offset is relative to the start of the deciphered scenario blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("instruction decode error at offset {offset:#x}: {fault}")]
pub struct DecodeError {
    /// Byte offset of the failing field.
    pub offset: usize,
    /// What went wrong.
    pub fault: DecodeFault,
}

impl DecodeError {
    pub(crate) fn new(offset: usize, fault: DecodeFault) -> Self {
        Self { offset, fault }
    }
}

/// Reason an archive header or table of contents was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatFault {
    /// File is too short to hold the fixed header.
    #[error("file of {0} bytes is too short for an archive header")]
    TruncatedHeader(usize),

    /// Header magic does not match.
    #[error("bad archive magic {0:02x?}")]
    BadMagic([u8; 4]),

    /// Header declares an unsupported container version.
    #[error("unsupported archive version {0}")]
    UnsupportedVersion(u16),

    /// The table of contents does not fit in the file.
    #[error("table of contents with {entries} entries needs {needed} bytes, file has {available}")]
    TocSize {
        /// Declared entry count.
        entries: u32,
        /// Bytes required for header and entries.
        needed: usize,
        /// File length.
        available: usize,
    },

    /// A scenario id is outside the addressable range.
    #[error("scenario id {0} out of range")]
    IdOutOfRange(u32),

    /// A scenario id appears twice.
    #[error("duplicate scenario id {0}")]
    DuplicateId(ScenarioId),

    /// A descriptor points outside the file or into the header.
    #[error("scenario {id} range {offset:#x}+{length:#x} is outside the data area")]
    RangeOutOfBounds {
        /// Scenario the descriptor belongs to.
        id: ScenarioId,
        /// Declared offset.
        offset: u32,
        /// Declared length.
        length: u32,
    },
}

/// Errors raised by [`crate::Archive`] operations.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// The archive file could not be read.
    #[error("failed to read archive {path}: {source}")]
    Io {
        /// Path that was being read.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The container header or table of contents is corrupt.
    #[error("archive format error: {0}")]
    Format(#[from] FormatFault),

    /// The requested scenario id is not in the table of contents.
    #[error("unknown scenario {id}")]
    UnknownScenario {
        /// The id that was requested.
        id: ScenarioId,
    },

    /// The scenario exists but its element stream is malformed.
    #[error("scenario {id}: {source}")]
    Decode {
        /// The scenario that failed to decode.
        id: ScenarioId,
        /// Decoder diagnostics.
        #[source]
        source: DecodeError,
    },
}

/// Reasons an element cannot be represented in the wire format.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    /// Opcode does not fit in 24 bits.
    #[error("opcode {0} exceeds 24 bits")]
    OpcodeOutOfRange(u32),

    /// A command carries more arguments than the count field can express.
    #[error("{0} arguments exceed the per-command limit")]
    TooManyArguments(usize),

    /// A sized field (argument, body, raw data, element stream) is too long for its length prefix.
    #[error("{what} of {len} bytes exceeds its length field")]
    TooLong {
        /// Which field overflowed.
        what: &'static str,
        /// Actual length.
        len: usize,
    },
}
