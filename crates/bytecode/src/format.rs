//! Wire constants shared by the decoder, encoder and archive code.

/// Archive container magic.
pub const ARCHIVE_MAGIC: [u8; 4] = *b"VNSA";
/// Archive container version understood by this crate.
pub const ARCHIVE_VERSION: u16 = 1;
/// Fixed archive header length (magic, version, flags, entry count).
pub const ARCHIVE_HEADER_LEN: usize = 12;
/// Length of one table-of-contents entry (id, offset, length).
pub const TOC_ENTRY_LEN: usize = 12;

/// Scenario blob magic.
pub const SCENARIO_MAGIC: [u8; 4] = *b"VNSC";
/// Scenario blob version understood by this crate.
pub const SCENARIO_VERSION: u16 = 1;
/// Fixed scenario header length.
pub const SCENARIO_HEADER_LEN: usize = 12;

/// Maximum nesting depth of expression trees.
pub const MAX_EXPR_DEPTH: usize = 32;

/// Element discriminants.
pub mod element {
    pub const LINE: u8 = 0x0A;
    pub const ENTRYPOINT: u8 = 0x21;
    pub const RAW_DATA: u8 = 0x22;
    pub const COMMAND: u8 = 0x23;
    pub const LABEL: u8 = 0x40;
}

/// Argument type tags.
pub mod argument {
    pub const INT: u8 = 0x01;
    pub const INT_VAR: u8 = 0x02;
    pub const STR: u8 = 0x03;
    pub const STR_VAR: u8 = 0x04;
    pub const EXPR: u8 = 0x05;
    pub const LABEL: u8 = 0x06;
}

/// Command payload tags.
pub mod payload {
    pub const TEXT: u8 = 0x01;
    pub const ARRAY: u8 = 0x02;
}

/// Expression node tags.
pub mod expr {
    pub const CONST: u8 = 0x01;
    pub const VAR: u8 = 0x02;
    pub const UNARY: u8 = 0x03;
    pub const BINARY: u8 = 0x04;
    pub const INDEXED: u8 = 0x05;
}
