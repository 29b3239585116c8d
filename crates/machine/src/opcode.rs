//! Packed opcode keys.

use std::fmt;

use vnscript_bytecode::MAX_OPCODE;

use crate::error::RegistryError;

/// `(opcode, overload)` packed into one integer: `opcode << 8 | overload`.
///
/// Packing is a bijection between `opcode < 2^24, overload <= 255` and `u32`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OpcodeKey(u32);

impl OpcodeKey {
    /// Pack an opcode and overload.
    pub fn pack(opcode: u32, overload: u8) -> Result<Self, RegistryError> {
        if opcode > MAX_OPCODE {
            return Err(RegistryError::OpcodeOutOfRange { opcode });
        }
        Ok(Self((opcode << 8) | u32::from(overload)))
    }

    /// Split the key back into `(opcode, overload)`.
    pub fn unpack(self) -> (u32, u8) {
        (self.0 >> 8, (self.0 & 0xFF) as u8)
    }

    /// Key from its raw packed value. Every `u32` is a valid key.
    pub fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Raw packed value.
    pub fn raw(self) -> u32 {
        self.0
    }

    /// Opcode half of the key.
    pub fn opcode(self) -> u32 {
        self.unpack().0
    }

    /// Overload half of the key.
    pub fn overload(self) -> u8 {
        self.unpack().1
    }
}

impl fmt::Display for OpcodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (opcode, overload) = self.unpack();
        write!(f, "{opcode}, {overload}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_pack_layout() {
        let key = OpcodeKey::pack(0x12_3456, 0x78).unwrap();
        assert_eq!(key.raw(), 0x1234_5678);
        assert_eq!(key.to_string(), "1193046, 120");
    }

    #[test]
    fn test_pack_rejects_wide_opcode() {
        assert_eq!(
            OpcodeKey::pack(MAX_OPCODE + 1, 0),
            Err(RegistryError::OpcodeOutOfRange {
                opcode: MAX_OPCODE + 1
            })
        );
    }

    proptest! {
        #[test]
        fn prop_unpack_inverts_pack(opcode in 0u32..=MAX_OPCODE, overload in any::<u8>()) {
            let key = OpcodeKey::pack(opcode, overload).unwrap();
            prop_assert_eq!(key.unpack(), (opcode, overload));
        }

        #[test]
        fn prop_pack_inverts_unpack(raw in any::<u32>()) {
            let key = OpcodeKey::from_raw(raw);
            let (opcode, overload) = key.unpack();
            prop_assert_eq!(OpcodeKey::pack(opcode, overload).unwrap(), key);
        }
    }
}
