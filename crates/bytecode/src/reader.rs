//! Bounds-checked little-endian cursor used by the decoder.

use crate::error::{DecodeError, DecodeFault};

/// Cursor over a byte slice that reports absolute offsets in its errors.
///
/// `base` is the absolute offset of `data[0]` inside the scenario blob, so
/// child readers created with [`ByteReader::sized`] still report positions
/// relative to the whole blob.
#[derive(Debug, Clone)]
pub(crate) struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
    base: usize,
}

impl<'a> ByteReader<'a> {
    pub(crate) fn new(data: &'a [u8], base: usize) -> Self {
        Self { data, pos: 0, base }
    }

    /// Absolute offset of the next unread byte.
    pub(crate) fn offset(&self) -> usize {
        self.base + self.pos
    }

    pub(crate) fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub(crate) fn is_finished(&self) -> bool {
        self.pos >= self.data.len()
    }

    pub(crate) fn error(&self, fault: DecodeFault) -> DecodeError {
        DecodeError::new(self.offset(), fault)
    }

    pub(crate) fn take(&mut self, len: usize) -> Result<&'a [u8], DecodeError> {
        if len > self.remaining() {
            return Err(self.error(DecodeFault::Truncated {
                needed: len,
                available: self.remaining(),
            }));
        }
        let bytes = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    /// Split off the next `len` bytes as an independent reader.
    pub(crate) fn sized(&mut self, len: usize) -> Result<ByteReader<'a>, DecodeError> {
        let base = self.offset();
        let bytes = self.take(len)?;
        Ok(ByteReader::new(bytes, base))
    }

    /// Consume everything that is left.
    pub(crate) fn rest(&mut self) -> &'a [u8] {
        let bytes = &self.data[self.pos..];
        self.pos = self.data.len();
        bytes
    }

    pub(crate) fn u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.take(1)?[0])
    }

    pub(crate) fn u16(&mut self) -> Result<u16, DecodeError> {
        let bytes = self.take(2)?;
        Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    pub(crate) fn u24(&mut self) -> Result<u32, DecodeError> {
        let bytes = self.take(3)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], 0]))
    }

    pub(crate) fn u32(&mut self) -> Result<u32, DecodeError> {
        let bytes = self.take(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub(crate) fn i32(&mut self) -> Result<i32, DecodeError> {
        self.u32().map(|value| value as i32)
    }

    /// Fail unless every byte has been consumed.
    pub(crate) fn finish(&self) -> Result<(), DecodeError> {
        match self.remaining() {
            0 => Ok(()),
            left => Err(self.error(DecodeFault::TrailingBytes(left))),
        }
    }
}
