//! Bounds-checked payload assembly

use heapless::Vec;

use crate::frame::{Frame, MAX_PAYLOAD_SIZE};
use crate::value::WireValue;

/// Payload would exceed [`MAX_PAYLOAD_SIZE`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PayloadFull;

/// Cursor that appends big-endian fields to a frame payload
///
/// Every push checks the remaining capacity; nothing is ever truncated.
#[derive(Debug, Clone, Default)]
pub struct PayloadWriter {
    buf: Vec<u8, MAX_PAYLOAD_SIZE>,
}

impl PayloadWriter {
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    /// Bytes still available
    pub fn remaining(&self) -> usize {
        MAX_PAYLOAD_SIZE - self.buf.len()
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn u8(&mut self, value: u8) -> Result<&mut Self, PayloadFull> {
        self.buf.push(value).map_err(|_| PayloadFull)?;
        Ok(self)
    }

    pub fn u16(&mut self, value: u16) -> Result<&mut Self, PayloadFull> {
        self.bytes(&value.to_be_bytes())
    }

    pub fn i16(&mut self, value: i16) -> Result<&mut Self, PayloadFull> {
        self.bytes(&value.to_be_bytes())
    }

    pub fn u32(&mut self, value: u32) -> Result<&mut Self, PayloadFull> {
        self.bytes(&value.to_be_bytes())
    }

    pub fn value(&mut self, value: WireValue) -> Result<&mut Self, PayloadFull> {
        let mut out = [0u8; 4];
        let len = value.to_be_bytes(&mut out);
        self.bytes(&out[..len])
    }

    /// Append raw bytes, all or nothing
    pub fn bytes(&mut self, data: &[u8]) -> Result<&mut Self, PayloadFull> {
        if data.len() > self.remaining() {
            return Err(PayloadFull);
        }
        self.buf.extend_from_slice(data).map_err(|_| PayloadFull)?;
        Ok(self)
    }

    /// Append `count` copies of `byte`
    pub fn fill(&mut self, byte: u8, count: usize) -> Result<&mut Self, PayloadFull> {
        if count > self.remaining() {
            return Err(PayloadFull);
        }
        for _ in 0..count {
            self.buf.push(byte).map_err(|_| PayloadFull)?;
        }
        Ok(self)
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    /// Finish into a frame
    pub fn into_frame(self, command: u8, address: u16) -> Frame {
        Frame {
            command,
            address,
            payload: self.buf,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fields_are_big_endian() {
        let mut writer = PayloadWriter::new();
        writer.u8(0x11).unwrap().u16(0x1234).unwrap().i16(-1).unwrap().u32(0xDEADBEEF).unwrap();
        assert_eq!(
            writer.as_slice(),
            &[0x11, 0x12, 0x34, 0xFF, 0xFF, 0xDE, 0xAD, 0xBE, 0xEF]
        );
    }

    #[test]
    fn test_overflow_is_all_or_nothing() {
        let mut writer = PayloadWriter::new();
        writer.fill(0, MAX_PAYLOAD_SIZE - 1).unwrap();
        assert_eq!(writer.u16(7).err(), Some(PayloadFull));
        assert_eq!(writer.len(), MAX_PAYLOAD_SIZE - 1);
        writer.u8(7).unwrap();
        assert_eq!(writer.remaining(), 0);
        assert_eq!(writer.u8(8).err(), Some(PayloadFull));
    }

    #[test]
    fn test_into_frame() {
        let mut writer = PayloadWriter::new();
        writer.value(WireValue::Word(150)).unwrap();
        let frame = writer.into_frame(0x82, 0x1006);
        assert_eq!(frame, Frame::new(0x82, 0x1006, &[0x00, 0x96]).unwrap());
    }
}
