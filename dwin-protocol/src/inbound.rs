//! Inbound frame parsing
//!
//! Frame format (display → controller):
//! - HEADER (2 bytes): 0x5A 0xA5
//! - LENGTH (1 byte): bytes that follow (COMMAND + ADDRESS + PAYLOAD)
//! - COMMAND (1 byte)
//! - ADDRESS (2 bytes): big-endian variable pointer
//! - PAYLOAD (LENGTH - 3 bytes)
//!
//! Two short forms never reach the event table: the handshake reply
//! `5A A5 00 'O' 'K'` and the acknowledgement the panel sends after every
//! variable or register write (`LENGTH = 3`, address bytes `'O' 'K'`).

use heapless::Vec;

use crate::command::{CMD_REG_WRITE, CMD_VAR_READ, CMD_VAR_WRITE};
use crate::frame::{FrameError, HEADER, MAX_PAYLOAD_SIZE};

/// Receive accumulator size
pub const ACCUMULATOR_SIZE: usize = 512;

/// Words one inbound frame can carry
pub const MAX_VALUES: usize = MAX_PAYLOAD_SIZE / 2;

/// Acknowledgement literal, sent where the address would be
pub const ACK_OK: [u8; 2] = *b"OK";

/// Bytes of a handshake reply
const HANDSHAKE_REPLY_LEN: usize = HEADER.len() + 1 + ACK_OK.len();

/// Bytes ahead of the inbound payload
const INBOUND_HEADER_LEN: usize = HEADER.len() + 1 + 1 + 2;

/// A complete inbound data frame
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InboundFrame {
    pub command: u8,
    pub address: u16,
    pub payload: Vec<u8, MAX_PAYLOAD_SIZE>,
}

impl InboundFrame {
    /// Payload as big-endian words
    ///
    /// Read responses (`0x83`) carry a word count ahead of the words; a count
    /// larger than the payload yields only the words actually present.
    pub fn values(&self) -> Vec<u16, MAX_VALUES> {
        let words = if self.command == CMD_VAR_READ {
            match self.payload.split_first() {
                Some((&count, rest)) => &rest[..rest.len().min(count as usize * 2)],
                None => &[][..],
            }
        } else {
            &self.payload[..]
        };

        words
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect()
    }

    /// First payload word, if any
    pub fn first_value(&self) -> Option<u16> {
        self.values().first().copied()
    }
}

/// Result of parsing one inbound unit
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Inbound {
    /// Data frame for the event table
    Frame(InboundFrame),
    /// Reply to the handshake probe
    HandshakeAck,
    /// Acknowledgement of a write
    WriteAck,
}

/// Accumulating parser for the inbound byte stream
///
/// Bytes are pushed as they arrive and frames are pulled out with
/// [`InboundParser::next_frame`]. A partial frame stays in the accumulator
/// until the rest arrives; it is never returned.
#[derive(Debug, Clone, Default)]
pub struct InboundParser {
    buffer: Vec<u8, ACCUMULATOR_SIZE>,
    discarded: usize,
}

impl InboundParser {
    pub fn new() -> Self {
        Self {
            buffer: Vec::new(),
            discarded: 0,
        }
    }

    /// Reset the parser state
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.discarded = 0;
    }

    /// Bytes held waiting for the rest of a frame
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// Bytes thrown away since the last good frame
    pub fn discarded(&self) -> usize {
        self.discarded
    }

    /// Bytes that can be pushed before the accumulator overflows
    pub fn room(&self) -> usize {
        ACCUMULATOR_SIZE - self.buffer.len()
    }

    /// Append received bytes
    ///
    /// On overflow the bytes that fit are kept and the rest are dropped.
    pub fn push(&mut self, bytes: &[u8]) -> Result<(), FrameError> {
        let room = ACCUMULATOR_SIZE - self.buffer.len();
        let take = bytes.len().min(room);
        self.buffer
            .extend_from_slice(&bytes[..take])
            .map_err(|_| FrameError::Overflow)?;
        if take < bytes.len() {
            self.discarded += bytes.len() - take;
            return Err(FrameError::Overflow);
        }
        Ok(())
    }

    /// Pull the next complete unit out of the accumulator
    ///
    /// Returns `Ok(None)` while the accumulator holds only part of a frame.
    /// Bytes ahead of a header byte are skipped silently. A header byte that
    /// is not followed by the rest of the sentinel, or a length that cannot
    /// describe a frame, drops the offending bytes and returns an error;
    /// calling again continues the scan.
    pub fn next_frame(&mut self) -> Result<Option<Inbound>, FrameError> {
        self.skip_to_header();

        if self.buffer.len() < HEADER.len() {
            return Ok(None);
        }
        if self.buffer[1] != HEADER[1] {
            self.consume(1);
            self.discarded += 1;
            return Err(FrameError::HeaderMismatch);
        }
        if self.buffer.len() < HEADER.len() + 1 {
            return Ok(None);
        }

        let length = self.buffer[2] as usize;
        if length == 0 {
            return self.handshake_reply();
        }
        if length < 3 || length - 3 > MAX_PAYLOAD_SIZE {
            self.consume(HEADER.len());
            self.discarded += HEADER.len();
            return Err(FrameError::InvalidLength);
        }

        let total = HEADER.len() + 1 + length;
        if self.buffer.len() < total {
            return Ok(None);
        }

        let command = self.buffer[3];
        let address_bytes = [self.buffer[4], self.buffer[5]];
        let payload = Vec::from_slice(&self.buffer[INBOUND_HEADER_LEN..total])
            .map_err(|_| FrameError::PayloadTooLarge)?;
        self.consume(total);
        self.discarded = 0;

        let is_write = command == CMD_VAR_WRITE || command == CMD_REG_WRITE;
        if is_write && length == 3 && address_bytes == ACK_OK {
            return Ok(Some(Inbound::WriteAck));
        }

        Ok(Some(Inbound::Frame(InboundFrame {
            command,
            address: u16::from_be_bytes(address_bytes),
            payload,
        })))
    }

    fn handshake_reply(&mut self) -> Result<Option<Inbound>, FrameError> {
        let available = self.buffer.len().min(HANDSHAKE_REPLY_LEN);
        let received = &self.buffer[HEADER.len() + 1..available];
        if received != &ACK_OK[..received.len()] {
            self.consume(HEADER.len());
            self.discarded += HEADER.len();
            return Err(FrameError::InvalidLength);
        }
        if available < HANDSHAKE_REPLY_LEN {
            return Ok(None);
        }
        self.consume(HANDSHAKE_REPLY_LEN);
        self.discarded = 0;
        Ok(Some(Inbound::HandshakeAck))
    }

    fn skip_to_header(&mut self) {
        let skip = self
            .buffer
            .iter()
            .position(|&b| b == HEADER[0])
            .unwrap_or(self.buffer.len());
        if skip > 0 {
            self.consume(skip);
            self.discarded += skip;
        }
    }

    fn consume(&mut self, count: usize) {
        let count = count.min(self.buffer.len());
        let remaining = self.buffer.len() - count;
        self.buffer.copy_within(count.., 0);
        self.buffer.truncate(remaining);
    }
}
