//! Inbound event decoding
//!
//! Wraps the protocol's accumulating parser. Complete frames are turned
//! into `(address, values)` pairs, looked up in the event table and handed
//! out as typed events. Acknowledgements are absorbed here.

use dwin_protocol::{FrameError, Inbound, InboundParser, MAX_VALUES};
use heapless::Vec;

use super::key::EventKey;
use super::table::{EventTable, InterpretedValue};

/// Address and payload words of one inbound frame
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RawInput {
    pub address: u16,
    pub values: Vec<u16, MAX_VALUES>,
}

/// A table-resolved input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DecodedEvent {
    pub address: u16,
    pub key: EventKey,
    pub value: InterpretedValue,
}

/// Decoder statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DecoderStats {
    pub frames: u32,
    pub write_acks: u32,
    pub unknown_addresses: u32,
    pub rejected_values: u32,
}

/// Turns received bytes into events
#[derive(Debug, Clone)]
pub struct EventDecoder {
    parser: InboundParser,
    table: EventTable,
    handshake_acked: bool,
    stats: DecoderStats,
}

impl Default for EventDecoder {
    fn default() -> Self {
        Self::new(EventTable::standard())
    }
}

impl EventDecoder {
    pub fn new(table: EventTable) -> Self {
        Self {
            parser: InboundParser::new(),
            table,
            handshake_acked: false,
            stats: DecoderStats::default(),
        }
    }

    /// Append bytes read from the UART
    pub fn push(&mut self, bytes: &[u8]) -> Result<(), FrameError> {
        self.parser.push(bytes)
    }

    /// Drop everything accumulated so far
    pub fn reset(&mut self) {
        self.parser.reset();
    }

    /// Bytes waiting for the rest of a frame
    pub fn pending(&self) -> usize {
        self.parser.pending()
    }

    /// Bytes thrown away since the last good frame
    pub fn discarded(&self) -> usize {
        self.parser.discarded()
    }

    /// Free accumulator space
    pub fn room(&self) -> usize {
        self.parser.room()
    }

    pub fn stats(&self) -> DecoderStats {
        self.stats
    }

    pub fn table(&self) -> &EventTable {
        &self.table
    }

    /// Report and clear whether a handshake reply was seen
    pub fn take_handshake_ack(&mut self) -> bool {
        core::mem::take(&mut self.handshake_acked)
    }

    /// Next complete data frame
    ///
    /// `Ok(None)` until a whole frame has arrived; each frame is returned
    /// once. Handshake replies and write acknowledgements are consumed
    /// without being returned.
    pub fn decode_next(&mut self) -> Result<Option<RawInput>, FrameError> {
        loop {
            match self.parser.next_frame()? {
                None => return Ok(None),
                Some(Inbound::HandshakeAck) => {
                    self.handshake_acked = true;
                }
                Some(Inbound::WriteAck) => {
                    self.stats.write_acks = self.stats.write_acks.wrapping_add(1);
                }
                Some(Inbound::Frame(frame)) => {
                    self.stats.frames = self.stats.frames.wrapping_add(1);
                    return Ok(Some(RawInput {
                        address: frame.address,
                        values: frame.values(),
                    }));
                }
            }
        }
    }

    /// Next input that maps to an event
    ///
    /// Unknown addresses and values the rule rejects are logged and skipped.
    pub fn next_event(&mut self) -> Result<Option<DecodedEvent>, FrameError> {
        while let Some(raw) = self.decode_next()? {
            let Some(entry) = self.table.lookup(raw.address) else {
                debug!("ignoring unknown address {=u16:#x}", raw.address);
                self.stats.unknown_addresses = self.stats.unknown_addresses.wrapping_add(1);
                continue;
            };

            match entry.rule.interpret(raw.values.first().copied()) {
                Some(value) => {
                    trace!("input {=u16:#x} -> {:?}", raw.address, entry.key);
                    return Ok(Some(DecodedEvent {
                        address: raw.address,
                        key: entry.key,
                        value,
                    }));
                }
                None => {
                    debug!("rejected value at {=u16:#x}", raw.address);
                    self.stats.rejected_values = self.stats.rejected_values.wrapping_add(1);
                }
            }
        }
        Ok(None)
    }
}
