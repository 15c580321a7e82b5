//! Outbound frame encoding and decoding.
//!
//! Frame format (controller → display):
//! - HEADER (2 bytes): 0x5A 0xA5
//! - COMMAND (1 byte): protocol operation
//! - ADDRESS (2 bytes): variable pointer, big-endian (0 for draw primitives)
//! - PAYLOAD (0-246 bytes): command-specific data
//! - TAIL (4 bytes): 0xCC 0x33 0xC3 0x3C
//!
//! There is no checksum. Frame boundaries rest entirely on the sentinels.

use heapless::Vec;

/// Frame header sentinel, shared by both directions
pub const HEADER: [u8; 2] = [0x5A, 0xA5];

/// Outbound frame tail sentinel
pub const TAIL: [u8; 4] = [0xCC, 0x33, 0xC3, 0x3C];

/// Maximum payload size in bytes
pub const MAX_PAYLOAD_SIZE: usize = 246;

/// Bytes around the payload (HEADER + COMMAND + ADDRESS + TAIL)
pub const FRAME_OVERHEAD: usize = HEADER.len() + 1 + 2 + TAIL.len();

/// Maximum complete outbound frame size
pub const MAX_FRAME_SIZE: usize = FRAME_OVERHEAD + MAX_PAYLOAD_SIZE;

/// Errors that can occur during frame parsing or encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// Payload exceeds maximum allowed size
    PayloadTooLarge,
    /// Not enough bytes yet; keep accumulating
    Incomplete,
    /// Bytes at the frame start are not the header sentinel
    HeaderMismatch,
    /// Inbound length byte cannot describe a valid frame
    InvalidLength,
    /// Receive accumulator is full
    Overflow,
    /// Buffer too small for encoding
    BufferTooSmall,
}

/// A parsed or constructed outbound frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Protocol operation
    pub command: u8,
    /// Variable pointer
    pub address: u16,
    /// Payload data
    pub payload: Vec<u8, MAX_PAYLOAD_SIZE>,
}

impl Frame {
    /// Create a new frame with the given command, address and payload
    pub fn new(command: u8, address: u16, payload: &[u8]) -> Result<Self, FrameError> {
        let payload = Vec::from_slice(payload).map_err(|_| FrameError::PayloadTooLarge)?;
        Ok(Self {
            command,
            address,
            payload,
        })
    }

    /// Create a frame with no payload
    pub fn empty(command: u8, address: u16) -> Self {
        Self {
            command,
            address,
            payload: Vec::new(),
        }
    }

    /// Whether the payload holds the tail sentinel
    ///
    /// Such a frame cannot be decoded back: the tail has no overlap with
    /// itself, so this is the only payload that breaks framing.
    pub fn payload_contains_tail(&self) -> bool {
        self.payload.windows(TAIL.len()).any(|window| window == TAIL)
    }

    /// Encoded size of this frame in bytes
    pub fn encoded_len(&self) -> usize {
        FRAME_OVERHEAD + self.payload.len()
    }

    /// Encode this frame into a byte buffer
    ///
    /// Returns the number of bytes written
    pub fn encode(&self, buffer: &mut [u8]) -> Result<usize, FrameError> {
        let frame_len = self.encoded_len();
        if buffer.len() < frame_len {
            return Err(FrameError::BufferTooSmall);
        }

        let body = HEADER.len() + 3;
        buffer[..2].copy_from_slice(&HEADER);
        buffer[2] = self.command;
        buffer[3..5].copy_from_slice(&self.address.to_be_bytes());
        buffer[body..body + self.payload.len()].copy_from_slice(&self.payload);
        buffer[body + self.payload.len()..frame_len].copy_from_slice(&TAIL);

        Ok(frame_len)
    }

    /// Encode this frame into a heapless Vec
    pub fn encode_to_vec(&self) -> Result<Vec<u8, MAX_FRAME_SIZE>, FrameError> {
        let mut buffer = [0u8; MAX_FRAME_SIZE];
        let len = self.encode(&mut buffer)?;
        Vec::from_slice(&buffer[..len]).map_err(|_| FrameError::BufferTooSmall)
    }

    /// Decode one outbound frame from the start of `bytes`
    ///
    /// Returns the frame and the number of bytes it occupied. The frame ends
    /// at the first tail sentinel after the address, so a payload that itself
    /// contains the tail sequence cannot be recovered. `Incomplete` means more
    /// bytes are needed.
    pub fn decode(bytes: &[u8]) -> Result<(Self, usize), FrameError> {
        let prefix = bytes.len().min(HEADER.len());
        if bytes[..prefix] != HEADER[..prefix] {
            return Err(FrameError::HeaderMismatch);
        }

        let body = HEADER.len() + 3;
        if bytes.len() < body + TAIL.len() {
            return Err(FrameError::Incomplete);
        }

        let tail_at = bytes[body..]
            .windows(TAIL.len())
            .position(|window| window == TAIL)
            .map(|offset| body + offset);

        match tail_at {
            Some(end) => {
                let frame = Frame::new(
                    bytes[2],
                    u16::from_be_bytes([bytes[3], bytes[4]]),
                    &bytes[body..end],
                )?;
                Ok((frame, end + TAIL.len()))
            }
            None if bytes.len() >= MAX_FRAME_SIZE => Err(FrameError::PayloadTooLarge),
            None => Err(FrameError::Incomplete),
        }
    }
}
