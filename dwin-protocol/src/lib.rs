//! DWIN touchscreen wire protocol
//!
//! This crate defines the framing used between a printer controller and
//! a DWIN/DGUS serial touchscreen. Both directions share a two byte
//! header; only controller frames carry a tail.
//!
//! # Protocol Overview
//!
//! Controller → display:
//! ```text
//! ┌────────┬─────────┬─────────┬─────────────┬─────────────┐
//! │ HEADER │ COMMAND │ ADDRESS │ PAYLOAD     │ TAIL        │
//! │ 5A A5  │ 1B      │ 2B (BE) │ 0–246B      │ CC 33 C3 3C │
//! └────────┴─────────┴─────────┴─────────────┴─────────────┘
//! ```
//!
//! Display → controller:
//! ```text
//! ┌────────┬────────┬─────────┬─────────┬──────────────────┐
//! │ HEADER │ LENGTH │ COMMAND │ ADDRESS │ PAYLOAD          │
//! │ 5A A5  │ 1B     │ 1B      │ 2B (BE) │ LENGTH − 3 bytes │
//! └────────┴────────┴─────────┴─────────┴──────────────────┘
//! ```
//!
//! There is no checksum: a corrupted payload byte that does not touch a
//! sentinel goes undetected. The panel hardware fixes this format.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod command;
pub mod encoder;
pub mod frame;
pub mod inbound;
pub mod payload;
pub mod value;

pub use command::{Color, CommandError, DisplayCommand, Point, RectMode, TextStyle};
pub use encoder::{CommandEncoder, OUTBOX_CAPACITY};
pub use frame::{Frame, FrameError, HEADER, MAX_FRAME_SIZE, MAX_PAYLOAD_SIZE, TAIL};
pub use inbound::{Inbound, InboundFrame, InboundParser, MAX_VALUES};
pub use payload::PayloadWriter;
pub use value::{Fixed, ValueError, WireValue};
