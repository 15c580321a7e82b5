//! Touchscreen input events
//!
//! Bytes from the panel become [`DecodedEvent`]s in three steps: the
//! decoder reassembles frames, the [`EventTable`] maps the frame address
//! to an [`EventKey`], and the entry's [`ValueRule`] interprets the value.

pub mod decoder;
pub mod key;
pub mod table;

pub use decoder::{DecodedEvent, DecoderStats, EventDecoder, RawInput};
pub use key::{EventKey, FilePageAction, HighlightMove, MenuTarget, PreheatChoice, SettingsChoice};
pub use table::{
    EventTable, EventTableEntry, InterpretedValue, TableError, ValueRule, STANDARD_ENTRIES,
};
