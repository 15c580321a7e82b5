//! Touchscreen application logic for a printer controller
//!
//! Everything between the serial port of a DWIN panel and the rest of the
//! printer firmware that does not depend on a particular board:
//!
//! - Link transport with the startup handshake and resynchronisation
//! - Event table and decoder turning panel input into [`EventKey`]s
//! - Dispatcher applying each event to the printer collaborators
//! - Page, popup and blocking-operation state
//! - Periodic updater redrawing fields that changed
//! - Display settings persistence
//!
//! [`Touchscreen`] ties these together behind `start` and `tick`.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

#[macro_use]
mod fmt;

pub mod config;
pub mod dispatch;
pub mod event;
pub mod fields;
pub mod link;
pub mod settings;
pub mod state;
pub mod touchscreen;
pub mod traits;
pub mod updater;

#[cfg(test)]
mod testing;

pub use config::TouchscreenConfig;
pub use dispatch::{Dispatcher, Disposition};
pub use event::{DecodedEvent, EventDecoder, EventKey, EventTable};
pub use link::{HandshakeOutcome, LinkState, LinkTransport};
pub use settings::DisplaySettings;
pub use state::{FatalKind, PageId, PopupKind, ProcessState};
pub use touchscreen::Touchscreen;
pub use traits::Printer;
pub use updater::{PeriodicUpdater, PrinterSnapshot};
