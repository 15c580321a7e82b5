//! Hardware abstraction for the touchscreen link
//!
//! The link core never touches a peripheral directly. A board crate
//! implements these traits for its UART, its monotonic timer and its
//! settings partition, and hands them to `dwin-core`.
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  dwin-core (Touchscreen, transport)     │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  dwin-hal (this crate - traits)         │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │ board UART /  │       │ embedded-io   │
//! │ timer / flash │       │ adapter       │
//! └───────────────┘       └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`uart::UartTx`], [`uart::UartRx`] - Non-blocking serial port
//! - [`clock::Clock`] - Millisecond monotonic clock
//! - [`flash::SettingsStorage`] - Persistent key-value storage

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod clock;
pub mod flash;
pub mod io;
pub mod uart;

pub use clock::Clock;
pub use flash::{FlashError, SettingsStorage, StorageKey};
pub use io::IoUart;
pub use uart::{Uart, UartConfig, UartRx, UartTx};
