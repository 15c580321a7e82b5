//! Printer collaborator traits
//!
//! The touchscreen core drives the rest of the printer firmware through
//! these traits and never reaches into it otherwise. A host implements
//! them on its own types and passes them into each tick.

pub mod job;
pub mod media;
pub mod motion;
pub mod settings;
pub mod thermal;
pub mod tuning;

pub use job::{JobState, PrintJob};
pub use media::{FileName, Media, MAX_FILE_NAME_LEN};
pub use motion::{Axis, MotionCommand, MotionQueue};
pub use settings::SettingsStore;
pub use thermal::{Heater, Thermal};
pub use tuning::{PidTerm, Tuning};

/// Errors reported by collaborators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HostError {
    /// Collaborator cannot accept work right now
    Busy,
    /// No media is mounted
    NoMedia,
    /// File could not be opened or read
    Io,
    /// Persistent storage rejected the operation
    Storage,
}

/// Everything the dispatcher needs from the printer
pub trait Printer: MotionQueue + PrintJob + Thermal + Media + SettingsStore + Tuning {}

// Blanket implementation
impl<T: MotionQueue + PrintJob + Thermal + Media + SettingsStore + Tuning + ?Sized> Printer for T {}
