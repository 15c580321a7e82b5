//! Printer settings persistence collaborator

use super::HostError;

/// Printer-side persisted settings (EEPROM)
pub trait SettingsStore {
    fn save(&mut self) -> Result<(), HostError>;
    fn load(&mut self) -> Result<(), HostError>;
    fn reset_to_defaults(&mut self);
}
