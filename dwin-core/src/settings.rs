//! Persisted touchscreen settings
//!
//! Volume, backlight and standby settings belong to the panel rather than
//! the printer. They are stored postcard-encoded under
//! [`StorageKey::DisplaySettings`] and pushed to the panel at startup and
//! whenever they change.

use dwin_hal::{FlashError, SettingsStorage, StorageKey};
use dwin_protocol::{CommandEncoder, CommandError};
use serde::{Deserialize, Serialize};

/// Encoded size upper bound
const MAX_ENCODED_LEN: usize = 16;

/// Record layout version, bumped on incompatible changes
const SETTINGS_VERSION: u8 = 1;

pub const MIN_BRIGHTNESS: u8 = 10;
pub const MAX_BRIGHTNESS: u8 = 100;
pub const MIN_STANDBY_SECONDS: u16 = 5;
pub const MAX_STANDBY_SECONDS: u16 = 100;
pub const MAX_VOLUME: u8 = 100;

/// Errors loading or storing settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SettingsError {
    Storage(FlashError),
    Encode,
    Decode,
    /// Stored record has another layout version
    Version(u8),
}

impl From<FlashError> for SettingsError {
    fn from(e: FlashError) -> Self {
        SettingsError::Storage(e)
    }
}

/// Panel-side user settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DisplaySettings {
    version: u8,
    /// Buzzer volume, 0..=100 %
    pub volume: u8,
    /// Active backlight, 10..=100 %
    pub brightness: u8,
    /// Dimmed backlight, 10..=100 %
    pub standby_brightness: u8,
    /// Idle time before dimming, 5..=100 s
    pub standby_seconds: u16,
    pub standby_enabled: bool,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            version: SETTINGS_VERSION,
            volume: 100,
            brightness: MAX_BRIGHTNESS,
            standby_brightness: 20,
            standby_seconds: 60,
            standby_enabled: true,
        }
    }
}

impl DisplaySettings {
    /// Clamp and set the active brightness; returns the value applied
    pub fn set_brightness(&mut self, percent: u16) -> u8 {
        self.brightness = clamp_percent(percent, MIN_BRIGHTNESS, MAX_BRIGHTNESS);
        self.brightness
    }

    pub fn set_standby_brightness(&mut self, percent: u16) -> u8 {
        self.standby_brightness = clamp_percent(percent, MIN_BRIGHTNESS, MAX_BRIGHTNESS);
        self.standby_brightness
    }

    pub fn set_standby_seconds(&mut self, seconds: u16) -> u16 {
        self.standby_seconds = seconds.clamp(MIN_STANDBY_SECONDS, MAX_STANDBY_SECONDS);
        self.standby_seconds
    }

    pub fn set_volume(&mut self, percent: u16) -> u8 {
        self.volume = clamp_percent(percent, 0, MAX_VOLUME);
        self.volume
    }

    /// Volume scaled to the buzzer register (0..=255)
    pub fn volume_level(&self) -> u8 {
        (self.volume as u16 * 255 / MAX_VOLUME as u16) as u8
    }

    /// Queue the register writes that put these settings into effect
    pub fn apply(&self, out: &mut CommandEncoder) -> Result<(), CommandError> {
        let standby = if self.standby_enabled {
            self.standby_seconds
        } else {
            0
        };
        out.set_backlight(self.brightness, self.standby_brightness, standby)?;
        out.set_volume(self.volume_level())
    }

    /// Bring a decoded record back into range
    fn sanitized(mut self) -> Self {
        self.set_brightness(self.brightness as u16);
        self.set_standby_brightness(self.standby_brightness as u16);
        self.set_standby_seconds(self.standby_seconds);
        self.set_volume(self.volume as u16);
        self
    }

    pub fn load<S: SettingsStorage + ?Sized>(storage: &mut S) -> Result<Self, SettingsError> {
        let mut buf = [0u8; MAX_ENCODED_LEN];
        let len = storage.read(StorageKey::DisplaySettings, &mut buf)?;
        let settings: Self =
            postcard::from_bytes(&buf[..len.min(buf.len())]).map_err(|_| SettingsError::Decode)?;
        if settings.version != SETTINGS_VERSION {
            return Err(SettingsError::Version(settings.version));
        }
        Ok(settings.sanitized())
    }

    /// Load, falling back to defaults when nothing usable is stored
    pub fn load_or_default<S: SettingsStorage + ?Sized>(storage: &mut S) -> Self {
        match Self::load(storage) {
            Ok(settings) => settings,
            Err(SettingsError::Storage(FlashError::NotFound)) => Self::default(),
            Err(e) => {
                warn!("display settings unusable: {:?}", e);
                Self::default()
            }
        }
    }

    pub fn store<S: SettingsStorage + ?Sized>(&self, storage: &mut S) -> Result<(), SettingsError> {
        let mut buf = [0u8; MAX_ENCODED_LEN];
        let bytes = postcard::to_slice(self, &mut buf).map_err(|_| SettingsError::Encode)?;
        storage.write(StorageKey::DisplaySettings, bytes)?;
        Ok(())
    }
}

fn clamp_percent(value: u16, min: u8, max: u8) -> u8 {
    value.clamp(min as u16, max as u16) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryStorage;
    use dwin_protocol::command::{ADDR_BACKLIGHT, ADDR_VOLUME};

    #[test]
    fn test_setters_clamp() {
        let mut settings = DisplaySettings::default();
        assert_eq!(settings.set_brightness(0), MIN_BRIGHTNESS);
        assert_eq!(settings.set_brightness(500), MAX_BRIGHTNESS);
        assert_eq!(settings.set_standby_seconds(1), MIN_STANDBY_SECONDS);
        assert_eq!(settings.set_standby_seconds(1000), MAX_STANDBY_SECONDS);
        assert_eq!(settings.set_volume(101), 100);
    }

    #[test]
    fn test_volume_scaling() {
        let mut settings = DisplaySettings::default();
        settings.set_volume(100);
        assert_eq!(settings.volume_level(), 255);
        settings.set_volume(0);
        assert_eq!(settings.volume_level(), 0);
        settings.set_volume(50);
        assert_eq!(settings.volume_level(), 127);
    }

    #[test]
    fn test_apply_writes_backlight_and_volume() {
        let mut settings = DisplaySettings::default();
        settings.standby_enabled = false;
        let mut out = CommandEncoder::new();
        settings.apply(&mut out).unwrap();

        let backlight = out.pop().unwrap();
        assert_eq!(backlight.address, ADDR_BACKLIGHT);
        assert_eq!(backlight.payload.as_slice(), &[100, 20, 0, 0]);
        let volume = out.pop().unwrap();
        assert_eq!(volume.address, ADDR_VOLUME);
        assert_eq!(volume.payload.as_slice(), &[255, 0]);
    }

    #[test]
    fn test_store_then_load() {
        let mut storage = MemoryStorage::default();
        let mut settings = DisplaySettings::default();
        settings.set_brightness(40);
        settings.set_volume(30);
        settings.store(&mut storage).unwrap();

        assert_eq!(DisplaySettings::load(&mut storage), Ok(settings));
    }

    #[test]
    fn test_missing_record_gives_defaults() {
        let mut storage = MemoryStorage::default();
        assert_eq!(
            DisplaySettings::load(&mut storage),
            Err(SettingsError::Storage(FlashError::NotFound))
        );
        assert_eq!(DisplaySettings::load_or_default(&mut storage), DisplaySettings::default());
    }

    #[test]
    fn test_corrupt_record_gives_defaults() {
        let mut storage = MemoryStorage::default();
        storage.write(StorageKey::DisplaySettings, &[0xFF; 3]).unwrap();
        assert_eq!(DisplaySettings::load_or_default(&mut storage), DisplaySettings::default());
    }

    #[test]
    fn test_other_version_rejected() {
        let mut storage = MemoryStorage::default();
        let mut settings = DisplaySettings::default();
        settings.version = 9;
        settings.store(&mut storage).unwrap();
        assert_eq!(DisplaySettings::load(&mut storage), Err(SettingsError::Version(9)));
    }
}
