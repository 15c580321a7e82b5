//! Configuration type definitions

use heapless::String;
use serde::{Deserialize, Serialize};

use crate::traits::{Axis, Heater};

/// Maximum label length
pub const MAX_LABEL_LEN: usize = 16;

/// Maximum machine info string length
pub const MAX_INFO_LEN: usize = 32;

/// Serial link timing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[serde(default)]
pub struct LinkConfig {
    /// Baud rate the panel is configured for
    pub baudrate: u32,
    /// How long to wait for the handshake reply
    pub handshake_timeout_ms: u32,
    /// Discarded bytes after which a framing error resets the link
    pub resync_threshold: u16,
    /// UART reads attempted per tick
    pub max_reads_per_tick: u8,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            baudrate: 115200,
            handshake_timeout_ms: 1000,
            resync_threshold: 8,
            max_reads_per_tick: 8,
        }
    }
}

/// Periodic updater cadence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[serde(default)]
pub struct RefreshConfig {
    /// Interval between snapshot diffs
    pub interval_ms: u32,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self { interval_ms: 500 }
    }
}

/// Travel range of one axis in whole mm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AxisTravel {
    pub min_mm: i16,
    pub max_mm: i16,
}

/// Bounds applied to values entered on the panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[serde(default)]
pub struct MachineLimits {
    pub x: AxisTravel,
    pub y: AxisTravel,
    pub z: AxisTravel,
    /// Highest hotend target in °C
    pub max_hotend_c: i16,
    /// Highest bed target in °C
    pub max_bed_c: i16,
    /// Z offset bounds in hundredths of a mm
    pub min_z_offset_x100: i16,
    pub max_z_offset_x100: i16,
    /// Steps/mm upper bound in tenths
    pub max_steps_per_mm_x10: i32,
    /// PID coefficient upper bound in hundredths
    pub max_pid_x100: i32,
}

impl Default for MachineLimits {
    fn default() -> Self {
        Self {
            x: AxisTravel { min_mm: 0, max_mm: 220 },
            y: AxisTravel { min_mm: 0, max_mm: 220 },
            z: AxisTravel { min_mm: 0, max_mm: 250 },
            max_hotend_c: 260,
            max_bed_c: 100,
            min_z_offset_x100: -500,
            max_z_offset_x100: 500,
            max_steps_per_mm_x10: 20_000,
            max_pid_x100: 30_000,
        }
    }
}

impl MachineLimits {
    /// Travel of a motion axis; the extruder has none
    pub fn travel(&self, axis: Axis) -> Option<AxisTravel> {
        match axis {
            Axis::X => Some(self.x),
            Axis::Y => Some(self.y),
            Axis::Z => Some(self.z),
            Axis::E => None,
        }
    }

    /// Highest target temperature for a heater
    pub fn max_target(&self, heater: Heater) -> i16 {
        match heater {
            Heater::Hotend => self.max_hotend_c,
            Heater::Bed => self.max_bed_c,
        }
    }
}

/// Material preheat preset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PreheatProfile {
    pub label: String<MAX_LABEL_LEN>,
    pub hotend_c: i16,
    pub bed_c: i16,
}

impl PreheatProfile {
    pub fn new(label: &str, hotend_c: i16, bed_c: i16) -> Self {
        let mut name = String::new();
        for c in label.chars().take(MAX_LABEL_LEN) {
            if name.push(c).is_err() {
                break;
            }
        }
        Self {
            label: name,
            hotend_c,
            bed_c,
        }
    }
}

/// Strings shown on the info page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[serde(default)]
pub struct MachineInfo {
    pub name: String<MAX_INFO_LEN>,
    pub firmware_version: String<MAX_INFO_LEN>,
}

impl Default for MachineInfo {
    fn default() -> Self {
        let mut name = String::new();
        let _ = name.push_str("3D Printer");
        let mut firmware_version = String::new();
        let _ = firmware_version.push_str(env!("CARGO_PKG_VERSION"));
        Self {
            name,
            firmware_version,
        }
    }
}

/// Complete touchscreen configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[serde(default)]
pub struct TouchscreenConfig {
    pub link: LinkConfig,
    pub refresh: RefreshConfig,
    pub limits: MachineLimits,
    pub pla: PreheatProfile,
    pub abs: PreheatProfile,
    pub info: MachineInfo,
}

impl Default for TouchscreenConfig {
    fn default() -> Self {
        Self {
            link: LinkConfig::default(),
            refresh: RefreshConfig::default(),
            limits: MachineLimits::default(),
            pla: PreheatProfile::new("PLA", 200, 60),
            abs: PreheatProfile::new("ABS", 240, 100),
            info: MachineInfo::default(),
        }
    }
}
