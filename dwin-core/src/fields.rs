//! Display variable map
//!
//! Every address the panel project uses, inputs and outputs alike. Inputs
//! are the addresses the panel reports when the user touches a control;
//! several of them double as the display field showing the current value.

use crate::traits::{Axis, Heater, PidTerm};

/// Variable pointers
pub mod vp {
    // Status area
    pub const STATUS_ICON: u16 = 0x1000;
    pub const MAIN_MENU: u16 = 0x1002;
    pub const OPEN_PAGE: u16 = 0x1004;
    pub const FEEDRATE: u16 = 0x1006;
    pub const STOP_PRINT: u16 = 0x1008;
    pub const PAUSE_PRINT: u16 = 0x100A;
    pub const RESUME_PRINT: u16 = 0x100C;
    pub const PROGRESS_ICON: u16 = 0x100E;
    pub const ELAPSED_HOURS: u16 = 0x1010;
    pub const ELAPSED_MINUTES: u16 = 0x1012;
    pub const PROGRESS: u16 = 0x1016;
    pub const Z_OFFSET: u16 = 0x1026;

    // Temperatures
    pub const PREHEAT: u16 = 0x1030;
    pub const HOTEND_TARGET: u16 = 0x1034;
    pub const HOTEND_CURRENT: u16 = 0x1036;
    pub const BED_TARGET: u16 = 0x103A;
    pub const BED_CURRENT: u16 = 0x103C;

    // Motion
    pub const HOME_ALL: u16 = 0x1044;
    pub const START_LEVELING: u16 = 0x1046;
    pub const X_POSITION: u16 = 0x1048;
    pub const Y_POSITION: u16 = 0x104A;
    pub const Z_POSITION: u16 = 0x104C;
    pub const DISABLE_STEPPERS: u16 = 0x1056;
    pub const CANCEL_OPERATION: u16 = 0x105C;

    // Settings and tuning
    pub const SETTINGS_ACTION: u16 = 0x1098;
    pub const FAN: u16 = 0x109A;
    pub const FLOW: u16 = 0x109C;
    pub const STEPS_X: u16 = 0x10B6;
    pub const STEPS_Y: u16 = 0x10B8;
    pub const STEPS_Z: u16 = 0x10BA;
    pub const STEPS_E: u16 = 0x10BC;
    pub const HOTEND_PID_P: u16 = 0x10BE;
    pub const HOTEND_PID_I: u16 = 0x10C0;
    pub const HOTEND_PID_D: u16 = 0x10C2;
    pub const BED_PID_P: u16 = 0x10C4;
    pub const BED_PID_I: u16 = 0x10C6;
    pub const BED_PID_D: u16 = 0x10C8;
    pub const FILE_PAGE_NUMBER: u16 = 0x10CA;
    pub const FILE_PAGE_COUNT: u16 = 0x10CC;
    pub const REMAINING_HOURS: u16 = 0x10D2;
    pub const REMAINING_MINUTES: u16 = 0x10D4;

    // File browser
    pub const FILE_NAME_BASE: u16 = 0x200A;
    /// Words between consecutive file name slots
    pub const FILE_NAME_STRIDE: u16 = 0x10;
    pub const START_PRINT: u16 = 0x2198;
    pub const SELECT_FILE: u16 = 0x2199;
    pub const FILE_PAGE: u16 = 0x219C;

    // Popups
    pub const POPUP_CONFIRM: u16 = 0x2200;
    pub const POPUP_CANCEL: u16 = 0x2201;
    pub const POPUP_HIGHLIGHT: u16 = 0x2202;

    // Panel settings
    pub const BRIGHTNESS: u16 = 0x2210;
    pub const STANDBY_BRIGHTNESS: u16 = 0x2211;
    pub const STANDBY_SECONDS: u16 = 0x2212;
    pub const VOLUME: u16 = 0x2213;

    // Text fields
    pub const SELECTED_FILE_NAME: u16 = 0x2220;
    pub const PRINTING_FILE_NAME: u16 = 0x2240;
    pub const POPUP_TEXT: u16 = 0x2260;
    pub const POPUP_HIGHLIGHT_ICON: u16 = 0x2280;
    pub const MACHINE_NAME: u16 = 0x2290;
    pub const FIRMWARE_VERSION: u16 = 0x22B0;
}

/// Byte width of every text field
pub const TEXT_FIELD_WIDTH: u8 = 32;

/// File name slots on one browser page
pub const FILES_PER_PAGE: u16 = 20;

/// Address of a file name slot (0-based)
pub fn file_slot(slot: u16) -> u16 {
    vp::FILE_NAME_BASE + slot * vp::FILE_NAME_STRIDE
}

pub fn position_field(axis: Axis) -> Option<u16> {
    match axis {
        Axis::X => Some(vp::X_POSITION),
        Axis::Y => Some(vp::Y_POSITION),
        Axis::Z => Some(vp::Z_POSITION),
        Axis::E => None,
    }
}

pub fn steps_field(axis: Axis) -> u16 {
    match axis {
        Axis::X => vp::STEPS_X,
        Axis::Y => vp::STEPS_Y,
        Axis::Z => vp::STEPS_Z,
        Axis::E => vp::STEPS_E,
    }
}

pub fn pid_field(heater: Heater, term: PidTerm) -> u16 {
    match (heater, term) {
        (Heater::Hotend, PidTerm::P) => vp::HOTEND_PID_P,
        (Heater::Hotend, PidTerm::I) => vp::HOTEND_PID_I,
        (Heater::Hotend, PidTerm::D) => vp::HOTEND_PID_D,
        (Heater::Bed, PidTerm::P) => vp::BED_PID_P,
        (Heater::Bed, PidTerm::I) => vp::BED_PID_I,
        (Heater::Bed, PidTerm::D) => vp::BED_PID_D,
    }
}

/// Snapshot-backed display fields redrawn by the periodic updater
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Field {
    Status,
    Progress,
    Elapsed,
    Remaining,
    HotendCurrent,
    HotendTarget,
    BedCurrent,
    BedTarget,
    Feedrate,
    Flow,
    Fan,
    PositionX,
    PositionY,
    PositionZ,
    ZOffset,
}

impl Field {
    pub const ALL: [Field; 15] = [
        Field::Status,
        Field::Progress,
        Field::Elapsed,
        Field::Remaining,
        Field::HotendCurrent,
        Field::HotendTarget,
        Field::BedCurrent,
        Field::BedTarget,
        Field::Feedrate,
        Field::Flow,
        Field::Fan,
        Field::PositionX,
        Field::PositionY,
        Field::PositionZ,
        Field::ZOffset,
    ];

    pub fn target_temp(heater: Heater) -> Self {
        match heater {
            Heater::Hotend => Field::HotendTarget,
            Heater::Bed => Field::BedTarget,
        }
    }

    pub fn position(axis: Axis) -> Option<Self> {
        match axis {
            Axis::X => Some(Field::PositionX),
            Axis::Y => Some(Field::PositionY),
            Axis::Z => Some(Field::PositionZ),
            Axis::E => None,
        }
    }

    const fn bit(self) -> u16 {
        1 << self as u8
    }
}

/// Set of [`Field`]s
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FieldSet(u16);

impl FieldSet {
    pub const EMPTY: FieldSet = FieldSet(0);

    pub const fn all() -> Self {
        FieldSet((1 << Field::ALL.len()) - 1)
    }

    pub fn insert(&mut self, field: Field) {
        self.0 |= field.bit();
    }

    pub fn remove(&mut self, field: Field) {
        self.0 &= !field.bit();
    }

    pub fn contains(self, field: Field) -> bool {
        self.0 & field.bit() != 0
    }

    pub fn union(self, other: FieldSet) -> Self {
        FieldSet(self.0 | other.0)
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn iter(self) -> impl Iterator<Item = Field> {
        Field::ALL.into_iter().filter(move |f| self.contains(*f))
    }
}

impl From<Field> for FieldSet {
    fn from(field: Field) -> Self {
        FieldSet(field.bit())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_slots_stay_below_browser_inputs() {
        let last = file_slot(FILES_PER_PAGE - 1);
        let last_word = last + (TEXT_FIELD_WIDTH as u16) / 2 - 1;
        assert!(last_word < vp::START_PRINT);
        assert_eq!(file_slot(0), vp::FILE_NAME_BASE);
    }

    #[test]
    fn test_text_fields_do_not_overlap() {
        let words = (TEXT_FIELD_WIDTH as u16) / 2;
        let starts = [
            vp::SELECTED_FILE_NAME,
            vp::PRINTING_FILE_NAME,
            vp::POPUP_TEXT,
            vp::POPUP_HIGHLIGHT_ICON,
            vp::MACHINE_NAME,
            vp::FIRMWARE_VERSION,
        ];
        for pair in starts.windows(2) {
            assert!(pair[0] + words <= pair[1]);
        }
    }

    #[test]
    fn test_field_set() {
        let mut set = FieldSet::EMPTY;
        assert!(set.is_empty());
        set.insert(Field::Feedrate);
        set.insert(Field::ZOffset);
        assert!(set.contains(Field::Feedrate));
        assert!(!set.contains(Field::Fan));
        set.remove(Field::Feedrate);
        assert_eq!(set.iter().collect::<std::vec::Vec<_>>(), std::vec![Field::ZOffset]);
        assert_eq!(FieldSet::all().iter().count(), Field::ALL.len());
    }
}
