//! Address → event table
//!
//! The table is a static slice sorted by address. Sorting strictly
//! ascending is what makes it injective, and the standard table is checked
//! for that at compile time. Lookups are a binary search.

use dwin_protocol::Fixed;

use super::key::EventKey;
use crate::fields::{self, vp, FILES_PER_PAGE};
use crate::traits::{Axis, Heater, PidTerm};

/// How to read the payload word of an input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ValueRule {
    /// Button press; the value is ignored
    Trigger,
    /// Unsigned integer clamped to `min..=max`
    Integer { min: u16, max: u16 },
    /// Decimal pre-scaled by 10^scale, clamped to `min..=max` (raw units)
    Fixed {
        scale: u8,
        signed: bool,
        min: i32,
        max: i32,
    },
    /// 1-based index into a fixed list of `count` entries
    Index { count: u16 },
}

/// Input value after applying its [`ValueRule`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InterpretedValue {
    None,
    Integer(u16),
    Fixed(Fixed),
    Index(u16),
}

impl InterpretedValue {
    pub fn integer(self) -> Option<u16> {
        match self {
            InterpretedValue::Integer(v) => Some(v),
            _ => None,
        }
    }

    pub fn fixed(self) -> Option<Fixed> {
        match self {
            InterpretedValue::Fixed(v) => Some(v),
            _ => None,
        }
    }

    pub fn index(self) -> Option<u16> {
        match self {
            InterpretedValue::Index(v) => Some(v),
            _ => None,
        }
    }
}

impl ValueRule {
    /// Interpret the first payload word
    ///
    /// Numbers saturate at the declared bounds. An index outside its list,
    /// or a missing word where one is needed, yields `None`.
    pub fn interpret(&self, word: Option<u16>) -> Option<InterpretedValue> {
        match *self {
            ValueRule::Trigger => Some(InterpretedValue::None),
            ValueRule::Integer { min, max } => {
                word.map(|w| InterpretedValue::Integer(w.clamp(min, max.max(min))))
            }
            ValueRule::Fixed {
                scale,
                signed,
                min,
                max,
            } => word.map(|w| {
                let value = if signed {
                    Fixed::from_signed_word(w, scale)
                } else {
                    Fixed::from_word(w, scale)
                };
                InterpretedValue::Fixed(value.clamp_raw(min, max))
            }),
            ValueRule::Index { count } => match word {
                Some(i) if (1..=count).contains(&i) => Some(InterpretedValue::Index(i)),
                _ => None,
            },
        }
    }
}

/// One input address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EventTableEntry {
    pub address: u16,
    pub key: EventKey,
    pub rule: ValueRule,
}

const fn entry(address: u16, key: EventKey, rule: ValueRule) -> EventTableEntry {
    EventTableEntry { address, key, rule }
}

const TRIGGER: ValueRule = ValueRule::Trigger;

const fn integer(min: u16, max: u16) -> ValueRule {
    ValueRule::Integer { min, max }
}

const fn signed(scale: u8, min: i32, max: i32) -> ValueRule {
    ValueRule::Fixed {
        scale,
        signed: true,
        min,
        max,
    }
}

const fn unsigned(scale: u8, min: i32, max: i32) -> ValueRule {
    ValueRule::Fixed {
        scale,
        signed: false,
        min,
        max,
    }
}

const fn index(count: u16) -> ValueRule {
    ValueRule::Index { count }
}

/// Steps/mm arrive in tenths
const STEPS: ValueRule = unsigned(1, 1, 65_535);
/// PID terms arrive in hundredths
const PID: ValueRule = unsigned(2, 0, 65_535);
/// Jog targets arrive in tenths of a mm
const JOG: ValueRule = signed(1, -32_768, 32_767);

/// Input addresses of the standard panel project
pub const STANDARD_ENTRIES: &[EventTableEntry] = &[
    entry(vp::MAIN_MENU, EventKey::GoToMainMenu, TRIGGER),
    entry(vp::OPEN_PAGE, EventKey::OpenPage, index(7)),
    entry(vp::FEEDRATE, EventKey::SetFeedratePercent, integer(10, 999)),
    entry(vp::STOP_PRINT, EventKey::StopPrintJob, TRIGGER),
    entry(vp::PAUSE_PRINT, EventKey::PausePrintJob, TRIGGER),
    entry(vp::RESUME_PRINT, EventKey::ResumePrintJob, TRIGGER),
    entry(vp::Z_OFFSET, EventKey::SetZOffset, signed(2, -500, 500)),
    entry(vp::PREHEAT, EventKey::Preheat, index(3)),
    entry(vp::HOTEND_TARGET, EventKey::SetTargetTemp(Heater::Hotend), integer(0, 300)),
    entry(vp::BED_TARGET, EventKey::SetTargetTemp(Heater::Bed), integer(0, 120)),
    entry(vp::HOME_ALL, EventKey::HomeAll, TRIGGER),
    entry(vp::START_LEVELING, EventKey::StartLeveling, TRIGGER),
    entry(vp::X_POSITION, EventKey::AxisJog(Axis::X), JOG),
    entry(vp::Y_POSITION, EventKey::AxisJog(Axis::Y), JOG),
    entry(vp::Z_POSITION, EventKey::AxisJog(Axis::Z), JOG),
    entry(vp::DISABLE_STEPPERS, EventKey::DisableSteppers, TRIGGER),
    entry(vp::CANCEL_OPERATION, EventKey::CancelOperation, TRIGGER),
    entry(vp::SETTINGS_ACTION, EventKey::SettingsAction, index(3)),
    entry(vp::FAN, EventKey::SetFanPercent, integer(0, 100)),
    entry(vp::FLOW, EventKey::SetFlowPercent, integer(50, 200)),
    entry(vp::STEPS_X, EventKey::SetStepsPerMm(Axis::X), STEPS),
    entry(vp::STEPS_Y, EventKey::SetStepsPerMm(Axis::Y), STEPS),
    entry(vp::STEPS_Z, EventKey::SetStepsPerMm(Axis::Z), STEPS),
    entry(vp::STEPS_E, EventKey::SetStepsPerMm(Axis::E), STEPS),
    entry(vp::HOTEND_PID_P, EventKey::SetPidTerm(Heater::Hotend, PidTerm::P), PID),
    entry(vp::HOTEND_PID_I, EventKey::SetPidTerm(Heater::Hotend, PidTerm::I), PID),
    entry(vp::HOTEND_PID_D, EventKey::SetPidTerm(Heater::Hotend, PidTerm::D), PID),
    entry(vp::BED_PID_P, EventKey::SetPidTerm(Heater::Bed, PidTerm::P), PID),
    entry(vp::BED_PID_I, EventKey::SetPidTerm(Heater::Bed, PidTerm::I), PID),
    entry(vp::BED_PID_D, EventKey::SetPidTerm(Heater::Bed, PidTerm::D), PID),
    entry(vp::START_PRINT, EventKey::StartPrintJob, TRIGGER),
    entry(vp::SELECT_FILE, EventKey::SelectFile, index(FILES_PER_PAGE)),
    entry(vp::FILE_PAGE, EventKey::FilePage, index(3)),
    entry(vp::POPUP_CONFIRM, EventKey::ConfirmPopup, TRIGGER),
    entry(vp::POPUP_CANCEL, EventKey::CancelPopup, TRIGGER),
    entry(vp::POPUP_HIGHLIGHT, EventKey::MoveHighlight, index(2)),
    entry(vp::BRIGHTNESS, EventKey::SetBrightness, integer(10, 100)),
    entry(vp::STANDBY_BRIGHTNESS, EventKey::SetStandbyBrightness, integer(10, 100)),
    entry(vp::STANDBY_SECONDS, EventKey::SetStandbySeconds, integer(5, 100)),
    entry(vp::VOLUME, EventKey::SetVolume, integer(0, 100)),
];

/// True when every address is greater than the one before it
pub const fn is_strictly_ascending(entries: &[EventTableEntry]) -> bool {
    let mut i = 1;
    while i < entries.len() {
        if entries[i - 1].address >= entries[i].address {
            return false;
        }
        i += 1;
    }
    true
}

const _: () = assert!(
    is_strictly_ascending(STANDARD_ENTRIES),
    "event table addresses must be unique and ascending"
);

/// Problems found validating a table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TableError {
    /// Two entries share this address
    Duplicate(u16),
    /// Entry at this address is out of order
    Unsorted(u16),
}

/// Immutable address → event map
#[derive(Debug, Clone, Copy)]
pub struct EventTable {
    entries: &'static [EventTableEntry],
}

impl Default for EventTable {
    fn default() -> Self {
        Self::standard()
    }
}

impl EventTable {
    /// The built-in table
    pub const fn standard() -> Self {
        Self {
            entries: STANDARD_ENTRIES,
        }
    }

    /// Validate and wrap a host-supplied table
    pub fn new(entries: &'static [EventTableEntry]) -> Result<Self, TableError> {
        for pair in entries.windows(2) {
            if pair[0].address == pair[1].address {
                return Err(TableError::Duplicate(pair[1].address));
            }
            if pair[0].address > pair[1].address {
                return Err(TableError::Unsorted(pair[1].address));
            }
        }
        Ok(Self { entries })
    }

    pub fn lookup(&self, address: u16) -> Option<&EventTableEntry> {
        self.entries
            .binary_search_by_key(&address, |e| e.address)
            .ok()
            .map(|i| &self.entries[i])
    }

    pub fn entries(&self) -> &'static [EventTableEntry] {
        self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Display field of a value-carrying input, used to echo accepted edits
pub fn echo_field(key: EventKey) -> Option<u16> {
    match key {
        EventKey::SetStepsPerMm(axis) => Some(fields::steps_field(axis)),
        EventKey::SetPidTerm(heater, term) => Some(fields::pid_field(heater, term)),
        EventKey::SetBrightness => Some(vp::BRIGHTNESS),
        EventKey::SetStandbyBrightness => Some(vp::STANDBY_BRIGHTNESS),
        EventKey::SetStandbySeconds => Some(vp::STANDBY_SECONDS),
        EventKey::SetVolume => Some(vp::VOLUME),
        _ => None,
    }
}
