//! Logical pages, popups and blocking operations

use crate::event::EventKey;

/// Logical screens of the panel project
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PageId {
    /// Boot logo, shown until the link is up
    Splash,
    Main,
    FileList,
    Printing,
    Paused,
    PrintFinished,
    Tune,
    Temperature,
    Move,
    /// Wait screen while homing
    Homing,
    Leveling,
    /// Wait screen while probing
    LevelingProgress,
    Settings,
    Info,
}

impl PageId {
    /// Page number in the panel project
    pub fn display_id(self) -> u16 {
        match self {
            PageId::Splash => 0,
            PageId::Main => 1,
            PageId::FileList => 2,
            PageId::Printing => 3,
            PageId::Paused => 4,
            PageId::PrintFinished => 5,
            PageId::Tune => 6,
            PageId::Temperature => 7,
            PageId::Move => 8,
            PageId::Homing => 9,
            PageId::Leveling => 10,
            PageId::LevelingProgress => 11,
            PageId::Settings => 12,
            PageId::Info => 13,
        }
    }
}

/// Long-running operations that lock out most input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OperationId {
    Homing,
    Leveling,
}

impl OperationId {
    /// Keys still accepted while this operation runs
    pub fn allows(self, key: EventKey) -> bool {
        matches!(key, EventKey::CancelOperation)
    }

    /// Wait screen shown while running
    pub fn page(self) -> PageId {
        match self {
            OperationId::Homing => PageId::Homing,
            OperationId::Leveling => PageId::LevelingProgress,
        }
    }

    /// Page to return to once finished or cancelled
    pub fn return_page(self) -> PageId {
        match self {
            OperationId::Homing => PageId::Move,
            OperationId::Leveling => PageId::Leveling,
        }
    }
}

/// Faults that end in the fatal popup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FatalKind {
    ThermalRunaway,
    HeatingFailed,
    ProbingFailed,
    MinTemp,
    MaxTemp,
    PrinterKilled,
}

impl FatalKind {
    pub fn message(self) -> &'static str {
        match self {
            FatalKind::ThermalRunaway => "Thermal runaway",
            FatalKind::HeatingFailed => "Heating failed",
            FatalKind::ProbingFailed => "Probing failed",
            FatalKind::MinTemp => "Temperature too low",
            FatalKind::MaxTemp => "Temperature too high",
            FatalKind::PrinterKilled => "Printer halted",
        }
    }
}

/// Why a popup is open
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PopupKind {
    StartPrint,
    StopPrint,
    NoMedia,
    MediaError,
    PowerLossRecovery,
    FilamentRunout,
    ResetDefaults,
    SaveFailed,
    /// Prompt supplied by a collaborator
    UserConfirmation,
    Fatal(FatalKind),
}

impl PopupKind {
    /// Page number of the popup in the panel project
    pub fn display_id(self) -> u16 {
        match self {
            PopupKind::UserConfirmation => 20,
            PopupKind::NoMedia => 21,
            PopupKind::PowerLossRecovery => 22,
            PopupKind::FilamentRunout => 23,
            PopupKind::Fatal(_) => 24,
            PopupKind::StartPrint => 25,
            PopupKind::StopPrint => 26,
            PopupKind::ResetDefaults => 27,
            PopupKind::MediaError | PopupKind::SaveFailed => 28,
        }
    }

    /// Built-in prompt text; collaborator prompts are supplied separately
    pub fn prompt(self) -> Option<&'static str> {
        match self {
            PopupKind::StartPrint => Some("Start printing?"),
            PopupKind::StopPrint => Some("Stop printing?"),
            PopupKind::NoMedia => Some("No media inserted"),
            PopupKind::MediaError => Some("Cannot open file"),
            PopupKind::PowerLossRecovery => Some("Resume interrupted print?"),
            PopupKind::FilamentRunout => Some("Filament runout"),
            PopupKind::ResetDefaults => Some("Restore default settings?"),
            PopupKind::SaveFailed => Some("Saving settings failed"),
            PopupKind::UserConfirmation => None,
            PopupKind::Fatal(kind) => Some(kind.message()),
        }
    }

    pub fn is_fatal(self) -> bool {
        matches!(self, PopupKind::Fatal(_))
    }
}

/// Focused popup button
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PopupButton {
    #[default]
    Confirm,
    Cancel,
}

impl PopupButton {
    pub fn toggled(self) -> Self {
        match self {
            PopupButton::Confirm => PopupButton::Cancel,
            PopupButton::Cancel => PopupButton::Confirm,
        }
    }

    /// Icon index for the highlight marker
    pub fn icon(self) -> u16 {
        match self {
            PopupButton::Confirm => 0,
            PopupButton::Cancel => 1,
        }
    }
}

/// An open modal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PopupContext {
    pub kind: PopupKind,
    pub on_confirm: EventKey,
    pub on_cancel: EventKey,
    pub highlighted: PopupButton,
}

impl PopupContext {
    pub fn new(kind: PopupKind, on_confirm: EventKey, on_cancel: EventKey) -> Self {
        Self {
            kind,
            on_confirm,
            on_cancel,
            highlighted: PopupButton::Confirm,
        }
    }

    /// Popup with a single acknowledge button
    pub fn notice(kind: PopupKind) -> Self {
        Self::new(kind, EventKey::Dismiss, EventKey::Dismiss)
    }

    /// Fatal popups have only an acknowledge button
    pub fn fatal(kind: FatalKind) -> Self {
        Self::new(
            PopupKind::Fatal(kind),
            EventKey::AcknowledgeFatal,
            EventKey::AcknowledgeFatal,
        )
    }
}
