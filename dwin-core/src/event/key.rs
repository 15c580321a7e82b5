//! Semantic touchscreen events

use crate::traits::{Axis, Heater, PidTerm};

/// Actions the panel can request
///
/// Table entries map input addresses onto these; popup contexts name
/// them as their confirm/cancel outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EventKey {
    // Navigation
    GoToMainMenu,
    /// Value: [`MenuTarget`] index
    OpenPage,

    // Live edits
    SetFeedratePercent,
    SetFlowPercent,
    SetFanPercent,
    SetTargetTemp(Heater),
    /// Value: [`PreheatChoice`] index
    Preheat,
    SetZOffset,
    SetStepsPerMm(Axis),
    SetPidTerm(Heater, PidTerm),

    // Motion
    /// Value: absolute position in mm, scale 1
    AxisJog(Axis),
    HomeAll,
    StartLeveling,
    DisableSteppers,
    CancelOperation,

    // Files and print job
    /// Value: slot 1..=20 on the current file page
    SelectFile,
    /// Value: [`FilePageAction`] index
    FilePage,
    StartPrintJob,
    PausePrintJob,
    ResumePrintJob,
    StopPrintJob,

    // Settings
    /// Value: [`SettingsChoice`] index
    SettingsAction,
    SetBrightness,
    SetStandbyBrightness,
    SetStandbySeconds,
    SetVolume,

    // Popup controls
    ConfirmPopup,
    CancelPopup,
    /// Value: [`HighlightMove`] index
    MoveHighlight,

    // Popup outcomes
    Dismiss,
    AbortPrintJob,
    ResumeRecoveredJob,
    DiscardRecoveredJob,
    ResumeAfterRunout,
    ResetToDefaults,
    AcknowledgeFatal,
}

impl EventKey {
    /// Keys accepted while a popup is open
    pub fn is_popup_control(self) -> bool {
        matches!(
            self,
            EventKey::ConfirmPopup | EventKey::CancelPopup | EventKey::MoveHighlight
        )
    }
}

macro_rules! index_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident = $value:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        #[cfg_attr(feature = "defmt", derive(defmt::Format))]
        pub enum $name {
            $($variant = $value),+
        }

        impl $name {
            /// Map a 1-based panel index
            pub fn from_index(index: u16) -> Option<Self> {
                match index {
                    $($value => Some($name::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

index_enum! {
    /// Pages reachable from the main menu
    MenuTarget {
        Files = 1,
        Tune = 2,
        Temperature = 3,
        Move = 4,
        Leveling = 5,
        Settings = 6,
        Info = 7,
    }
}

index_enum! {
    /// Preheat buttons
    PreheatChoice {
        Pla = 1,
        Abs = 2,
        Cooldown = 3,
    }
}

index_enum! {
    /// File browser paging buttons
    FilePageAction {
        Next = 1,
        Previous = 2,
        Refresh = 3,
    }
}

index_enum! {
    /// Settings page buttons
    SettingsChoice {
        Save = 1,
        Load = 2,
        ResetDefaults = 3,
    }
}

index_enum! {
    /// Encoder-style popup focus movement
    HighlightMove {
        Previous = 1,
        Next = 2,
    }
}
