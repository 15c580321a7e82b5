//! Process state: current page, blocking operation, open popup
//!
//! Owned by the dispatcher. Gating decisions are pure functions of this
//! state and the incoming key.

use super::page::{OperationId, PageId, PopupContext};
use crate::event::EventKey;

/// Why an event was not routed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DropReason {
    /// A popup is open and the key is not a popup control
    PopupOpen,
    /// An operation is running and does not allow the key
    Blocked(OperationId),
}

/// Gating verdict for one key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Gate {
    /// Route to the key's handler
    Route,
    /// Route to the open popup
    Popup,
    /// Popup control with no popup open
    Ignore,
    Drop(DropReason),
}

/// Page/process state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessState {
    page: PageId,
    blocking: Option<OperationId>,
    popup: Option<PopupContext>,
}

impl Default for ProcessState {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessState {
    pub fn new() -> Self {
        Self {
            page: PageId::Splash,
            blocking: None,
            popup: None,
        }
    }

    pub fn page(&self) -> PageId {
        self.page
    }

    pub fn blocking(&self) -> Option<OperationId> {
        self.blocking
    }

    pub fn popup(&self) -> Option<&PopupContext> {
        self.popup.as_ref()
    }

    /// Decide what to do with a key
    ///
    /// The popup is checked first so a popup raised during a blocking
    /// operation can still be answered.
    pub fn gate(&self, key: EventKey) -> Gate {
        if self.popup.is_some() {
            return if key.is_popup_control() {
                Gate::Popup
            } else {
                Gate::Drop(DropReason::PopupOpen)
            };
        }
        if key.is_popup_control() {
            return Gate::Ignore;
        }
        match self.blocking {
            Some(op) if !op.allows(key) => Gate::Drop(DropReason::Blocked(op)),
            _ => Gate::Route,
        }
    }

    /// Change page; returns whether it changed
    pub fn set_page(&mut self, page: PageId) -> bool {
        let changed = self.page != page;
        self.page = page;
        changed
    }

    /// Start a blocking operation, replacing any other
    pub fn begin(&mut self, op: OperationId) {
        self.blocking = Some(op);
    }

    /// End `op` if it is the one running; returns whether it was
    pub fn finish(&mut self, op: OperationId) -> bool {
        if self.blocking == Some(op) {
            self.blocking = None;
            true
        } else {
            false
        }
    }

    /// End whatever operation is running
    pub fn clear_blocking(&mut self) -> Option<OperationId> {
        self.blocking.take()
    }

    /// Open a popup; returns the popup it supersedes
    pub fn open_popup(&mut self, popup: PopupContext) -> Option<PopupContext> {
        self.popup.replace(popup)
    }

    /// Close and return the open popup
    pub fn take_popup(&mut self) -> Option<PopupContext> {
        self.popup.take()
    }

    pub fn popup_mut(&mut self) -> Option<&mut PopupContext> {
        self.popup.as_mut()
    }

    /// A fatal popup is showing
    pub fn is_fatal(&self) -> bool {
        self.popup.is_some_and(|p| p.kind.is_fatal())
    }
}
