//! Application dispatcher
//!
//! Turns decoded touchscreen events into collaborator calls and display
//! writes. Every event is first gated by the [`ProcessState`]: an open
//! popup only accepts popup controls, a running operation only accepts
//! the keys it allows. Accepted events go to one handler per key.
//!
//! Collaborators report their own transitions through the `notify_*`
//! methods. Those take priority over whatever the user was doing and close
//! a non-fatal popup that happens to be open.
//!
//! Handlers never fail. A display write that cannot be queued is logged
//! and dropped; the printer-side effect still happens.

mod files;
mod handlers;
mod notify;

pub use files::FileBrowser;

use dwin_protocol::{CommandEncoder, CommandError};

use crate::config::TouchscreenConfig;
use crate::event::{DecodedEvent, EventKey, HighlightMove, InterpretedValue};
use crate::fields::{vp, FieldSet, TEXT_FIELD_WIDTH};
use crate::settings::DisplaySettings;
use crate::state::{DropReason, Gate, OperationId, PageId, PopupContext, ProcessState};
use crate::traits::Printer;
use crate::updater::RefreshRequest;

/// What happened to a dispatched event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Disposition {
    /// Handled; state or collaborators may have changed
    Accepted,
    /// Valid key that had nothing to act on (bad index, wrong job state)
    Ignored,
    /// Refused by gating
    Dropped(DropReason),
}

/// The state-machine core
#[derive(Debug, Clone)]
pub struct Dispatcher {
    state: ProcessState,
    config: TouchscreenConfig,
    display: DisplaySettings,
    files: FileBrowser,
    refresh: RefreshRequest,
    persist_display: bool,
    /// A page or popup switch was queued by the current handler
    page_shown: bool,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(TouchscreenConfig::default())
    }
}

impl Dispatcher {
    pub fn new(config: TouchscreenConfig) -> Self {
        Self {
            state: ProcessState::new(),
            config,
            display: DisplaySettings::default(),
            files: FileBrowser::default(),
            refresh: RefreshRequest::default(),
            persist_display: false,
            page_shown: false,
        }
    }

    pub fn state(&self) -> &ProcessState {
        &self.state
    }

    pub fn config(&self) -> &TouchscreenConfig {
        &self.config
    }

    pub fn files(&self) -> &FileBrowser {
        &self.files
    }

    pub fn display_settings(&self) -> &DisplaySettings {
        &self.display
    }

    /// Install settings loaded from storage
    pub fn set_display_settings(&mut self, settings: DisplaySettings) {
        self.display = settings;
    }

    /// Redraw work requested since the last call
    pub fn take_refresh(&mut self) -> RefreshRequest {
        core::mem::take(&mut self.refresh)
    }

    /// Display settings the user asked to keep, if any
    pub fn take_persist_request(&mut self) -> Option<DisplaySettings> {
        core::mem::take(&mut self.persist_display).then_some(self.display)
    }

    /// Show the main page after the link comes up
    pub fn enter_main(&mut self, out: &mut CommandEncoder) {
        self.state.set_page(PageId::Main);
        self.redraw_all();
        if let Err(e) = out.switch_page(PageId::Main.display_id()) {
            warn!("main page switch not queued: {:?}", e);
        }
    }

    pub fn dispatch_event<P: Printer + ?Sized>(
        &mut self,
        event: &DecodedEvent,
        printer: &mut P,
        out: &mut CommandEncoder,
    ) -> Disposition {
        self.dispatch(event.key, event.value, printer, out)
    }

    /// Gate and handle one event
    pub fn dispatch<P: Printer + ?Sized>(
        &mut self,
        key: EventKey,
        value: InterpretedValue,
        printer: &mut P,
        out: &mut CommandEncoder,
    ) -> Disposition {
        let result = match self.state.gate(key) {
            Gate::Drop(reason) => {
                debug!("dropped {:?}: {:?}", key, reason);
                return Disposition::Dropped(reason);
            }
            Gate::Ignore => return Disposition::Ignored,
            Gate::Popup => self.answer_popup(key, value, printer, out),
            Gate::Route => self.route(key, value, printer, out),
        };

        result.unwrap_or_else(|e| {
            warn!("display update for {:?} not queued: {:?}", key, e);
            Disposition::Accepted
        })
    }

    fn answer_popup<P: Printer + ?Sized>(
        &mut self,
        key: EventKey,
        value: InterpretedValue,
        printer: &mut P,
        out: &mut CommandEncoder,
    ) -> Result<Disposition, CommandError> {
        match key {
            EventKey::MoveHighlight => {
                let Some(_) = value.index().and_then(HighlightMove::from_index) else {
                    return Ok(Disposition::Ignored);
                };
                let Some(popup) = self.state.popup_mut() else {
                    return Ok(Disposition::Ignored);
                };
                if popup.kind.is_fatal() {
                    return Ok(Disposition::Ignored);
                }
                // two buttons, so either direction lands on the other one
                popup.highlighted = popup.highlighted.toggled();
                let icon = popup.highlighted.icon();
                out.write_word(vp::POPUP_HIGHLIGHT_ICON, icon)?;
                Ok(Disposition::Accepted)
            }
            EventKey::ConfirmPopup | EventKey::CancelPopup => {
                if key == EventKey::CancelPopup && self.state.is_fatal() {
                    return Ok(Disposition::Ignored);
                }
                let Some(popup) = self.state.take_popup() else {
                    return Ok(Disposition::Ignored);
                };
                let outcome = if key == EventKey::ConfirmPopup {
                    popup.on_confirm
                } else {
                    popup.on_cancel
                };
                debug!("popup {:?} answered with {:?}", popup.kind, outcome);

                self.page_shown = false;
                let routed = self.route(outcome, InterpretedValue::None, printer, out);
                // outcomes that stay put still need the popup taken off the panel
                if !self.page_shown {
                    out.switch_page(self.state.page().display_id())?;
                }
                routed.map(|_| Disposition::Accepted)
            }
            _ => Ok(Disposition::Ignored),
        }
    }

    fn show_page(&mut self, page: PageId, out: &mut CommandEncoder) -> Result<(), CommandError> {
        self.state.set_page(page);
        self.page_shown = true;
        out.switch_page(page.display_id())
    }

    /// Open a popup over the current page, replacing any open one
    fn open_popup(
        &mut self,
        popup: PopupContext,
        prompt: Option<&str>,
        out: &mut CommandEncoder,
    ) -> Result<(), CommandError> {
        if let Some(previous) = self.state.open_popup(popup) {
            debug!("popup {:?} superseded by {:?}", previous.kind, popup.kind);
        }
        if let Some(text) = prompt.or(popup.kind.prompt()) {
            out.write_text(vp::POPUP_TEXT, text, TEXT_FIELD_WIDTH)?;
        }
        self.page_shown = true;
        out.write_word(vp::POPUP_HIGHLIGHT_ICON, popup.highlighted.icon())?;
        out.switch_page(popup.kind.display_id())
    }

    /// Start a blocking operation and show its wait screen
    fn begin_operation(
        &mut self,
        op: OperationId,
        out: &mut CommandEncoder,
    ) -> Result<(), CommandError> {
        self.state.begin(op);
        self.refresh.immediate = true;
        self.show_page(op.page(), out)
    }

    fn invalidate(&mut self, fields: impl Into<FieldSet>) {
        self.refresh.fields = self.refresh.fields.union(fields.into());
    }

    fn request_immediate(&mut self) {
        self.refresh.immediate = true;
    }

    fn redraw_all(&mut self) {
        self.refresh.full = true;
    }
}
