//! Collaborator-driven transitions

use dwin_protocol::{CommandEncoder, CommandError};

use super::Dispatcher;
use crate::event::EventKey;
use crate::fields::Field;
use crate::state::{FatalKind, OperationId, PageId, PopupContext, PopupKind};
use crate::traits::Printer;

impl Dispatcher {
    /// Move to `page` on behalf of a collaborator
    ///
    /// A non-fatal popup is closed first. Under a fatal popup only the
    /// page underneath changes.
    fn collaborator_page(
        &mut self,
        page: PageId,
        out: &mut CommandEncoder,
    ) -> Result<(), CommandError> {
        if self.state.is_fatal() {
            self.state.set_page(page);
            return Ok(());
        }
        if let Some(popup) = self.state.take_popup() {
            debug!("popup {:?} closed by collaborator", popup.kind);
        }
        self.show_page(page, out)
    }

    /// Open a collaborator popup; refused while a fatal popup is showing
    fn collaborator_popup(
        &mut self,
        popup: PopupContext,
        prompt: Option<&str>,
        out: &mut CommandEncoder,
    ) -> Result<bool, CommandError> {
        if self.state.is_fatal() && !popup.kind.is_fatal() {
            warn!("{:?} suppressed by fatal popup", popup.kind);
            return Ok(false);
        }
        self.open_popup(popup, prompt, out)?;
        Ok(true)
    }

    fn operation_started(&mut self, op: OperationId, out: &mut CommandEncoder) {
        self.state.begin(op);
        self.request_immediate();
        self.invalidate(Field::Status);
        log_write(self.collaborator_page(op.page(), out));
    }

    fn operation_finished(&mut self, op: OperationId, out: &mut CommandEncoder) {
        if !self.state.finish(op) {
            debug!("{:?} finished but was not running", op);
            return;
        }
        self.request_immediate();
        self.invalidate(Field::Status);
        for field in [Field::PositionX, Field::PositionY, Field::PositionZ] {
            self.invalidate(field);
        }
        log_write(self.collaborator_page(op.return_page(), out));
    }

    fn job_changed(&mut self, page: PageId, out: &mut CommandEncoder) {
        self.request_immediate();
        log_write(self.collaborator_page(page, out));
    }

    pub fn notify_homing_started(&mut self, out: &mut CommandEncoder) {
        self.operation_started(OperationId::Homing, out);
    }

    pub fn notify_homing_finished(&mut self, out: &mut CommandEncoder) {
        self.operation_finished(OperationId::Homing, out);
    }

    pub fn notify_leveling_started(&mut self, out: &mut CommandEncoder) {
        self.operation_started(OperationId::Leveling, out);
    }

    pub fn notify_leveling_finished(&mut self, out: &mut CommandEncoder) {
        self.operation_finished(OperationId::Leveling, out);
    }

    pub fn notify_print_started(&mut self, out: &mut CommandEncoder) {
        self.redraw_all();
        self.job_changed(PageId::Printing, out);
    }

    pub fn notify_print_paused(&mut self, out: &mut CommandEncoder) {
        self.job_changed(PageId::Paused, out);
    }

    pub fn notify_print_resumed(&mut self, out: &mut CommandEncoder) {
        self.job_changed(PageId::Printing, out);
    }

    pub fn notify_print_finished(&mut self, out: &mut CommandEncoder) {
        self.job_changed(PageId::PrintFinished, out);
    }

    pub fn notify_print_aborted(&mut self, out: &mut CommandEncoder) {
        self.job_changed(PageId::Main, out);
    }

    /// An interrupted job can be resumed
    pub fn notify_power_loss_recoverable(&mut self, out: &mut CommandEncoder) {
        let popup = PopupContext::new(
            PopupKind::PowerLossRecovery,
            EventKey::ResumeRecoveredJob,
            EventKey::DiscardRecoveredJob,
        );
        log_write(self.collaborator_popup(popup, None, out));
    }

    /// The job was paused because the filament ran out
    pub fn notify_filament_runout(&mut self, out: &mut CommandEncoder) {
        let popup = PopupContext::new(
            PopupKind::FilamentRunout,
            EventKey::ResumeAfterRunout,
            EventKey::Dismiss,
        );
        if self.state.page() == PageId::Printing {
            self.state.set_page(PageId::Paused);
        }
        self.request_immediate();
        log_write(self.collaborator_popup(popup, None, out));
    }

    /// Ask the user to confirm something on a collaborator's behalf
    ///
    /// `on_confirm` and `on_cancel` are handled exactly as if the panel had
    /// sent them once the popup is answered.
    pub fn offer_confirmation(
        &mut self,
        prompt: &str,
        on_confirm: EventKey,
        on_cancel: EventKey,
        out: &mut CommandEncoder,
    ) {
        let popup = PopupContext::new(PopupKind::UserConfirmation, on_confirm, on_cancel);
        log_write(self.collaborator_popup(popup, Some(prompt), out));
    }

    /// Show a fatal error; only acknowledging it returns to the main page
    pub fn notify_fatal(&mut self, kind: FatalKind, out: &mut CommandEncoder) {
        warn!("fatal: {:?}", kind);
        self.state.clear_blocking();
        self.request_immediate();
        log_write(self.collaborator_popup(PopupContext::fatal(kind), None, out));
    }

    /// Display settings could not be written to storage
    pub fn notify_settings_not_saved(&mut self, out: &mut CommandEncoder) {
        let popup = PopupContext::notice(PopupKind::SaveFailed);
        log_write(self.collaborator_popup(popup, None, out));
    }

    /// The link lost sync: abandon the open popup and any running
    /// operation, and drop motion that has not started yet
    pub fn on_link_error<P: Printer + ?Sized>(
        &mut self,
        printer: &mut P,
        out: &mut CommandEncoder,
    ) {
        if let Some(op) = self.state.clear_blocking() {
            warn!("{:?} abandoned after link error", op);
            printer.drop_pending();
            self.state.set_page(op.return_page());
        }
        self.redraw_all();
        if self.state.is_fatal() {
            return;
        }
        if let Some(popup) = self.state.take_popup() {
            debug!("popup {:?} abandoned", popup.kind);
        }
        log_write(out.switch_page(self.state.page().display_id()));
    }
}

fn log_write<T>(result: Result<T, CommandError>) {
    if let Err(e) = result {
        warn!("display update not queued: {:?}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Call, FakePrinter};

    fn ready() -> (Dispatcher, CommandEncoder) {
        let mut dispatcher = Dispatcher::default();
        let mut out = CommandEncoder::new();
        dispatcher.enter_main(&mut out);
        dispatcher.take_refresh();
        out.clear();
        (dispatcher, out)
    }

    #[test]
    fn test_collaborator_homing() {
        let (mut d, mut out) = ready();
        d.notify_homing_started(&mut out);
        assert_eq!(d.state().blocking(), Some(OperationId::Homing));
        assert_eq!(d.state().page(), PageId::Homing);

        d.notify_leveling_finished(&mut out);
        assert_eq!(d.state().blocking(), Some(OperationId::Homing));

        d.notify_homing_finished(&mut out);
        assert_eq!(d.state().blocking(), None);
        assert_eq!(d.state().page(), PageId::Move);
        assert!(d.take_refresh().fields.contains(Field::PositionZ));
    }

    #[test]
    fn test_print_transitions_request_immediate_refresh() {
        let (mut d, mut out) = ready();
        d.notify_print_started(&mut out);
        assert_eq!(d.state().page(), PageId::Printing);
        let request = d.take_refresh();
        assert!(request.immediate && request.full);

        d.notify_print_paused(&mut out);
        assert_eq!(d.state().page(), PageId::Paused);
        assert!(d.take_refresh().immediate);

        d.notify_print_finished(&mut out);
        assert_eq!(d.state().page(), PageId::PrintFinished);
        d.notify_print_aborted(&mut out);
        assert_eq!(d.state().page(), PageId::Main);
    }

    #[test]
    fn test_collaborator_closes_user_popup() {
        let (mut d, mut out) = ready();
        d.offer_confirmation("Continue?", EventKey::Dismiss, EventKey::Dismiss, &mut out);
        d.notify_print_finished(&mut out);
        assert!(d.state().popup().is_none());
        assert_eq!(d.state().page(), PageId::PrintFinished);
    }

    #[test]
    fn test_prompt_text_written() {
        let (mut d, mut out) = ready();
        d.offer_confirmation("Load filament?", EventKey::Dismiss, EventKey::Dismiss, &mut out);

        let text = out.pop().unwrap();
        assert_eq!(text.address, crate::fields::vp::POPUP_TEXT);
        assert!(text.payload.starts_with(b"Load filament?\0"));
        assert_eq!(out.pop().unwrap().address, crate::fields::vp::POPUP_HIGHLIGHT_ICON);
        let switch = out.pop().unwrap();
        assert_eq!(&switch.payload[2..], &PopupKind::UserConfirmation.display_id().to_be_bytes());
    }

    #[test]
    fn test_runout_popup() {
        let (mut d, mut out) = ready();
        d.notify_print_started(&mut out);
        d.notify_filament_runout(&mut out);
        let popup = d.state().popup().unwrap();
        assert_eq!(popup.kind, PopupKind::FilamentRunout);
        assert_eq!(popup.on_confirm, EventKey::ResumeAfterRunout);
        assert_eq!(d.state().page(), PageId::Paused);
    }

    #[test]
    fn test_fatal_replaces_fatal() {
        let (mut d, mut out) = ready();
        d.notify_fatal(FatalKind::MinTemp, &mut out);
        d.notify_fatal(FatalKind::PrinterKilled, &mut out);
        assert_eq!(
            d.state().popup().map(|p| p.kind),
            Some(PopupKind::Fatal(FatalKind::PrinterKilled))
        );
    }

    #[test]
    fn test_fatal_clears_running_operation() {
        let (mut d, mut out) = ready();
        d.notify_leveling_started(&mut out);
        d.notify_fatal(FatalKind::ProbingFailed, &mut out);
        assert_eq!(d.state().blocking(), None);
    }

    #[test]
    fn test_link_error_abandons_popup_and_operation() {
        let (mut d, mut out) = ready();
        let mut printer = FakePrinter::default();
        d.notify_homing_started(&mut out);
        d.offer_confirmation("Continue?", EventKey::Dismiss, EventKey::Dismiss, &mut out);

        d.on_link_error(&mut printer, &mut out);
        assert!(d.state().popup().is_none());
        assert_eq!(d.state().blocking(), None);
        assert_eq!(printer.calls, [Call::DropPending]);
        assert!(d.take_refresh().full);
    }

    #[test]
    fn test_link_error_keeps_fatal_popup() {
        let (mut d, mut out) = ready();
        let mut printer = FakePrinter::default();
        d.notify_fatal(FatalKind::ThermalRunaway, &mut out);
        d.on_link_error(&mut printer, &mut out);
        assert!(d.state().is_fatal());
        assert!(printer.calls.is_empty());
    }
}
