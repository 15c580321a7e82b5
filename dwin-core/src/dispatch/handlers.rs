//! Per-key handlers

use dwin_protocol::{CommandEncoder, CommandError, Fixed};

use super::{Disposition, Dispatcher};
use crate::event::table::echo_field;
use crate::event::{
    EventKey, FilePageAction, InterpretedValue, MenuTarget, PreheatChoice, SettingsChoice,
};
use crate::fields::{vp, Field, TEXT_FIELD_WIDTH};
use crate::settings::DisplaySettings;
use crate::state::{OperationId, PageId, PopupContext, PopupKind};
use crate::traits::{Axis, Heater, JobState, MotionCommand, PidTerm, Printer};

type Handled = Result<Disposition, CommandError>;

const ACCEPTED: Handled = Ok(Disposition::Accepted);
const IGNORED: Handled = Ok(Disposition::Ignored);

impl Dispatcher {
    pub(super) fn route<P: Printer + ?Sized>(
        &mut self,
        key: EventKey,
        value: InterpretedValue,
        printer: &mut P,
        out: &mut CommandEncoder,
    ) -> Handled {
        match key {
            EventKey::GoToMainMenu => {
                self.show_page(PageId::Main, out)?;
                ACCEPTED
            }
            EventKey::OpenPage => match value.index().and_then(MenuTarget::from_index) {
                Some(target) => self.open_menu(target, printer, out),
                None => IGNORED,
            },

            EventKey::SetFeedratePercent => self.edit_integer(value, Field::Feedrate, |v| {
                printer.set_feedrate_percent(v)
            }),
            EventKey::SetFlowPercent => {
                self.edit_integer(value, Field::Flow, |v| printer.set_flow_percent(v))
            }
            EventKey::SetFanPercent => self.edit_integer(value, Field::Fan, |v| {
                printer.set_fan_percent(v.min(100) as u8)
            }),
            EventKey::SetTargetTemp(heater) => match value.integer() {
                Some(celsius) => {
                    self.set_target(heater, celsius as i16, printer);
                    ACCEPTED
                }
                None => IGNORED,
            },
            EventKey::Preheat => match value.index().and_then(PreheatChoice::from_index) {
                Some(choice) => {
                    self.preheat(choice, printer);
                    ACCEPTED
                }
                None => IGNORED,
            },
            EventKey::SetZOffset => {
                let Some(offset) = value.fixed() else {
                    return IGNORED;
                };
                let limits = &self.config.limits;
                let offset = offset.rescale(2).clamp_raw(
                    limits.min_z_offset_x100 as i32,
                    limits.max_z_offset_x100 as i32,
                );
                printer.set_z_offset(offset);
                self.invalidate(Field::ZOffset);
                ACCEPTED
            }
            EventKey::SetStepsPerMm(axis) => {
                let Some(steps) = value.fixed() else {
                    return IGNORED;
                };
                let steps = steps
                    .rescale(1)
                    .clamp_raw(1, self.config.limits.max_steps_per_mm_x10);
                printer.set_steps_per_mm(axis, steps);
                self.echo(key, steps, out)
            }
            EventKey::SetPidTerm(heater, term) => {
                let Some(gain) = value.fixed() else {
                    return IGNORED;
                };
                let gain = gain.rescale(2).clamp_raw(0, self.config.limits.max_pid_x100);
                printer.set_pid_term(heater, term, gain);
                self.echo(key, gain, out)
            }

            EventKey::AxisJog(axis) => self.jog(axis, value, printer),
            EventKey::HomeAll => self.start_operation(OperationId::Homing, printer, out),
            EventKey::StartLeveling => self.start_operation(OperationId::Leveling, printer, out),
            EventKey::DisableSteppers => {
                if printer.state().is_active() {
                    return IGNORED;
                }
                if let Err(e) = printer.enqueue(MotionCommand::DisableSteppers) {
                    warn!("disable steppers refused: {:?}", e);
                    return IGNORED;
                }
                ACCEPTED
            }
            EventKey::CancelOperation => match self.state.clear_blocking() {
                Some(op) => {
                    info!("{:?} cancelled", op);
                    printer.drop_pending();
                    self.request_immediate();
                    self.invalidate(Field::Status);
                    self.show_page(op.return_page(), out)?;
                    ACCEPTED
                }
                None => IGNORED,
            },

            EventKey::SelectFile => match value.index() {
                Some(slot) => self.select_file(slot, printer, out),
                None => IGNORED,
            },
            EventKey::FilePage => match value.index().and_then(FilePageAction::from_index) {
                Some(action) => self.turn_file_page(action, printer, out),
                None => IGNORED,
            },
            EventKey::StartPrintJob => self.start_print(printer, out),
            EventKey::PausePrintJob => {
                if printer.state() != JobState::Printing {
                    return IGNORED;
                }
                printer.pause();
                self.request_immediate();
                self.show_page(PageId::Paused, out)?;
                ACCEPTED
            }
            EventKey::ResumePrintJob => {
                if printer.state() != JobState::Paused {
                    return IGNORED;
                }
                printer.resume();
                self.request_immediate();
                self.show_page(PageId::Printing, out)?;
                ACCEPTED
            }
            EventKey::StopPrintJob => {
                if !printer.state().is_active() {
                    return IGNORED;
                }
                let popup = PopupContext::new(
                    PopupKind::StopPrint,
                    EventKey::AbortPrintJob,
                    EventKey::Dismiss,
                );
                self.open_popup(popup, None, out)?;
                ACCEPTED
            }

            EventKey::SettingsAction => match value.index().and_then(SettingsChoice::from_index) {
                Some(choice) => self.settings_action(choice, printer, out),
                None => IGNORED,
            },
            EventKey::SetBrightness
            | EventKey::SetStandbyBrightness
            | EventKey::SetStandbySeconds
            | EventKey::SetVolume => match value.integer() {
                Some(v) => self.edit_display(key, v, out),
                None => IGNORED,
            },

            // Answered in `answer_popup`; reaching here means no popup is open
            EventKey::ConfirmPopup | EventKey::CancelPopup | EventKey::MoveHighlight => IGNORED,

            EventKey::Dismiss => ACCEPTED,
            EventKey::AbortPrintJob => {
                printer.abort();
                printer.drop_pending();
                self.request_immediate();
                self.show_page(PageId::Main, out)?;
                ACCEPTED
            }
            EventKey::ResumeRecoveredJob => {
                printer.resume_recovered();
                self.request_immediate();
                self.show_page(PageId::Printing, out)?;
                ACCEPTED
            }
            EventKey::DiscardRecoveredJob => {
                printer.discard_recovered();
                self.show_page(PageId::Main, out)?;
                ACCEPTED
            }
            EventKey::ResumeAfterRunout => {
                if printer.state() == JobState::Paused {
                    printer.resume();
                }
                self.request_immediate();
                self.show_page(PageId::Printing, out)?;
                ACCEPTED
            }
            EventKey::ResetToDefaults => {
                printer.reset_to_defaults();
                self.display = DisplaySettings::default();
                self.persist_display = true;
                self.redraw_all();
                self.display.apply(out)?;
                self.draw_display_settings(out)?;
                ACCEPTED
            }
            EventKey::AcknowledgeFatal => {
                self.state.clear_blocking();
                self.redraw_all();
                self.show_page(PageId::Main, out)?;
                ACCEPTED
            }
        }
    }

    fn edit_integer(
        &mut self,
        value: InterpretedValue,
        field: Field,
        apply: impl FnOnce(u16),
    ) -> Handled {
        match value.integer() {
            Some(v) => {
                apply(v);
                self.invalidate(field);
                ACCEPTED
            }
            None => IGNORED,
        }
    }

    fn echo(&mut self, key: EventKey, value: Fixed, out: &mut CommandEncoder) -> Handled {
        if let Some(address) = echo_field(key) {
            out.write_fixed(address, value)?;
        }
        ACCEPTED
    }

    fn set_target<P: Printer + ?Sized>(&mut self, heater: Heater, celsius: i16, printer: &mut P) {
        let celsius = celsius.clamp(0, self.config.limits.max_target(heater));
        printer.set_target(heater, celsius);
        self.invalidate(Field::target_temp(heater));
    }

    fn preheat<P: Printer + ?Sized>(&mut self, choice: PreheatChoice, printer: &mut P) {
        let (hotend, bed) = match choice {
            PreheatChoice::Pla => (self.config.pla.hotend_c, self.config.pla.bed_c),
            PreheatChoice::Abs => (self.config.abs.hotend_c, self.config.abs.bed_c),
            PreheatChoice::Cooldown => (0, 0),
        };
        self.set_target(Heater::Hotend, hotend, printer);
        self.set_target(Heater::Bed, bed, printer);
    }

    fn jog<P: Printer + ?Sized>(
        &mut self,
        axis: Axis,
        value: InterpretedValue,
        printer: &mut P,
    ) -> Handled {
        let (Some(target), Some(travel)) = (value.fixed(), self.config.limits.travel(axis)) else {
            return IGNORED;
        };
        if printer.state().is_active() {
            debug!("jog ignored while printing");
            return IGNORED;
        }

        let position = target
            .rescale(1)
            .clamp_raw(travel.min_mm as i32 * 10, travel.max_mm as i32 * 10);
        if let Err(e) = printer.enqueue(MotionCommand::MoveTo { axis, position }) {
            warn!("jog refused: {:?}", e);
        }
        if let Some(field) = Field::position(axis) {
            self.invalidate(field);
        }
        ACCEPTED
    }

    fn start_operation<P: Printer + ?Sized>(
        &mut self,
        op: OperationId,
        printer: &mut P,
        out: &mut CommandEncoder,
    ) -> Handled {
        if printer.state().is_active() {
            return IGNORED;
        }
        let command = match op {
            OperationId::Homing => MotionCommand::HomeAll,
            OperationId::Leveling => MotionCommand::AutoLevel,
        };
        if let Err(e) = printer.enqueue(command) {
            warn!("{:?} refused: {:?}", op, e);
            return IGNORED;
        }
        info!("{:?} started", op);
        self.begin_operation(op, out)?;
        ACCEPTED
    }

    fn open_menu<P: Printer + ?Sized>(
        &mut self,
        target: MenuTarget,
        printer: &mut P,
        out: &mut CommandEncoder,
    ) -> Handled {
        match target {
            MenuTarget::Files => return self.open_file_list(printer, out),
            MenuTarget::Tune => {
                self.invalidate(Field::Feedrate);
                self.invalidate(Field::Flow);
                self.invalidate(Field::Fan);
                self.invalidate(Field::ZOffset);
                self.show_page(PageId::Tune, out)?;
            }
            MenuTarget::Temperature => {
                self.invalidate(Field::HotendTarget);
                self.invalidate(Field::BedTarget);
                self.show_page(PageId::Temperature, out)?;
            }
            MenuTarget::Move => {
                for axis in Axis::XYZ {
                    if let Some(field) = Field::position(axis) {
                        self.invalidate(field);
                    }
                }
                self.show_page(PageId::Move, out)?;
            }
            MenuTarget::Leveling => {
                self.invalidate(Field::ZOffset);
                self.show_page(PageId::Leveling, out)?;
            }
            MenuTarget::Settings => {
                self.draw_tuning(printer, out)?;
                self.draw_display_settings(out)?;
                self.show_page(PageId::Settings, out)?;
            }
            MenuTarget::Info => {
                let info = &self.config.info;
                out.write_text(vp::MACHINE_NAME, &info.name, TEXT_FIELD_WIDTH)?;
                out.write_text(vp::FIRMWARE_VERSION, &info.firmware_version, TEXT_FIELD_WIDTH)?;
                self.show_page(PageId::Info, out)?;
            }
        }
        ACCEPTED
    }

    /// Steps/mm and PID gains are not part of the snapshot, so the settings
    /// page draws them when opened
    fn draw_tuning<P: Printer + ?Sized>(
        &mut self,
        printer: &P,
        out: &mut CommandEncoder,
    ) -> Result<(), CommandError> {
        for axis in [Axis::X, Axis::Y, Axis::Z, Axis::E] {
            let key = EventKey::SetStepsPerMm(axis);
            self.echo(key, printer.steps_per_mm(axis).rescale(1), out)?;
        }
        for heater in [Heater::Hotend, Heater::Bed] {
            for term in [PidTerm::P, PidTerm::I, PidTerm::D] {
                let key = EventKey::SetPidTerm(heater, term);
                self.echo(key, printer.pid_term(heater, term).rescale(2), out)?;
            }
        }
        Ok(())
    }

    fn draw_display_settings(&mut self, out: &mut CommandEncoder) -> Result<(), CommandError> {
        out.write_word(vp::BRIGHTNESS, self.display.brightness as u16)?;
        out.write_word(vp::STANDBY_BRIGHTNESS, self.display.standby_brightness as u16)?;
        out.write_word(vp::STANDBY_SECONDS, self.display.standby_seconds)?;
        out.write_word(vp::VOLUME, self.display.volume as u16)
    }

    fn edit_display(&mut self, key: EventKey, value: u16, out: &mut CommandEncoder) -> Handled {
        let applied = match key {
            EventKey::SetBrightness => self.display.set_brightness(value) as u16,
            EventKey::SetStandbyBrightness => self.display.set_standby_brightness(value) as u16,
            EventKey::SetStandbySeconds => self.display.set_standby_seconds(value),
            EventKey::SetVolume => self.display.set_volume(value) as u16,
            _ => return IGNORED,
        };
        if let Some(address) = echo_field(key) {
            out.write_word(address, applied)?;
        }
        self.display.apply(out)?;
        ACCEPTED
    }

    fn settings_action<P: Printer + ?Sized>(
        &mut self,
        choice: SettingsChoice,
        printer: &mut P,
        out: &mut CommandEncoder,
    ) -> Handled {
        match choice {
            SettingsChoice::Save => match printer.save() {
                Ok(()) => {
                    self.persist_display = true;
                    ACCEPTED
                }
                Err(e) => {
                    warn!("saving settings failed: {:?}", e);
                    self.open_popup(PopupContext::notice(PopupKind::SaveFailed), None, out)?;
                    ACCEPTED
                }
            },
            SettingsChoice::Load => {
                if let Err(e) = printer.load() {
                    warn!("loading settings failed: {:?}", e);
                    return IGNORED;
                }
                self.redraw_all();
                self.draw_tuning(printer, out)?;
                ACCEPTED
            }
            SettingsChoice::ResetDefaults => {
                let popup = PopupContext::new(
                    PopupKind::ResetDefaults,
                    EventKey::ResetToDefaults,
                    EventKey::Dismiss,
                );
                self.open_popup(popup, None, out)?;
                ACCEPTED
            }
        }
    }
}
