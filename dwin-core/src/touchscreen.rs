//! Touchscreen orchestrator
//!
//! Owns every part of the link and runs them from the host's cooperative
//! loop. One call to [`Touchscreen::tick`]:
//!
//! 1. drains the serial port into the decoder
//! 2. dispatches every complete input
//! 3. stores display settings the user saved
//! 4. lets the periodic updater redraw changed fields
//! 5. writes all queued frames
//!
//! Nothing in a tick blocks. The startup handshake in
//! [`Touchscreen::start`] is the only wait, and it is bounded by the
//! configured timeout.

use dwin_hal::{Clock, SettingsStorage, Uart};
use dwin_protocol::CommandEncoder;

use crate::config::TouchscreenConfig;
use crate::dispatch::Dispatcher;
use crate::event::{EventDecoder, EventKey, EventTable};
use crate::link::{HandshakeOutcome, LinkState, LinkStats, LinkTransport};
use crate::settings::DisplaySettings;
use crate::state::{FatalKind, ProcessState};
use crate::traits::Printer;
use crate::updater::{PeriodicUpdater, PrinterSnapshot};

/// A DWIN panel attached to a printer
pub struct Touchscreen<U: Uart, S: SettingsStorage> {
    link: LinkTransport<U>,
    decoder: EventDecoder,
    dispatcher: Dispatcher,
    updater: PeriodicUpdater,
    outbox: CommandEncoder,
    storage: S,
}

impl<U: Uart, S: SettingsStorage> Touchscreen<U, S> {
    /// Panel using the standard address table
    pub fn new(uart: U, storage: S, config: TouchscreenConfig) -> Self {
        Self::with_table(uart, storage, config, EventTable::standard())
    }

    /// Panel with a host-supplied address table
    pub fn with_table(uart: U, storage: S, config: TouchscreenConfig, table: EventTable) -> Self {
        Self {
            link: LinkTransport::new(uart, config.link),
            decoder: EventDecoder::new(table),
            updater: PeriodicUpdater::new(config.refresh),
            dispatcher: Dispatcher::new(config),
            outbox: CommandEncoder::new(),
            storage,
        }
    }

    /// Bring the panel up
    ///
    /// Runs the handshake, restores the stored display settings, shows the
    /// main page and draws every field. A handshake timeout is not an
    /// error; the panel may come up later.
    pub fn start<C: Clock + ?Sized, P: Printer + ?Sized>(
        &mut self,
        clock: &C,
        printer: &P,
    ) -> HandshakeOutcome {
        let outcome = self.link.handshake(&mut self.decoder, clock);

        let settings = DisplaySettings::load_or_default(&mut self.storage);
        self.dispatcher.set_display_settings(settings);
        if let Err(e) = settings.apply(&mut self.outbox) {
            warn!("display settings not applied: {:?}", e);
        }
        self.dispatcher.enter_main(&mut self.outbox);

        self.forward_refresh();
        let snapshot = PrinterSnapshot::sample(printer, None);
        self.updater.tick(clock.now_ms(), &snapshot, &mut self.outbox);
        self.link.flush(&mut self.outbox);
        outcome
    }

    /// Run one pass of the loop
    pub fn tick<P: Printer + ?Sized>(&mut self, now_ms: u32, printer: &mut P) {
        self.link.poll(&mut self.decoder);
        if self.link.state() == LinkState::ErrorRecovery {
            self.dispatcher.on_link_error(printer, &mut self.outbox);
        }

        loop {
            match self.decoder.next_event() {
                Ok(Some(event)) => {
                    let disposition =
                        self.dispatcher.dispatch_event(&event, printer, &mut self.outbox);
                    debug!("{:?} -> {:?}", event.key, disposition);
                    self.link.flush(&mut self.outbox);
                }
                Ok(None) => break,
                Err(e) => {
                    if self.link.on_frame_error(e, &mut self.decoder) {
                        self.dispatcher.on_link_error(printer, &mut self.outbox);
                        break;
                    }
                }
            }
        }
        self.link.note_late_ack(&mut self.decoder);

        self.persist_settings();
        self.forward_refresh();

        let snapshot = PrinterSnapshot::sample(printer, self.dispatcher.state().blocking());
        self.updater.tick(now_ms, &snapshot, &mut self.outbox);
        self.link.flush(&mut self.outbox);
    }

    fn forward_refresh(&mut self) {
        let request = self.dispatcher.take_refresh();
        if !request.is_empty() {
            self.updater.request(request);
        }
    }

    fn persist_settings(&mut self) {
        let Some(settings) = self.dispatcher.take_persist_request() else {
            return;
        };
        match settings.store(&mut self.storage) {
            Ok(()) => info!("display settings saved"),
            Err(e) => {
                warn!("display settings not saved: {:?}", e);
                self.dispatcher.notify_settings_not_saved(&mut self.outbox);
            }
        }
    }

    pub fn state(&self) -> &ProcessState {
        self.dispatcher.state()
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn link(&self) -> &LinkTransport<U> {
        &self.link
    }

    pub fn link_mut(&mut self) -> &mut LinkTransport<U> {
        &mut self.link
    }

    pub fn link_stats(&self) -> LinkStats {
        self.link.stats()
    }

    pub fn decoder(&self) -> &EventDecoder {
        &self.decoder
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn notify_homing_started(&mut self) {
        self.dispatcher.notify_homing_started(&mut self.outbox);
    }

    pub fn notify_homing_finished(&mut self) {
        self.dispatcher.notify_homing_finished(&mut self.outbox);
    }

    pub fn notify_leveling_started(&mut self) {
        self.dispatcher.notify_leveling_started(&mut self.outbox);
    }

    pub fn notify_leveling_finished(&mut self) {
        self.dispatcher.notify_leveling_finished(&mut self.outbox);
    }

    pub fn notify_print_started(&mut self) {
        self.dispatcher.notify_print_started(&mut self.outbox);
    }

    pub fn notify_print_paused(&mut self) {
        self.dispatcher.notify_print_paused(&mut self.outbox);
    }

    pub fn notify_print_resumed(&mut self) {
        self.dispatcher.notify_print_resumed(&mut self.outbox);
    }

    pub fn notify_print_finished(&mut self) {
        self.dispatcher.notify_print_finished(&mut self.outbox);
    }

    pub fn notify_print_aborted(&mut self) {
        self.dispatcher.notify_print_aborted(&mut self.outbox);
    }

    pub fn notify_power_loss_recoverable(&mut self) {
        self.dispatcher.notify_power_loss_recoverable(&mut self.outbox);
    }

    pub fn notify_filament_runout(&mut self) {
        self.dispatcher.notify_filament_runout(&mut self.outbox);
    }

    pub fn notify_fatal(&mut self, kind: FatalKind) {
        self.dispatcher.notify_fatal(kind, &mut self.outbox);
    }

    pub fn offer_confirmation(&mut self, prompt: &str, on_confirm: EventKey, on_cancel: EventKey) {
        self.dispatcher
            .offer_confirmation(prompt, on_confirm, on_cancel, &mut self.outbox);
    }
}
