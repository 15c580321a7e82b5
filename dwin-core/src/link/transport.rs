//! Link transport
//!
//! Owns the serial port. Drains received bytes into the [`EventDecoder`]
//! every tick, writes queued frames out, and runs the startup handshake.
//!
//! ```text
//! Uninit ──► Handshaking ──ack──► Ready ◄──► ErrorRecovery
//!                 │                 ▲
//!                 └───timeout───────┘ (degraded)
//! ```
//!
//! The wire format has no checksum. Sentinel bytes are the only framing
//! check, and a burst of discarded bytes is the only trigger for a resync.

use dwin_hal::{Clock, Uart, UartConfig};
use dwin_protocol::{CommandEncoder, DisplayCommand, Frame, FrameError};

use crate::config::LinkConfig;
use crate::event::EventDecoder;

/// Bytes requested from the port per read
pub const READ_CHUNK: usize = 64;

/// Link state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkState {
    Uninit,
    Handshaking,
    Ready,
    /// Accumulator was discarded; back to `Ready` on the next poll
    ErrorRecovery,
}

/// Result of the startup handshake
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HandshakeOutcome {
    Acknowledged,
    /// No reply in time; the link runs degraded
    TimedOut,
}

/// Link counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LinkStats {
    pub frames_sent: u32,
    pub tx_errors: u32,
    pub rx_errors: u32,
    pub bytes_received: u32,
    pub bytes_discarded: u32,
    pub resyncs: u32,
}

/// Serial transport for one panel
pub struct LinkTransport<U: Uart> {
    uart: U,
    config: LinkConfig,
    state: LinkState,
    degraded: bool,
    stats: LinkStats,
}

impl<U: Uart> LinkTransport<U> {
    pub fn new(uart: U, config: LinkConfig) -> Self {
        Self {
            uart,
            config,
            state: LinkState::Uninit,
            degraded: false,
            stats: LinkStats::default(),
        }
    }

    /// Port settings the panel expects
    pub fn uart_config(config: &LinkConfig) -> UartConfig {
        UartConfig::with_baudrate(config.baudrate)
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    /// The handshake timed out and no acknowledgement has been seen since
    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    pub fn stats(&self) -> LinkStats {
        self.stats
    }

    pub fn uart(&self) -> &U {
        &self.uart
    }

    pub fn uart_mut(&mut self) -> &mut U {
        &mut self.uart
    }

    pub fn into_inner(self) -> U {
        self.uart
    }

    /// Probe the panel and wait for its reply
    ///
    /// Sends a single handshake frame and polls until the acknowledgement
    /// arrives or the timeout elapses. There is no retry: on timeout the
    /// link still becomes `Ready`, flagged degraded, so the printer keeps
    /// running without a panel. A reply that arrives later clears the flag.
    pub fn handshake<C: Clock + ?Sized>(
        &mut self,
        decoder: &mut EventDecoder,
        clock: &C,
    ) -> HandshakeOutcome {
        self.state = LinkState::Handshaking;
        decoder.take_handshake_ack();

        match DisplayCommand::Handshake.to_frame() {
            Ok(frame) => {
                self.send(&frame);
            }
            Err(e) => warn!("handshake frame: {:?}", e),
        }

        let start = clock.now_ms();
        loop {
            self.receive(decoder);
            self.drain_until_ack(decoder);
            if decoder.take_handshake_ack() {
                info!("display handshake ok");
                self.state = LinkState::Ready;
                self.degraded = false;
                return HandshakeOutcome::Acknowledged;
            }
            if clock.elapsed_since(start) >= self.config.handshake_timeout_ms {
                break;
            }
        }

        warn!("display handshake timed out, continuing degraded");
        decoder.reset();
        self.state = LinkState::Ready;
        self.degraded = true;
        HandshakeOutcome::TimedOut
    }

    /// Consume frames that arrive before the link is up
    fn drain_until_ack(&mut self, decoder: &mut EventDecoder) {
        loop {
            match decoder.decode_next() {
                Ok(Some(raw)) => debug!("input {=u16:#x} before handshake", raw.address),
                Ok(None) => return,
                Err(e) => {
                    if self.on_frame_error(e, decoder) {
                        return;
                    }
                }
            }
        }
    }

    /// Move received bytes into the decoder
    ///
    /// Called once per tick. Reads until the port is empty, the per-tick
    /// read budget is spent or the decoder is full. Bytes that do not fit
    /// stay in the port until the pending frames have been taken out.
    /// Returns the number of bytes moved.
    pub fn poll(&mut self, decoder: &mut EventDecoder) -> usize {
        if self.state == LinkState::ErrorRecovery {
            self.state = LinkState::Ready;
        }
        self.receive(decoder)
    }

    fn receive(&mut self, decoder: &mut EventDecoder) -> usize {
        let mut buf = [0u8; READ_CHUNK];
        let mut total = 0;

        for _ in 0..self.config.max_reads_per_tick {
            let room = decoder.room().min(READ_CHUNK);
            if room == 0 {
                break;
            }
            let n = match self.uart.read_available(&mut buf[..room]) {
                Ok(0) => break,
                Ok(n) => n,
                Err(_) => {
                    warn!("display uart read failed");
                    self.stats.rx_errors = self.stats.rx_errors.wrapping_add(1);
                    break;
                }
            };
            total += n;
            self.stats.bytes_received = self.stats.bytes_received.wrapping_add(n as u32);
            trace!("rx {=usize} bytes", n);

            if let Err(e) = decoder.push(&buf[..n]) {
                self.on_frame_error(e, decoder);
                break;
            }
        }
        total
    }

    /// React to a decoder error; returns whether the accumulator was reset
    ///
    /// Overflow always resets. Sentinel and length errors reset once the
    /// bytes discarded since the last good frame reach the resync threshold;
    /// below that the decoder keeps scanning on its own.
    pub fn on_frame_error(&mut self, error: FrameError, decoder: &mut EventDecoder) -> bool {
        let discarded = decoder.discarded();
        let resync = match error {
            FrameError::Overflow => true,
            _ => discarded >= self.config.resync_threshold as usize,
        };
        if !resync {
            trace!("frame error {:?}, scanning", error);
            return false;
        }

        warn!("display link resync after {:?}", error);
        let dropped = discarded + decoder.pending();
        self.stats.bytes_discarded = self.stats.bytes_discarded.wrapping_add(dropped as u32);
        self.stats.resyncs = self.stats.resyncs.wrapping_add(1);
        decoder.reset();
        self.state = LinkState::ErrorRecovery;
        true
    }

    /// A handshake reply showed up after the link was declared degraded
    pub fn note_late_ack(&mut self, decoder: &mut EventDecoder) {
        if decoder.take_handshake_ack() && self.degraded {
            info!("display answered late handshake");
            self.degraded = false;
        }
    }

    /// Write every queued frame
    ///
    /// A frame the port refuses is counted and dropped.
    pub fn flush(&mut self, out: &mut CommandEncoder) -> usize {
        let mut sent = 0;
        while let Some(frame) = out.pop() {
            if self.send(&frame) {
                sent += 1;
            }
        }
        if sent > 0 && self.uart.flush().is_err() {
            warn!("display uart flush failed");
        }
        sent
    }

    fn send(&mut self, frame: &Frame) -> bool {
        let bytes = match frame.encode_to_vec() {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("frame not encoded: {:?}", e);
                self.stats.tx_errors = self.stats.tx_errors.wrapping_add(1);
                return false;
            }
        };
        match self.uart.write_all(&bytes) {
            Ok(()) => {
                self.stats.frames_sent = self.stats.frames_sent.wrapping_add(1);
                true
            }
            Err(_) => {
                warn!("display uart write failed");
                self.stats.tx_errors = self.stats.tx_errors.wrapping_add(1);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventKey;
    use crate::fields::vp;
    use crate::testing::{LoopbackUart, ManualClock};
    use dwin_protocol::inbound::ACCUMULATOR_SIZE;

    const ACK: [u8; 5] = [0x5A, 0xA5, 0x00, b'O', b'K'];

    fn transport(uart: LoopbackUart) -> LinkTransport<LoopbackUart> {
        LinkTransport::new(uart, LinkConfig::default())
    }

    fn feedrate_frame(value: u16) -> [u8; 9] {
        let [a_hi, a_lo] = vp::FEEDRATE.to_be_bytes();
        let [v_hi, v_lo] = value.to_be_bytes();
        [0x5A, 0xA5, 0x06, 0x83, a_hi, a_lo, 0x01, v_hi, v_lo]
    }

    #[test]
    fn test_handshake_acknowledged() {
        let mut link = transport(LoopbackUart {
            ack_handshake: true,
            ..LoopbackUart::default()
        });
        let mut decoder = EventDecoder::default();
        let clock = ManualClock::stepping(10);

        assert_eq!(link.handshake(&mut decoder, &clock), HandshakeOutcome::Acknowledged);
        assert_eq!(link.state(), LinkState::Ready);
        assert!(!link.is_degraded());
        assert_eq!(
            link.uart().tx,
            [0x5A, 0xA5, 0x00, 0x00, 0x00, 0xCC, 0x33, 0xC3, 0x3C]
        );
    }

    #[test]
    fn test_handshake_timeout_is_degraded_ready() {
        let mut link = transport(LoopbackUart::default());
        let mut decoder = EventDecoder::default();
        let clock = ManualClock::stepping(100);

        assert_eq!(link.handshake(&mut decoder, &clock), HandshakeOutcome::TimedOut);
        assert_eq!(link.state(), LinkState::Ready);
        assert!(link.is_degraded());
    }

    /// Known gap: a lost handshake is never retried, so exactly one probe
    /// goes out however long the panel stays silent
    #[test]
    fn test_handshake_not_retried() {
        let mut link = transport(LoopbackUart::default());
        let mut decoder = EventDecoder::default();
        let clock = ManualClock::stepping(1);

        link.handshake(&mut decoder, &clock);
        assert_eq!(link.uart().sent_frames().len(), 1);
        assert_eq!(link.stats().frames_sent, 1);

        let mut out = CommandEncoder::new();
        for _ in 0..5 {
            link.poll(&mut decoder);
            link.flush(&mut out);
        }
        assert_eq!(link.uart().sent_frames().len(), 1);
    }

    #[test]
    fn test_wrong_reply_is_not_an_ack() {
        let mut link = transport(LoopbackUart::default());
        link.uart_mut().feed(&[0x5A, 0xA5, 0x00, b'N', b'O']);
        let mut decoder = EventDecoder::default();
        let clock = ManualClock::stepping(100);

        assert_eq!(link.handshake(&mut decoder, &clock), HandshakeOutcome::TimedOut);
    }

    #[test]
    fn test_late_ack_clears_degraded() {
        let mut link = transport(LoopbackUart::default());
        let mut decoder = EventDecoder::default();
        link.handshake(&mut decoder, &ManualClock::stepping(100));
        assert!(link.is_degraded());

        link.uart_mut().feed(&ACK);
        link.poll(&mut decoder);
        assert_eq!(decoder.next_event(), Ok(None));
        link.note_late_ack(&mut decoder);
        assert!(!link.is_degraded());
    }

    #[test]
    fn test_poll_drains_port() {
        let mut link = transport(LoopbackUart::default());
        let mut decoder = EventDecoder::default();
        let frame = feedrate_frame(150);
        link.uart_mut().feed(&frame[..4]);

        assert_eq!(link.poll(&mut decoder), 4);
        assert_eq!(decoder.next_event(), Ok(None));

        link.uart_mut().feed(&frame[4..]);
        link.poll(&mut decoder);
        let event = decoder.next_event().unwrap().unwrap();
        assert_eq!(event.key, EventKey::SetFeedratePercent);
    }

    #[test]
    fn test_read_budget_limits_one_poll() {
        let mut link = transport(LoopbackUart::default());
        let mut decoder = EventDecoder::default();
        link.uart_mut().feed(&[0u8; READ_CHUNK * 10]);

        let budget = LinkConfig::default().max_reads_per_tick as usize;
        assert_eq!(link.poll(&mut decoder), READ_CHUNK * budget);
        assert_eq!(link.uart().rx.len(), READ_CHUNK * (10 - budget));
    }

    #[test]
    fn test_valid_burst_after_partial_frame_does_not_resync() {
        let mut link = transport(LoopbackUart::default());
        let mut decoder = EventDecoder::default();
        let first = feedrate_frame(150);
        link.uart_mut().feed(&first[..4]);
        link.poll(&mut decoder);

        link.uart_mut().feed(&first[4..]);
        for _ in 0..70 {
            link.uart_mut().feed(&feedrate_frame(120));
        }

        let mut events = 0;
        for _ in 0..4 {
            link.poll(&mut decoder);
            while decoder.next_event().unwrap().is_some() {
                events += 1;
            }
        }
        assert_eq!(events, 71);
        assert_eq!(link.stats().resyncs, 0);
        assert_eq!(link.state(), LinkState::Ready);
        assert_eq!(decoder.pending(), 0);
        assert!(link.uart().rx.is_empty());
    }

    #[test]
    fn test_read_stops_when_decoder_is_full() {
        let mut link = transport(LoopbackUart::default());
        let mut decoder = EventDecoder::default();
        link.uart_mut().feed(&[0u8; 10]);
        link.poll(&mut decoder);

        link.uart_mut().feed(&[0u8; READ_CHUNK * 10]);
        assert_eq!(link.poll(&mut decoder), ACCUMULATOR_SIZE - 10);
        assert_eq!(decoder.room(), 0);
        assert_eq!(link.stats().resyncs, 0);
    }

    #[test]
    fn test_small_glitch_does_not_resync() {
        let mut link = transport(LoopbackUart::default());
        let mut decoder = EventDecoder::default();
        link.uart_mut().feed(&[0x5A, 0x00]);
        link.uart_mut().feed(&feedrate_frame(120));
        link.poll(&mut decoder);

        let err = decoder.next_event().unwrap_err();
        assert!(!link.on_frame_error(err, &mut decoder));
        assert_eq!(link.state(), LinkState::Ready);
        assert!(decoder.next_event().unwrap().is_some());
    }

    #[test]
    fn test_garbage_burst_resyncs() {
        let mut link = transport(LoopbackUart::default());
        let mut decoder = EventDecoder::default();
        link.uart_mut().feed(&[0x5A; 16]);
        link.poll(&mut decoder);

        let mut reset = false;
        while let Err(e) = decoder.next_event() {
            if link.on_frame_error(e, &mut decoder) {
                reset = true;
                break;
            }
        }
        assert!(reset);
        assert_eq!(link.state(), LinkState::ErrorRecovery);
        assert_eq!(link.stats().resyncs, 1);
        assert_eq!(decoder.pending(), 0);

        link.poll(&mut decoder);
        assert_eq!(link.state(), LinkState::Ready);
    }

    #[test]
    fn test_flush_writes_frames_in_order() {
        let mut link = transport(LoopbackUart::default());
        let mut out = CommandEncoder::new();
        out.write_word(vp::FEEDRATE, 150).unwrap();
        out.switch_page(3).unwrap();

        assert_eq!(link.flush(&mut out), 2);
        assert!(out.is_empty());
        let frames = link.uart().sent_frames();
        assert_eq!(frames[0].address, vp::FEEDRATE);
        assert_eq!(frames[1].payload.as_slice(), &[0x5A, 0x01, 0x00, 0x03]);
    }

    #[test]
    fn test_write_failure_counted_and_dropped() {
        let mut link = transport(LoopbackUart {
            fail_writes: true,
            ..LoopbackUart::default()
        });
        let mut out = CommandEncoder::new();
        out.refresh().unwrap();

        assert_eq!(link.flush(&mut out), 0);
        assert!(out.is_empty());
        assert_eq!(link.stats().tx_errors, 1);
    }

    #[test]
    fn test_uart_config_follows_link_config() {
        let config = LinkConfig {
            baudrate: 9600,
            ..LinkConfig::default()
        };
        assert_eq!(LinkTransport::<LoopbackUart>::uart_config(&config).baudrate, 9600);
    }
}
