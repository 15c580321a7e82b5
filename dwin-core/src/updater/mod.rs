//! Periodic updater
//!
//! Samples the printer on a fixed cadence and writes only the display
//! fields whose value changed since the previous sample. Print start,
//! pause and finish request an immediate pass; live edits mark their
//! field so it is redrawn on the next pass even when the value did not
//! change (the panel shows what the user typed until it is overwritten).

pub mod snapshot;

pub use snapshot::{PrinterSnapshot, Temperature};

use dwin_protocol::{CommandEncoder, CommandError};

use crate::config::RefreshConfig;
use crate::fields::{vp, Field, FieldSet};

/// Redraw work collected between updater passes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RefreshRequest {
    /// Fields to redraw even if unchanged
    pub fields: FieldSet,
    /// Run the next pass without waiting for the interval
    pub immediate: bool,
    /// Forget the previous snapshot and redraw everything
    pub full: bool,
}

impl RefreshRequest {
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && !self.immediate && !self.full
    }
}

/// Emits display writes for changed snapshot fields
#[derive(Debug, Clone)]
pub struct PeriodicUpdater {
    interval_ms: u32,
    previous: Option<PrinterSnapshot>,
    invalid: FieldSet,
    immediate: bool,
    last_run_ms: Option<u32>,
}

impl Default for PeriodicUpdater {
    fn default() -> Self {
        Self::new(RefreshConfig::default())
    }
}

impl PeriodicUpdater {
    pub fn new(config: RefreshConfig) -> Self {
        Self {
            interval_ms: config.interval_ms,
            previous: None,
            invalid: FieldSet::EMPTY,
            immediate: false,
            last_run_ms: None,
        }
    }

    /// Redraw these fields on the next pass
    pub fn invalidate(&mut self, fields: impl Into<FieldSet>) {
        self.invalid = self.invalid.union(fields.into());
    }

    /// Redraw every field on the next pass
    pub fn invalidate_all(&mut self) {
        self.previous = None;
        self.immediate = true;
    }

    /// Run the next pass without waiting for the interval
    pub fn request_immediate(&mut self) {
        self.immediate = true;
    }

    /// Merge redraw work requested by the dispatcher
    pub fn request(&mut self, request: RefreshRequest) {
        if request.full {
            self.invalidate_all();
        }
        if request.immediate {
            self.request_immediate();
        }
        self.invalidate(request.fields);
    }

    /// Fields waiting for a redraw
    pub fn invalid(&self) -> FieldSet {
        self.invalid
    }

    pub fn is_due(&self, now_ms: u32) -> bool {
        if self.immediate || !self.invalid.is_empty() {
            return true;
        }
        match self.last_run_ms {
            None => true,
            Some(last) => now_ms.wrapping_sub(last) >= self.interval_ms,
        }
    }

    /// Run a pass if one is due; returns the number of frames queued
    pub fn tick(
        &mut self,
        now_ms: u32,
        snapshot: &PrinterSnapshot,
        out: &mut CommandEncoder,
    ) -> usize {
        if !self.is_due(now_ms) {
            return 0;
        }
        self.last_run_ms = Some(now_ms);
        self.immediate = false;
        self.update(snapshot, out)
    }

    /// Diff against the previous snapshot and queue writes for changes
    ///
    /// A field whose write cannot be queued stays invalid and is retried on
    /// the next pass.
    pub fn update(&mut self, snapshot: &PrinterSnapshot, out: &mut CommandEncoder) -> usize {
        let mut queued = 0;
        let mut failed = FieldSet::EMPTY;

        for field in Field::ALL {
            let unchanged = self
                .previous
                .as_ref()
                .is_some_and(|prev| prev.same(snapshot, field));
            if unchanged && !self.invalid.contains(field) {
                continue;
            }
            match write_field(field, snapshot, out) {
                Ok(frames) => queued += frames,
                Err(e) => {
                    warn!("field {:?} not written: {:?}", field, e);
                    failed.insert(field);
                }
            }
        }

        self.invalid = failed;
        self.previous = Some(*snapshot);
        queued
    }
}

fn hours_minutes(seconds: u32) -> (u16, u16) {
    let hours = (seconds / 3600).min(u16::MAX as u32) as u16;
    let minutes = ((seconds % 3600) / 60) as u16;
    (hours, minutes)
}

fn write_field(
    field: Field,
    s: &PrinterSnapshot,
    out: &mut CommandEncoder,
) -> Result<usize, CommandError> {
    match field {
        Field::Status => out.write_word(vp::STATUS_ICON, s.status_code()).map(|_| 1),
        Field::Progress => {
            out.write_word(vp::PROGRESS, s.progress_percent as u16)?;
            out.write_word(vp::PROGRESS_ICON, s.progress_percent as u16 / 10)?;
            Ok(2)
        }
        Field::Elapsed => {
            let (hours, minutes) = hours_minutes(s.elapsed_s);
            out.write_word(vp::ELAPSED_HOURS, hours)?;
            out.write_word(vp::ELAPSED_MINUTES, minutes)?;
            Ok(2)
        }
        Field::Remaining => {
            let (hours, minutes) = hours_minutes(s.remaining_s);
            out.write_word(vp::REMAINING_HOURS, hours)?;
            out.write_word(vp::REMAINING_MINUTES, minutes)?;
            Ok(2)
        }
        Field::HotendCurrent => out.write_signed(vp::HOTEND_CURRENT, s.hotend.current).map(|_| 1),
        Field::HotendTarget => out.write_signed(vp::HOTEND_TARGET, s.hotend.target).map(|_| 1),
        Field::BedCurrent => out.write_signed(vp::BED_CURRENT, s.bed.current).map(|_| 1),
        Field::BedTarget => out.write_signed(vp::BED_TARGET, s.bed.target).map(|_| 1),
        Field::Feedrate => out.write_word(vp::FEEDRATE, s.feedrate_percent).map(|_| 1),
        Field::Flow => out.write_word(vp::FLOW, s.flow_percent).map(|_| 1),
        Field::Fan => out.write_word(vp::FAN, s.fan_percent as u16).map(|_| 1),
        Field::PositionX => out.write_fixed(vp::X_POSITION, s.position[0]).map(|_| 1),
        Field::PositionY => out.write_fixed(vp::Y_POSITION, s.position[1]).map(|_| 1),
        Field::PositionZ => out.write_fixed(vp::Z_POSITION, s.position[2]).map(|_| 1),
        Field::ZOffset => out.write_fixed(vp::Z_OFFSET, s.z_offset).map(|_| 1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dwin_protocol::command::CMD_VAR_WRITE;
    use dwin_protocol::{Fixed, Frame, OUTBOX_CAPACITY};

    fn drain(out: &mut CommandEncoder) -> std::vec::Vec<Frame> {
        core::iter::from_fn(|| out.pop()).collect()
    }

    /// Updater that has already drawn `snapshot`
    fn primed(snapshot: &PrinterSnapshot) -> PeriodicUpdater {
        let mut updater = PeriodicUpdater::default();
        let mut out = CommandEncoder::new();
        updater.tick(0, snapshot, &mut out);
        updater
    }

    #[test]
    fn test_first_pass_draws_everything() {
        let mut updater = PeriodicUpdater::default();
        let mut out = CommandEncoder::new();
        let queued = updater.tick(0, &PrinterSnapshot::default(), &mut out);
        // three double-word fields
        assert_eq!(queued, Field::ALL.len() + 3);
        assert_eq!(out.pending(), queued);
    }

    #[test]
    fn test_unchanged_snapshot_writes_nothing() {
        let snapshot = PrinterSnapshot::default();
        let mut updater = primed(&snapshot);
        let mut out = CommandEncoder::new();
        assert_eq!(updater.tick(500, &snapshot, &mut out), 0);
        assert!(out.is_empty());
    }

    #[test]
    fn test_single_changed_field() {
        let before = PrinterSnapshot::default();
        let mut updater = primed(&before);
        let after = PrinterSnapshot {
            feedrate_percent: 150,
            ..before
        };

        let mut out = CommandEncoder::new();
        updater.tick(500, &after, &mut out);
        let frames = drain(&mut out);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].command, CMD_VAR_WRITE);
        assert_eq!(frames[0].address, vp::FEEDRATE);
        assert_eq!(frames[0].payload.as_slice(), &[0x00, 0x96]);
    }

    #[test]
    fn test_respects_interval() {
        let before = PrinterSnapshot::default();
        let mut updater = primed(&before);
        let after = PrinterSnapshot {
            hotend: Temperature {
                current: 30,
                target: 0,
            },
            ..before
        };

        let mut out = CommandEncoder::new();
        assert_eq!(updater.tick(499, &after, &mut out), 0);
        assert_eq!(updater.tick(500, &after, &mut out), 1);
    }

    #[test]
    fn test_immediate_request_skips_interval() {
        let before = PrinterSnapshot::default();
        let mut updater = primed(&before);
        let after = PrinterSnapshot {
            job: crate::traits::JobState::Printing,
            ..before
        };

        updater.request_immediate();
        let mut out = CommandEncoder::new();
        assert_eq!(updater.tick(10, &after, &mut out), 1);
        assert_eq!(out.pop().unwrap().address, vp::STATUS_ICON);
    }

    #[test]
    fn test_invalidated_field_redrawn_even_if_equal() {
        let snapshot = PrinterSnapshot::default();
        let mut updater = primed(&snapshot);
        updater.invalidate(Field::Feedrate);

        let mut out = CommandEncoder::new();
        assert_eq!(updater.tick(1, &snapshot, &mut out), 1);
        assert_eq!(out.pop().unwrap().address, vp::FEEDRATE);
        assert!(updater.invalid().is_empty());
    }

    #[test]
    fn test_position_written_in_tenths() {
        let before = PrinterSnapshot::default();
        let mut updater = primed(&before);
        let mut after = before;
        after.position[2] = Fixed::new(125, 1);

        let mut out = CommandEncoder::new();
        updater.tick(500, &after, &mut out);
        let frame = out.pop().unwrap();
        assert_eq!(frame.address, vp::Z_POSITION);
        assert_eq!(frame.payload.as_slice(), &[0x00, 0x7D]);
    }

    #[test]
    fn test_full_queue_retries_next_pass() {
        let before = PrinterSnapshot::default();
        let mut updater = primed(&before);
        let after = PrinterSnapshot {
            fan_percent: 50,
            ..before
        };

        let mut out = CommandEncoder::new();
        for _ in 0..OUTBOX_CAPACITY {
            out.refresh().unwrap();
        }
        assert_eq!(updater.tick(500, &after, &mut out), 0);
        assert!(updater.invalid().contains(Field::Fan));

        out.clear();
        assert_eq!(updater.tick(501, &after, &mut out), 1);
        assert_eq!(out.pop().unwrap().address, vp::FAN);
    }

    #[test]
    fn test_full_request_redraws_everything() {
        let snapshot = PrinterSnapshot::default();
        let mut updater = primed(&snapshot);
        updater.request(RefreshRequest {
            full: true,
            ..RefreshRequest::default()
        });

        let mut out = CommandEncoder::new();
        assert_eq!(updater.tick(1, &snapshot, &mut out), Field::ALL.len() + 3);
    }

    #[test]
    fn test_time_split() {
        assert_eq!(hours_minutes(0), (0, 0));
        assert_eq!(hours_minutes(3 * 3600 + 25 * 60 + 59), (3, 25));
    }
}
