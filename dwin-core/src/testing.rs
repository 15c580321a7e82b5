//! Test doubles for the host collaborators and the hal traits

use core::cell::Cell;
use std::collections::{BTreeMap, VecDeque};
use std::vec::Vec;

use dwin_hal::{Clock, FlashError, SettingsStorage, StorageKey, UartRx, UartTx};
use dwin_protocol::{Fixed, Frame};

use crate::traits::{
    Axis, FileName, HostError, JobState, Media, MotionCommand, MotionQueue, PidTerm, PrintJob,
    SettingsStore, Heater, Thermal, Tuning,
};

/// Calls the dispatcher made on the printer
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Enqueue(MotionCommand),
    Synchronize,
    DropPending,
    Select(usize),
    OpenAndPrint(std::string::String),
    Start,
    Pause,
    Resume,
    Abort,
    ResumeRecovered,
    DiscardRecovered,
    Save,
    Load,
    ResetToDefaults,
    SetTarget(Heater, i16),
}

/// In-memory printer that records every mutating call
#[derive(Debug, Clone)]
pub struct FakePrinter {
    pub calls: Vec<Call>,
    pub job: JobState,
    pub progress: u8,
    pub elapsed_s: u32,
    pub remaining_s: u32,
    pub temps: [(i16, i16); 2],
    pub position: [Fixed; 4],
    pub mounted: bool,
    pub files: Vec<FileName>,
    pub open_fails: bool,
    pub save_fails: bool,
    pub feedrate: u16,
    pub flow: u16,
    pub fan: u8,
    pub z_offset: Fixed,
    pub steps: [Fixed; 4],
    pub pid: [[Fixed; 3]; 2],
}

impl Default for FakePrinter {
    fn default() -> Self {
        Self {
            calls: Vec::new(),
            job: JobState::Idle,
            progress: 0,
            elapsed_s: 0,
            remaining_s: 0,
            temps: [(0, 0); 2],
            position: [Fixed::new(0, 1); 4],
            mounted: true,
            files: Vec::new(),
            open_fails: false,
            save_fails: false,
            feedrate: 100,
            flow: 100,
            fan: 0,
            z_offset: Fixed::new(0, 2),
            steps: [Fixed::new(800, 1); 4],
            pid: [[Fixed::new(0, 2); 3]; 2],
        }
    }
}

impl FakePrinter {
    /// Printer with `count` files named `file0.gcode`, `file1.gcode`, ...
    pub fn with_files(count: usize) -> Self {
        let mut printer = Self::default();
        for i in 0..count {
            let mut name = FileName::new();
            core::fmt::Write::write_fmt(&mut name, format_args!("file{}.gcode", i)).unwrap();
            printer.files.push(name);
        }
        printer
    }

    pub fn called(&self, call: &Call) -> bool {
        self.calls.contains(call)
    }

    pub fn enqueued(&self) -> Vec<MotionCommand> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::Enqueue(cmd) => Some(*cmd),
                _ => None,
            })
            .collect()
    }
}

fn heater_index(heater: Heater) -> usize {
    match heater {
        Heater::Hotend => 0,
        Heater::Bed => 1,
    }
}

fn term_index(term: PidTerm) -> usize {
    match term {
        PidTerm::P => 0,
        PidTerm::I => 1,
        PidTerm::D => 2,
    }
}

impl MotionQueue for FakePrinter {
    fn enqueue(&mut self, command: MotionCommand) -> Result<(), HostError> {
        if let MotionCommand::MoveTo { axis, position } = command {
            self.position[axis.index()] = position;
        }
        self.calls.push(Call::Enqueue(command));
        Ok(())
    }

    fn synchronize(&mut self) {
        self.calls.push(Call::Synchronize);
    }

    fn drop_pending(&mut self) {
        self.calls.push(Call::DropPending);
    }

    fn position(&self, axis: Axis) -> Fixed {
        self.position[axis.index()]
    }
}

impl PrintJob for FakePrinter {
    fn start(&mut self) {
        self.job = JobState::Printing;
        self.calls.push(Call::Start);
    }

    fn pause(&mut self) {
        self.job = JobState::Paused;
        self.calls.push(Call::Pause);
    }

    fn resume(&mut self) {
        self.job = JobState::Printing;
        self.calls.push(Call::Resume);
    }

    fn abort(&mut self) {
        self.job = JobState::Aborted;
        self.calls.push(Call::Abort);
    }

    fn state(&self) -> JobState {
        self.job
    }

    fn progress_percent(&self) -> u8 {
        self.progress
    }

    fn elapsed_s(&self) -> u32 {
        self.elapsed_s
    }

    fn remaining_s(&self) -> u32 {
        self.remaining_s
    }

    fn resume_recovered(&mut self) {
        self.job = JobState::Printing;
        self.calls.push(Call::ResumeRecovered);
    }

    fn discard_recovered(&mut self) {
        self.calls.push(Call::DiscardRecovered);
    }
}

impl Thermal for FakePrinter {
    fn current(&self, heater: Heater) -> i16 {
        self.temps[heater_index(heater)].0
    }

    fn target(&self, heater: Heater) -> i16 {
        self.temps[heater_index(heater)].1
    }

    fn set_target(&mut self, heater: Heater, celsius: i16) {
        self.temps[heater_index(heater)].1 = celsius;
        self.calls.push(Call::SetTarget(heater, celsius));
    }
}

impl Media for FakePrinter {
    fn is_mounted(&self) -> bool {
        self.mounted
    }

    fn list(&self) -> &[FileName] {
        &self.files
    }

    fn select(&mut self, index: usize) {
        self.calls.push(Call::Select(index));
    }

    fn open_and_print(&mut self, name: &str) -> Result<(), HostError> {
        self.calls.push(Call::OpenAndPrint(name.into()));
        if self.open_fails {
            Err(HostError::Io)
        } else {
            Ok(())
        }
    }
}

impl SettingsStore for FakePrinter {
    fn save(&mut self) -> Result<(), HostError> {
        self.calls.push(Call::Save);
        if self.save_fails {
            Err(HostError::Storage)
        } else {
            Ok(())
        }
    }

    fn load(&mut self) -> Result<(), HostError> {
        self.calls.push(Call::Load);
        Ok(())
    }

    fn reset_to_defaults(&mut self) {
        self.calls.push(Call::ResetToDefaults);
    }
}

impl Tuning for FakePrinter {
    fn feedrate_percent(&self) -> u16 {
        self.feedrate
    }

    fn set_feedrate_percent(&mut self, percent: u16) {
        self.feedrate = percent;
    }

    fn flow_percent(&self) -> u16 {
        self.flow
    }

    fn set_flow_percent(&mut self, percent: u16) {
        self.flow = percent;
    }

    fn fan_percent(&self) -> u8 {
        self.fan
    }

    fn set_fan_percent(&mut self, percent: u8) {
        self.fan = percent;
    }

    fn z_offset(&self) -> Fixed {
        self.z_offset
    }

    fn set_z_offset(&mut self, offset: Fixed) {
        self.z_offset = offset;
    }

    fn steps_per_mm(&self, axis: Axis) -> Fixed {
        self.steps[axis.index()]
    }

    fn set_steps_per_mm(&mut self, axis: Axis, steps: Fixed) {
        self.steps[axis.index()] = steps;
    }

    fn pid_term(&self, heater: Heater, term: PidTerm) -> Fixed {
        self.pid[heater_index(heater)][term_index(term)]
    }

    fn set_pid_term(&mut self, heater: Heater, term: PidTerm, value: Fixed) {
        self.pid[heater_index(heater)][term_index(term)] = value;
    }
}

/// Error injected by [`LoopbackUart`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortError;

/// Serial port with a scripted receive queue and a transmit log
#[derive(Debug, Default)]
pub struct LoopbackUart {
    pub rx: VecDeque<u8>,
    pub tx: Vec<u8>,
    pub fail_writes: bool,
    /// Reply queued into `rx` when a handshake frame is written
    pub ack_handshake: bool,
}

impl LoopbackUart {
    pub fn feed(&mut self, bytes: &[u8]) {
        self.rx.extend(bytes.iter().copied());
    }

    /// Decode everything written so far into frames
    pub fn sent_frames(&self) -> Vec<Frame> {
        let mut frames = Vec::new();
        let mut rest = &self.tx[..];
        while let Ok((frame, used)) = Frame::decode(rest) {
            frames.push(frame);
            rest = &rest[used..];
        }
        frames
    }
}

impl UartTx for LoopbackUart {
    type Error = PortError;

    fn write_all(&mut self, data: &[u8]) -> Result<(), PortError> {
        if self.fail_writes {
            return Err(PortError);
        }
        if self.ack_handshake && data.get(2) == Some(&0x00) {
            self.feed(&[0x5A, 0xA5, 0x00, b'O', b'K']);
        }
        self.tx.extend_from_slice(data);
        Ok(())
    }

    fn flush(&mut self) -> Result<(), PortError> {
        Ok(())
    }
}

impl UartRx for LoopbackUart {
    type Error = PortError;

    fn read_available(&mut self, buf: &mut [u8]) -> Result<usize, PortError> {
        let n = buf.len().min(self.rx.len());
        for slot in buf.iter_mut().take(n) {
            *slot = self.rx.pop_front().unwrap_or_default();
        }
        Ok(n)
    }
}

/// Clock moved by hand; every read advances it by `step_ms`
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<u32>,
    pub step_ms: u32,
}

impl ManualClock {
    pub fn stepping(step_ms: u32) -> Self {
        Self {
            now: Cell::new(0),
            step_ms,
        }
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u32 {
        let now = self.now.get();
        self.now.set(now.wrapping_add(self.step_ms));
        now
    }
}

/// Settings storage backed by a map
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    records: BTreeMap<u8, Vec<u8>>,
    pub fail_writes: bool,
}

impl MemoryStorage {
    /// Storage that rejects every write
    pub fn failing() -> Self {
        Self {
            fail_writes: true,
            ..Self::default()
        }
    }
}

impl SettingsStorage for MemoryStorage {
    fn read(&mut self, key: StorageKey, buffer: &mut [u8]) -> Result<usize, FlashError> {
        let record = self.records.get(&key.as_u8()).ok_or(FlashError::NotFound)?;
        if record.len() > buffer.len() {
            return Err(FlashError::BufferTooSmall);
        }
        buffer[..record.len()].copy_from_slice(record);
        Ok(record.len())
    }

    fn write(&mut self, key: StorageKey, data: &[u8]) -> Result<(), FlashError> {
        if self.fail_writes {
            return Err(FlashError::Flash);
        }
        self.records.insert(key.as_u8(), data.to_vec());
        Ok(())
    }

}
