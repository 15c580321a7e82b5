//! Printer state as shown on the panel

use dwin_protocol::Fixed;

use crate::fields::Field;
use crate::state::OperationId;
use crate::traits::{Axis, Heater, JobState, Printer};

/// Current and target temperature in °C
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Temperature {
    pub current: i16,
    pub target: i16,
}

/// Read-only view of the printer, sampled once per update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PrinterSnapshot {
    pub job: JobState,
    pub operation: Option<OperationId>,
    pub progress_percent: u8,
    pub elapsed_s: u32,
    pub remaining_s: u32,
    pub hotend: Temperature,
    pub bed: Temperature,
    pub feedrate_percent: u16,
    pub flow_percent: u16,
    pub fan_percent: u8,
    /// X, Y, Z in mm at scale 1
    pub position: [Fixed; 3],
    /// mm at scale 2
    pub z_offset: Fixed,
}

impl Default for PrinterSnapshot {
    fn default() -> Self {
        Self {
            job: JobState::Idle,
            operation: None,
            progress_percent: 0,
            elapsed_s: 0,
            remaining_s: 0,
            hotend: Temperature::default(),
            bed: Temperature::default(),
            feedrate_percent: 100,
            flow_percent: 100,
            fan_percent: 0,
            position: [Fixed::new(0, 1); 3],
            z_offset: Fixed::new(0, 2),
        }
    }
}

impl PrinterSnapshot {
    /// Sample every collaborator
    pub fn sample<P: Printer + ?Sized>(printer: &P, operation: Option<OperationId>) -> Self {
        Self {
            job: printer.state(),
            operation,
            progress_percent: printer.progress_percent().min(100),
            elapsed_s: printer.elapsed_s(),
            remaining_s: printer.remaining_s(),
            hotend: Temperature {
                current: printer.current(Heater::Hotend),
                target: printer.target(Heater::Hotend),
            },
            bed: Temperature {
                current: printer.current(Heater::Bed),
                target: printer.target(Heater::Bed),
            },
            feedrate_percent: printer.feedrate_percent(),
            flow_percent: printer.flow_percent(),
            fan_percent: printer.fan_percent(),
            position: Axis::XYZ.map(|axis| printer.position(axis).rescale(1)),
            z_offset: printer.z_offset().rescale(2),
        }
    }

    /// Status icon index
    pub fn status_code(&self) -> u16 {
        match (self.operation, self.job) {
            (Some(OperationId::Homing), _) => 5,
            (Some(OperationId::Leveling), _) => 6,
            (None, JobState::Idle) => 0,
            (None, JobState::Printing) => 1,
            (None, JobState::Paused) => 2,
            (None, JobState::Finished) => 3,
            (None, JobState::Aborted) => 4,
        }
    }

    /// Whether `field` shows the same thing in both snapshots
    pub fn same(&self, other: &Self, field: Field) -> bool {
        match field {
            Field::Status => self.status_code() == other.status_code(),
            Field::Progress => self.progress_percent == other.progress_percent,
            Field::Elapsed => self.elapsed_s / 60 == other.elapsed_s / 60,
            Field::Remaining => self.remaining_s / 60 == other.remaining_s / 60,
            Field::HotendCurrent => self.hotend.current == other.hotend.current,
            Field::HotendTarget => self.hotend.target == other.hotend.target,
            Field::BedCurrent => self.bed.current == other.bed.current,
            Field::BedTarget => self.bed.target == other.bed.target,
            Field::Feedrate => self.feedrate_percent == other.feedrate_percent,
            Field::Flow => self.flow_percent == other.flow_percent,
            Field::Fan => self.fan_percent == other.fan_percent,
            Field::PositionX => self.position[0] == other.position[0],
            Field::PositionY => self.position[1] == other.position[1],
            Field::PositionZ => self.position[2] == other.position[2],
            Field::ZOffset => self.z_offset == other.z_offset,
        }
    }
}
