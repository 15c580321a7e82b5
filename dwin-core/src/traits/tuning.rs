//! Live-tunable printer parameters

use dwin_protocol::Fixed;

use super::motion::Axis;
use super::thermal::Heater;

/// PID coefficient selector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PidTerm {
    P,
    I,
    D,
}

/// Runtime tuning knobs
///
/// Fixed-point values carry their own scale; implementations rescale to
/// whatever they store internally.
pub trait Tuning {
    fn feedrate_percent(&self) -> u16;
    fn set_feedrate_percent(&mut self, percent: u16);

    fn flow_percent(&self) -> u16;
    fn set_flow_percent(&mut self, percent: u16);

    fn fan_percent(&self) -> u8;
    fn set_fan_percent(&mut self, percent: u8);

    /// Probe Z offset in mm
    fn z_offset(&self) -> Fixed;
    fn set_z_offset(&mut self, offset: Fixed);

    fn steps_per_mm(&self, axis: Axis) -> Fixed;
    fn set_steps_per_mm(&mut self, axis: Axis, steps: Fixed);

    fn pid_term(&self, heater: Heater, term: PidTerm) -> Fixed;
    fn set_pid_term(&mut self, heater: Heater, term: PidTerm, value: Fixed);
}
