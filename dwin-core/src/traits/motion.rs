//! Motion queue collaborator

use dwin_protocol::Fixed;

use super::HostError;

/// Printer axes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Axis {
    X,
    Y,
    Z,
    E,
}

impl Axis {
    /// Motion axes, in display order
    pub const XYZ: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    pub fn index(self) -> usize {
        self as usize
    }
}

/// Work handed to the motion subsystem
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MotionCommand {
    /// Home all axes
    HomeAll,
    /// Move one axis to an absolute position in mm (scale 1)
    MoveTo { axis: Axis, position: Fixed },
    /// Probe the bed and build a mesh
    AutoLevel,
    /// Release the stepper drivers
    DisableSteppers,
}

/// Motion/command queue
///
/// Long operations are only enqueued here; completion comes back through
/// the `notify_*` callbacks on the touchscreen.
pub trait MotionQueue {
    /// Queue a command behind whatever is already planned
    fn enqueue(&mut self, command: MotionCommand) -> Result<(), HostError>;

    /// Wait until every queued move has finished
    ///
    /// Only called before operations that must not overlap motion.
    fn synchronize(&mut self);

    /// Drop commands that have not started; moves in progress finish normally
    fn drop_pending(&mut self);

    /// Current position of an axis in mm (scale 1)
    fn position(&self, axis: Axis) -> Fixed;
}
