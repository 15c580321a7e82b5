//! Print job collaborator

/// Print job lifecycle as seen by the UI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum JobState {
    #[default]
    Idle,
    Printing,
    Paused,
    Finished,
    Aborted,
}

impl JobState {
    /// A job exists and has not ended
    pub fn is_active(self) -> bool {
        matches!(self, JobState::Printing | JobState::Paused)
    }
}

/// Print job control and progress
pub trait PrintJob {
    /// Start the job timer for a freshly opened file
    fn start(&mut self);
    fn pause(&mut self);
    fn resume(&mut self);
    fn abort(&mut self);

    fn state(&self) -> JobState;

    /// 0..=100
    fn progress_percent(&self) -> u8;
    /// Seconds since the job started
    fn elapsed_s(&self) -> u32;
    /// Estimated seconds left, 0 when unknown
    fn remaining_s(&self) -> u32;

    /// Continue the job interrupted by a power loss
    fn resume_recovered(&mut self);
    /// Forget the interrupted job
    fn discard_recovered(&mut self);
}
