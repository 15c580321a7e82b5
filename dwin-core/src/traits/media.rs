//! Media (SD card / USB) collaborator

use heapless::String;

use super::HostError;

/// Longest file name shown on the panel
pub const MAX_FILE_NAME_LEN: usize = 32;

/// Printable file name
pub type FileName = String<MAX_FILE_NAME_LEN>;

/// File listing and print start
pub trait Media {
    fn is_mounted(&self) -> bool;

    /// Printable files in listing order
    fn list(&self) -> &[FileName];

    /// Mark a listing entry as the current file
    fn select(&mut self, index: usize);

    /// Open a file and begin printing it
    fn open_and_print(&mut self, name: &str) -> Result<(), HostError>;
}
