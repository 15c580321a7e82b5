//! Page and process state

pub mod page;
pub mod process;

pub use page::{FatalKind, OperationId, PageId, PopupButton, PopupContext, PopupKind};
pub use process::{DropReason, Gate, ProcessState};
