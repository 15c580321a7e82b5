//! Outbound command queue
//!
//! The [`CommandEncoder`] turns each intent into exactly one frame and
//! parks it until the link transport drains the queue. Queuing never
//! blocks: a full queue is reported as [`CommandError::QueueFull`].

use heapless::Deque;

use crate::command::{
    Color, CommandError, DisplayCommand, Point, RectMode, TextStyle,
};
use crate::frame::Frame;
use crate::value::{Fixed, WireValue};

/// Frames held between two transport flushes
pub const OUTBOX_CAPACITY: usize = 32;

/// Queue of encoded outbound frames
#[derive(Debug, Default)]
pub struct CommandEncoder {
    queue: Deque<Frame, OUTBOX_CAPACITY>,
}

impl CommandEncoder {
    pub fn new() -> Self {
        Self {
            queue: Deque::new(),
        }
    }

    /// Validate, encode and enqueue one command
    pub fn push(&mut self, command: &DisplayCommand<'_>) -> Result<(), CommandError> {
        if self.queue.is_full() {
            return Err(CommandError::QueueFull);
        }
        let frame = command.to_frame()?;
        self.queue
            .push_back(frame)
            .map_err(|_| CommandError::QueueFull)
    }

    /// Next frame to transmit
    pub fn pop(&mut self) -> Option<Frame> {
        self.queue.pop_front()
    }

    /// Frames waiting for the transport
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Drop everything not yet transmitted
    pub fn clear(&mut self) {
        self.queue.clear();
    }

    /// Iterate queued frames, oldest first
    pub fn iter(&self) -> impl Iterator<Item = &Frame> {
        self.queue.iter()
    }

    pub fn handshake(&mut self) -> Result<(), CommandError> {
        self.push(&DisplayCommand::Handshake)
    }

    pub fn clear_screen(&mut self, color: Color) -> Result<(), CommandError> {
        self.push(&DisplayCommand::Clear { color })
    }

    pub fn draw_line(&mut self, color: Color, from: Point, to: Point) -> Result<(), CommandError> {
        self.push(&DisplayCommand::Line { color, from, to })
    }

    pub fn draw_rect(
        &mut self,
        mode: RectMode,
        color: Color,
        from: Point,
        to: Point,
    ) -> Result<(), CommandError> {
        self.push(&DisplayCommand::Rect {
            mode,
            color,
            from,
            to,
        })
    }

    pub fn draw_text(
        &mut self,
        style: TextStyle,
        origin: Point,
        text: &str,
        max_len: Option<u8>,
    ) -> Result<(), CommandError> {
        self.push(&DisplayCommand::Text {
            style,
            origin,
            text,
            max_len,
        })
    }

    pub fn draw_number(
        &mut self,
        style: TextStyle,
        origin: Point,
        value: Fixed,
        digits: u8,
    ) -> Result<(), CommandError> {
        self.push(&DisplayCommand::Number {
            style,
            origin,
            value,
            digits,
        })
    }

    pub fn show_icon(&mut self, library: u8, index: u8, origin: Point) -> Result<(), CommandError> {
        self.push(&DisplayCommand::Icon {
            library,
            index,
            origin,
        })
    }

    pub fn refresh(&mut self) -> Result<(), CommandError> {
        self.push(&DisplayCommand::Refresh)
    }

    pub fn write_value(&mut self, address: u16, value: WireValue) -> Result<(), CommandError> {
        self.push(&DisplayCommand::WriteValue { address, value })
    }

    pub fn write_word(&mut self, address: u16, value: u16) -> Result<(), CommandError> {
        self.write_value(address, WireValue::Word(value))
    }

    pub fn write_signed(&mut self, address: u16, value: i16) -> Result<(), CommandError> {
        self.write_value(address, WireValue::Signed(value))
    }

    pub fn write_long(&mut self, address: u16, value: u32) -> Result<(), CommandError> {
        self.write_value(address, WireValue::Long(value))
    }

    /// Write a decimal as its pre-scaled signed word
    pub fn write_fixed(&mut self, address: u16, value: Fixed) -> Result<(), CommandError> {
        self.write_value(address, WireValue::try_from(value)?)
    }

    pub fn write_text(&mut self, address: u16, text: &str, width: u8) -> Result<(), CommandError> {
        self.push(&DisplayCommand::WriteText {
            address,
            text,
            width,
        })
    }

    pub fn switch_page(&mut self, page: u16) -> Result<(), CommandError> {
        self.push(&DisplayCommand::SwitchPage { page })
    }

    pub fn set_backlight(
        &mut self,
        brightness: u8,
        standby_brightness: u8,
        standby_seconds: u16,
    ) -> Result<(), CommandError> {
        self.push(&DisplayCommand::Backlight {
            brightness,
            standby_brightness,
            standby_seconds,
        })
    }

    pub fn set_volume(&mut self, level: u8) -> Result<(), CommandError> {
        self.push(&DisplayCommand::Volume { level })
    }

    pub fn start_value_report(&mut self, address: u16, words: u8) -> Result<(), CommandError> {
        self.push(&DisplayCommand::ValueReport { address, words })
    }

    pub fn stop_value_report(&mut self, address: u16) -> Result<(), CommandError> {
        self.push(&DisplayCommand::ValueReport { address, words: 0 })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{CMD_VAR_WRITE, ADDR_PAGE_SWITCH};

    #[test]
    fn test_long_matching_tail_not_queued() {
        let mut out = CommandEncoder::new();
        assert_eq!(out.write_long(0x1010, 0xCC33_C33C), Err(CommandError::TailInPayload));
        assert!(out.is_empty());
    }

    #[test]
    fn test_one_frame_per_call() {
        let mut out = CommandEncoder::new();
        out.write_word(0x1006, 150).unwrap();
        out.switch_page(1).unwrap();

        assert_eq!(out.pending(), 2);
        let first = out.pop().unwrap();
        assert_eq!(first.command, CMD_VAR_WRITE);
        assert_eq!(first.address, 0x1006);
        assert_eq!(first.payload.as_slice(), &[0x00, 0x96]);
        assert_eq!(out.pop().unwrap().address, ADDR_PAGE_SWITCH);
        assert!(out.pop().is_none());
    }

    #[test]
    fn test_invalid_command_is_not_queued() {
        let mut out = CommandEncoder::new();
        assert_eq!(
            out.show_icon(0, 200, Point::new(0, 0)),
            Err(CommandError::IconOutOfRange)
        );
        assert!(out.is_empty());
    }

    #[test]
    fn test_queue_full() {
        let mut out = CommandEncoder::new();
        for i in 0..OUTBOX_CAPACITY {
            out.write_word(0x1000, i as u16).unwrap();
        }
        assert_eq!(out.refresh(), Err(CommandError::QueueFull));
        assert_eq!(out.pending(), OUTBOX_CAPACITY);

        out.clear();
        assert!(out.is_empty());
    }

    #[test]
    fn test_write_fixed_rejects_wide_values() {
        let mut out = CommandEncoder::new();
        out.write_fixed(0x1026, Fixed::new(-150, 2)).unwrap();
        assert_eq!(out.pop().unwrap().payload.as_slice(), &[0xFF, 0x6A]);
        assert_eq!(
            out.write_fixed(0x1026, Fixed::new(70_000, 2)),
            Err(CommandError::ValueOutOfRange)
        );
    }
}
