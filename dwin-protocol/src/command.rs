//! Outbound display commands
//!
//! Each [`DisplayCommand`] describes one intent (draw a string, show an
//! icon, write a variable, switch page...) and validates its arguments
//! before building exactly one [`Frame`]. Out-of-range arguments are
//! rejected with a [`CommandError`]; nothing is clipped behind the
//! caller's back.

use crate::frame::Frame;
use crate::payload::{PayloadFull, PayloadWriter};
use crate::value::{Fixed, ValueError, WireValue};

// Command bytes: draw primitives
pub const CMD_HANDSHAKE: u8 = 0x00;
pub const CMD_CLEAR: u8 = 0x01;
pub const CMD_LINE: u8 = 0x03;
pub const CMD_RECT: u8 = 0x05;
pub const CMD_STRING: u8 = 0x11;
pub const CMD_VALUE: u8 = 0x14;
pub const CMD_ICON: u8 = 0x23;
pub const CMD_REFRESH: u8 = 0x3D;

// Command bytes: register and variable access
pub const CMD_REG_WRITE: u8 = 0x80;
pub const CMD_REG_READ: u8 = 0x81;
pub const CMD_VAR_WRITE: u8 = 0x82;
pub const CMD_VAR_READ: u8 = 0x83;

/// Variable that switches the visible page
pub const ADDR_PAGE_SWITCH: u16 = 0x0084;
/// Variable holding backlight brightness and standby timing
pub const ADDR_BACKLIGHT: u16 = 0x0082;
/// Variable holding buzzer volume
pub const ADDR_VOLUME: u16 = 0x00A0;

/// Prefix word written ahead of the page id on a page switch
pub const PAGE_SWITCH_MAGIC: [u8; 2] = [0x5A, 0x01];

/// Panel size in pixels
pub const SCREEN_WIDTH: u16 = 272;
pub const SCREEN_HEIGHT: u16 = 480;

/// Highest font id understood by the panel
pub const MAX_FONT: u8 = 9;
/// Icon libraries 0..=15, icons 0..=127 in each
pub const MAX_ICON_LIBRARY: u8 = 15;
pub const MAX_ICON_INDEX: u8 = 127;
/// Integer digits a numeric draw may request
pub const MAX_VALUE_DIGITS: u8 = 10;

/// Errors that can occur building a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CommandError {
    /// Point outside the 272x480 panel
    CoordinateOutOfRange,
    /// Icon library or index outside the panel's tables
    IconOutOfRange,
    /// Font id above [`MAX_FONT`]
    InvalidFont,
    /// String does not fit the field or the frame
    StringTooLong,
    /// Numeric value does not fit its wire width
    ValueOutOfRange,
    /// Digit count above [`MAX_VALUE_DIGITS`]
    InvalidDigits,
    /// Assembled payload exceeds the frame limit
    PayloadTooLarge,
    /// Payload carries the tail sentinel and would end the frame early
    TailInPayload,
    /// Outbound queue has no free slot
    QueueFull,
}

impl From<PayloadFull> for CommandError {
    fn from(_: PayloadFull) -> Self {
        CommandError::PayloadTooLarge
    }
}

impl From<ValueError> for CommandError {
    fn from(_: ValueError) -> Self {
        CommandError::ValueOutOfRange
    }
}

/// RGB565 color
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Color(pub u16);

impl Color {
    pub const BLACK: Color = Color(0x0000);
    pub const WHITE: Color = Color(0xFFFF);
    pub const RED: Color = Color(0xF800);
    pub const BACKGROUND_BLUE: Color = Color(0x1125);
    pub const SELECT: Color = Color(0x33BB);

    /// Pack 8-bit channels into RGB565
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Color(((r as u16 & 0xF8) << 8) | ((g as u16 & 0xFC) << 3) | (b as u16 >> 3))
    }
}

/// Pixel position, origin top-left
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Point {
    pub x: u16,
    pub y: u16,
}

impl Point {
    pub const fn new(x: u16, y: u16) -> Self {
        Self { x, y }
    }

    fn check(self) -> Result<Self, CommandError> {
        if self.x < SCREEN_WIDTH && self.y < SCREEN_HEIGHT {
            Ok(self)
        } else {
            Err(CommandError::CoordinateOutOfRange)
        }
    }
}

/// Rectangle draw mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum RectMode {
    Frame = 0,
    Fill = 1,
    Xor = 2,
}

/// Text styling for string draws
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TextStyle {
    pub font: u8,
    pub foreground: Color,
    pub background: Color,
    /// Paint the background box behind the glyphs
    pub show_background: bool,
    /// Let the panel adjust glyph width
    pub width_adjust: bool,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font: 1,
            foreground: Color::WHITE,
            background: Color::BACKGROUND_BLUE,
            show_background: false,
            width_adjust: false,
        }
    }
}

impl TextStyle {
    fn flags(&self) -> Result<u8, CommandError> {
        if self.font > MAX_FONT {
            return Err(CommandError::InvalidFont);
        }
        Ok(((self.width_adjust as u8) << 7) | ((self.show_background as u8) << 6) | self.font)
    }
}

/// Commands sent from the controller to the display
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DisplayCommand<'a> {
    /// Link probe; the panel answers `5A A5 00 'O' 'K'`
    Handshake,
    /// Fill the whole screen
    Clear { color: Color },
    /// Draw a straight line
    Line { color: Color, from: Point, to: Point },
    /// Draw a rectangle
    Rect {
        mode: RectMode,
        color: Color,
        from: Point,
        to: Point,
    },
    /// Draw a string; `max_len` shows at most that many bytes
    Text {
        style: TextStyle,
        origin: Point,
        text: &'a str,
        max_len: Option<u8>,
    },
    /// Draw a number with a fixed number of integer and fraction digits
    Number {
        style: TextStyle,
        origin: Point,
        value: Fixed,
        digits: u8,
    },
    /// Show an icon from a library
    Icon { library: u8, index: u8, origin: Point },
    /// Push the frame buffer to the panel
    Refresh,
    /// Write a number to a display variable
    WriteValue { address: u16, value: WireValue },
    /// Write text to a fixed-width display variable, zero padded to `width` bytes
    WriteText { address: u16, text: &'a str, width: u8 },
    /// Show a page by id
    SwitchPage { page: u16 },
    /// Backlight levels in percent and the standby delay in seconds
    Backlight {
        brightness: u8,
        standby_brightness: u8,
        standby_seconds: u16,
    },
    /// Buzzer volume, 0..=255
    Volume { level: u8 },
    /// Ask the panel to report `words` words from `address`; 0 stops the report
    ValueReport { address: u16, words: u8 },
}

impl DisplayCommand<'_> {
    /// Encode this command into a frame
    ///
    /// The panel ends a frame at the first tail sentinel it sees, so a
    /// payload containing `CC 33 C3 3C` is refused instead of being sent
    /// misframed.
    pub fn to_frame(&self) -> Result<Frame, CommandError> {
        let frame = self.build()?;
        if frame.payload_contains_tail() {
            return Err(CommandError::TailInPayload);
        }
        Ok(frame)
    }

    fn build(&self) -> Result<Frame, CommandError> {
        let mut w = PayloadWriter::new();
        match *self {
            DisplayCommand::Handshake => Ok(Frame::empty(CMD_HANDSHAKE, 0)),
            DisplayCommand::Clear { color } => {
                w.u16(color.0)?;
                Ok(w.into_frame(CMD_CLEAR, 0))
            }
            DisplayCommand::Line { color, from, to } => {
                let (from, to) = (from.check()?, to.check()?);
                w.u16(color.0)?.u16(from.x)?.u16(from.y)?.u16(to.x)?.u16(to.y)?;
                Ok(w.into_frame(CMD_LINE, 0))
            }
            DisplayCommand::Rect {
                mode,
                color,
                from,
                to,
            } => {
                let (from, to) = (from.check()?, to.check()?);
                w.u8(mode as u8)?
                    .u16(color.0)?
                    .u16(from.x)?
                    .u16(from.y)?
                    .u16(to.x)?
                    .u16(to.y)?;
                Ok(w.into_frame(CMD_RECT, 0))
            }
            DisplayCommand::Text {
                style,
                origin,
                text,
                max_len,
            } => {
                let origin = origin.check()?;
                let bytes = text.as_bytes();
                let shown = match max_len {
                    Some(limit) => &bytes[..bytes.len().min(limit as usize)],
                    None => bytes,
                };
                w.u8(style.flags()?)?
                    .u16(style.foreground.0)?
                    .u16(style.background.0)?
                    .u16(origin.x)?
                    .u16(origin.y)?;
                w.bytes(shown).map_err(|_| CommandError::StringTooLong)?;
                Ok(w.into_frame(CMD_STRING, 0))
            }
            DisplayCommand::Number {
                style,
                origin,
                value,
                digits,
            } => {
                let origin = origin.check()?;
                if digits == 0 || digits > MAX_VALUE_DIGITS {
                    return Err(CommandError::InvalidDigits);
                }
                let signed = (value.raw() < 0) as u8;
                w.u8(style.flags()? | (signed << 5))?
                    .u16(style.foreground.0)?
                    .u16(style.background.0)?
                    .u8(digits)?
                    .u8(value.scale())?
                    .u16(origin.x)?
                    .u16(origin.y)?
                    .u32(value.raw() as u32)?;
                Ok(w.into_frame(CMD_VALUE, 0))
            }
            DisplayCommand::Icon {
                library,
                index,
                origin,
            } => {
                if library > MAX_ICON_LIBRARY || index > MAX_ICON_INDEX {
                    return Err(CommandError::IconOutOfRange);
                }
                let origin = origin.check()?;
                w.u8(0x80 | library)?.u8(index)?.u16(origin.x)?.u16(origin.y)?;
                Ok(w.into_frame(CMD_ICON, 0))
            }
            DisplayCommand::Refresh => Ok(Frame::empty(CMD_REFRESH, 0)),
            DisplayCommand::WriteValue { address, value } => {
                w.value(value)?;
                Ok(w.into_frame(CMD_VAR_WRITE, address))
            }
            DisplayCommand::WriteText {
                address,
                text,
                width,
            } => {
                let bytes = text.as_bytes();
                if bytes.len() > width as usize || width as usize > w.remaining() {
                    return Err(CommandError::StringTooLong);
                }
                w.bytes(bytes)?.fill(0x00, width as usize - bytes.len())?;
                Ok(w.into_frame(CMD_VAR_WRITE, address))
            }
            DisplayCommand::SwitchPage { page } => {
                w.bytes(&PAGE_SWITCH_MAGIC)?.u16(page)?;
                Ok(w.into_frame(CMD_VAR_WRITE, ADDR_PAGE_SWITCH))
            }
            DisplayCommand::Backlight {
                brightness,
                standby_brightness,
                standby_seconds,
            } => {
                if brightness > 100 || standby_brightness > 100 {
                    return Err(CommandError::ValueOutOfRange);
                }
                w.u8(brightness)?.u8(standby_brightness)?.u16(standby_seconds)?;
                Ok(w.into_frame(CMD_VAR_WRITE, ADDR_BACKLIGHT))
            }
            DisplayCommand::Volume { level } => {
                w.u8(level)?.u8(0x00)?;
                Ok(w.into_frame(CMD_VAR_WRITE, ADDR_VOLUME))
            }
            DisplayCommand::ValueReport { address, words } => {
                w.u8(words)?;
                Ok(w.into_frame(CMD_VAR_READ, address))
            }
        }
    }
}
