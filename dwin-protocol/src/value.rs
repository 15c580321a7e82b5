//! Numeric values on the wire
//!
//! The panel has no floating-point type. Decimals travel as integers
//! pre-multiplied by 10^scale, with the scale fixed per field.

/// Largest supported decimal scale (10^4)
pub const MAX_SCALE: u8 = 4;

/// Errors converting values to their wire form
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ValueError {
    /// Value does not fit the target word width
    OutOfRange,
}

/// 10^scale, saturating at 10^MAX_SCALE
pub const fn pow10(scale: u8) -> i32 {
    match scale {
        0 => 1,
        1 => 10,
        2 => 100,
        3 => 1_000,
        _ => 10_000,
    }
}

/// Fixed-point decimal: `raw / 10^scale`
///
/// Scales above [`MAX_SCALE`] are capped on construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Fixed {
    raw: i32,
    scale: u8,
}

impl Fixed {
    /// Construct from a pre-scaled integer
    pub const fn new(raw: i32, scale: u8) -> Self {
        let scale = if scale > MAX_SCALE { MAX_SCALE } else { scale };
        Self { raw, scale }
    }

    /// Whole number at the given scale (`from_int(12, 1)` is 12.0)
    pub const fn from_int(value: i32, scale: u8) -> Self {
        let fixed = Self::new(0, scale);
        Self::new(value.saturating_mul(pow10(fixed.scale)), fixed.scale)
    }

    /// Interpret an unsigned wire word
    pub const fn from_word(word: u16, scale: u8) -> Self {
        Self::new(word as i32, scale)
    }

    /// Interpret a two's-complement wire word
    pub const fn from_signed_word(word: u16, scale: u8) -> Self {
        Self::new(word as i16 as i32, scale)
    }

    /// Pre-scaled integer
    pub const fn raw(self) -> i32 {
        self.raw
    }

    /// Number of decimal places
    pub const fn scale(self) -> u8 {
        self.scale
    }

    /// Integer part, truncated toward zero
    pub const fn whole(self) -> i32 {
        self.raw / pow10(self.scale)
    }

    /// Same value at another scale, truncating toward zero when narrowing
    pub fn rescale(self, scale: u8) -> Self {
        let target = Self::new(0, scale).scale;
        if target >= self.scale {
            let factor = pow10(target - self.scale);
            Self::new(self.raw.saturating_mul(factor), target)
        } else {
            let factor = pow10(self.scale - target);
            Self::new(self.raw / factor, target)
        }
    }

    /// Clamp the raw value into `[min, max]`, both at this value's scale
    pub fn clamp_raw(self, min: i32, max: i32) -> Self {
        Self::new(self.raw.clamp(min, max.max(min)), self.scale)
    }

    /// Clamp against bounds expressed at any scale
    pub fn clamp(self, min: Fixed, max: Fixed) -> Self {
        self.clamp_raw(min.rescale(self.scale).raw, max.rescale(self.scale).raw)
    }

    /// Wire form as a signed 16-bit word
    pub fn to_signed_word(self) -> Result<i16, ValueError> {
        i16::try_from(self.raw).map_err(|_| ValueError::OutOfRange)
    }

    /// Wire form as an unsigned 16-bit word
    pub fn to_word(self) -> Result<u16, ValueError> {
        u16::try_from(self.raw).map_err(|_| ValueError::OutOfRange)
    }
}

/// A fixed-width number ready to be written to a display variable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WireValue {
    /// Unsigned 16-bit word
    Word(u16),
    /// Signed 16-bit word
    Signed(i16),
    /// 32-bit long, occupying two consecutive variables
    Long(u32),
}

impl WireValue {
    /// Encode big-endian into `out`, returning the byte count
    pub fn to_be_bytes(self, out: &mut [u8; 4]) -> usize {
        match self {
            WireValue::Word(v) => {
                out[..2].copy_from_slice(&v.to_be_bytes());
                2
            }
            WireValue::Signed(v) => {
                out[..2].copy_from_slice(&v.to_be_bytes());
                2
            }
            WireValue::Long(v) => {
                out.copy_from_slice(&v.to_be_bytes());
                4
            }
        }
    }
}

impl From<u16> for WireValue {
    fn from(value: u16) -> Self {
        WireValue::Word(value)
    }
}

impl From<i16> for WireValue {
    fn from(value: i16) -> Self {
        WireValue::Signed(value)
    }
}

impl From<u32> for WireValue {
    fn from(value: u32) -> Self {
        WireValue::Long(value)
    }
}

impl TryFrom<Fixed> for WireValue {
    type Error = ValueError;

    /// Fixed values go out as one signed word; larger magnitudes are rejected
    fn try_from(value: Fixed) -> Result<Self, Self::Error> {
        value.to_signed_word().map(WireValue::Signed)
    }
}
