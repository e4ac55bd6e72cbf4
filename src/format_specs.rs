//! Represent FORMAT edit descriptors and formatting modes as Rust types.
//!
//! A FORMAT string such as `(a4,1x,i5.2)` is not parsed up front; it is
//! interpreted one edit descriptor at a time by
//! [`FormatControl`](crate::format_control::FormatControl), which produces a
//! [`DataEdit`] for each data item the running program transfers. The types
//! in this module are the vocabulary shared by the interpreter, the
//! statement state, and the output converters.
use std::fmt::{self, Display};

/// A character of a FORMAT string or of an output record.
///
/// FORMAT strings and internal output buffers come in the three Fortran
/// character kinds (1-, 2-, and 4-byte units). All descriptor lexing is
/// ASCII, so the interpreter folds characters through [`to_char`] for
/// recognition and copies raw slices for literal and Hollerith payloads.
///
/// [`to_char`]: FormatChar::to_char
pub trait FormatChar: Copy + Eq + fmt::Debug + 'static {
    /// The blank used to prefill output records.
    const SPACE: Self;

    /// Widen one ASCII byte to this character kind.
    fn from_byte(byte: u8) -> Self;

    /// The character's scalar value, for recognition and diagnostics.
    /// Values outside the Unicode range map to the replacement character,
    /// which no descriptor matches.
    fn to_char(self) -> char;
}

impl FormatChar for u8 {
    const SPACE: Self = b' ';

    fn from_byte(byte: u8) -> Self {
        byte
    }

    fn to_char(self) -> char {
        char::from(self)
    }
}

impl FormatChar for u16 {
    const SPACE: Self = b' ' as u16;

    fn from_byte(byte: u8) -> Self {
        u16::from(byte)
    }

    fn to_char(self) -> char {
        char::from_u32(u32::from(self)).unwrap_or(char::REPLACEMENT_CHARACTER)
    }
}

impl FormatChar for u32 {
    const SPACE: Self = b' ' as u32;

    fn from_byte(byte: u8) -> Self {
        u32::from(byte)
    }

    fn to_char(self) -> char {
        char::from_u32(self).unwrap_or(char::REPLACEMENT_CHARACTER)
    }
}

/// Rounding applied to real output conversions, selected by the `RN`, `RZ`,
/// `RU`, `RD`, and `RC` control edit descriptors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundingMode {
    TiesToEven,
    ToZero,
    Up,
    Down,
    TiesAwayFromZero,
}

bitflags::bitflags! {
    /// Editing flags toggled by control edit descriptors.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct EditingFlags: u8 {
        /// `SP`: write an explicit `+` on positive numeric output.
        const SIGN_PLUS = 0b0000_0001;
        /// `BZ`: treat blanks in numeric input fields as zeros.
        const BLANK_ZERO = 0b0000_0010;
        /// `DC`: use a comma as the decimal symbol.
        const DECIMAL_COMMA = 0b0000_0100;
    }
}

/// Formatting modes that control edit descriptors mutate over the life of a
/// statement.
///
/// The modes live on the statement; every [`DataEdit`] carries a by-value
/// snapshot of them, so a conversion that runs after further control edits
/// still sees the modes that were in effect when its edit was cued up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MutableModes {
    pub rounding: RoundingMode,
    pub flags: EditingFlags,
}

impl Default for MutableModes {
    fn default() -> Self {
        Self {
            rounding: RoundingMode::TiesToEven,
            flags: EditingFlags::empty(),
        }
    }
}

/// One data edit descriptor, ready to be applied to a data item.
///
/// Produced by [`FormatControl::get_next`] with all repeat and parenthesis
/// machinery already resolved. `descriptor` is an upper-case letter
/// (`A I B O Z F D G E`); `variation` is the second letter of an `EN`, `ES`,
/// or `EX` descriptor. A `repeat` greater than one tells the caller it may
/// apply this edit to that many successive data items.
///
/// [`FormatControl::get_next`]: crate::format_control::FormatControl::get_next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataEdit {
    pub descriptor: char,
    pub variation: Option<char>,
    pub width: i32,
    /// Minimum digits (`Iw.m`) or fractional digits (`Fw.d` and friends).
    pub digits: Option<i32>,
    /// Exponent digits, the `e` of `Ew.dEe`.
    pub expo_digits: Option<i32>,
    pub repeat: i32,
    pub modes: MutableModes,
}

impl Default for DataEdit {
    fn default() -> Self {
        Self {
            descriptor: ' ',
            variation: None,
            width: 0,
            digits: None,
            expo_digits: None,
            repeat: 1,
            modes: MutableModes::default(),
        }
    }
}

impl Display for DataEdit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.descriptor)?;
        if let Some(variation) = self.variation {
            write!(f, "{variation}")?;
        }
        write!(f, "{}", self.width)?;
        if let Some(digits) = self.digits {
            write!(f, ".{digits}")?;
        }
        if let Some(expo) = self.expo_digits {
            write!(f, "E{expo}")?;
        }
        Ok(())
    }
}
