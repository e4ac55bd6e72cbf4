//! Read-only pre-pass over a FORMAT string.
//!
//! A statement runs this scan once before interpretation begins. Its one
//! output the interpreter consumes is the maximum parenthesis nesting depth,
//! which bounds the iteration stack; on the way it rejects the structural
//! problems that would leave the interpreter's cursor without a matching
//! delimiter.
use thiserror::Error;

use crate::format_specs::FormatChar;

/// Structural defects in a FORMAT string. Any of these is fatal to the
/// statement that supplied the FORMAT.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("FORMAT has unbalanced parentheses")]
    UnbalancedParens,
    #[error("FORMAT missing closing quote on character literal")]
    UnclosedLiteral,
    #[error("Hollerith edit descriptor overruns the FORMAT")]
    HollerithOverrun,
    #[error("FORMAT repeat count out of range")]
    CountOutOfRange,
}

/// One-shot scanner over a FORMAT character array.
#[derive(Debug)]
pub struct FormatValidator<'a, C: FormatChar> {
    format: &'a [C],
}

impl<'a, C: FormatChar> FormatValidator<'a, C> {
    pub fn new(format: &'a [C]) -> Self {
        Self { format }
    }

    /// Scan the whole FORMAT once and return the maximum parenthesis
    /// nesting depth observed.
    ///
    /// Quoted character literals (with doubled-quote escapes) and Hollerith
    /// payloads are opaque: parentheses inside them do not count. A repeat
    /// count is remembered across blanks so that `12H` skips exactly twelve
    /// payload characters.
    pub fn check(self) -> Result<usize, FormatError> {
        let mut depth = 0usize;
        let mut max_depth = 0usize;
        let mut count: Option<i32> = None;
        let mut offset = 0usize;
        while offset < self.format.len() {
            let raw = self.format[offset];
            let ch = raw.to_char();
            offset += 1;
            match ch {
                '0'..='9' => {
                    let digit = ch as i32 - '0' as i32;
                    count = Some(
                        count
                            .unwrap_or(0)
                            .checked_mul(10)
                            .and_then(|n| n.checked_add(digit))
                            .ok_or(FormatError::CountOutOfRange)?,
                    );
                }
                ' ' => {}
                '(' => {
                    depth += 1;
                    max_depth = max_depth.max(depth);
                    count = None;
                }
                ')' => {
                    depth = depth.checked_sub(1).ok_or(FormatError::UnbalancedParens)?;
                    count = None;
                }
                '\'' | '"' => {
                    while offset < self.format.len() && self.format[offset] != raw {
                        offset += 1;
                    }
                    if offset >= self.format.len() {
                        return Err(FormatError::UnclosedLiteral);
                    }
                    offset += 1;
                    count = None;
                }
                'H' | 'h' => {
                    let payload = count.take().unwrap_or(0).max(0) as usize;
                    if offset + payload > self.format.len() {
                        return Err(FormatError::HollerithOverrun);
                    }
                    offset += payload;
                }
                _ => {
                    count = None;
                }
            }
        }
        if depth != 0 {
            Err(FormatError::UnbalancedParens)
        } else {
            Ok(max_depth)
        }
    }
}
