//! Output editing of integer data items.
use crate::format_control::FormatContext;
use crate::format_specs::{DataEdit, EditingFlags, FormatChar};

/// Room for 64 binary digits plus a sign, filled from the right.
const SCRATCH: usize = 66;

/// Edit one integer under `edit` and emit the field through `io`.
///
/// The field is right-justified in `edit.width` characters. `Iw.m` pads the
/// value to at least `m` digits with leading zeros, except that `Iw.0` of a
/// zero value is an all-blank field (of width at least one). A field too
/// narrow for the value is filled with `*`. Returns `false` only when the
/// sink rejected an emission; the caller treats it as "no more will fit",
/// not as a conversion failure.
pub(crate) fn edit_integer_output<C: FormatChar, S: FormatContext<C>>(
    io: &mut S,
    edit: &DataEdit,
    value: i64,
) -> bool {
    let mut scratch = [0u8; SCRATCH];
    let mut p = SCRATCH;
    let mut magnitude = value.unsigned_abs();
    let mut sign_chars = 0;
    match edit.descriptor {
        'G' | 'I' => {
            if value < 0 || edit.modes.flags.contains(EditingFlags::SIGN_PLUS) {
                sign_chars = 1;
            }
            while magnitude > 0 {
                p -= 1;
                scratch[p] = b'0' + (magnitude % 10) as u8;
                magnitude /= 10;
            }
        }
        'B' => {
            while magnitude > 0 {
                p -= 1;
                scratch[p] = b'0' + (magnitude & 1) as u8;
                magnitude >>= 1;
            }
        }
        'O' => {
            while magnitude > 0 {
                p -= 1;
                scratch[p] = b'0' + (magnitude & 7) as u8;
                magnitude >>= 3;
            }
        }
        'Z' => {
            while magnitude > 0 {
                let digit = (magnitude & 0xf) as u8;
                p -= 1;
                scratch[p] = if digit >= 10 { b'A' + digit - 10 } else { b'0' + digit };
                magnitude >>= 4;
            }
        }
        _ => io.crash(&format!(
            "Data edit descriptor '{}' does not correspond to an INTEGER data item",
            edit.descriptor
        )),
    }
    let digits = (SCRATCH - p) as i32;
    let mut width = edit.width;
    let mut leading_zeroes = 0;
    match edit.digits {
        Some(minimum) if digits <= minimum => {
            if minimum == 0 && value == 0 {
                // Iw.0 of a zero value: the field is blank, even under SP.
                sign_chars = 0;
                width = width.max(1);
            } else {
                leading_zeroes = minimum - digits;
            }
        }
        _ if value == 0 => leading_zeroes = 1,
        _ => {}
    }
    let total = sign_chars + leading_zeroes + digits;
    if width > 0 && total > width {
        return emit_repeated(io, b'*', width);
    }
    if total < width && !emit_repeated(io, b' ', width - total) {
        return false;
    }
    if sign_chars > 0 && !emit_byte(io, if value < 0 { b'-' } else { b'+' }) {
        return false;
    }
    if !emit_repeated(io, b'0', leading_zeroes) {
        return false;
    }
    emit_ascii(io, &scratch[p..])
}

fn emit_byte<C: FormatChar, S: FormatContext<C>>(io: &mut S, byte: u8) -> bool {
    io.emit(&[C::from_byte(byte)])
}

fn emit_repeated<C: FormatChar, S: FormatContext<C>>(io: &mut S, byte: u8, count: i32) -> bool {
    for _ in 0..count {
        if !emit_byte(io, byte) {
            return false;
        }
    }
    true
}

fn emit_ascii<C: FormatChar, S: FormatContext<C>>(io: &mut S, bytes: &[u8]) -> bool {
    let mut widened = [C::SPACE; SCRATCH];
    for (slot, &byte) in widened.iter_mut().zip(bytes) {
        *slot = C::from_byte(byte);
    }
    io.emit(&widened[..bytes.len()])
}
