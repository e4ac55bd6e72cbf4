//! Stable C-callable surface of the runtime.
//!
//! Compiled Fortran programs reach the I/O core through these entry points.
//! Every symbol carries the single `Fortio` decoration so the runtime can
//! coexist with the host program's own namespace. The protocol is the one
//! the statement types implement: one `Begin…` call constructs a statement
//! and hands back an opaque [`Cookie`], one `Output…` call transfers one
//! data item, and `FortioEndIoStatement` drains the FORMAT trailer, releases
//! the cookie, and reports the status code.
//!
//! Fatal conditions (malformed FORMAT, descriptor/type mismatch, a null or
//! stale cookie) terminate the program with a diagnostic; they do not
//! return.
use std::ffi::{c_char, c_int, c_void, CStr};
use std::slice;

use crate::io_stmt::{InternalFormattedOutput, IoStatementState};

/// Owner of one statement in progress, boxed behind the C surface.
pub struct IoCookie {
    state: Box<dyn IoStatementState>,
}

/// Opaque handle to a statement in progress.
pub type Cookie = *mut IoCookie;

/// Begin an internal formatted output statement over a caller-owned buffer.
///
/// `scratch_area`/`scratch_bytes` are reserved and may be null/0.
/// `source_file` (a NUL-terminated string, may be null) and `source_line`
/// identify the originating statement for diagnostics.
///
/// # Safety
///
/// `buffer` must point to `buffer_length` writable characters and `format`
/// to `format_length` readable characters, both alive and unaliased until
/// `FortioEndIoStatement` returns the cookie.
#[no_mangle]
pub unsafe extern "C" fn FortioBeginInternalFormattedOutput(
    buffer: *mut c_char,
    buffer_length: usize,
    format: *const c_char,
    format_length: usize,
    _scratch_area: *mut c_void,
    _scratch_bytes: usize,
    source_file: *const c_char,
    source_line: c_int,
) -> Cookie {
    assert!(
        !buffer.is_null() && !format.is_null(),
        "null buffer or FORMAT passed to FortioBeginInternalFormattedOutput"
    );
    let buffer = unsafe { slice::from_raw_parts_mut(buffer.cast::<u8>(), buffer_length) };
    let format = unsafe { slice::from_raw_parts(format.cast::<u8>(), format_length) };
    let source_file = if source_file.is_null() {
        None
    } else {
        Some(unsafe { CStr::from_ptr(source_file) }.to_string_lossy().into_owned())
    };
    let statement =
        InternalFormattedOutput::with_source(buffer, format, source_file, source_line);
    Box::into_raw(Box::new(IoCookie {
        state: Box::new(statement),
    }))
}

/// Transfer one integer data item under the statement's next data edit
/// descriptor. Returns `false` once the record cannot take a whole field.
///
/// # Safety
///
/// `cookie` must have come from a `Begin…` call and not yet been passed to
/// `FortioEndIoStatement`.
#[no_mangle]
pub unsafe extern "C-unwind" fn FortioOutputInteger64(cookie: Cookie, value: i64) -> bool {
    let cookie = unsafe { cookie.as_mut() }
        .expect("null cookie passed to FortioOutputInteger64");
    cookie.state.output_integer64(value)
}

/// Transfer one real data item. Conversion is not implemented yet: a
/// REAL-compatible edit descriptor yields `false`, anything else is a fatal
/// mismatch.
///
/// # Safety
///
/// As for [`FortioOutputInteger64`].
#[no_mangle]
pub unsafe extern "C" fn FortioOutputReal64(cookie: Cookie, value: f64) -> bool {
    let cookie = unsafe { cookie.as_mut() }
        .expect("null cookie passed to FortioOutputReal64");
    cookie.state.output_real64(value)
}

/// End the statement: drain the FORMAT trailer, release the cookie, and
/// report the status (0 for success).
///
/// # Safety
///
/// `cookie` must have come from a `Begin…` call; it is invalid afterwards.
#[no_mangle]
pub unsafe extern "C" fn FortioEndIoStatement(cookie: Cookie) -> c_int {
    assert!(!cookie.is_null(), "null cookie passed to FortioEndIoStatement");
    let mut cookie = unsafe { Box::from_raw(cookie) };
    cookie.state.end_io_statement().code()
}
