//! I/O statement status and the fatal diagnostic path.
use std::fmt::Display;

/// Status of an I/O statement, as reported by `EndIoStatement`.
///
/// Zero is success. The only recoverable condition an internal formatted
/// output statement can accumulate is end-of-record, raised when the
/// destination buffer runs out of room; the statement keeps as many
/// characters as fit and reports [`Iostat::Eor`] at the end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum Iostat {
    Ok = 0,
    Eor = 1,
}

impl Iostat {
    /// The integer code handed back across the C surface.
    pub fn code(self) -> i32 {
        self as i32
    }
}

impl Display for Iostat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Iostat::Ok => write!(f, "no error"),
            Iostat::Eor => write!(f, "end of record"),
        }
    }
}

/// Per-statement error state: the source position of the I/O statement for
/// diagnostics, plus the first recoverable condition signaled so far.
///
/// Malformed FORMAT strings, descriptor/type mismatches, and contract
/// violations are not recoverable; they go through [`crash`], which logs the
/// diagnostic and panics. A Fortran runtime is built with `panic = "abort"`,
/// so this terminates the host program with the statement's source position.
///
/// [`crash`]: IoErrorHandler::crash
#[derive(Debug)]
pub struct IoErrorHandler {
    source_file: Option<String>,
    source_line: i32,
    status: Iostat,
}

impl IoErrorHandler {
    pub fn new(source_file: Option<String>, source_line: i32) -> Self {
        Self {
            source_file,
            source_line,
            status: Iostat::Ok,
        }
    }

    /// Record an end-of-record condition. The first condition recorded on a
    /// statement is the one its end status reports.
    pub fn signal_eor(&mut self) {
        if self.status == Iostat::Ok {
            tracing::trace!("end of record in internal unit");
            self.status = Iostat::Eor;
        }
    }

    /// The status accumulated so far.
    pub fn io_stat(&self) -> Iostat {
        self.status
    }

    /// Report an unrecoverable error and terminate.
    pub fn crash(&self, message: &str) -> ! {
        let position = match &self.source_file {
            Some(file) => format!("{file}, line {}", self.source_line),
            None => "unknown source position".to_owned(),
        };
        tracing::error!(%position, message, "fatal Fortran runtime I/O error");
        panic!("fatal Fortran runtime I/O error ({position}): {message}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_condition_wins() {
        let mut handler = IoErrorHandler::new(None, 0);
        assert_eq!(handler.io_stat(), Iostat::Ok);
        handler.signal_eor();
        handler.signal_eor();
        assert_eq!(handler.io_stat(), Iostat::Eor);
        assert_eq!(handler.io_stat().code(), 1);
    }

    #[test]
    #[should_panic(expected = "demo.f90, line 12")]
    fn test_crash_carries_source_position() {
        let handler = IoErrorHandler::new(Some("demo.f90".to_owned()), 12);
        handler.crash("something is wrong");
    }
}
