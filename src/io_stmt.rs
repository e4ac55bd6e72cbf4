//! State of an I/O statement in progress.
use crate::edit_output::edit_integer_output;
use crate::format_control::{FormatContext, FormatControl};
use crate::format_specs::{DataEdit, FormatChar, MutableModes};
use crate::io_error::{IoErrorHandler, Iostat};
use crate::validator::FormatValidator;

/// The operations a host program can apply to a statement in progress.
///
/// Data transfer operations have fatal defaults so that applying one to the
/// wrong statement kind fails with a diagnostic instead of scribbling on
/// state; each statement kind overrides the operations it supports.
pub trait IoStatementState {
    fn handler(&mut self) -> &mut IoErrorHandler;

    /// Drain whatever remains of the FORMAT and report the accumulated
    /// status.
    fn end_io_statement(&mut self) -> Iostat;

    /// Edit one integer data item into the current record. Returns `false`
    /// when the record could not take the whole field.
    fn output_integer64(&mut self, _value: i64) -> bool {
        self.handler()
            .crash("OutputInteger64() called for an I/O statement that is not formatted output")
    }

    /// Edit one real data item into the current record.
    fn output_real64(&mut self, _value: f64) -> bool {
        self.handler()
            .crash("OutputReal64() called for an I/O statement that is not formatted output")
    }
}

/// The record side of an internal output statement: the caller's buffer,
/// the position cursor, and the statement-local error and mode state. Kept
/// apart from the statement's `FormatControl` so the interpreter can borrow
/// it as a sink while the control advances.
#[derive(Debug)]
struct InternalOutputUnit<'a, C: FormatChar> {
    buffer: &'a mut [C],
    at: usize,
    modes: MutableModes,
    handler: IoErrorHandler,
}

impl<'a, C: FormatChar> FormatContext<C> for InternalOutputUnit<'a, C> {
    fn handler(&mut self) -> &mut IoErrorHandler {
        &mut self.handler
    }

    fn mutable_modes(&mut self) -> &mut MutableModes {
        &mut self.modes
    }

    fn emit(&mut self, data: &[C]) -> bool {
        if self.at + data.len() > self.buffer.len() {
            // Keep the prefix that fits; the truncated state is what the
            // caller observes along with the EOR status.
            self.handler.signal_eor();
            let room = self.buffer.len() - self.at;
            self.buffer[self.at..].copy_from_slice(&data[..room]);
            self.at = self.buffer.len();
            false
        } else {
            self.buffer[self.at..self.at + data.len()].copy_from_slice(data);
            self.at += data.len();
            true
        }
    }

    // An internal unit has a single record, so the implied or explicit `/`
    // keeps its fatal default.

    fn handle_absolute_position(&mut self, column: i32) -> bool {
        let column = column.max(0) as usize;
        if column >= self.buffer.len() {
            self.handler.signal_eor();
            false
        } else {
            self.at = column;
            true
        }
    }

    fn handle_relative_position(&mut self, delta: i32) -> bool {
        if delta < 0 {
            self.at -= self.at.min(delta.unsigned_abs() as usize);
            true
        } else if self.at + delta as usize > self.buffer.len() {
            self.handler.signal_eor();
            self.at = self.buffer.len();
            false
        } else {
            self.at += delta as usize;
            true
        }
    }
}

/// An internal formatted output statement: FORMAT-directed WRITE into a
/// caller-owned character buffer.
///
/// The buffer is prefilled with blanks when the statement begins, and holds
/// whatever fit if the statement ends with an end-of-record status. One
/// `output_*` call consumes one data edit descriptor; ending the statement
/// drains any FORMAT trailer (final literals, positioning) first.
#[derive(Debug)]
pub struct InternalFormattedOutput<'a, C: FormatChar = u8> {
    unit: InternalOutputUnit<'a, C>,
    format: FormatControl<'a, C>,
}

impl<'a, C: FormatChar> InternalFormattedOutput<'a, C> {
    pub fn new(buffer: &'a mut [C], format: &'a [C]) -> Self {
        Self::with_source(buffer, format, None, 0)
    }

    /// Begin a statement, recording the originating source position for any
    /// diagnostics it raises. A malformed FORMAT is fatal here, before any
    /// data is transferred.
    pub fn with_source(
        buffer: &'a mut [C],
        format: &'a [C],
        source_file: Option<String>,
        source_line: i32,
    ) -> Self {
        let handler = IoErrorHandler::new(source_file, source_line);
        let nesting = match FormatValidator::new(format).check() {
            Ok(depth) => depth,
            Err(error) => handler.crash(&error.to_string()),
        };
        // Room for the outermost frame plus one repeated non-parenthesized
        // edit descriptor.
        let control = FormatControl::new(&handler, format, nesting + 2);
        tracing::debug!(
            buffer_length = buffer.len(),
            format_length = format.len(),
            "begin internal formatted output"
        );
        buffer.fill(C::SPACE);
        Self {
            unit: InternalOutputUnit {
                buffer,
                at: 0,
                modes: MutableModes::default(),
                handler,
            },
            format: control,
        }
    }

    /// Cue up the next data edit descriptor, applying any intervening
    /// literals and control edits to this statement's record.
    pub fn get_next(&mut self, max_repeat: i32) -> DataEdit {
        self.format.get_next(&mut self.unit, max_repeat)
    }

    /// End the statement, releasing the buffer borrow.
    pub fn end(mut self) -> Iostat {
        self.end_io_statement()
    }
}

impl<'a, C: FormatChar> IoStatementState for InternalFormattedOutput<'a, C> {
    fn handler(&mut self) -> &mut IoErrorHandler {
        &mut self.unit.handler
    }

    fn end_io_statement(&mut self) -> Iostat {
        self.format.finish_output(&mut self.unit);
        let status = self.unit.handler.io_stat();
        tracing::debug!(
            status = status.code(),
            at = self.unit.at,
            "end internal formatted output"
        );
        status
    }

    fn output_integer64(&mut self, value: i64) -> bool {
        let edit = self.format.get_next(&mut self.unit, 1);
        edit_integer_output(&mut self.unit, &edit, value)
    }

    fn output_real64(&mut self, _value: f64) -> bool {
        let edit = self.format.get_next(&mut self.unit, 1);
        match edit.descriptor {
            // TODO: E, EN, ES, EX (and later F, D, G) conversion of the value.
            'E' => false,
            _ => self.unit.handler.crash(&format!(
                "Data edit descriptor '{}' does not correspond to a REAL data item",
                edit.descriptor
            )),
        }
    }
}
