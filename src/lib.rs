//! FORMAT-directed formatted output for a Fortran runtime.
//!
//! A Fortran `WRITE` statement with a FORMAT runs the FORMAT as a small
//! program: data edit descriptors (`I5`, `E12.4`, …) each consume one data
//! item, while literals, Hollerith fields, positioning, and mode changes
//! execute in between. This crate implements that interpreter
//! ([`format_control`]) together with the internal formatted output
//! statement ([`io_stmt`]) that drives it into a caller-owned character
//! buffer, including integer output editing. A compiled program reaches the
//! same machinery through the C surface in [`io_api`].
//!
//! ```
//! use fortio::io_error::Iostat;
//! use fortio::io_stmt::{InternalFormattedOutput, IoStatementState};
//!
//! let mut buffer = [0u8; 16];
//! let mut statement = InternalFormattedOutput::new(&mut buffer, b"(I5.3,1X,SP,I4)");
//! statement.output_integer64(7);
//! statement.output_integer64(12);
//! assert_eq!(statement.end(), Iostat::Ok);
//! assert_eq!(&buffer[..], b"  007  +12      ");
//! ```
//!
//! The FORMAT string and the destination buffer are borrowed from the
//! caller for the life of the statement, in any of the three Fortran
//! character kinds. Malformed FORMAT strings and descriptor/type mismatches
//! are programmer (or compiler) errors and terminate with a diagnostic;
//! running out of record is recoverable and reported by the end status.
pub mod format_control;
pub mod format_specs;
pub mod io_api;
pub mod io_error;
pub mod io_stmt;
pub mod validator;

mod edit_output;
