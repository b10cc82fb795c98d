//! Fund statement parsing and FIFO (PEPS) gain/loss accounting.
//!
//! Statement text goes through [`parser::StatementParser`], the resulting
//! operations are replayed per fund by [`accounting::analyze`], and
//! [`accounting::reports::ReportWriter`] renders the outcome as CSV.

pub mod accounting;
pub mod amount;
pub mod config;
pub mod dates;
pub mod error;
pub mod extract;
pub mod parser;

pub use error::{Error, Result};
