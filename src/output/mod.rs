//! Output rendering for finished results

mod formatter;

pub use formatter::*;
