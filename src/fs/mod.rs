//! File system helpers
//!
//! Expands path arguments into the files handed to the dispatcher.

mod scanner;

pub use scanner::*;
