//! Configuration module for hashit
//!
//! Provides CLI arguments, the algorithm set and the frozen
//! runtime configuration shared by every worker.

mod settings;

pub use settings::*;
