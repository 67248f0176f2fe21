//! File-level dispatch
//!
//! Provides the bounded worker pool that runs one pipeline per source
//! and the sink its results are drained from.

mod dispatcher;
mod sink;

pub use dispatcher::*;
pub use sink::*;
