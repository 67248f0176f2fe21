//! Multi-digest hashing engine
//!
//! Accumulators for every supported algorithm, the chunk fan-out that feeds
//! them, strategy selection and the three I/O pipelines built on top.

mod fanout;
mod hasher;
mod pipeline;
mod result;
mod strategy;

pub use fanout::*;
pub use hasher::*;
pub use pipeline::*;
pub use result::*;
pub use strategy::*;

#[cfg(test)]
pub(crate) use hasher::EMPTY_VECTORS;
