//! # hashit - Multi-Digest File Hashing
//!
//! hashit computes several cryptographic digests of many files in one pass
//! over each file's bytes.
//!
//! ## Features
//!
//! - **Many Algorithms at Once**: MD4, MD5, SHA-1, SHA-256, SHA-512,
//!   BLAKE2b-256/512 and SHA3-224/256/384/512 from a single read
//! - **Size-Aware I/O**: small files are read whole, large files are memory
//!   mapped or streamed in fixed-size chunks
//! - **Parallel Files**: a bounded pool of workers hashes files concurrently
//! - **Standard Input**: streamed when no files are given
//!
//! ## Quick Start
//!
//! ```no_run
//! use hashit::config::{HashAlgorithm, HashConfig};
//! use hashit::core::{Dispatcher, Source};
//! use std::path::PathBuf;
//!
//! let config = HashConfig::default()
//!     .with_algorithms(&[HashAlgorithm::Sha256, HashAlgorithm::Blake2b512]);
//! let dispatcher = Dispatcher::new(config).unwrap();
//!
//! let sources = Source::from_paths(vec![PathBuf::from("/data/image.iso")]);
//! let (results, report) = dispatcher.collect(sources).unwrap();
//!
//! for result in &results {
//!     println!("{} {:?}", result.file(), result.digest(HashAlgorithm::Sha256));
//! }
//! report.log_summary();
//! ```
//!
//! ## Streaming Results
//!
//! ```no_run
//! use hashit::config::HashConfig;
//! use hashit::core::{Dispatcher, Source};
//! use std::path::PathBuf;
//!
//! let dispatcher = Dispatcher::new(HashConfig::default()).unwrap();
//! let sources = Source::from_paths(vec![PathBuf::from("a.bin"), PathBuf::from("b.bin")]);
//!
//! let (sink, handle) = dispatcher.spawn(sources).unwrap();
//! for result in sink {
//!     println!("{} done", result.file());
//! }
//! let report = handle.join().unwrap().unwrap();
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod core;
pub mod error;
pub mod fs;
pub mod hash;
pub mod output;

// Re-export commonly used types
pub use config::{HashAlgorithm, HashConfig};
pub use core::{DispatchReport, Dispatcher, Source};
pub use error::{HashitError, Result};
pub use hash::FileDigest;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports
pub mod prelude {
    //! Convenient re-exports for common usage
    //!
    //! ```no_run
    //! use hashit::prelude::*;
    //! ```

    pub use crate::config::{HashAlgorithm, HashConfig, OutputFormat};
    pub use crate::core::{hash_path, hash_reader, DispatchReport, Dispatcher, ResultSink, Source};
    pub use crate::error::{HashitError, Result};
    pub use crate::fs::{ScanConfig, Scanner};
    pub use crate::hash::{FileDigest, Strategy};
    pub use crate::output::Formatter;
}
