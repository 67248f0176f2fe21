//! I/O strategy selection
//!
//! A pure function of what is known about a source before any byte is read.

use crate::config::{HashConfig, MmapSupport};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How a source's bytes reach the accumulators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Map the file and fan out 1 MiB windows
    MemoryMap,
    /// Read the file into one buffer and hash it whole
    WholeRead,
    /// Read 4 KiB chunks and fan them out
    StreamScan,
}

impl Strategy {
    /// Choose a strategy.
    ///
    /// `size` is `None` when the source length cannot be known up front
    /// (standard input), which always streams.
    pub fn select(size: Option<u64>, threshold: u64, mmap: MmapSupport, no_mmap: bool) -> Self {
        match size {
            None => Self::StreamScan,
            Some(size) if size <= threshold => Self::WholeRead,
            Some(_) if mmap.is_reliable() && !no_mmap => Self::MemoryMap,
            Some(_) => Self::StreamScan,
        }
    }

    /// Choose a strategy using the thresholds and flags of `config`
    pub fn for_config(size: Option<u64>, config: &HashConfig) -> Self {
        Self::select(size, config.stream_threshold, config.mmap_support, config.no_mmap)
    }

    /// Short name for logs and wide output
    pub fn name(&self) -> &'static str {
        match self {
            Self::MemoryMap => "mmap",
            Self::WholeRead => "read",
            Self::StreamScan => "stream",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const T: u64 = 1_000_000;

    #[test]
    fn test_unknown_size_always_streams() {
        assert_eq!(Strategy::select(None, T, MmapSupport::Reliable, false), Strategy::StreamScan);
        assert_eq!(Strategy::select(None, T, MmapSupport::Unavailable, true), Strategy::StreamScan);
    }

    #[test]
    fn test_small_files_read_whole() {
        assert_eq!(Strategy::select(Some(0), T, MmapSupport::Reliable, false), Strategy::WholeRead);
        assert_eq!(Strategy::select(Some(T), T, MmapSupport::Reliable, false), Strategy::WholeRead);
        assert_eq!(Strategy::select(Some(10), T, MmapSupport::Unavailable, true), Strategy::WholeRead);
    }

    #[test]
    fn test_large_files() {
        assert_eq!(Strategy::select(Some(T + 1), T, MmapSupport::Reliable, false), Strategy::MemoryMap);
        assert_eq!(Strategy::select(Some(T + 1), T, MmapSupport::Reliable, true), Strategy::StreamScan);
        assert_eq!(Strategy::select(Some(T + 1), T, MmapSupport::Unavailable, false), Strategy::StreamScan);
    }

    #[test]
    fn test_for_config() {
        let config = HashConfig {
            stream_threshold: 10,
            mmap_support: MmapSupport::Reliable,
            ..Default::default()
        };
        assert_eq!(Strategy::for_config(Some(11), &config), Strategy::MemoryMap);
        assert_eq!(Strategy::for_config(Some(10), &config), Strategy::WholeRead);
    }
}
