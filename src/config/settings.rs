//! Configuration settings for hashit
//!
//! Defines the CLI arguments and the immutable [`HashConfig`] the engine is
//! driven by. The configuration is built once in `main` and shared read-only
//! by every worker.

use crate::error::{HashitError, Result};
use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Files at or below this size are read whole into memory
pub const DEFAULT_STREAM_THRESHOLD: u64 = 1_000_000;

/// Depth of each per-algorithm chunk queue
pub const DEFAULT_QUEUE_DEPTH: usize = 10;

/// hashit - compute many digests of many files at once
#[derive(Parser, Debug, Clone)]
#[command(name = "hashit")]
#[command(author = "Hashit Team")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Hash files or standard input with several algorithms at once")]
#[command(long_about = r#"
hashit computes a set of digests for every file given on the command line,
or for standard input when no files are given.

Supported algorithms:
  md4 md5 sha1 sha256 sha512 blake2b256 blake2b512
  sha3224 sha3256 sha3384 sha3512

Examples:
  hashit file.iso                         # Default digests
  hashit --hash sha256,blake2b512 dir/    # Selected digests, recursive
  cat file | hashit --hash all            # Standard input
  hashit --format json *.tar > sums.json  # JSON output
"#)]
pub struct CliArgs {
    /// Files or directories to hash (standard input when empty)
    #[arg(value_name = "PATHS")]
    pub paths: Vec<PathBuf>,

    /// Hashes to compute, comma separated, or 'all'
    #[arg(long = "hash", value_name = "ALGOS", value_delimiter = ',',
          default_values = ["md5", "sha1", "sha256", "sha512"])]
    pub hashes: Vec<String>,

    /// List supported hash algorithms and exit
    #[arg(long)]
    pub list_hashes: bool,

    /// Never memory map files, stream large files instead
    #[arg(long)]
    pub no_mmap: bool,

    /// Files up to this size are read into memory in one go (e.g. 1M, 500K)
    #[arg(long, default_value = "1000000", value_name = "SIZE")]
    pub stream_size: String,

    /// Number of files hashed in parallel (0 = auto-detect)
    #[arg(short = 't', long, default_value = "0", value_name = "NUM")]
    pub threads: usize,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Write output to this file instead of stdout
    #[arg(short = 'o', long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Emit results in input order instead of completion order
    #[arg(long)]
    pub sorted: bool,

    /// Follow symbolic links when walking directories
    #[arg(short = 'L', long)]
    pub follow_symlinks: bool,

    /// Include hidden files when walking directories
    #[arg(long)]
    pub include_hidden: bool,

    /// Verbose output (can be repeated: -v, -vv)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (only errors are logged)
    #[arg(short = 'q', long)]
    pub quiet: bool,
}

/// Supported digest algorithms, in canonical output order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// MD4 (128-bit, broken, legacy compatibility)
    Md4,
    /// MD5 (128-bit)
    Md5,
    /// SHA-1 (160-bit)
    Sha1,
    /// SHA-256 (256-bit)
    Sha256,
    /// SHA-512 (512-bit)
    Sha512,
    /// BLAKE2b with a 256-bit output
    Blake2b256,
    /// BLAKE2b with a 512-bit output
    Blake2b512,
    /// SHA3-224
    Sha3224,
    /// SHA3-256
    Sha3256,
    /// SHA3-384
    Sha3384,
    /// SHA3-512
    Sha3512,
}

impl HashAlgorithm {
    /// Every supported algorithm in canonical order
    pub const ALL: [HashAlgorithm; 11] = [
        Self::Md4,
        Self::Md5,
        Self::Sha1,
        Self::Sha256,
        Self::Sha512,
        Self::Blake2b256,
        Self::Blake2b512,
        Self::Sha3224,
        Self::Sha3256,
        Self::Sha3384,
        Self::Sha3512,
    ];

    /// Get the output size in bytes
    pub fn output_size(&self) -> usize {
        match self {
            Self::Md4 | Self::Md5 => 16,
            Self::Sha1 => 20,
            Self::Sha3224 => 28,
            Self::Sha256 | Self::Blake2b256 | Self::Sha3256 => 32,
            Self::Sha3384 => 48,
            Self::Sha512 | Self::Blake2b512 | Self::Sha3512 => 64,
        }
    }

    /// Stable lowercase identifier used on the command line and in JSON/CSV
    pub fn key(&self) -> &'static str {
        match self {
            Self::Md4 => "md4",
            Self::Md5 => "md5",
            Self::Sha1 => "sha1",
            Self::Sha256 => "sha256",
            Self::Sha512 => "sha512",
            Self::Blake2b256 => "blake2b256",
            Self::Blake2b512 => "blake2b512",
            Self::Sha3224 => "sha3224",
            Self::Sha3256 => "sha3256",
            Self::Sha3384 => "sha3384",
            Self::Sha3512 => "sha3512",
        }
    }

    /// Get human-readable name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Md4 => "MD4",
            Self::Md5 => "MD5",
            Self::Sha1 => "SHA1",
            Self::Sha256 => "SHA256",
            Self::Sha512 => "SHA512",
            Self::Blake2b256 => "Blake2b 256",
            Self::Blake2b512 => "Blake2b 512",
            Self::Sha3224 => "SHA3 224",
            Self::Sha3256 => "SHA3 256",
            Self::Sha3384 => "SHA3 384",
            Self::Sha3512 => "SHA3 512",
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for HashAlgorithm {
    type Err = HashitError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted: String = s
            .trim()
            .to_lowercase()
            .chars()
            .filter(|c| !matches!(c, '-' | '_'))
            .collect();

        Self::ALL
            .into_iter()
            .find(|a| a.key() == wanted)
            .ok_or_else(|| HashitError::UnsupportedHashAlgorithm(s.trim().to_string()))
    }
}

/// Parse a list of algorithm names into a canonical, deduplicated set.
///
/// `all` anywhere in the list enables every algorithm.
pub fn parse_algorithms<S: AsRef<str>>(names: &[S]) -> Result<Vec<HashAlgorithm>> {
    let mut algorithms = Vec::new();

    for name in names {
        let name = name.as_ref().trim();
        if name.is_empty() {
            continue;
        }
        if name.eq_ignore_ascii_case("all") {
            return Ok(HashAlgorithm::ALL.to_vec());
        }
        algorithms.push(name.parse::<HashAlgorithm>()?);
    }

    algorithms.sort();
    algorithms.dedup();

    if algorithms.is_empty() {
        return Err(HashitError::config("At least one hash algorithm must be enabled"));
    }

    Ok(algorithms)
}

/// Output format for results
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// File name followed by one line per digest
    #[default]
    Text,
    /// One line per file
    Wide,
    /// JSON array
    Json,
    /// CSV with a header row
    Csv,
}

/// Whether the host can reliably release a memory mapping.
///
/// Some platforms refuse to unmap a file view while it is still open, so
/// mapping is only offered where release is dependable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MmapSupport {
    /// Mappings can be created and released reliably
    Reliable,
    /// Mappings must not be used
    Unavailable,
}

impl MmapSupport {
    /// Detect the capability of the current platform
    pub fn detect() -> Self {
        if cfg!(windows) {
            Self::Unavailable
        } else {
            Self::Reliable
        }
    }

    /// Is mapping usable at all
    pub fn is_reliable(&self) -> bool {
        matches!(self, Self::Reliable)
    }
}

/// Immutable engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HashConfig {
    /// Enabled algorithms, canonical order, no duplicates
    pub algorithms: Vec<HashAlgorithm>,
    /// Files at or below this size are read whole
    pub stream_threshold: u64,
    /// Explicitly disable memory mapping
    pub no_mmap: bool,
    /// Platform mapping capability
    pub mmap_support: MmapSupport,
    /// File-level worker count (0 = number of CPUs)
    pub threads: usize,
    /// Per-algorithm chunk queue depth
    pub queue_depth: usize,
}

impl Default for HashConfig {
    fn default() -> Self {
        Self {
            algorithms: vec![
                HashAlgorithm::Md5,
                HashAlgorithm::Sha1,
                HashAlgorithm::Sha256,
                HashAlgorithm::Sha512,
            ],
            stream_threshold: DEFAULT_STREAM_THRESHOLD,
            no_mmap: false,
            mmap_support: MmapSupport::detect(),
            threads: 0, // Auto-detect
            queue_depth: DEFAULT_QUEUE_DEPTH,
        }
    }
}

impl HashConfig {
    /// Create config from CLI arguments
    pub fn from_cli(args: &CliArgs) -> Result<Self> {
        let stream_threshold = parse_size(&args.stream_size)
            .map_err(|e| HashitError::config(format!("Invalid stream size: {}", e)))?;

        Ok(Self {
            algorithms: parse_algorithms(&args.hashes)?,
            stream_threshold,
            no_mmap: args.no_mmap,
            threads: args.threads,
            ..Default::default()
        })
    }

    /// Replace the enabled algorithm set
    pub fn with_algorithms(mut self, algorithms: &[HashAlgorithm]) -> Self {
        let mut algorithms = algorithms.to_vec();
        algorithms.sort();
        algorithms.dedup();
        self.algorithms = algorithms;
        self
    }

    /// Worker count with auto-detection resolved
    pub fn effective_threads(&self) -> usize {
        if self.threads == 0 {
            num_cpus::get().max(1)
        } else {
            self.threads
        }
    }

    /// Check the configuration before any worker starts
    pub fn validate(&self) -> Result<()> {
        if self.algorithms.is_empty() {
            return Err(HashitError::config("At least one hash algorithm must be enabled"));
        }
        if self.queue_depth == 0 {
            return Err(HashitError::config("Queue depth must be at least 1"));
        }
        Ok(())
    }
}

/// Parse human-readable size string to bytes
pub fn parse_size(size: &str) -> std::result::Result<u64, String> {
    let size = size.trim().to_uppercase();

    if size.is_empty() {
        return Err("Empty size string".to_string());
    }

    let (num_str, multiplier) = if size.ends_with("TB") || size.ends_with('T') {
        let num = size.trim_end_matches(|c| c == 'T' || c == 'B');
        (num, 1024u64 * 1024 * 1024 * 1024)
    } else if size.ends_with("GB") || size.ends_with('G') {
        let num = size.trim_end_matches(|c| c == 'G' || c == 'B');
        (num, 1024u64 * 1024 * 1024)
    } else if size.ends_with("MB") || size.ends_with('M') {
        let num = size.trim_end_matches(|c| c == 'M' || c == 'B');
        (num, 1024u64 * 1024)
    } else if size.ends_with("KB") || size.ends_with('K') {
        let num = size.trim_end_matches(|c| c == 'K' || c == 'B');
        (num, 1024u64)
    } else if size.ends_with('B') {
        let num = size.trim_end_matches('B');
        (num, 1u64)
    } else {
        // Assume bytes if no suffix
        (size.as_str(), 1u64)
    };

    let num: f64 = num_str
        .trim()
        .parse()
        .map_err(|_| format!("Invalid number: {}", num_str))?;

    if !num.is_finite() {
        return Err(format!("Invalid number: {}", num_str));
    }
    if num < 0.0 {
        return Err(format!("Negative size: {}", num_str));
    }

    let bytes = num * multiplier as f64;
    if bytes >= u64::MAX as f64 {
        return Err(format!("Size too large: {}", num_str));
    }

    Ok(bytes as u64)
}
