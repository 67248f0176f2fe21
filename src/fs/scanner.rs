//! Path expansion
//!
//! Turns the paths given on the command line into the list of files to hash.
//! Directories are walked recursively; everything else passes through so
//! that access problems surface as per-file errors in the dispatcher.

use crate::config::CliArgs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use walkdir::{DirEntry, WalkDir};

/// Configuration for path expansion
#[derive(Debug, Clone, Default)]
pub struct ScanConfig {
    /// Follow symbolic links while walking directories
    pub follow_symlinks: bool,
    /// Include hidden files and directories
    pub include_hidden: bool,
    /// Maximum depth (None = unlimited)
    pub max_depth: Option<usize>,
}

impl ScanConfig {
    /// Build from CLI arguments
    pub fn from_cli(args: &CliArgs) -> Self {
        Self {
            follow_symlinks: args.follow_symlinks,
            include_hidden: args.include_hidden,
            max_depth: None,
        }
    }
}

/// Result of expanding a set of paths
#[derive(Debug, Clone, Default)]
pub struct ScanResult {
    /// Files to hash, in argument then walk order
    pub files: Vec<PathBuf>,
    /// Directories that were walked
    pub dir_count: usize,
    /// Walk errors, as `path: message`
    pub errors: Vec<String>,
    /// Expansion duration
    pub scan_duration: Duration,
}

/// Expands path arguments into files
pub struct Scanner {
    config: ScanConfig,
}

impl Scanner {
    /// Create a new scanner with the given configuration
    pub fn new(config: ScanConfig) -> Self {
        Self { config }
    }

    /// Expand every path in order
    pub fn expand<P: AsRef<Path>>(&self, paths: &[P]) -> ScanResult {
        let start_time = Instant::now();
        let mut result = ScanResult::default();

        for path in paths {
            let path = path.as_ref();
            let is_dir = if self.config.follow_symlinks {
                path.is_dir()
            } else {
                std::fs::symlink_metadata(path)
                    .map(|m| m.is_dir())
                    .unwrap_or(false)
            };

            if is_dir {
                self.walk(path, &mut result);
            } else {
                result.files.push(path.to_path_buf());
            }
        }

        result.scan_duration = start_time.elapsed();
        tracing::debug!(
            "expanded {} path(s) into {} file(s) across {} dir(s) in {:?}",
            paths.len(),
            result.files.len(),
            result.dir_count,
            result.scan_duration
        );
        result
    }

    fn walk(&self, root: &Path, result: &mut ScanResult) {
        let mut walker = WalkDir::new(root)
            .follow_links(self.config.follow_symlinks)
            .sort_by_file_name();

        if let Some(max_depth) = self.config.max_depth {
            walker = walker.max_depth(max_depth);
        }

        let include_hidden = self.config.include_hidden;
        let entries = walker
            .into_iter()
            .filter_entry(|e| include_hidden || e.depth() == 0 || !is_hidden(e));

        for entry in entries {
            match entry {
                Ok(e) if e.file_type().is_dir() => result.dir_count += 1,
                Ok(e) if e.file_type().is_file() => result.files.push(e.into_path()),
                Ok(e) => tracing::debug!("skipping {}: not a regular file", e.path().display()),
                Err(err) => {
                    let path = err
                        .path()
                        .map(|p| p.display().to_string())
                        .unwrap_or_else(|| root.display().to_string());
                    tracing::warn!("Unable to walk {}: {}", path, err);
                    result.errors.push(format!("{}: {}", path, err));
                }
            }
        }
    }
}

/// Check if an entry is hidden (Unix convention)
fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map(|s| s.starts_with('.'))
        .unwrap_or(false)
}
