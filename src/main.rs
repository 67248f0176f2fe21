//! hashit CLI - Multi-Digest File Hashing
//!
//! Hashes files, directories or standard input with several algorithms at once.

use clap::Parser;
use hashit::config::{CliArgs, HashConfig};
use hashit::core::{Dispatcher, Source};
use hashit::error::{HashitError, IoResultExt, Result};
use hashit::fs::{ScanConfig, Scanner};
use hashit::hash::sort_by_submission;
use hashit::output::{write_algorithm_list, Formatter};
use tracing_subscriber::EnvFilter;

fn main() {
    // Parse CLI arguments
    let args = CliArgs::parse();

    // Initialize logging
    let default_level = match (args.quiet, args.verbose) {
        (true, _) => "error",
        (false, 0) => "info",
        (false, 1) => "debug",
        (false, _) => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    // Handle result
    match run(args) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Returns whether every source was hashed
fn run(args: CliArgs) -> Result<bool> {
    if args.list_hashes {
        let stdout = std::io::stdout();
        write_algorithm_list(&mut stdout.lock())?;
        return Ok(true);
    }

    // Build configuration
    let config = HashConfig::from_cli(&args)?;

    if args.verbose > 0 {
        print_config(&config);
    }

    // Expand directories; no paths means standard input
    let mut scan_errors = 0;
    let sources = if args.paths.is_empty() {
        vec![Source::Stdin]
    } else {
        let scan = Scanner::new(ScanConfig::from_cli(&args)).expand(&args.paths);
        scan_errors = scan.errors.len();
        scan.files.into_iter().map(Source::Path).collect()
    };

    let formatter = Formatter::new(args.format, &config.algorithms);
    let dispatcher = Dispatcher::new(config)?;
    let (mut results, report) = dispatcher.collect(sources)?;

    if args.sorted {
        sort_by_submission(&mut results);
    }

    // Print results
    match &args.output {
        Some(path) => {
            let file = std::fs::File::create(path).with_path(path)?;
            let mut writer = std::io::BufWriter::new(file);
            formatter.write_all(&mut writer, &results)?;
        }
        None => {
            let stdout = std::io::stdout();
            let mut writer = stdout.lock();
            formatter.write_all(&mut writer, &results)?;
        }
    }

    if !args.quiet {
        report.log_summary();
    }

    Ok(report.is_success() && scan_errors == 0)
}

fn print_config(config: &HashConfig) {
    match serde_json::to_string_pretty(config) {
        Ok(json) => tracing::debug!("Configuration:\n{}", json),
        Err(e) => tracing::warn!("{}", HashitError::from(e)),
    }
    tracing::debug!("Worker threads: {}", config.effective_threads());
}
