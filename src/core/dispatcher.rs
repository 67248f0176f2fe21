//! File dispatcher
//!
//! A fixed pool of file-level workers drains a bounded job queue. Each worker
//! selects a strategy for its source, runs the pipeline to completion and
//! pushes the result into the sink. Results leave in completion order.

use crate::config::HashConfig;
use crate::core::ResultSink;
use crate::error::{ErrorKind, HashitError, Result};
use crate::hash::{hash_mapped, hash_stream, hash_whole, FileDigest, Strategy, STDIN_SOURCE};
use crossbeam::channel::{bounded, unbounded, Receiver, Sender};
use std::fmt;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Something to hash
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// A file on disk
    Path(PathBuf),
    /// The process's standard input
    Stdin,
}

impl Source {
    /// Identifier used in results and diagnostics
    pub fn id(&self) -> String {
        match self {
            Self::Path(path) => path.to_string_lossy().into_owned(),
            Self::Stdin => STDIN_SOURCE.to_string(),
        }
    }

    /// Build the source list for a run: standard input when no paths are given
    pub fn from_paths(paths: Vec<PathBuf>) -> Vec<Source> {
        if paths.is_empty() {
            vec![Self::Stdin]
        } else {
            paths.into_iter().map(Self::Path).collect()
        }
    }
}

/// Where a source is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileStage {
    /// Waiting for a worker
    Queued,
    /// Strategy chosen
    StrategySelected(Strategy),
    /// Bytes flowing to accumulators
    PipelineRunning,
    /// All accumulators finalized
    Joined,
    /// Result pushed to the sink
    ResultEmitted,
    /// Abandoned
    Errored(ErrorKind),
}

impl fmt::Display for FileStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Queued => f.write_str("queued"),
            Self::StrategySelected(strategy) => write!(f, "strategy-selected({})", strategy),
            Self::PipelineRunning => f.write_str("pipeline-running"),
            Self::Joined => f.write_str("joined"),
            Self::ResultEmitted => f.write_str("result-emitted"),
            Self::Errored(kind) => write!(f, "errored({})", kind),
        }
    }
}

fn stage(source_id: &str, stage: FileStage) {
    tracing::trace!("{}: {}", source_id, stage);
}

/// Outcome of a dispatch run
#[derive(Debug, Default)]
pub struct DispatchReport {
    /// Sources hashed successfully
    pub hashed: u64,
    /// Bytes hashed across all sources
    pub bytes: u64,
    /// Sources that were skipped, with the reason
    pub failures: Vec<(String, String)>,
    /// Wall time of the run
    pub duration: Duration,
}

impl DispatchReport {
    /// Check if every source produced a result
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Log a summary of the run
    pub fn log_summary(&self) {
        tracing::info!(
            "hashed {} source(s), {} in {:.2?}",
            self.hashed,
            humansize::format_size(self.bytes, humansize::BINARY),
            self.duration
        );
        if !self.failures.is_empty() {
            tracing::warn!("{} source(s) could not be hashed", self.failures.len());
        }
    }
}

/// Per-worker tally, merged after the pool joins
#[derive(Default)]
struct WorkerTally {
    hashed: u64,
    bytes: u64,
    failures: Vec<(String, String)>,
    fatal: Option<HashitError>,
}

/// Opens the reader behind [`Source::Stdin`]
pub type OpenReader = dyn Fn() -> Box<dyn Read + Send> + Send + Sync;

/// Bounded pool of file-level workers
pub struct Dispatcher {
    config: Arc<HashConfig>,
    open_stdin: Arc<OpenReader>,
}

impl Dispatcher {
    /// Create a dispatcher; the configuration is frozen from here on
    pub fn new(config: HashConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config: Arc::new(config),
            open_stdin: Arc::new(|| Box::new(std::io::stdin()) as Box<dyn Read + Send>),
        })
    }

    /// Read [`Source::Stdin`] from something other than the process's stdin
    pub fn with_stdin<F>(mut self, open: F) -> Self
    where
        F: Fn() -> Box<dyn Read + Send> + Send + Sync + 'static,
    {
        self.open_stdin = Arc::new(open);
        self
    }

    /// The configuration every worker reads
    pub fn config(&self) -> &HashConfig {
        &self.config
    }

    /// Hash every source, pushing results into `sink` as they complete.
    ///
    /// Blocks until every worker has finished; the sink is closed when the
    /// last sender clone drops at the end of this call. Per-file failures are
    /// recorded in the report. A fatal stream error stops the pool from
    /// taking new sources and is returned once in-flight work is done.
    pub fn run(&self, sources: Vec<Source>, sink: Sender<FileDigest>) -> Result<DispatchReport> {
        let start = Instant::now();
        let workers = self.config.effective_threads().min(sources.len()).max(1);
        let aborted = AtomicBool::new(false);
        let (job_tx, job_rx) = bounded::<(usize, Source)>(workers * 2);

        tracing::debug!(
            "dispatching {} source(s) to {} worker(s), algorithms: {:?}",
            sources.len(),
            workers,
            self.config.algorithms
        );

        let tallies = thread::scope(|scope| {
            let mut handles = Vec::with_capacity(workers);

            for worker_id in 0..workers {
                let rx = job_rx.clone();
                let tx = sink.clone();
                let config = &*self.config;
                let open_stdin = &*self.open_stdin;
                let aborted = &aborted;

                let handle = thread::Builder::new()
                    .name(format!("hash-worker-{}", worker_id))
                    .spawn_scoped(scope, move || {
                        worker_loop(&rx, &tx, config, open_stdin, aborted)
                    })
                    .map_err(|e| HashitError::ThreadPoolError(e.to_string()))?;
                handles.push(handle);
            }
            drop(job_rx);

            for (index, source) in sources.into_iter().enumerate() {
                if aborted.load(Ordering::SeqCst) {
                    break;
                }
                stage(&source.id(), FileStage::Queued);
                if job_tx.send((index, source)).is_err() {
                    break;
                }
            }
            drop(job_tx);

            let mut tallies = Vec::with_capacity(handles.len());
            for handle in handles {
                let tally = handle
                    .join()
                    .map_err(|_| HashitError::ThreadPoolError("hash worker panicked".to_string()))?;
                tallies.push(tally);
            }
            Ok::<_, HashitError>(tallies)
        })?;

        drop(sink);

        let mut report = DispatchReport::default();
        let mut fatal = None;
        for tally in tallies {
            report.hashed += tally.hashed;
            report.bytes += tally.bytes;
            report.failures.extend(tally.failures);
            if fatal.is_none() {
                fatal = tally.fatal;
            }
        }
        report.duration = start.elapsed();

        match fatal {
            Some(err) => Err(err),
            None => Ok(report),
        }
    }

    /// Run on a background thread and hand back the sink to drain
    pub fn spawn(
        self,
        sources: Vec<Source>,
    ) -> Result<(ResultSink, thread::JoinHandle<Result<DispatchReport>>)> {
        let (tx, rx) = unbounded();
        let handle = thread::Builder::new()
            .name("hash-dispatcher".to_string())
            .spawn(move || self.run(sources, tx))
            .map_err(|e| HashitError::ThreadPoolError(e.to_string()))?;

        Ok((ResultSink::new(rx), handle))
    }

    /// Hash every source and collect the results in completion order
    pub fn collect(&self, sources: Vec<Source>) -> Result<(Vec<FileDigest>, DispatchReport)> {
        let (tx, rx) = unbounded();
        let report = self.run(sources, tx)?;
        let results = ResultSink::new(rx).collect();
        Ok((results, report))
    }
}

fn worker_loop(
    jobs: &Receiver<(usize, Source)>,
    sink: &Sender<FileDigest>,
    config: &HashConfig,
    open_stdin: &OpenReader,
    aborted: &AtomicBool,
) -> WorkerTally {
    let mut tally = WorkerTally::default();

    while let Ok((index, source)) = jobs.recv() {
        if aborted.load(Ordering::SeqCst) {
            continue;
        }

        let source_id = source.id();
        match hash_source(&source, index, config, open_stdin) {
            Ok(result) => {
                let bytes = result.bytes();
                if sink.send(result).is_err() {
                    tracing::warn!("result sink closed, dropping result for {}", source_id);
                } else {
                    tally.hashed += 1;
                    tally.bytes += bytes;
                    stage(&source_id, FileStage::ResultEmitted);
                }
            }
            Err(err) => {
                stage(&source_id, FileStage::Errored(err.kind()));
                if err.is_fatal() {
                    tracing::error!("{}", err);
                    aborted.store(true, Ordering::SeqCst);
                    tally.fatal.get_or_insert(err);
                } else {
                    tracing::error!("Unable to process {}: {}", source_id, err);
                    tally.failures.push((source_id, err.to_string()));
                }
            }
        }
    }

    tracing::debug!("Worker {} shutting down", thread::current().name().unwrap_or("?"));
    tally
}

/// Hash one source with the strategy its size calls for
pub fn hash_source(
    source: &Source,
    index: usize,
    config: &HashConfig,
    open_stdin: &OpenReader,
) -> Result<FileDigest> {
    match source {
        Source::Path(path) => hash_path(path, index, config),
        Source::Stdin => hash_reader(STDIN_SOURCE, index, open_stdin(), config),
    }
}

/// Hash a file on disk.
///
/// Only regular files report a usable length. FIFOs, devices and procfs
/// entries are treated as unknown-size sources and streamed from the handle
/// opened here, so a writer on the other end of a pipe is never cut off.
pub fn hash_path(path: &Path, index: usize, config: &HashConfig) -> Result<FileDigest> {
    let source_id = path.to_string_lossy();

    let file = std::fs::File::open(path).map_err(|e| HashitError::source_access(path, e))?;
    let metadata = file.metadata().map_err(|e| HashitError::source_access(path, e))?;
    if metadata.is_dir() {
        return Err(HashitError::source_access(
            path,
            std::io::Error::new(std::io::ErrorKind::Other, "is a directory"),
        ));
    }
    let size = metadata.is_file().then(|| metadata.len());

    let strategy = Strategy::for_config(size, config);
    stage(&source_id, FileStage::StrategySelected(strategy));
    match size {
        Some(size) => tracing::debug!(
            "{} bytes={} ({}) using {}",
            source_id,
            size,
            humansize::format_size(size, humansize::BINARY),
            strategy
        ),
        None => tracing::debug!("{} size unknown, using {}", source_id, strategy),
    }

    stage(&source_id, FileStage::PipelineRunning);
    let output = match strategy {
        Strategy::MemoryMap => hash_mapped(path, config)?,
        Strategy::WholeRead => hash_whole(path, config)?,
        Strategy::StreamScan => hash_stream(&source_id, file, config)?,
    };
    stage(&source_id, FileStage::Joined);

    Ok(FileDigest::new(source_id, index, strategy, output.bytes, output.digests))
}

/// Hash a reader of unknown length, such as standard input
pub fn hash_reader<R: Read>(
    source_id: &str,
    index: usize,
    reader: R,
    config: &HashConfig,
) -> Result<FileDigest> {
    let strategy = Strategy::for_config(None, config);
    stage(source_id, FileStage::StrategySelected(strategy));

    stage(source_id, FileStage::PipelineRunning);
    let output = hash_stream(source_id, reader, config)?;
    stage(source_id, FileStage::Joined);

    Ok(FileDigest::new(source_id, index, strategy, output.bytes, output.digests))
}
