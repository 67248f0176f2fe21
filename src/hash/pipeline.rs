//! Digest pipelines
//!
//! Three ways of getting a source's bytes to the accumulators:
//!
//! - [`hash_mapped`]: map the file and fan out 1 MiB windows of the mapping
//! - [`hash_whole`]: read the file into one buffer and hash it per algorithm
//!   on the rayon pool
//! - [`hash_stream`]: read 4 KiB chunks and fan out a copy of each
//!
//! All three return the same [`PipelineOutput`] for the same bytes.

use crate::config::{HashAlgorithm, HashConfig};
use crate::error::{HashitError, Result};
use crate::hash::{fan_out, hash_bytes, AlgorithmDigest};
use memmap2::Mmap;
use rayon::prelude::*;
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

/// Window size handed to accumulators by the memory-mapped pipeline
pub const MMAP_CHUNK_SIZE: usize = 1024 * 1024;

/// Read size of the streaming pipeline
pub const STREAM_CHUNK_SIZE: usize = 4 * 1024;

/// Digests and byte count produced by a pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineOutput {
    /// One digest per enabled algorithm
    pub digests: Vec<AlgorithmDigest>,
    /// Bytes delivered to every accumulator
    pub bytes: u64,
}

/// Read-only mapping of a file, unmapped when released or dropped
struct MappedRegion<'a> {
    path: &'a Path,
    map: Option<Mmap>,
}

impl<'a> MappedRegion<'a> {
    fn map(file: &File, path: &'a Path) -> Result<Self> {
        // SAFETY: the mapping is read-only and never outlives this guard.
        // Concurrent truncation by another process is outside our control,
        // as for every mmap-based reader.
        let map = unsafe { Mmap::map(file) }.map_err(|e| HashitError::mapping(path, e))?;
        Ok(Self {
            path,
            map: Some(map),
        })
    }

    fn as_slice(&self) -> &[u8] {
        self.map.as_deref().unwrap_or(&[])
    }

    fn release(mut self) {
        self.unmap();
    }

    fn unmap(&mut self) {
        if let Some(map) = self.map.take() {
            let len = map.len();
            drop(map);
            tracing::trace!("released mapping of {} ({} bytes)", self.path.display(), len);
        }
    }
}

impl Drop for MappedRegion<'_> {
    fn drop(&mut self) {
        self.unmap();
    }
}

/// Hash a file through a read-only memory mapping
pub fn hash_mapped(path: &Path, config: &HashConfig) -> Result<PipelineOutput> {
    let start = Instant::now();
    let source_id = path.to_string_lossy();

    let file = File::open(path).map_err(|e| HashitError::source_access(path, e))?;
    let region = MappedRegion::map(&file, path)?;

    let outcome = fan_out(&source_id, &config.algorithms, config.queue_depth, |tx| {
        for window in region.as_slice().chunks(MMAP_CHUNK_SIZE) {
            tx.send(window)?;
        }
        Ok(())
    });

    // Unmapped before the outcome is inspected, on success and failure alike.
    region.release();
    let outcome = outcome?;

    tracing::trace!(
        "mmap pipeline for {}: {} windows in {:?}",
        source_id,
        outcome.chunks,
        start.elapsed()
    );

    Ok(PipelineOutput {
        digests: outcome.digests,
        bytes: outcome.bytes,
    })
}

/// Read a file into memory and hash it whole
pub fn hash_whole(path: &Path, config: &HashConfig) -> Result<PipelineOutput> {
    let start = Instant::now();
    let content = std::fs::read(path).map_err(|e| HashitError::source_access(path, e))?;
    tracing::trace!("read {} in {:?}", path.display(), start.elapsed());

    Ok(hash_buffer(&content, &config.algorithms))
}

/// Hash an in-memory buffer with every algorithm concurrently
pub fn hash_buffer(content: &[u8], algorithms: &[HashAlgorithm]) -> PipelineOutput {
    let digests: Vec<AlgorithmDigest> = algorithms
        .par_iter()
        .map(|&algorithm| hash_bytes(content, algorithm))
        .collect();

    PipelineOutput {
        digests,
        bytes: content.len() as u64,
    }
}

/// Stream a file from disk in fixed-size chunks
pub fn hash_file_stream(path: &Path, config: &HashConfig) -> Result<PipelineOutput> {
    let file = File::open(path).map_err(|e| HashitError::source_access(path, e))?;
    hash_stream(&path.to_string_lossy(), file, config)
}

/// Stream any reader in fixed-size chunks.
///
/// Each chunk is copied once into a shared buffer and that copy is handed to
/// every accumulator, so the read buffer can be refilled as soon as the copy
/// sits in all queues. Any read error other than an interruption is fatal.
pub fn hash_stream<R: Read>(source_id: &str, mut reader: R, config: &HashConfig) -> Result<PipelineOutput> {
    let start = Instant::now();
    let mut buffer = vec![0u8; STREAM_CHUNK_SIZE];

    let outcome = fan_out(source_id, &config.algorithms, config.queue_depth, |tx| {
        loop {
            let n = match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(HashitError::stream_read(source_id, e)),
            };
            tx.send(Arc::<[u8]>::from(&buffer[..n]))?;
        }
        Ok(())
    })?;

    tracing::trace!(
        "stream pipeline for {}: {} chunks, {} bytes in {:?}",
        source_id,
        outcome.chunks,
        outcome.bytes,
        start.elapsed()
    );

    Ok(PipelineOutput {
        digests: outcome.digests,
        bytes: outcome.bytes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::EMPTY_VECTORS;
    use proptest::prelude::*;
    use std::io::{Cursor, Write};
    use tempfile::TempDir;

    fn all_config() -> HashConfig {
        HashConfig::default().with_algorithms(&HashAlgorithm::ALL)
    }

    fn write_file(dir: &Path, name: &str, content: &[u8]) -> std::path::PathBuf {
        let path = dir.join(name);
        let mut file = File::create(&path).unwrap();
        file.write_all(content).unwrap();
        path
    }

    fn patterned(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i * 31 % 256) as u8).collect()
    }

    /// Reader that fails after handing out some bytes
    struct FailingReader {
        remaining: usize,
    }

    impl Read for FailingReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.remaining == 0 {
                return Err(std::io::Error::new(ErrorKind::BrokenPipe, "pipe closed"));
            }
            let n = buf.len().min(self.remaining);
            buf[..n].fill(7);
            self.remaining -= n;
            Ok(n)
        }
    }

    /// Reader that is interrupted before every successful read
    struct InterruptingReader {
        inner: Cursor<Vec<u8>>,
        interrupt: bool,
    }

    impl Read for InterruptingReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            self.interrupt = !self.interrupt;
            if self.interrupt {
                return Err(std::io::Error::new(ErrorKind::Interrupted, "signal"));
            }
            self.inner.read(buf)
        }
    }

    #[test]
    fn test_empty_input_every_pipeline() {
        let dir = TempDir::new().unwrap();
        let path = write_file(dir.path(), "empty.bin", b"");
        let config = all_config();

        let whole = hash_whole(&path, &config).unwrap();
        let stream = hash_stream("stdin", Cursor::new(Vec::new()), &config).unwrap();

        assert_eq!(whole, stream);
        assert_eq!(whole.bytes, 0);
        for (digest, (algorithm, expected)) in whole.digests.iter().zip(EMPTY_VECTORS) {
            assert_eq!(digest.algorithm, algorithm);
            assert_eq!(digest.hex, expected);
        }
    }

    #[test]
    fn test_three_pipelines_agree_across_threshold() {
        let dir = TempDir::new().unwrap();
        let config = HashConfig {
            stream_threshold: 64 * 1024,
            ..all_config()
        };

        // Same prefix, one file on each side of the threshold
        let big = patterned(3 * MMAP_CHUNK_SIZE / 2 + 17);
        let small = &big[..config.stream_threshold as usize];
        let big_path = write_file(dir.path(), "big.bin", &big);
        let small_path = write_file(dir.path(), "small.bin", small);

        for path in [&big_path, &small_path] {
            let whole = hash_whole(path, &config).unwrap();
            let mapped = hash_mapped(path, &config).unwrap();
            let streamed = hash_file_stream(path, &config).unwrap();

            assert_eq!(whole, mapped);
            assert_eq!(whole, streamed);
        }

        let big_digest = hash_whole(&big_path, &config).unwrap();
        let small_digest = hash_whole(&small_path, &config).unwrap();
        assert_eq!(big_digest.bytes, big.len() as u64);
        assert_eq!(small_digest.bytes, config.stream_threshold);
        assert_ne!(big_digest.digests, small_digest.digests);
    }

    #[test]
    fn test_mapping_missing_file_is_access_error() {
        let dir = TempDir::new().unwrap();
        let err = hash_mapped(&dir.path().join("nope"), &all_config()).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::SourceAccess);
    }

    #[cfg(unix)]
    #[test]
    fn test_mapping_directory_is_mapping_error() {
        let dir = TempDir::new().unwrap();
        let err = hash_mapped(dir.path(), &all_config()).unwrap_err();

        assert_eq!(err.kind(), crate::error::ErrorKind::Mapping);
        assert!(!err.is_fatal());
        assert_eq!(err.path().map(|p| p.as_path()), Some(dir.path()));
    }

    #[test]
    fn test_stream_read_error_is_fatal() {
        let reader = FailingReader { remaining: 10_000 };
        let err = hash_stream("stdin", reader, &all_config()).unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_stream_retries_interrupted_reads() {
        let data = patterned(10 * STREAM_CHUNK_SIZE + 5);
        let reader = InterruptingReader {
            inner: Cursor::new(data.clone()),
            interrupt: false,
        };
        let config = all_config();

        let streamed = hash_stream("stdin", reader, &config).unwrap();
        assert_eq!(streamed, hash_buffer(&data, &config.algorithms));
    }

    #[test]
    fn test_abc_scenario() {
        let config = HashConfig::default().with_algorithms(&[HashAlgorithm::Sha256, HashAlgorithm::Md5]);
        let output = hash_stream("abc", Cursor::new(b"abc".to_vec()), &config).unwrap();

        assert_eq!(output.bytes, 3);
        assert_eq!(output.digests[0].hex, "900150983cd24fb0d6963f7d28e17f72");
        assert_eq!(
            output.digests[1].hex,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn prop_stream_matches_buffer(data in proptest::collection::vec(any::<u8>(), 0..20_000)) {
            let config = HashConfig::default().with_algorithms(&[
                HashAlgorithm::Md4,
                HashAlgorithm::Blake2b256,
                HashAlgorithm::Sha3224,
            ]);
            let streamed = hash_stream("prop", Cursor::new(data.clone()), &config).unwrap();
            prop_assert_eq!(streamed, hash_buffer(&data, &config.algorithms));
        }
    }
}
