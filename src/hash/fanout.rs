//! Chunk fan-out to per-algorithm accumulators
//!
//! One producer duplicates every chunk into N bounded queues, one per enabled
//! algorithm. Each queue is drained by a scoped thread that owns the
//! algorithm's [`DigestState`]. A full queue blocks the producer, so a slow
//! algorithm bounds memory instead of letting chunks pile up.

use crate::config::HashAlgorithm;
use crate::error::{HashitError, Result};
use crate::hash::{AlgorithmDigest, DigestState};
use crossbeam::channel::{bounded, Sender};
use std::thread;

/// Producer side of the fan-out: N bounded queues fed in lockstep
pub struct Broadcast<'a, T> {
    source_id: &'a str,
    senders: Vec<Sender<T>>,
    delivered: u64,
    chunks: u64,
}

impl<'a, T> Broadcast<'a, T>
where
    T: AsRef<[u8]> + Clone,
{
    fn new(source_id: &'a str, senders: Vec<Sender<T>>) -> Self {
        Self {
            source_id,
            senders,
            delivered: 0,
            chunks: 0,
        }
    }

    /// Deliver one chunk to every queue, in queue order.
    ///
    /// Returns once the chunk sits in every queue; blocks while any queue is
    /// full.
    pub fn send(&mut self, chunk: T) -> Result<()> {
        let len = chunk.as_ref().len() as u64;

        if let Some((last, rest)) = self.senders.split_last() {
            for tx in rest {
                tx.send(chunk.clone()).map_err(|_| self.disconnected())?;
            }
            last.send(chunk).map_err(|_| self.disconnected())?;
        }

        self.delivered += len;
        self.chunks += 1;
        Ok(())
    }

    /// Bytes delivered to each queue so far
    pub fn delivered(&self) -> u64 {
        self.delivered
    }

    /// Chunks delivered to each queue so far
    pub fn chunks(&self) -> u64 {
        self.chunks
    }

    fn disconnected(&self) -> HashitError {
        HashitError::accumulator(self.source_id, "consumption task stopped before end of input")
    }
}

/// What a completed fan-out produced
#[derive(Debug, Clone)]
pub struct FanOutOutcome {
    /// One digest per enabled algorithm, in enabled-set order
    pub digests: Vec<AlgorithmDigest>,
    /// Bytes every accumulator consumed
    pub bytes: u64,
    /// Chunks delivered to every accumulator
    pub chunks: u64,
}

/// Run `produce` against one consumption thread per algorithm.
///
/// Every queue is closed when `produce` returns, successfully or not, and all
/// consumption threads are joined before this function returns. A producer
/// error wins over accumulator errors.
pub fn fan_out<T, F>(
    source_id: &str,
    algorithms: &[HashAlgorithm],
    queue_depth: usize,
    produce: F,
) -> Result<FanOutOutcome>
where
    T: AsRef<[u8]> + Clone + Send,
    F: FnOnce(&mut Broadcast<'_, T>) -> Result<()>,
{
    thread::scope(|scope| {
        let mut senders = Vec::with_capacity(algorithms.len());
        let mut handles = Vec::with_capacity(algorithms.len());

        for &algorithm in algorithms {
            let (tx, rx) = bounded::<T>(queue_depth.max(1));
            senders.push(tx);

            let handle = thread::Builder::new()
                .name(format!("digest-{}", algorithm))
                .spawn_scoped(scope, move || {
                    let mut state = DigestState::new(algorithm);
                    for chunk in rx.iter() {
                        state.consume(chunk.as_ref());
                    }
                    state.finalize()
                })
                .map_err(|e| HashitError::ThreadPoolError(e.to_string()));

            match handle {
                Ok(handle) => handles.push((algorithm, handle)),
                Err(e) => return Err(e),
            }
        }

        let mut broadcast = Broadcast::new(source_id, senders);
        let produced = produce(&mut broadcast);
        let delivered = broadcast.delivered();
        let chunks = broadcast.chunks();

        // Closing the queues lets every consumer drain and finalize.
        drop(broadcast);

        let mut digests = Vec::with_capacity(handles.len());
        let mut failure = None;

        for (algorithm, handle) in handles {
            match handle.join() {
                Ok(digest) => digests.push(digest),
                Err(_) => {
                    tracing::error!("{} accumulator for {} panicked", algorithm, source_id);
                    failure.get_or_insert_with(|| {
                        HashitError::accumulator(source_id, format!("{} task panicked", algorithm))
                    });
                }
            }
        }

        produced?;
        if let Some(err) = failure {
            return Err(err);
        }

        check_consumed(source_id, &digests, delivered)?;

        tracing::trace!(
            "fan-out for {} done: {} chunks, {} bytes, {} accumulators",
            source_id,
            chunks,
            delivered,
            digests.len()
        );

        Ok(FanOutOutcome {
            digests,
            bytes: delivered,
            chunks,
        })
    })
}

/// Every accumulator must have consumed exactly what was delivered
fn check_consumed(source_id: &str, digests: &[AlgorithmDigest], delivered: u64) -> Result<()> {
    match digests.iter().find(|d| d.bytes != delivered) {
        Some(short) => Err(HashitError::accumulator(
            source_id,
            format!(
                "{} consumed {} bytes, {} were delivered",
                short.algorithm, short.bytes, delivered
            ),
        )),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::hash_bytes;
    use std::sync::Arc;

    const ALGOS: [HashAlgorithm; 3] = [HashAlgorithm::Md5, HashAlgorithm::Sha256, HashAlgorithm::Sha3512];

    #[test]
    fn test_every_algorithm_sees_full_stream() {
        let data: Vec<u8> = (0..10_000u32).map(|i| (i % 251) as u8).collect();

        let outcome = fan_out("mem", &ALGOS, 2, |tx| {
            for chunk in data.chunks(333) {
                tx.send(chunk)?;
            }
            Ok(())
        })
        .unwrap();

        assert_eq!(outcome.bytes, data.len() as u64);
        assert_eq!(outcome.chunks, data.chunks(333).count() as u64);
        assert_eq!(outcome.digests.len(), ALGOS.len());

        for (digest, algorithm) in outcome.digests.iter().zip(ALGOS) {
            assert_eq!(digest.algorithm, algorithm);
            assert_eq!(digest.hex, hash_bytes(&data, algorithm).hex);
        }
    }

    #[test]
    fn test_owned_chunks() {
        let outcome = fan_out("owned", &ALGOS, 1, |tx| {
            tx.send(Arc::<[u8]>::from(&b"ab"[..]))?;
            tx.send(Arc::<[u8]>::from(&b"c"[..]))
        })
        .unwrap();

        assert_eq!(outcome.bytes, 3);
        assert_eq!(outcome.digests[0].hex, "900150983cd24fb0d6963f7d28e17f72");
    }

    #[test]
    fn test_out_of_order_delivery_changes_digest() {
        let data = b"0123456789abcdefghijklmnopqrstuvwxyz";
        let chunks: Vec<&[u8]> = data.chunks(8).collect();

        let in_order = fan_out("ordered", &ALGOS, 10, |tx| {
            for c in &chunks {
                tx.send(*c)?;
            }
            Ok(())
        })
        .unwrap();

        let swapped = fan_out("swapped", &ALGOS, 10, |tx| {
            tx.send(chunks[1])?;
            tx.send(chunks[0])?;
            for c in &chunks[2..] {
                tx.send(*c)?;
            }
            Ok(())
        })
        .unwrap();

        assert_eq!(in_order.bytes, swapped.bytes);
        for (a, b) in in_order.digests.iter().zip(&swapped.digests) {
            assert_ne!(a.hex, b.hex);
        }
    }

    #[test]
    fn test_producer_error_still_joins() {
        let result = fan_out::<&[u8], _>("broken", &ALGOS, 1, |tx| {
            tx.send(&b"partial"[..])?;
            Err(HashitError::stream_read(
                "broken",
                std::io::Error::new(std::io::ErrorKind::Other, "disk on fire"),
            ))
        });

        let err = result.unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_empty_stream() {
        let outcome = fan_out::<&[u8], _>("empty", &[HashAlgorithm::Md5], 10, |_| Ok(())).unwrap();
        assert_eq!(outcome.bytes, 0);
        assert_eq!(outcome.chunks, 0);
        assert_eq!(outcome.digests[0].hex, "d41d8cd98f00b204e9800998ecf8427e");
    }

    #[test]
    fn test_send_to_stopped_consumer_is_accumulator_error() {
        let (tx, rx) = bounded::<&[u8]>(1);
        drop(rx);

        let mut broadcast = Broadcast::new("gone", vec![tx]);
        let err = broadcast.send(b"abc".as_slice()).unwrap_err();

        assert_eq!(err.kind(), crate::error::ErrorKind::Accumulator);
        assert!(!err.is_fatal());
        assert_eq!(broadcast.delivered(), 0);
    }

    #[test]
    fn test_byte_count_mismatch_is_accumulator_error() {
        let digests = vec![
            hash_bytes(b"abc", HashAlgorithm::Md5),
            hash_bytes(b"ab", HashAlgorithm::Sha256),
        ];

        let err = check_consumed("short", &digests, 3).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Accumulator);
        assert!(err.to_string().contains("sha256 consumed 2 bytes, 3 were delivered"));

        assert!(check_consumed("ok", &digests[..1], 3).is_ok());
    }
}
