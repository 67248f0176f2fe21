//! Result sink
//!
//! Receiving end of the dispatcher. Results arrive in completion order; the
//! sink ends once every worker has finished and the dispatcher has returned.

use crate::hash::{sort_by_submission, FileDigest};
use crossbeam::channel::Receiver;

/// Stream of finished results
pub struct ResultSink {
    receiver: Receiver<FileDigest>,
}

impl ResultSink {
    /// Wrap the receiving end of a result channel
    pub fn new(receiver: Receiver<FileDigest>) -> Self {
        Self { receiver }
    }

    /// Wait for the next result; `None` once the sink is closed and drained
    pub fn recv(&self) -> Option<FileDigest> {
        self.receiver.recv().ok()
    }

    /// Number of results waiting to be drained
    pub fn pending(&self) -> usize {
        self.receiver.len()
    }

    /// Drain every result and return them in submission order
    pub fn collect_sorted(self) -> Vec<FileDigest> {
        let mut results: Vec<FileDigest> = self.collect();
        sort_by_submission(&mut results);
        results
    }
}

impl Iterator for ResultSink {
    type Item = FileDigest;

    fn next(&mut self) -> Option<Self::Item> {
        self.recv()
    }
}
