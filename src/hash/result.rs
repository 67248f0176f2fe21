//! Per-source hashing result

use crate::config::HashAlgorithm;
use crate::hash::{AlgorithmDigest, Strategy};
use serde::Serialize;
use std::collections::BTreeMap;

/// Source identifier used for standard input
pub const STDIN_SOURCE: &str = "stdin";

/// Digests of one source. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileDigest {
    file: String,
    bytes: u64,
    #[serde(flatten)]
    digests: BTreeMap<HashAlgorithm, String>,
    #[serde(skip)]
    strategy: Strategy,
    #[serde(skip)]
    index: usize,
}

impl FileDigest {
    /// Assemble a result from finished accumulators
    pub fn new(
        file: impl Into<String>,
        index: usize,
        strategy: Strategy,
        bytes: u64,
        digests: Vec<AlgorithmDigest>,
    ) -> Self {
        Self {
            file: file.into(),
            bytes,
            digests: digests.into_iter().map(|d| (d.algorithm, d.hex)).collect(),
            strategy,
            index,
        }
    }

    /// Source path, or `stdin`
    pub fn file(&self) -> &str {
        &self.file
    }

    /// Bytes consumed by every accumulator
    pub fn bytes(&self) -> u64 {
        self.bytes
    }

    /// Hex digest of one algorithm, if it was enabled
    pub fn digest(&self, algorithm: HashAlgorithm) -> Option<&str> {
        self.digests.get(&algorithm).map(String::as_str)
    }

    /// All digests in canonical algorithm order
    pub fn digests(&self) -> impl Iterator<Item = (HashAlgorithm, &str)> {
        self.digests.iter().map(|(a, h)| (*a, h.as_str()))
    }

    /// Number of digests held
    pub fn digest_count(&self) -> usize {
        self.digests.len()
    }

    /// Strategy that produced this result
    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Position of the source in the submitted list
    pub fn index(&self) -> usize {
        self.index
    }

    /// Is this the standard input result
    pub fn is_stdin(&self) -> bool {
        self.file == STDIN_SOURCE
    }
}

/// Restore submission order for callers that need it
pub fn sort_by_submission(results: &mut [FileDigest]) {
    results.sort_by_key(|r| r.index);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::hash_bytes;

    fn digest_of(name: &str, index: usize) -> FileDigest {
        let digests = vec![
            hash_bytes(name.as_bytes(), HashAlgorithm::Sha256),
            hash_bytes(name.as_bytes(), HashAlgorithm::Md5),
        ];
        FileDigest::new(name, index, Strategy::WholeRead, name.len() as u64, digests)
    }

    #[test]
    fn test_digests_in_canonical_order() {
        let result = digest_of("abc", 0);
        let order: Vec<_> = result.digests().map(|(a, _)| a).collect();

        assert_eq!(order, vec![HashAlgorithm::Md5, HashAlgorithm::Sha256]);
        assert_eq!(result.digest(HashAlgorithm::Md5), Some("900150983cd24fb0d6963f7d28e17f72"));
        assert_eq!(result.digest(HashAlgorithm::Sha1), None);
        assert_eq!(result.digest_count(), 2);
    }

    #[test]
    fn test_json_shape() {
        let json = serde_json::to_value(digest_of("abc", 3)).unwrap();

        assert_eq!(json["file"], "abc");
        assert_eq!(json["bytes"], 3);
        assert_eq!(json["md5"], "900150983cd24fb0d6963f7d28e17f72");
        assert!(json.get("index").is_none());
        assert!(json.get("strategy").is_none());
    }

    #[test]
    fn test_sort_by_submission() {
        let mut results = vec![digest_of("c", 2), digest_of("a", 0), digest_of("b", 1)];
        sort_by_submission(&mut results);

        let names: Vec<_> = results.iter().map(|r| r.file()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }
}
