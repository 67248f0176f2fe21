//! Per-algorithm digest state
//!
//! [`Hasher`] unifies the RustCrypto implementations behind one enum.
//! [`DigestState`] adds the byte accounting the pipelines rely on and makes
//! finalization a by-value, exactly-once operation.

use crate::config::HashAlgorithm;
use blake2::digest::consts::U32;
use blake2::{Blake2b, Blake2b512};
use md4::Md4;
use md5::Md5;
use sha1::Sha1;
use sha2::digest::Digest;
use sha2::{Sha256, Sha512};
use sha3::{Sha3_224, Sha3_256, Sha3_384, Sha3_512};

type Blake2b256 = Blake2b<U32>;

/// Unified hasher that supports all algorithms
#[derive(Clone)]
pub enum Hasher {
    /// MD4
    Md4(Md4),
    /// MD5
    Md5(Md5),
    /// SHA-1
    Sha1(Sha1),
    /// SHA-256
    Sha256(Sha256),
    /// SHA-512
    Sha512(Sha512),
    /// BLAKE2b-256
    Blake2b256(Blake2b256),
    /// BLAKE2b-512
    Blake2b512(Blake2b512),
    /// SHA3-224
    Sha3_224(Sha3_224),
    /// SHA3-256
    Sha3_256(Sha3_256),
    /// SHA3-384
    Sha3_384(Sha3_384),
    /// SHA3-512
    Sha3_512(Sha3_512),
}

impl Hasher {
    /// Create a new hasher for the given algorithm
    pub fn new(algorithm: HashAlgorithm) -> Self {
        match algorithm {
            HashAlgorithm::Md4 => Self::Md4(Md4::new()),
            HashAlgorithm::Md5 => Self::Md5(Md5::new()),
            HashAlgorithm::Sha1 => Self::Sha1(Sha1::new()),
            HashAlgorithm::Sha256 => Self::Sha256(Sha256::new()),
            HashAlgorithm::Sha512 => Self::Sha512(Sha512::new()),
            HashAlgorithm::Blake2b256 => Self::Blake2b256(Blake2b256::new()),
            HashAlgorithm::Blake2b512 => Self::Blake2b512(Blake2b512::new()),
            HashAlgorithm::Sha3224 => Self::Sha3_224(Sha3_224::new()),
            HashAlgorithm::Sha3256 => Self::Sha3_256(Sha3_256::new()),
            HashAlgorithm::Sha3384 => Self::Sha3_384(Sha3_384::new()),
            HashAlgorithm::Sha3512 => Self::Sha3_512(Sha3_512::new()),
        }
    }

    /// Get the algorithm this hasher uses
    pub fn algorithm(&self) -> HashAlgorithm {
        match self {
            Self::Md4(_) => HashAlgorithm::Md4,
            Self::Md5(_) => HashAlgorithm::Md5,
            Self::Sha1(_) => HashAlgorithm::Sha1,
            Self::Sha256(_) => HashAlgorithm::Sha256,
            Self::Sha512(_) => HashAlgorithm::Sha512,
            Self::Blake2b256(_) => HashAlgorithm::Blake2b256,
            Self::Blake2b512(_) => HashAlgorithm::Blake2b512,
            Self::Sha3_224(_) => HashAlgorithm::Sha3224,
            Self::Sha3_256(_) => HashAlgorithm::Sha3256,
            Self::Sha3_384(_) => HashAlgorithm::Sha3384,
            Self::Sha3_512(_) => HashAlgorithm::Sha3512,
        }
    }

    /// Update the hasher with more data
    pub fn update(&mut self, data: &[u8]) {
        match self {
            Self::Md4(h) => Digest::update(h, data),
            Self::Md5(h) => Digest::update(h, data),
            Self::Sha1(h) => Digest::update(h, data),
            Self::Sha256(h) => Digest::update(h, data),
            Self::Sha512(h) => Digest::update(h, data),
            Self::Blake2b256(h) => Digest::update(h, data),
            Self::Blake2b512(h) => Digest::update(h, data),
            Self::Sha3_224(h) => Digest::update(h, data),
            Self::Sha3_256(h) => Digest::update(h, data),
            Self::Sha3_384(h) => Digest::update(h, data),
            Self::Sha3_512(h) => Digest::update(h, data),
        }
    }

    /// Finalize and get the hash as lowercase hex string
    pub fn finalize(self) -> String {
        match self {
            Self::Md4(h) => hex::encode(h.finalize()),
            Self::Md5(h) => hex::encode(h.finalize()),
            Self::Sha1(h) => hex::encode(h.finalize()),
            Self::Sha256(h) => hex::encode(h.finalize()),
            Self::Sha512(h) => hex::encode(h.finalize()),
            Self::Blake2b256(h) => hex::encode(h.finalize()),
            Self::Blake2b512(h) => hex::encode(h.finalize()),
            Self::Sha3_224(h) => hex::encode(h.finalize()),
            Self::Sha3_256(h) => hex::encode(h.finalize()),
            Self::Sha3_384(h) => hex::encode(h.finalize()),
            Self::Sha3_512(h) => hex::encode(h.finalize()),
        }
    }
}

/// Lifecycle of a [`DigestState`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigestPhase {
    /// No chunk consumed yet
    Empty,
    /// At least one chunk consumed
    Accumulating,
}

/// Finished digest of one algorithm over one source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlgorithmDigest {
    /// Algorithm that produced the digest
    pub algorithm: HashAlgorithm,
    /// Lowercase hex digest
    pub hex: String,
    /// Bytes this accumulator consumed
    pub bytes: u64,
}

/// Incremental state of one algorithm for one source.
///
/// Owned by exactly one consumption task. `finalize` consumes the state, so
/// the Finalized phase is terminal and unreachable twice.
pub struct DigestState {
    hasher: Hasher,
    bytes: u64,
    chunks: u64,
}

impl DigestState {
    /// Create an empty state
    pub fn new(algorithm: HashAlgorithm) -> Self {
        Self {
            hasher: Hasher::new(algorithm),
            bytes: 0,
            chunks: 0,
        }
    }

    /// Algorithm of this state
    pub fn algorithm(&self) -> HashAlgorithm {
        self.hasher.algorithm()
    }

    /// Current phase
    pub fn phase(&self) -> DigestPhase {
        if self.chunks == 0 {
            DigestPhase::Empty
        } else {
            DigestPhase::Accumulating
        }
    }

    /// Consume the next chunk in source order
    pub fn consume(&mut self, chunk: &[u8]) {
        self.hasher.update(chunk);
        self.bytes += chunk.len() as u64;
        self.chunks += 1;
    }

    /// Bytes consumed so far
    pub fn bytes(&self) -> u64 {
        self.bytes
    }

    /// Finalize into a hex digest
    pub fn finalize(self) -> AlgorithmDigest {
        AlgorithmDigest {
            algorithm: self.hasher.algorithm(),
            bytes: self.bytes,
            hex: self.hasher.finalize(),
        }
    }
}

/// Compute one digest of data in memory
pub fn hash_bytes(data: &[u8], algorithm: HashAlgorithm) -> AlgorithmDigest {
    let mut state = DigestState::new(algorithm);
    state.consume(data);
    state.finalize()
}

/// Published digests of the empty message
#[cfg(test)]
pub(crate) const EMPTY_VECTORS: [(HashAlgorithm, &str); 11] = [
    (HashAlgorithm::Md4, "31d6cfe0d16ae931b73c59d7e0c089c0"),
    (HashAlgorithm::Md5, "d41d8cd98f00b204e9800998ecf8427e"),
    (HashAlgorithm::Sha1, "da39a3ee5e6b4b0d3255bfef95601890afd80709"),
    (
        HashAlgorithm::Sha256,
        "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855",
    ),
    (
        HashAlgorithm::Sha512,
        "cf83e1357eefb8bdf1542850d66d8007d620e4050b5715dc83f4a921d36ce9ce\
         47d0d13c5d85f2b0ff8318d2877eec2f63b931bd47417a81a538327af927da3e",
    ),
    (
        HashAlgorithm::Blake2b256,
        "0e5751c026e543b2e8ab2eb06099daa1d1e5df47778f7787faab45cdf12fe3a8",
    ),
    (
        HashAlgorithm::Blake2b512,
        "786a02f742015903c6c6fd852552d272912f4740e15847618a86e217f71f5419\
         d25e1031afee585313896444934eb04b903a685b1448b755d56f701afe9be2ce",
    ),
    (
        HashAlgorithm::Sha3224,
        "6b4e03423667dbb73b6e15454f0eb1abd4597f9a1b078e3f5b5a6bc7",
    ),
    (
        HashAlgorithm::Sha3256,
        "a7ffc6f8bf1ed76651c14756a061d662f580ff4de43b49fa82d80a4b80f8434a",
    ),
    (
        HashAlgorithm::Sha3384,
        "0c63a75b845e4f7d01107d852e4c2485c51a50aaaa94fc61995e71bbee983a2a\
         c3713831264adb47fb6bd1e058d5f004",
    ),
    (
        HashAlgorithm::Sha3512,
        "a69f73cca23a9ac5c8b567dc185a756e97c982164fe25859e0d1dcc1475c80a6\
         15b2123af1f5f94c11e3e9402c3ac558f500199d95b6d3e301758586281dcd26",
    ),
];
