//! Cryptographic hashing utilities for the block format
//!
//! Provides the SHA-256 based hashing used for block identity and merkle
//! tree nodes, and the [`Sha256Hash`] value type every 32-byte field uses.

use crate::core::codec::CodecError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

/// Computes SHA-256 hash of the input data
pub fn sha256(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

/// Computes double SHA-256 hash (SHA-256 of SHA-256)
/// Used for block hashes and merkle nodes
pub fn double_sha256(data: &[u8]) -> [u8; 32] {
    sha256(&sha256(data))
}

/// Double SHA-256 over the concatenation of two byte ranges
pub fn double_sha256_pair(left: &[u8], right: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(left);
    hasher.update(right);
    let first: [u8; 32] = hasher.finalize().into();
    sha256(&first)
}

/// Computes double SHA-256 hash and returns it as a hex string
pub fn double_sha256_hex(data: &[u8]) -> String {
    hex::encode(double_sha256(data))
}

/// A 32-byte hash held in display (big-endian) order.
///
/// The wire format stores these byte-reversed; use [`Sha256Hash::wrap_reversed`]
/// when reading and [`Sha256Hash::reversed_bytes`] when writing.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Sha256Hash([u8; 32]);

impl Sha256Hash {
    pub const LENGTH: usize = 32;

    /// The all-zero hash (genesis previous block, missing anchor)
    pub const ZERO: Sha256Hash = Sha256Hash([0u8; 32]);

    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Wrap raw bytes, failing unless exactly 32 are given
    pub fn wrap(bytes: &[u8]) -> Result<Self, CodecError> {
        let arr: [u8; 32] = bytes.try_into().map_err(|_| CodecError::LengthMismatch {
            expected: Self::LENGTH,
            actual: bytes.len(),
        })?;
        Ok(Self(arr))
    }

    /// Wrap bytes given in wire order, flipping them into display order
    pub fn wrap_reversed(bytes: &[u8]) -> Result<Self, CodecError> {
        let mut hash = Self::wrap(bytes)?;
        hash.0.reverse();
        Ok(hash)
    }

    /// Parse a 64-character hex string in display order
    pub fn from_hex(hex_str: &str) -> Result<Self, CodecError> {
        Self::wrap(&hex::decode(hex_str)?)
    }

    /// Double SHA-256 of `data`, flipped into display order
    pub fn hash_twice(data: &[u8]) -> Self {
        let mut digest = double_sha256(data);
        digest.reverse();
        Self(digest)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// A reversed copy of the bytes (wire order)
    pub fn reversed_bytes(&self) -> [u8; 32] {
        let mut out = self.0;
        out.reverse();
        out
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }
}

impl fmt::Display for Sha256Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for Sha256Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Sha256Hash({})", self)
    }
}

impl FromStr for Sha256Hash {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl From<[u8; 32]> for Sha256Hash {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl Serialize for Sha256Hash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Sha256Hash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}
