//! Compressed public key carried in the block header
//!
//! The plan key is the co-signing key for the 1-of-2 multisig redemption path.
//! It is always 33 bytes; the all-zero value stands for "no key".

use super::codec::CodecError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A fixed 33-byte compressed public key
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct CompactKey([u8; CompactKey::LENGTH]);

impl CompactKey {
    pub const LENGTH: usize = 33;

    /// Sentinel for an absent key
    pub const ZERO: CompactKey = CompactKey([0u8; CompactKey::LENGTH]);

    /// Wrap exactly 33 raw bytes
    pub fn wrap(bytes: &[u8]) -> Result<Self, CodecError> {
        let arr: [u8; Self::LENGTH] = bytes.try_into().map_err(|_| CodecError::LengthMismatch {
            expected: Self::LENGTH,
            actual: bytes.len(),
        })?;
        Ok(Self(arr))
    }

    /// Wrap bytes stored in wire order
    pub fn wrap_reversed(bytes: &[u8]) -> Result<Self, CodecError> {
        let mut key = Self::wrap(bytes)?;
        key.0.reverse();
        Ok(key)
    }

    pub fn from_hex(hex_str: &str) -> Result<Self, CodecError> {
        Self::wrap(&hex::decode(hex_str)?)
    }

    pub fn as_bytes(&self) -> &[u8; Self::LENGTH] {
        &self.0
    }

    /// Returns a reversed copy of the key bytes.
    pub fn reversed_bytes(&self) -> [u8; Self::LENGTH] {
        let mut out = self.0;
        out.reverse();
        out
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }
}

impl Default for CompactKey {
    fn default() -> Self {
        Self::ZERO
    }
}

impl fmt::Display for CompactKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for CompactKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CompactKey({})", self)
    }
}

impl FromStr for CompactKey {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Serialize for CompactKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CompactKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}
