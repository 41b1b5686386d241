//! Wire codec for blocks
//!
//! Layout: the 137-byte header, then an optional transaction section
//! (compact-size count followed by that many reversed 32-byte hashes), then an
//! optional signature section (compact-size length followed by the reversed
//! signature bytes). A buffer ending right after the header or right after the
//! transaction section is valid; the missing sections are simply absent.

use super::block::{Block, BlockHeader, HEADER_SIZE};
use super::key::CompactKey;
use super::varint::VarSize;
use crate::crypto::Sha256Hash;
use crate::network::NetworkParams;
use bytes::Bytes;
use thiserror::Error;

/// Errors raised while constructing fixed-width values or parsing wire bytes
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Length mismatch: expected {expected} bytes, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },
    #[error("Truncated input: needed {needed} bytes, {remaining} remaining")]
    TruncatedInput { needed: usize, remaining: usize },
    #[error("Invalid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),
    #[error("Block too large: {size} bytes (max: {max})")]
    BlockTooLarge { size: usize, max: usize },
}

/// Cursor over a borrowed byte buffer
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    buf: &'a [u8],
    cursor: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, cursor: 0 }
    }

    /// Start reading at `offset`
    pub fn at(buf: &'a [u8], offset: usize) -> Result<Self, CodecError> {
        if offset > buf.len() {
            return Err(CodecError::TruncatedInput {
                needed: offset,
                remaining: buf.len(),
            });
        }
        Ok(Self {
            buf,
            cursor: offset,
        })
    }

    pub fn position(&self) -> usize {
        self.cursor
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.cursor
    }

    pub fn is_at_end(&self) -> bool {
        self.cursor == self.buf.len()
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], CodecError> {
        if len > self.remaining() {
            return Err(CodecError::TruncatedInput {
                needed: len,
                remaining: self.remaining(),
            });
        }
        let bytes = &self.buf[self.cursor..self.cursor + len];
        self.cursor += len;
        Ok(bytes)
    }

    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], CodecError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8, CodecError> {
        Ok(self.read_array::<1>()?[0])
    }

    pub fn read_u32_le(&mut self) -> Result<u32, CodecError> {
        Ok(u32::from_le_bytes(self.read_array()?))
    }

    pub fn read_u64_le(&mut self) -> Result<u64, CodecError> {
        Ok(u64::from_le_bytes(self.read_array()?))
    }

    /// Read a 32-byte hash stored reversed on the wire
    pub fn read_hash(&mut self) -> Result<Sha256Hash, CodecError> {
        Sha256Hash::wrap_reversed(self.read_bytes(Sha256Hash::LENGTH)?)
    }

    /// Read a 33-byte key stored reversed on the wire
    pub fn read_compact_key(&mut self) -> Result<CompactKey, CodecError> {
        CompactKey::wrap_reversed(self.read_bytes(CompactKey::LENGTH)?)
    }

    pub fn read_var_size(&mut self) -> Result<u64, CodecError> {
        Ok(VarSize::read(self)?.0)
    }

    /// Read a compact-size length and check `len * item_size` bytes follow
    pub(crate) fn read_length(&mut self, item_size: usize) -> Result<usize, CodecError> {
        let count = self.read_var_size()?;
        let needed = count.saturating_mul(item_size as u64);
        if needed > self.remaining() as u64 {
            return Err(CodecError::TruncatedInput {
                needed: usize::try_from(needed).unwrap_or(usize::MAX),
                remaining: self.remaining(),
            });
        }
        // bounded by remaining(), so it fits
        Ok(count as usize)
    }
}

/// Parses and serializes blocks under a set of network parameters
#[derive(Debug, Clone)]
pub struct BlockCodec {
    params: NetworkParams,
    /// Keep the parsed byte range so unchanged blocks serialize by copy
    retain_bytes: bool,
}

impl Default for BlockCodec {
    fn default() -> Self {
        Self::new(NetworkParams::default())
    }
}

impl BlockCodec {
    pub fn new(params: NetworkParams) -> Self {
        Self {
            params,
            retain_bytes: true,
        }
    }

    /// Toggle parse-retain mode
    pub fn retain_bytes(mut self, retain: bool) -> Self {
        self.retain_bytes = retain;
        self
    }

    pub fn params(&self) -> &NetworkParams {
        &self.params
    }

    /// Parse a block starting at `offset`.
    ///
    /// Either the whole block parses or an error is returned; bytes after the
    /// signature section are left unread.
    pub fn parse(&self, buf: &[u8], offset: usize) -> Result<Block, CodecError> {
        let mut reader = ByteReader::at(buf, offset)?;

        let header = BlockHeader::read(&mut reader)?;
        let hash = Sha256Hash::hash_twice(&buf[offset..offset + HEADER_SIZE]);

        let transactions = if reader.is_at_end() {
            None
        } else {
            let count = reader.read_length(Sha256Hash::LENGTH)?;
            let size = HEADER_SIZE + count * Sha256Hash::LENGTH;
            if size > self.params.max_block_size {
                return Err(CodecError::BlockTooLarge {
                    size,
                    max: self.params.max_block_size,
                });
            }
            let mut hashes = Vec::with_capacity(count);
            for _ in 0..count {
                hashes.push(reader.read_hash()?);
            }
            Some(hashes)
        };

        let signatures = if reader.is_at_end() {
            None
        } else {
            let len = reader.read_length(1)?;
            let mut sig = reader.read_bytes(len)?.to_vec();
            sig.reverse();
            Some(sig)
        };

        let end = reader.position();
        log::debug!(
            "Parsed block {} ({} bytes, {} transaction(s))",
            hash,
            end - offset,
            transactions.as_ref().map_or(0, Vec::len)
        );

        let raw = self
            .retain_bytes
            .then(|| Bytes::copy_from_slice(&buf[offset..end]));

        Ok(Block::from_wire(
            header,
            hash,
            transactions,
            signatures,
            raw,
        ))
    }

    pub fn serialize(&self, block: &Block) -> Bytes {
        block.to_bytes()
    }
}
