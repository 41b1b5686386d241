//! Core block format components
//!
//! This module contains:
//! - The compact plan key carried in every header
//! - Compact-size integer encoding
//! - Blocks (header, transaction hashes, signatures, cached wire bytes)
//! - The wire codec
//! - Full transactions with type, creation time and nonce
//! - Header and merkle root verification

pub mod block;
pub mod codec;
pub mod key;
pub mod transaction;
pub mod varint;
pub mod verify;

#[cfg(test)]
pub(crate) mod fixtures;

pub use block::{
    Block, BlockBuilder, BlockHeader, BlockSummary, ALLOWED_TIME_DRIFT, BLOCK_VERSION_BIP34,
    BLOCK_VERSION_BIP65, BLOCK_VERSION_BIP66, BLOCK_VERSION_GENESIS, HEADER_SIZE, MAX_BLOCK_SIZE,
};
pub use codec::{BlockCodec, ByteReader, CodecError};
pub use key::CompactKey;
pub use transaction::{
    AnchorTransaction, TxInput, TxOutput, LOCKTIME_THRESHOLD, SEQUENCE_FINAL, TX_VERSION,
};
pub use varint::VarSize;
pub use verify::{BlockVerifier, Clock, FixedClock, SystemClock, VerifyError, VerifyFlags};
