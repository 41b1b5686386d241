//! Block verification
//!
//! Checks what can be checked without the chain: the header timestamp and
//! that the transaction hashes produce the header's merkle root. Proof of
//! work is not part of this block format.

use super::block::{Block, ALLOWED_TIME_DRIFT};
use crate::crypto::Sha256Hash;
use bitflags::bitflags;
use chrono::Utc;
use thiserror::Error;

/// Block verification failures. The block stays valid and usable.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerifyError {
    #[error("Block too far in future: {time} vs {limit}")]
    TimestampTooFarInFuture { time: i64, limit: i64 },
    #[error("Merkle hashes do not match: {calculated} vs {header}")]
    MerkleRootMismatch {
        calculated: Sha256Hash,
        header: Sha256Hash,
    },
}

bitflags! {
    /// Which parts of transaction verification to apply
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct VerifyFlags: u32 {
        /// Check that block height is in the coinbase transaction (BIP 34)
        const HEIGHT_IN_COINBASE = 0b0001;
    }
}

/// Source of the current time in seconds
pub trait Clock: Send + Sync {
    fn now_seconds(&self) -> i64;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_seconds(&self) -> i64 {
        Utc::now().timestamp()
    }
}

/// A clock stuck at one instant, for tests and replays
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub i64);

impl Clock for FixedClock {
    fn now_seconds(&self) -> i64 {
        self.0
    }
}

/// Stateless block checks; every method can run any number of times
pub struct BlockVerifier {
    allowed_time_drift: i64,
    clock: Box<dyn Clock>,
}

impl Default for BlockVerifier {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for BlockVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockVerifier")
            .field("allowed_time_drift", &self.allowed_time_drift)
            .finish_non_exhaustive()
    }
}

impl BlockVerifier {
    pub fn new() -> Self {
        Self {
            allowed_time_drift: ALLOWED_TIME_DRIFT,
            clock: Box::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Seconds a block time may run ahead of the clock
    pub fn with_time_drift(mut self, seconds: i64) -> Self {
        self.allowed_time_drift = seconds;
        self
    }

    /// Header-level checks
    pub fn verify_header(&self, block: &Block) -> Result<(), VerifyError> {
        self.check_timestamp(block)
    }

    fn check_timestamp(&self, block: &Block) -> Result<(), VerifyError> {
        let limit = self.clock.now_seconds() + self.allowed_time_drift;
        let time = i64::from(block.time());
        if time > limit {
            return Err(VerifyError::TimestampTooFarInFuture { time, limit });
        }
        Ok(())
    }

    /// Recompute the merkle root and compare it with the header.
    /// A header-only block has nothing to check.
    pub fn verify_merkle_root(&self, block: &Block) -> Result<(), VerifyError> {
        if block.transactions().is_none() {
            return Ok(());
        }

        let calculated = block.calculate_merkle_root();
        let header = block.merkle_root();
        if calculated != header {
            log::error!("Merkle tree did not verify");
            return Err(VerifyError::MerkleRootMismatch { calculated, header });
        }
        Ok(())
    }

    /// Transaction contents. No rules are defined for this block format yet.
    pub fn verify_transactions(
        &self,
        block: &Block,
        height: Option<u64>,
        flags: VerifyFlags,
    ) -> Result<(), VerifyError> {
        log::trace!(
            "Transaction checks for block {} at height {:?} with {:?}",
            block.hash(),
            height,
            flags
        );
        self.check_sig_ops(block)
    }

    /// Signature operation limit; always passes.
    fn check_sig_ops(&self, _block: &Block) -> Result<(), VerifyError> {
        Ok(())
    }

    /// Header, merkle root, then transactions; stops at the first failure
    pub fn verify(
        &self,
        block: &Block,
        height: Option<u64>,
        flags: VerifyFlags,
    ) -> Result<(), VerifyError> {
        self.verify_header(block)?;
        self.verify_merkle_root(block)?;
        self.verify_transactions(block, height, flags)
    }
}
