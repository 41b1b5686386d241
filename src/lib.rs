//! Anchor block: the block format of an anchored chain
//!
//! This crate provides:
//! - A fixed 137-byte header (version, plan key, previous block, merkle root,
//!   previous anchor, time) with bit-exact wire encoding
//! - Blocks carrying transaction hashes and a detached signature blob, with
//!   cached wire bytes that are dropped on mutation
//! - Block identity as the double SHA-256 of the header
//! - Merkle roots over transaction hashes
//! - Header and merkle root verification
//! - secp256k1 keys, identity-derived keys and Base58Check addresses
//!
//! # Example
//!
//! ```rust
//! use anchor_block::core::{Block, BlockVerifier, VerifyFlags};
//! use anchor_block::crypto::{sha256, Sha256Hash};
//!
//! // Build a block over two transactions
//! let block = Block::builder()
//!     .add_transaction_hash(Sha256Hash::new(sha256(b"tx1")))
//!     .add_transaction_hash(Sha256Hash::new(sha256(b"tx2")))
//!     .build();
//! println!("Block hash: {}", block.hash());
//!
//! // Round-trip through the wire format
//! let bytes = block.to_bytes();
//! let parsed = Block::from_bytes(&bytes).unwrap();
//! assert_eq!(parsed.hash(), block.hash());
//!
//! // Verify timestamp and merkle root
//! BlockVerifier::new()
//!     .verify(&parsed, None, VerifyFlags::empty())
//!     .unwrap();
//! ```

pub mod cli;
pub mod core;
pub mod crypto;
pub mod network;

// Re-export commonly used types
pub use core::{
    AnchorTransaction, Block, BlockBuilder, BlockCodec, BlockHeader, BlockVerifier, CodecError,
    CompactKey, VarSize, VerifyError, VerifyFlags, HEADER_SIZE,
};
pub use crypto::{KeyPair, MerkleProof, Sha256Hash};
pub use network::NetworkParams;
