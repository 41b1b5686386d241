//! Cryptographic utilities for the block format
//!
//! This module provides:
//! - SHA-256 / double SHA-256 hashing and the 32-byte hash type
//! - Merkle tree calculations
//! - ECDSA key management (secp256k1) and identity-derived keys
//! - Base58Check address encoding

pub mod address;
pub mod hash;
pub mod keys;
pub mod merkle;

pub use address::{base58check, hash160, multisig_redeem_script, p2pkh_address, p2sh_address};
pub use hash::{double_sha256, double_sha256_hex, double_sha256_pair, sha256, Sha256Hash};
pub use keys::{sign_hash, verify_signature, KeyError, KeyPair};
pub use merkle::{build_merkle_tree, calculate_merkle_root, MerkleProof};
