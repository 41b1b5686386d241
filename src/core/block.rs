//! Block implementation for the anchored chain
//!
//! A block is a fixed 137-byte header followed by the list of transaction
//! hashes it commits to and an optional signature blob. Its identity is the
//! double SHA-256 of the header alone.

use super::codec::{BlockCodec, ByteReader, CodecError};
use super::key::CompactKey;
use super::transaction::AnchorTransaction;
use super::varint::VarSize;
use crate::crypto::{calculate_merkle_root, verify_signature, KeyError, KeyPair, Sha256Hash};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::OnceLock;

// =============================================================================
// Block Constants
// =============================================================================

/// Block header size in bytes
pub const HEADER_SIZE: usize = 137;

/// Maximum block size in bytes (1024M)
pub const MAX_BLOCK_SIZE: usize = 1024 * 1000 * 1000;

/// Maximum distance a block time may sit in the future (48 hours in seconds)
pub const ALLOWED_TIME_DRIFT: i64 = 48 * 60 * 60;

pub const BLOCK_VERSION_GENESIS: u32 = 1;
/// Height in coinbase
pub const BLOCK_VERSION_BIP34: u32 = 1;
/// Strict DER signatures
pub const BLOCK_VERSION_BIP66: u32 = 1;
/// OP_CHECKLOCKTIMEVERIFY
pub const BLOCK_VERSION_BIP65: u32 = 1;

// =============================================================================
// Block Header
// =============================================================================

/// The fixed-size part of a block; everything that goes into its identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    pub version: u32,
    /// Co-signing key of the multisig redemption path
    pub plan_key: CompactKey,
    pub prev_block_hash: Sha256Hash,
    pub merkle_root: Sha256Hash,
    /// Anchoring transaction referenced by the previous block
    pub prev_anchor_hash: Sha256Hash,
    pub time: u32,
}

impl BlockHeader {
    pub fn read(reader: &mut ByteReader<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            version: reader.read_u32_le()?,
            plan_key: reader.read_compact_key()?,
            prev_block_hash: reader.read_hash()?,
            merkle_root: reader.read_hash()?,
            prev_anchor_hash: reader.read_hash()?,
            time: reader.read_u32_le()?,
        })
    }

    pub fn write_to(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.version.to_le_bytes());
        out.extend_from_slice(&self.plan_key.reversed_bytes());
        out.extend_from_slice(&self.prev_block_hash.reversed_bytes());
        out.extend_from_slice(&self.merkle_root.reversed_bytes());
        out.extend_from_slice(&self.prev_anchor_hash.reversed_bytes());
        out.extend_from_slice(&self.time.to_le_bytes());
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_SIZE);
        self.write_to(&mut out);
        out
    }

    /// Block identity in display order
    pub fn hash(&self) -> Sha256Hash {
        Sha256Hash::hash_twice(&self.to_bytes())
    }
}

// =============================================================================
// Wire Cache
// =============================================================================

/// Byte range a block was parsed from, and which parts of it still match the
/// block's fields. `raw` is dropped as soon as neither part is valid.
#[derive(Debug, Clone, Default)]
struct WireCache {
    raw: Option<Bytes>,
    header_valid: bool,
    body_valid: bool,
}

impl WireCache {
    fn retained(raw: Bytes) -> Self {
        Self {
            raw: Some(raw),
            header_valid: true,
            body_valid: true,
        }
    }

    fn full(&self) -> Option<&Bytes> {
        if self.header_valid && self.body_valid {
            self.raw.as_ref()
        } else {
            None
        }
    }

    fn header(&self) -> Option<&[u8]> {
        match &self.raw {
            Some(raw) if self.header_valid => raw.get(..HEADER_SIZE),
            _ => None,
        }
    }

    fn body(&self) -> Option<&[u8]> {
        match &self.raw {
            Some(raw) if self.body_valid => raw.get(HEADER_SIZE..),
            _ => None,
        }
    }

    fn invalidate_header(&mut self) {
        self.header_valid = false;
        if !self.body_valid {
            self.raw = None;
        }
    }

    fn invalidate_body(&mut self) {
        self.body_valid = false;
        if !self.header_valid {
            self.raw = None;
        }
    }
}

// =============================================================================
// Block
// =============================================================================

/// A block: header fields, transaction hashes, signature blob and local
/// anchor metadata.
///
/// Identity and merkle root are computed lazily and dropped by the setters
/// that affect them. Getters take `&self`, so a block nobody mutates can be
/// shared across threads.
#[derive(Debug, Clone)]
pub struct Block {
    version: u32,
    plan_key: CompactKey,
    prev_block_hash: Sha256Hash,
    merkle_root: OnceLock<Sha256Hash>,
    prev_anchor_hash: Sha256Hash,
    time: u32,

    /// `None` when this block holds only a header
    transactions: Option<Vec<Sha256Hash>>,
    signatures: Option<Vec<u8>>,
    /// Anchor of this block; never serialized, never hashed
    anchor_hash: Option<Sha256Hash>,

    hash: OnceLock<Sha256Hash>,
    cache: WireCache,
}

impl Block {
    /// Create a block from its fields. A `None` merkle root is computed from
    /// `tx_hashes` when first needed.
    pub fn new(
        version: u32,
        plan_key: CompactKey,
        prev_block_hash: Sha256Hash,
        merkle_root: Option<Sha256Hash>,
        prev_anchor_hash: Sha256Hash,
        time: u32,
        tx_hashes: Vec<Sha256Hash>,
    ) -> Self {
        Self {
            version,
            plan_key,
            prev_block_hash,
            merkle_root: merkle_root.map(OnceLock::from).unwrap_or_default(),
            prev_anchor_hash,
            time,
            transactions: Some(tx_hashes),
            signatures: None,
            anchor_hash: None,
            hash: OnceLock::new(),
            cache: WireCache::default(),
        }
    }

    /// A header-only block stamped with the current time and a zero previous
    /// block hash
    pub fn with_version(version: u32) -> Self {
        Self {
            version,
            plan_key: CompactKey::ZERO,
            prev_block_hash: Sha256Hash::ZERO,
            merkle_root: OnceLock::new(),
            prev_anchor_hash: Sha256Hash::ZERO,
            time: now_seconds(),
            transactions: None,
            signatures: None,
            anchor_hash: None,
            hash: OnceLock::new(),
            cache: WireCache::default(),
        }
    }

    pub fn builder() -> BlockBuilder {
        BlockBuilder::new()
    }

    pub(crate) fn from_wire(
        header: BlockHeader,
        hash: Sha256Hash,
        transactions: Option<Vec<Sha256Hash>>,
        signatures: Option<Vec<u8>>,
        raw: Option<Bytes>,
    ) -> Self {
        Self {
            version: header.version,
            plan_key: header.plan_key,
            prev_block_hash: header.prev_block_hash,
            merkle_root: OnceLock::from(header.merkle_root),
            prev_anchor_hash: header.prev_anchor_hash,
            time: header.time,
            transactions,
            signatures,
            anchor_hash: None,
            hash: OnceLock::from(hash),
            cache: raw.map(WireCache::retained).unwrap_or_default(),
        }
    }

    /// Parse a block from the start of `bytes` with default parameters
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CodecError> {
        BlockCodec::default().parse(bytes, 0)
    }

    /// Parse a block from a hex string
    pub fn from_hex(hex_str: &str) -> Result<Self, CodecError> {
        Self::from_bytes(&hex::decode(hex_str.trim())?)
    }

    // =========================================================================
    // Cache invalidation
    // =========================================================================

    fn uncache_header(&mut self) {
        self.cache.invalidate_header();
        self.hash.take();
    }

    /// The merkle root lives in the header, so this drops the header too
    fn uncache_transactions(&mut self) {
        self.cache.invalidate_body();
        self.uncache_header();
        self.merkle_root.take();
    }

    // =========================================================================
    // Identity
    // =========================================================================

    /// Block identity, big endian
    pub fn hash(&self) -> Sha256Hash {
        *self
            .hash
            .get_or_init(|| Sha256Hash::hash_twice(&self.header_bytes()))
    }

    pub fn hash_as_string(&self) -> String {
        self.hash().to_string()
    }

    /// Header fields with the merkle root resolved
    pub fn header(&self) -> BlockHeader {
        BlockHeader {
            version: self.version,
            plan_key: self.plan_key,
            prev_block_hash: self.prev_block_hash,
            merkle_root: self.merkle_root(),
            prev_anchor_hash: self.prev_anchor_hash,
            time: self.time,
        }
    }

    /// The 137 header bytes, from the parsed range when still valid
    pub fn header_bytes(&self) -> Vec<u8> {
        match self.cache.header() {
            Some(cached) => cached.to_vec(),
            None => self.header().to_bytes(),
        }
    }

    // =========================================================================
    // Serialization
    // =========================================================================

    /// Wire bytes of this block.
    ///
    /// A block that still matches its parsed byte range returns that range.
    /// When signatures are present on a header-only block an empty transaction
    /// section is written so the signature section stays parseable.
    pub fn to_bytes(&self) -> Bytes {
        if let Some(raw) = self.cache.full() {
            log::trace!("Serializing block {} from cached bytes", self.hash());
            return raw.clone();
        }

        let mut out = Vec::with_capacity(self.message_size());
        match self.cache.header() {
            Some(cached) => out.extend_from_slice(cached),
            None => self.header().write_to(&mut out),
        }
        match self.cache.body() {
            Some(cached) => out.extend_from_slice(cached),
            None => self.write_body(&mut out),
        }
        Bytes::from(out)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    fn write_body(&self, out: &mut Vec<u8>) {
        match (&self.transactions, &self.signatures) {
            (Some(txs), _) => {
                VarSize::from(txs.len()).write_to(out);
                for tx in txs {
                    out.extend_from_slice(&tx.reversed_bytes());
                }
            }
            (None, Some(_)) => VarSize(0).write_to(out),
            (None, None) => return,
        }

        if let Some(sig) = &self.signatures {
            VarSize::from(sig.len()).write_to(out);
            out.extend(sig.iter().rev());
        }
    }

    /// Length of what `to_bytes` returns. A still-valid parsed body keeps its
    /// original compact-size encodings.
    pub fn message_size(&self) -> usize {
        if let Some(raw) = self.cache.full() {
            return raw.len();
        }
        match self.cache.body() {
            Some(body) => HEADER_SIZE + body.len(),
            None => self.optimal_encoding_size(),
        }
    }

    /// Size with every compact-size field minimally encoded
    pub fn optimal_encoding_size(&self) -> usize {
        let mut size = HEADER_SIZE;
        match &self.transactions {
            Some(txs) => size += VarSize::size_of(txs.len() as u64) + txs.len() * Sha256Hash::LENGTH,
            None if self.signatures.is_some() => size += 1,
            None => {}
        }
        if let Some(sig) = &self.signatures {
            size += VarSize::size_of(sig.len() as u64) + sig.len();
        }
        size
    }

    // =========================================================================
    // Merkle root
    // =========================================================================

    /// Merkle root, computed from the transaction hashes if not supplied.
    /// An absent or empty transaction list gives the zero hash.
    pub fn merkle_root(&self) -> Sha256Hash {
        *self.merkle_root.get_or_init(|| self.calculate_merkle_root())
    }

    /// Merkle root recomputed from the current transaction hashes
    pub fn calculate_merkle_root(&self) -> Sha256Hash {
        self.transactions
            .as_deref()
            .and_then(calculate_merkle_root)
            .unwrap_or(Sha256Hash::ZERO)
    }

    pub fn set_merkle_root(&mut self, value: Sha256Hash) {
        self.uncache_header();
        self.merkle_root = OnceLock::from(value);
    }

    // =========================================================================
    // Transactions
    // =========================================================================

    /// Transaction hashes, or `None` for a header-only block
    pub fn transactions(&self) -> Option<&[Sha256Hash]> {
        self.transactions.as_deref()
    }

    pub fn has_transactions(&self) -> bool {
        self.transactions.as_ref().is_some_and(|txs| !txs.is_empty())
    }

    pub fn tx_count(&self) -> usize {
        self.transactions.as_ref().map_or(0, Vec::len)
    }

    /// Append a transaction hash. The merkle root and hash are invalid after this.
    pub fn add_transaction_hash(&mut self, tx_hash: Sha256Hash) {
        self.uncache_transactions();
        self.transactions.get_or_insert_with(Vec::new).push(tx_hash);
    }

    /// Append a full transaction by its txid
    pub fn add_transaction(&mut self, tx: &AnchorTransaction) {
        self.add_transaction_hash(tx.txid());
    }

    /// Replace the transaction list; `None` makes this a header-only block
    pub fn set_transactions(&mut self, tx_hashes: Option<Vec<Sha256Hash>>) {
        self.uncache_transactions();
        self.transactions = tx_hashes;
    }

    // =========================================================================
    // Header fields
    // =========================================================================

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn set_version(&mut self, version: u32) {
        self.uncache_header();
        self.version = version;
    }

    pub fn plan_key(&self) -> CompactKey {
        self.plan_key
    }

    pub fn set_plan_key(&mut self, plan_key: CompactKey) {
        self.uncache_header();
        self.plan_key = plan_key;
    }

    pub fn prev_block_hash(&self) -> Sha256Hash {
        self.prev_block_hash
    }

    pub fn set_prev_block_hash(&mut self, prev_block_hash: Sha256Hash) {
        self.uncache_header();
        self.prev_block_hash = prev_block_hash;
    }

    pub fn prev_anchor_hash(&self) -> Sha256Hash {
        self.prev_anchor_hash
    }

    pub fn set_prev_anchor_hash(&mut self, prev_anchor_hash: Sha256Hash) {
        self.uncache_header();
        self.prev_anchor_hash = prev_anchor_hash;
    }

    /// Seconds since the UNIX epoch
    pub fn time(&self) -> u32 {
        self.time
    }

    pub fn time_as_datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(i64::from(self.time), 0)
    }

    pub fn set_time(&mut self, time: u32) {
        self.uncache_header();
        self.time = time;
    }

    // =========================================================================
    // Body extras
    // =========================================================================

    pub fn signatures(&self) -> Option<&[u8]> {
        self.signatures.as_deref()
    }

    /// Replace the signature blob. Identity is unaffected.
    pub fn set_signatures(&mut self, signatures: Option<Vec<u8>>) {
        self.cache.invalidate_body();
        self.signatures = signatures;
    }

    /// Anchoring transaction of this block (not part of the identity)
    pub fn anchor_hash(&self) -> Option<Sha256Hash> {
        self.anchor_hash
    }

    pub fn set_anchor_hash(&mut self, anchor_hash: Option<Sha256Hash>) {
        self.anchor_hash = anchor_hash;
    }

    /// Sign the block identity and store the DER signature as the signature blob
    pub fn sign(&mut self, key: &KeyPair) -> Result<(), KeyError> {
        let hash = Block::hash(self);
        let signature = key.sign(hash.as_bytes())?;
        self.set_signatures(Some(signature));
        Ok(())
    }

    /// Whether the signature blob is a valid signature of the identity by `public_key`
    pub fn signature_matches(&self, public_key: &[u8]) -> bool {
        self.signatures
            .as_deref()
            .is_some_and(|sig| verify_signature(self.hash().as_bytes(), sig, public_key))
    }

    // =========================================================================
    // Feature gates
    // =========================================================================

    pub fn is_bip34(&self) -> bool {
        self.version >= BLOCK_VERSION_BIP34
    }

    pub fn is_bip66(&self) -> bool {
        self.version >= BLOCK_VERSION_BIP66
    }

    pub fn is_bip65(&self) -> bool {
        self.version >= BLOCK_VERSION_BIP65
    }

    /// A copy of the block without transactions
    pub fn clone_as_header(&self) -> Self {
        Self {
            version: self.version,
            plan_key: self.plan_key,
            prev_block_hash: self.prev_block_hash,
            merkle_root: OnceLock::from(self.merkle_root()),
            prev_anchor_hash: self.prev_anchor_hash,
            time: self.time,
            transactions: None,
            signatures: None,
            anchor_hash: None,
            hash: OnceLock::from(self.hash()),
            cache: WireCache::default(),
        }
    }

    pub fn summary(&self) -> BlockSummary {
        BlockSummary {
            hash: self.hash(),
            header: self.header(),
            time_utc: self.time_as_datetime(),
            anchor_hash: self.anchor_hash,
            transactions: self.transactions.clone(),
            signatures: self.signatures.as_ref().map(hex::encode),
            size: self.message_size(),
        }
    }
}

impl PartialEq for Block {
    fn eq(&self, other: &Self) -> bool {
        self.hash() == other.hash()
    }
}

impl Eq for Block {}

impl Hash for Block {
    fn hash<H: Hasher>(&self, state: &mut H) {
        Block::hash(self).hash(state);
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, " block: ")?;
        writeln!(f, "   hash: {}", self.hash())?;
        write!(f, "   version: {}", self.version)?;
        let bips: Vec<&str> = [
            (self.is_bip34(), "BIP34"),
            (self.is_bip66(), "BIP66"),
            (self.is_bip65(), "BIP65"),
        ]
        .into_iter()
        .filter_map(|(on, name)| on.then_some(name))
        .collect();
        if !bips.is_empty() {
            write!(f, " ({})", bips.join(", "))?;
        }
        writeln!(f)?;
        writeln!(f, "   plan key: {}", self.plan_key)?;
        writeln!(f, "   previous block: {}", self.prev_block_hash)?;
        writeln!(f, "   merkle root: {}", self.merkle_root())?;
        writeln!(f, "   previous anchor: {}", self.prev_anchor_hash)?;
        match self.anchor_hash {
            Some(anchor) => writeln!(f, "   current anchor: [ {} ] (not hashed)", anchor)?,
            None => writeln!(f, "   current anchor: [ none ] (not hashed)")?,
        }
        match self.time_as_datetime() {
            Some(dt) => writeln!(f, "   time: {} ({})", self.time, dt.format("%Y-%m-%dT%H:%M:%SZ"))?,
            None => writeln!(f, "   time: {}", self.time)?,
        }
        if let Some(txs) = self.transactions.as_ref().filter(|txs| !txs.is_empty()) {
            writeln!(f, "   with {} transaction(s):", txs.len())?;
            for tx in txs {
                writeln!(f, "      {}", tx)?;
            }
        }
        Ok(())
    }
}

/// Serializable snapshot of a block for display and JSON output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockSummary {
    pub hash: Sha256Hash,
    pub header: BlockHeader,
    pub time_utc: Option<DateTime<Utc>>,
    pub anchor_hash: Option<Sha256Hash>,
    pub transactions: Option<Vec<Sha256Hash>>,
    /// Hex of the signature blob
    pub signatures: Option<String>,
    pub size: usize,
}

fn now_seconds() -> u32 {
    u32::try_from(Utc::now().timestamp()).unwrap_or(u32::MAX)
}

// =============================================================================
// Block Builder
// =============================================================================

/// Field-by-field block construction
#[derive(Debug, Clone)]
pub struct BlockBuilder {
    version: u32,
    plan_key: CompactKey,
    prev_block_hash: Sha256Hash,
    merkle_root: Option<Sha256Hash>,
    prev_anchor_hash: Sha256Hash,
    time: Option<u32>,
    transactions: Option<Vec<Sha256Hash>>,
    signatures: Option<Vec<u8>>,
    anchor_hash: Option<Sha256Hash>,
}

impl Default for BlockBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockBuilder {
    pub fn new() -> Self {
        Self {
            version: BLOCK_VERSION_GENESIS,
            plan_key: CompactKey::ZERO,
            prev_block_hash: Sha256Hash::ZERO,
            merkle_root: None,
            prev_anchor_hash: Sha256Hash::ZERO,
            time: None,
            transactions: Some(Vec::new()),
            signatures: None,
            anchor_hash: None,
        }
    }

    pub fn version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    pub fn plan_key(mut self, plan_key: CompactKey) -> Self {
        self.plan_key = plan_key;
        self
    }

    pub fn prev_block_hash(mut self, hash: Sha256Hash) -> Self {
        self.prev_block_hash = hash;
        self
    }

    /// Supply the merkle root instead of computing it
    pub fn merkle_root(mut self, root: Sha256Hash) -> Self {
        self.merkle_root = Some(root);
        self
    }

    pub fn prev_anchor_hash(mut self, hash: Sha256Hash) -> Self {
        self.prev_anchor_hash = hash;
        self
    }

    /// Block time in seconds; defaults to now
    pub fn time(mut self, time: u32) -> Self {
        self.time = Some(time);
        self
    }

    pub fn add_transaction_hash(mut self, tx_hash: Sha256Hash) -> Self {
        self.transactions.get_or_insert_with(Vec::new).push(tx_hash);
        self
    }

    pub fn transactions(mut self, tx_hashes: Vec<Sha256Hash>) -> Self {
        self.transactions = Some(tx_hashes);
        self
    }

    /// Build without a transaction section
    pub fn header_only(mut self) -> Self {
        self.transactions = None;
        self
    }

    pub fn signatures(mut self, signatures: Vec<u8>) -> Self {
        self.signatures = Some(signatures);
        self
    }

    pub fn anchor_hash(mut self, hash: Sha256Hash) -> Self {
        self.anchor_hash = Some(hash);
        self
    }

    pub fn build(self) -> Block {
        let mut block = Block::new(
            self.version,
            self.plan_key,
            self.prev_block_hash,
            self.merkle_root,
            self.prev_anchor_hash,
            self.time.unwrap_or_else(now_seconds),
            Vec::new(),
        );
        block.transactions = self.transactions;
        block.signatures = self.signatures;
        block.anchor_hash = self.anchor_hash;
        block
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fixtures::{
        BLOCK_HASH, FIXTURE_TIME, FULL_HEX, HEADER_HEX, MERKLE_ROOT, PLAN_KEY,
    };
    use crate::crypto::hash::sha256;

    fn tx(data: &[u8]) -> Sha256Hash {
        Sha256Hash::new(sha256(data))
    }

    fn fixture_block() -> Block {
        Block::builder()
            .plan_key(CompactKey::from_hex(PLAN_KEY).unwrap())
            .prev_block_hash(tx(b"prev"))
            .time(FIXTURE_TIME)
            .transactions(vec![tx(b"tx1"), tx(b"tx2"), tx(b"tx3")])
            .signatures(vec![1, 2, 3, 4, 5])
            .build()
    }

    #[test]
    fn test_built_block_matches_fixture() {
        let block = fixture_block();
        assert_eq!(block.merkle_root().to_string(), MERKLE_ROOT);
        assert_eq!(hex::encode(block.header_bytes()), HEADER_HEX);
        assert_eq!(block.hash_as_string(), BLOCK_HASH);
        assert_eq!(block.to_hex(), FULL_HEX);
        assert_eq!(block.message_size(), FULL_HEX.len() / 2);
    }

    #[test]
    fn test_header_struct_hash() {
        let block = fixture_block();
        let header = block.header();
        assert_eq!(header.to_bytes().len(), HEADER_SIZE);
        assert_eq!(header.hash(), block.hash());
    }

    #[test]
    fn test_round_trip() {
        let built = fixture_block();
        let first = built.to_bytes();
        let parsed = Block::from_bytes(&first).unwrap();
        assert_eq!(parsed.to_bytes(), first);
        assert_eq!(parsed, built);

        let header_only = Block::builder().time(FIXTURE_TIME).header_only().build();
        let bytes = header_only.to_bytes();
        assert_eq!(bytes.len(), HEADER_SIZE);
        assert_eq!(Block::from_bytes(&bytes).unwrap().to_bytes(), bytes);
    }

    #[test]
    fn test_signatures_on_header_only_block() {
        let block = Block::builder()
            .time(FIXTURE_TIME)
            .header_only()
            .signatures(vec![0xAB, 0xCD])
            .build();
        let bytes = block.to_bytes();
        assert_eq!(&bytes[HEADER_SIZE..], &[0x00, 0x02, 0xCD, 0xAB]);
        assert_eq!(block.optimal_encoding_size(), bytes.len());

        let parsed = Block::from_bytes(&bytes).unwrap();
        assert_eq!(parsed.signatures(), Some(&[0xAB, 0xCD][..]));
        assert_eq!(parsed.to_bytes(), bytes);
    }

    #[test]
    fn test_transaction_changes_keep_identity_pure() {
        let mut block = Block::from_hex(FULL_HEX).unwrap();
        let before = block.hash();

        block.set_signatures(Some(vec![9, 9]));
        assert_eq!(block.hash(), before);
        block.set_anchor_hash(Some(tx(b"anchor")));
        assert_eq!(block.hash(), before);

        // a supplied root stays put until the list changes
        let mut fixed = fixture_block();
        fixed.set_merkle_root(tx(b"root"));
        let fixed_hash = fixed.hash();
        fixed.set_signatures(None);
        assert_eq!(fixed.hash(), fixed_hash);
    }

    #[test]
    fn test_transaction_mutation_recomputes_root_and_hash() {
        let mut block = Block::from_hex(FULL_HEX).unwrap();
        let before = block.hash();

        block.add_transaction_hash(tx(b"tx4"));
        assert_ne!(block.merkle_root().to_string(), MERKLE_ROOT);
        assert_eq!(
            block.merkle_root(),
            calculate_merkle_root(block.transactions().unwrap()).unwrap()
        );
        assert_ne!(block.hash(), before);

        block.set_transactions(Some(vec![tx(b"tx1"), tx(b"tx2"), tx(b"tx3")]));
        assert_eq!(block.merkle_root().to_string(), MERKLE_ROOT);
        assert_eq!(block.hash_as_string(), BLOCK_HASH);
    }

    #[test]
    fn test_header_mutation_changes_hash() {
        let base = Block::from_hex(FULL_HEX).unwrap();

        let mut b = base.clone();
        b.set_time(FIXTURE_TIME + 1);
        assert_ne!(b.hash(), base.hash());

        let mut b = base.clone();
        b.set_version(2);
        assert_ne!(b.hash(), base.hash());

        let mut b = base.clone();
        b.set_plan_key(CompactKey::ZERO);
        assert_ne!(b.hash(), base.hash());

        let mut b = base.clone();
        b.set_prev_block_hash(Sha256Hash::ZERO);
        assert_ne!(b.hash(), base.hash());

        let mut b = base.clone();
        b.set_prev_anchor_hash(tx(b"anchor"));
        assert_ne!(b.hash(), base.hash());

        let mut b = base.clone();
        b.set_merkle_root(Sha256Hash::ZERO);
        assert_ne!(b.hash(), base.hash());

        // same value, same identity
        let mut b = base.clone();
        b.set_time(FIXTURE_TIME);
        assert_eq!(b.hash(), base.hash());
    }

    #[test]
    fn test_no_stale_bytes_after_mutation() {
        let bytes = hex::decode(FULL_HEX).unwrap();

        let mut block = Block::from_bytes(&bytes).unwrap();
        block.set_time(FIXTURE_TIME + 10);
        let out = block.to_bytes();
        assert_ne!(&out[..], &bytes[..]);
        assert_eq!(&out[HEADER_SIZE..], &bytes[HEADER_SIZE..]);
        assert_eq!(Block::from_bytes(&out).unwrap().time(), FIXTURE_TIME + 10);

        let mut block = Block::from_bytes(&bytes).unwrap();
        block.set_signatures(Some(vec![7]));
        let out = block.to_bytes();
        assert_eq!(&out[..HEADER_SIZE], &bytes[..HEADER_SIZE]);
        assert_eq!(&out[out.len() - 2..], &[0x01, 0x07]);

        // signatures keep an empty transaction section in front of them
        let mut block = Block::from_bytes(&bytes).unwrap();
        block.set_transactions(None);
        let out = block.to_bytes();
        assert_eq!(out.len(), HEADER_SIZE + 1 + 1 + 5);
        assert_eq!(out[HEADER_SIZE], 0x00);
        let reparsed = Block::from_bytes(&out).unwrap();
        assert!(reparsed.merkle_root().is_zero());
        assert_eq!(reparsed.transactions(), Some(&[][..]));
        assert_eq!(reparsed.signatures(), block.signatures());

        block.set_signatures(None);
        let out = block.to_bytes();
        assert_eq!(out.len(), HEADER_SIZE);
        assert!(Block::from_bytes(&out).unwrap().transactions().is_none());
    }

    #[test]
    fn test_add_full_transaction() {
        let mut tx = AnchorTransaction::new(1);
        tx.add_output(5000, vec![0x51]);

        let mut block = Block::from_hex(HEADER_HEX).unwrap();
        let hash = block.hash();
        block.add_transaction(&tx);

        assert_eq!(block.transactions(), Some(&[tx.txid()][..]));
        assert_eq!(block.merkle_root(), tx.txid());
        assert_ne!(block.hash(), hash);
    }

    #[test]
    fn test_message_size_follows_cached_body() {
        // transaction count written as FD 03 00 instead of 03
        let full = hex::decode(FULL_HEX).unwrap();
        let mut bytes = full[..HEADER_SIZE].to_vec();
        bytes.extend_from_slice(&[0xFD, 0x03, 0x00]);
        bytes.extend_from_slice(&full[HEADER_SIZE + 1..]);

        let mut block = Block::from_bytes(&bytes).unwrap();
        assert_eq!(block.message_size(), full.len() + 2);

        block.set_time(FIXTURE_TIME + 1);
        assert_eq!(block.message_size(), block.to_bytes().len());
        assert_eq!(block.message_size(), full.len() + 2);
        assert_eq!(block.optimal_encoding_size(), full.len());

        block.set_signatures(None);
        assert_eq!(block.message_size(), block.to_bytes().len());
        assert_eq!(block.message_size(), block.optimal_encoding_size());
    }

    #[test]
    fn test_non_minimal_encoding_preserved_while_cached() {
        let mut bytes = hex::decode(HEADER_HEX).unwrap();
        bytes.extend_from_slice(&[0xFD, 0x00, 0x00]);

        let block = Block::from_bytes(&bytes).unwrap();
        assert_eq!(block.to_bytes(), Bytes::from(bytes.clone()));
        assert_eq!(block.message_size(), HEADER_SIZE + 3);
        assert_eq!(block.optimal_encoding_size(), HEADER_SIZE + 1);

        let mut block = block;
        block.set_transactions(Some(Vec::new()));
        assert_eq!(block.to_bytes().len(), HEADER_SIZE + 1);
    }

    #[test]
    fn test_computed_root_for_new_block() {
        let block = Block::new(
            1,
            CompactKey::ZERO,
            Sha256Hash::ZERO,
            None,
            Sha256Hash::ZERO,
            FIXTURE_TIME,
            vec![tx(b"only")],
        );
        assert_eq!(block.merkle_root(), tx(b"only"));
        assert!(block.has_transactions());

        let empty = Block::builder().time(FIXTURE_TIME).build();
        assert_eq!(empty.transactions(), Some(&[][..]));
        assert!(!empty.has_transactions());
        assert!(empty.merkle_root().is_zero());
    }

    #[test]
    fn test_clone_as_header() {
        let block = Block::from_hex(FULL_HEX).unwrap();
        let header = block.clone_as_header();
        assert!(header.transactions().is_none());
        assert!(header.signatures().is_none());
        assert_eq!(header.hash(), block.hash());
        assert_eq!(header.merkle_root(), block.merkle_root());
        assert_eq!(hex::encode(header.to_bytes()), HEADER_HEX);
    }

    #[test]
    fn test_with_version_is_header_only() {
        let block = Block::with_version(BLOCK_VERSION_GENESIS);
        assert!(block.transactions().is_none());
        assert!(block.prev_block_hash().is_zero());
        assert!(block.time() > FIXTURE_TIME);
        assert!(block.is_bip34() && block.is_bip66() && block.is_bip65());
    }

    #[test]
    fn test_sign_and_check_signature() {
        let key = KeyPair::generate();
        let mut block = fixture_block();
        let hash = block.hash();

        block.sign(&key).unwrap();
        assert_eq!(block.hash(), hash);
        assert!(block.signature_matches(&key.public_key_bytes()));
        assert!(!block.signature_matches(&KeyPair::generate().public_key_bytes()));

        let parsed = Block::from_bytes(&block.to_bytes()).unwrap();
        assert!(parsed.signature_matches(&key.public_key_bytes()));
    }

    #[test]
    fn test_display_and_summary() {
        let mut block = Block::from_hex(FULL_HEX).unwrap();
        block.set_anchor_hash(Some(tx(b"anchor")));

        let text = block.to_string();
        assert!(text.contains(BLOCK_HASH));
        assert!(text.contains("BIP34, BIP66, BIP65"));
        assert!(text.contains("with 3 transaction(s)"));
        assert!(text.contains("2017-07-14T02:40:00Z"));

        let json = serde_json::to_value(block.summary()).unwrap();
        assert_eq!(json["hash"], BLOCK_HASH);
        assert_eq!(json["header"]["merkle_root"], MERKLE_ROOT);
        assert_eq!(json["signatures"], "0102030405");
        assert_eq!(json["transactions"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn test_block_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Block>();
    }
}
