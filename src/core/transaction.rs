//! Transactions carried by anchored blocks
//!
//! The wire layout is the familiar Bitcoin one (version, inputs, outputs,
//! lock time) with three extra little-endian u32 fields appended: the
//! transaction type, its creation time and a nonce. Blocks only commit to
//! the transaction hash; see [`Block::add_transaction`](super::Block::add_transaction).

use super::codec::{ByteReader, CodecError};
use super::varint::VarSize;
use crate::crypto::Sha256Hash;
use chrono::{DateTime, Utc};
use std::fmt;

// =============================================================================
// Constants
// =============================================================================

pub const TX_VERSION: u32 = 1;

/// Sequence number that disables the lock time for an input
pub const SEQUENCE_FINAL: u32 = 0xFFFF_FFFF;

/// Lock times below this are block heights, above are timestamps
pub const LOCKTIME_THRESHOLD: u32 = 500_000_000;

/// Outpoint (36), empty script length (1), sequence (4)
const MIN_INPUT_SIZE: usize = 41;
/// Value (8), empty script length (1)
const MIN_OUTPUT_SIZE: usize = 9;

// =============================================================================
// Inputs and Outputs
// =============================================================================

/// Reference to a previous output plus the script that unlocks it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxInput {
    pub prev_tx: Sha256Hash,
    pub output_index: u32,
    pub script_sig: Vec<u8>,
    pub sequence: u32,
}

impl TxInput {
    fn read(reader: &mut ByteReader<'_>) -> Result<Self, CodecError> {
        let prev_tx = reader.read_hash()?;
        let output_index = reader.read_u32_le()?;
        let script_len = reader.read_length(1)?;
        let script_sig = reader.read_bytes(script_len)?.to_vec();
        Ok(Self {
            prev_tx,
            output_index,
            script_sig,
            sequence: reader.read_u32_le()?,
        })
    }

    fn write_to(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.prev_tx.reversed_bytes());
        out.extend_from_slice(&self.output_index.to_le_bytes());
        VarSize::from(self.script_sig.len()).write_to(out);
        out.extend_from_slice(&self.script_sig);
        out.extend_from_slice(&self.sequence.to_le_bytes());
    }

    pub fn is_final(&self) -> bool {
        self.sequence == SEQUENCE_FINAL
    }
}

/// Value locked by a script
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxOutput {
    pub value: u64,
    pub script_pubkey: Vec<u8>,
}

impl TxOutput {
    fn read(reader: &mut ByteReader<'_>) -> Result<Self, CodecError> {
        let value = reader.read_u64_le()?;
        let script_len = reader.read_length(1)?;
        Ok(Self {
            value,
            script_pubkey: reader.read_bytes(script_len)?.to_vec(),
        })
    }

    fn write_to(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.value.to_le_bytes());
        VarSize::from(self.script_pubkey.len()).write_to(out);
        out.extend_from_slice(&self.script_pubkey);
    }
}

// =============================================================================
// Transaction
// =============================================================================

/// A transaction with its type, creation time and nonce
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnchorTransaction {
    pub version: u32,
    pub inputs: Vec<TxInput>,
    pub outputs: Vec<TxOutput>,
    pub lock_time: u32,
    pub tx_type: u32,
    /// Seconds since the epoch
    pub create_time: u32,
    pub nonce: u32,
}

impl AnchorTransaction {
    /// Empty transaction of `tx_type`, stamped with the current time and a
    /// random nonce
    pub fn new(tx_type: u32) -> Self {
        Self {
            version: TX_VERSION,
            inputs: Vec::new(),
            outputs: Vec::new(),
            lock_time: 0,
            tx_type,
            create_time: u32::try_from(Utc::now().timestamp()).unwrap_or(u32::MAX),
            nonce: rand::random(),
        }
    }

    pub fn add_input(&mut self, input: TxInput) {
        self.inputs.push(input);
    }

    pub fn add_output(&mut self, value: u64, script_pubkey: Vec<u8>) {
        self.outputs.push(TxOutput {
            value,
            script_pubkey,
        });
    }

    pub fn read(reader: &mut ByteReader<'_>) -> Result<Self, CodecError> {
        let version = reader.read_u32_le()?;

        let input_count = reader.read_length(MIN_INPUT_SIZE)?;
        let mut inputs = Vec::with_capacity(input_count);
        for _ in 0..input_count {
            inputs.push(TxInput::read(reader)?);
        }

        let output_count = reader.read_length(MIN_OUTPUT_SIZE)?;
        let mut outputs = Vec::with_capacity(output_count);
        for _ in 0..output_count {
            outputs.push(TxOutput::read(reader)?);
        }

        Ok(Self {
            version,
            inputs,
            outputs,
            lock_time: reader.read_u32_le()?,
            tx_type: reader.read_u32_le()?,
            create_time: reader.read_u32_le()?,
            nonce: reader.read_u32_le()?,
        })
    }

    /// Parse a transaction at `offset`, returning it and the bytes consumed
    pub fn parse(buf: &[u8], offset: usize) -> Result<(Self, usize), CodecError> {
        let mut reader = ByteReader::at(buf, offset)?;
        let tx = Self::read(&mut reader)?;
        Ok((tx, reader.position() - offset))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CodecError> {
        Ok(Self::parse(bytes, 0)?.0)
    }

    pub fn write_to(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.version.to_le_bytes());
        VarSize::from(self.inputs.len()).write_to(out);
        for input in &self.inputs {
            input.write_to(out);
        }
        VarSize::from(self.outputs.len()).write_to(out);
        for output in &self.outputs {
            output.write_to(out);
        }
        for field in [self.lock_time, self.tx_type, self.create_time, self.nonce] {
            out.extend_from_slice(&field.to_le_bytes());
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.message_size());
        self.write_to(&mut out);
        out
    }

    pub fn message_size(&self) -> usize {
        let inputs: usize = self
            .inputs
            .iter()
            .map(|i| 40 + VarSize::size_of(i.script_sig.len() as u64) + i.script_sig.len())
            .sum();
        let outputs: usize = self
            .outputs
            .iter()
            .map(|o| 8 + VarSize::size_of(o.script_pubkey.len() as u64) + o.script_pubkey.len())
            .sum();
        4 + VarSize::size_of(self.inputs.len() as u64)
            + inputs
            + VarSize::size_of(self.outputs.len() as u64)
            + outputs
            + 16
    }

    /// Double SHA-256 of the wire bytes, in display order
    pub fn txid(&self) -> Sha256Hash {
        Sha256Hash::hash_twice(&self.to_bytes())
    }

    pub fn total_output(&self) -> u64 {
        self.outputs.iter().map(|o| o.value).sum()
    }

    /// Whether the lock time is in effect for at least one input
    pub fn is_time_locked(&self) -> bool {
        self.lock_time > 0 && self.inputs.iter().any(|i| !i.is_final())
    }

    pub fn create_time_as_datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(i64::from(self.create_time), 0)
    }
}

impl fmt::Display for AnchorTransaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  {}", self.txid())?;
        if self.is_time_locked() {
            if self.lock_time < LOCKTIME_THRESHOLD {
                writeln!(f, "  time locked until block {}", self.lock_time)?;
            } else {
                writeln!(f, "  time locked until {}", self.lock_time)?;
            }
        }
        if self.inputs.is_empty() {
            return writeln!(f, "  INCOMPLETE: No inputs!");
        }
        for input in &self.inputs {
            writeln!(
                f,
                "     in   {} outpoint:{}:{}",
                hex::encode(&input.script_sig),
                input.prev_tx,
                input.output_index
            )?;
        }
        for output in &self.outputs {
            writeln!(
                f,
                "     out  {} {}",
                hex::encode(&output.script_pubkey),
                output.value
            )?;
        }
        writeln!(f, "     type {}", self.tx_type)?;
        match self.create_time_as_datetime() {
            Some(dt) => writeln!(f, "     createtime {}", dt.format("%Y-%m-%dT%H:%M:%SZ"))?,
            None => writeln!(f, "     createtime {}", self.create_time)?,
        }
        writeln!(f, "     nonce {}", self.nonce)
    }
}
