//! Compact variable-length integers used for list lengths
//!
//! | value              | encoding                    |
//! |--------------------|-----------------------------|
//! | 0 - 252            | 1 byte                      |
//! | 253 - 0xFFFF       | `0xFD` + u16 little-endian  |
//! | 0x10000 - 0xFFFFFFFF | `0xFE` + u32 little-endian |
//! | larger             | `0xFF` + u64 little-endian  |

use super::codec::{ByteReader, CodecError};

/// A compact-size count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VarSize(pub u64);

impl VarSize {
    /// Number of bytes the minimal encoding of `value` takes
    pub fn size_of(value: u64) -> usize {
        match value {
            0..=0xFC => 1,
            0xFD..=0xFFFF => 3,
            0x1_0000..=0xFFFF_FFFF => 5,
            _ => 9,
        }
    }

    pub fn encoded_len(&self) -> usize {
        Self::size_of(self.0)
    }

    /// Append the minimal encoding to `out`
    pub fn write_to(&self, out: &mut Vec<u8>) {
        let value = self.0;
        match value {
            0..=0xFC => out.push(value as u8),
            0xFD..=0xFFFF => {
                out.push(0xFD);
                out.extend_from_slice(&(value as u16).to_le_bytes());
            }
            0x1_0000..=0xFFFF_FFFF => {
                out.push(0xFE);
                out.extend_from_slice(&(value as u32).to_le_bytes());
            }
            _ => {
                out.push(0xFF);
                out.extend_from_slice(&value.to_le_bytes());
            }
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.encoded_len());
        self.write_to(&mut out);
        out
    }

    /// Read a count, dispatching on the marker byte.
    ///
    /// Non-minimal encodings are accepted.
    pub fn read(reader: &mut ByteReader<'_>) -> Result<Self, CodecError> {
        let marker = reader.read_u8()?;
        let value = match marker {
            0xFD => u16::from_le_bytes(reader.read_array()?) as u64,
            0xFE => u32::from_le_bytes(reader.read_array()?) as u64,
            0xFF => u64::from_le_bytes(reader.read_array()?),
            n => n as u64,
        };
        Ok(Self(value))
    }

    /// Decode from `buf` at `offset`, returning the value and bytes consumed
    pub fn decode(buf: &[u8], offset: usize) -> Result<(u64, usize), CodecError> {
        let mut reader = ByteReader::at(buf, offset)?;
        let value = Self::read(&mut reader)?;
        Ok((value.0, reader.position() - offset))
    }
}

impl From<usize> for VarSize {
    fn from(value: usize) -> Self {
        Self(value as u64)
    }
}
