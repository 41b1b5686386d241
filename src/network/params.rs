//! Static network parameters
//!
//! Magic bytes, address version bytes and size limits for the anchored
//! network. Only the main network exists.

use serde::{Deserialize, Serialize};

/// Default P2P port
pub const DEFAULT_PORT: u16 = 6969;

/// Packet magic, "bfhz"
pub const PACKET_MAGIC: u32 = 0x6266_687a;

/// Prefix of the OP_RETURN payload that anchors a block ("8hz")
pub const ANCHOR_FIX_FLAG: [u8; 3] = [b'8', b'h', b'z'];

/// Network configuration consumed by the codec and the address encoders
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkParams {
    pub id: String,
    pub packet_magic: u32,
    pub port: u16,
    /// Version byte of pay-to-pubkey-hash (withdrawal) addresses
    pub address_header: u8,
    /// Version byte of pay-to-script-hash (deposit) addresses
    pub p2sh_header: u8,
    /// Version byte of WIF private keys
    pub dumped_private_key_header: u8,
    pub bip32_header_pub: u32,
    pub bip32_header_priv: u32,
    pub uri_scheme: String,
    pub anchor_prefix: Vec<u8>,
    pub max_block_size: usize,
}

impl NetworkParams {
    pub fn mainnet() -> Self {
        Self {
            id: "org.anchor.production".to_string(),
            packet_magic: PACKET_MAGIC,
            port: DEFAULT_PORT,
            address_header: 40,
            p2sh_header: 80,
            dumped_private_key_header: 128,
            // serialize in base58 to "xpub" / "xprv"
            bip32_header_pub: 0x0488_B21E,
            bip32_header_priv: 0x0488_ADE4,
            uri_scheme: "bafanghuzhu".to_string(),
            anchor_prefix: ANCHOR_FIX_FLAG.to_vec(),
            max_block_size: crate::core::MAX_BLOCK_SIZE,
        }
    }

    /// Magic bytes as they appear on the wire
    pub fn magic_bytes(&self) -> [u8; 4] {
        self.packet_magic.to_be_bytes()
    }

    /// Whether `version` is one of the accepted address version bytes
    pub fn accepts_address_header(&self, version: u8) -> bool {
        version == self.address_header || version == self.p2sh_header
    }
}

impl Default for NetworkParams {
    fn default() -> Self {
        Self::mainnet()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mainnet_values() {
        let params = NetworkParams::default();
        assert_eq!(params.port, 6969);
        assert_eq!(&params.magic_bytes(), b"bfhz");
        assert_eq!(params.anchor_prefix, b"8hz".to_vec());
        assert!(params.accepts_address_header(40));
        assert!(params.accepts_address_header(80));
        assert!(!params.accepts_address_header(0));
    }
}
