//! Base58Check address encoding
//!
//! Withdrawal addresses are pay-to-pubkey-hash; deposit addresses are
//! pay-to-script-hash over a 1-of-2 multisig with the plan key.

use super::hash::{double_sha256, sha256};
use crate::network::NetworkParams;
use ripemd::{Digest, Ripemd160};

const OP_CHECKMULTISIG: u8 = 0xae;

/// RIPEMD160(SHA256(data))
pub fn hash160(data: &[u8]) -> [u8; 20] {
    Ripemd160::digest(sha256(data)).into()
}

/// Version byte, payload and the first 4 bytes of its double SHA-256, in base58
pub fn base58check(version: u8, payload: &[u8]) -> String {
    let mut bytes = Vec::with_capacity(payload.len() + 5);
    bytes.push(version);
    bytes.extend_from_slice(payload);
    let checksum = double_sha256(&bytes);
    bytes.extend_from_slice(&checksum[..4]);
    bs58::encode(bytes).into_string()
}

/// Small-integer opcode for 1..=16
fn op_n(n: usize) -> u8 {
    0x50 + n as u8
}

/// `OP_m <pubkey>... OP_n OP_CHECKMULTISIG` with the keys sorted bytewise
pub fn multisig_redeem_script(threshold: usize, pubkeys: &[&[u8]]) -> Vec<u8> {
    let mut sorted = pubkeys.to_vec();
    sorted.sort();

    let mut script = vec![op_n(threshold)];
    for key in sorted {
        script.push(key.len() as u8);
        script.extend_from_slice(key);
    }
    script.push(op_n(pubkeys.len()));
    script.push(OP_CHECKMULTISIG);
    script
}

/// Pay-to-pubkey-hash address of a serialized public key
pub fn p2pkh_address(params: &NetworkParams, pubkey: &[u8]) -> String {
    base58check(params.address_header, &hash160(pubkey))
}

/// Pay-to-script-hash address of a redeem script
pub fn p2sh_address(params: &NetworkParams, redeem_script: &[u8]) -> String {
    base58check(params.p2sh_header, &hash160(redeem_script))
}
