//! CLI commands for the block tool
//!
//! Implements all command handlers for the CLI interface.

use crate::core::{Block, BlockCodec, BlockVerifier, CompactKey, FixedClock, VerifyFlags};
use crate::crypto::{calculate_merkle_root, KeyPair, Sha256Hash};
use crate::network::NetworkParams;
use std::fs;
use std::path::Path;

/// Result type for CLI operations
pub type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Fields for `build`
#[derive(Debug, Clone, Default)]
pub struct BuildArgs {
    pub version: Option<u32>,
    pub plan_key: Option<String>,
    pub prev_block: Option<String>,
    pub prev_anchor: Option<String>,
    pub merkle_root: Option<String>,
    pub time: Option<u32>,
    pub transactions: Vec<String>,
    pub header_only: bool,
    pub sign_key: Option<String>,
}

/// Load block bytes from a hex argument or a file holding hex text or raw bytes
pub fn read_block_input(hex_arg: Option<&str>, file: Option<&Path>) -> CliResult<Vec<u8>> {
    match (hex_arg, file) {
        (Some(text), _) => Ok(hex::decode(text.trim())?),
        (None, Some(path)) => {
            let contents = fs::read(path)?;
            let decoded = std::str::from_utf8(&contents)
                .ok()
                .and_then(|text| hex::decode(text.trim()).ok());
            Ok(decoded.unwrap_or(contents))
        }
        (None, None) => Err("either a hex block or --file is required".into()),
    }
}

/// Parse and print a block
pub fn cmd_inspect(bytes: &[u8], json: bool) -> CliResult<()> {
    let block = BlockCodec::default().parse(bytes, 0)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&block.summary())?);
    } else {
        print!("{}", block);
        println!("   size: {} bytes", block.message_size());
    }
    Ok(())
}

/// Run header and merkle checks, returning whether the block passed
pub fn cmd_verify(bytes: &[u8], now: Option<i64>, height: Option<u64>) -> CliResult<bool> {
    let block = BlockCodec::default().parse(bytes, 0)?;

    let verifier = match now {
        Some(seconds) => BlockVerifier::new().with_clock(FixedClock(seconds)),
        None => BlockVerifier::new(),
    };

    match verifier.verify(&block, height, VerifyFlags::empty()) {
        Ok(()) => {
            println!("✅ Block {} is valid", block.hash());
            Ok(true)
        }
        Err(e) => {
            println!("❌ Block {} failed verification: {}", block.hash(), e);
            Ok(false)
        }
    }
}

/// Print the merkle root over transaction hashes given in display order
pub fn cmd_merkle(hashes: &[String]) -> CliResult<Sha256Hash> {
    let leaves = hashes
        .iter()
        .map(|h| Sha256Hash::from_hex(h))
        .collect::<Result<Vec<_>, _>>()?;

    let root = calculate_merkle_root(&leaves).ok_or("at least one transaction hash is required")?;
    println!("{}", root);
    Ok(root)
}

/// Assemble a block and print it as hex
pub fn cmd_build(args: &BuildArgs) -> CliResult<Block> {
    let parse_hash = |value: &Option<String>| -> CliResult<Sha256Hash> {
        Ok(match value {
            Some(h) => Sha256Hash::from_hex(h)?,
            None => Sha256Hash::ZERO,
        })
    };

    let mut builder = Block::builder()
        .prev_block_hash(parse_hash(&args.prev_block)?)
        .prev_anchor_hash(parse_hash(&args.prev_anchor)?);

    if let Some(version) = args.version {
        builder = builder.version(version);
    }
    if let Some(key) = &args.plan_key {
        builder = builder.plan_key(CompactKey::from_hex(key)?);
    }
    if let Some(root) = &args.merkle_root {
        builder = builder.merkle_root(Sha256Hash::from_hex(root)?);
    }
    if let Some(time) = args.time {
        builder = builder.time(time);
    }

    builder = if args.header_only {
        builder.header_only()
    } else {
        let txs = args
            .transactions
            .iter()
            .map(|h| Sha256Hash::from_hex(h))
            .collect::<Result<Vec<_>, _>>()?;
        builder.transactions(txs)
    };

    let mut block = builder.build();
    if let Some(secret) = &args.sign_key {
        block.sign(&KeyPair::from_private_key_hex(secret)?)?;
    }

    log::info!("Built block {}", block.hash());
    println!("{}", block.to_hex());
    Ok(block)
}

/// Derive a key pair from an identity number and print its addresses
pub fn cmd_derive(id_number: &str, salt: &str, plan_key: &str) -> CliResult<KeyPair> {
    let params = NetworkParams::default();
    let key = KeyPair::from_id_number(id_number, salt, plan_key)?;

    println!("🔑 Identity key derived");
    print_key(&key, &params)?;
    Ok(key)
}

/// Generate a random key pair
pub fn cmd_keygen() -> CliResult<KeyPair> {
    let params = NetworkParams::default();
    let key = KeyPair::generate();

    println!("🔑 New key pair");
    print_key(&key, &params)?;
    Ok(key)
}

fn print_key(key: &KeyPair, params: &NetworkParams) -> CliResult<()> {
    println!("   Private key: {}", key.private_key_hex());
    println!("   WIF: {}", key.to_wif(params));
    println!("   Public key: {}", key.public_key_hex());
    println!("   Withdraw address: {}", key.common_address(params));
    if key.plan_key.is_some() {
        println!("   Charge address: {}", key.p2sh_address(params)?);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fixtures::{BLOCK_HASH, FIXTURE_TIME, FULL_HEX, MERKLE_ROOT, PLAN_KEY};
    use crate::crypto::sha256;
    use std::io::Write;

    fn tx_hex(data: &[u8]) -> String {
        hex::encode(sha256(data))
    }

    #[test]
    fn test_read_input_from_hex_and_files() {
        let expected = hex::decode(FULL_HEX).unwrap();
        assert_eq!(read_block_input(Some(FULL_HEX), None).unwrap(), expected);

        let mut hex_file = tempfile::NamedTempFile::new().unwrap();
        writeln!(hex_file, "{}", FULL_HEX).unwrap();
        assert_eq!(read_block_input(None, Some(hex_file.path())).unwrap(), expected);

        let mut raw_file = tempfile::NamedTempFile::new().unwrap();
        raw_file.write_all(&expected).unwrap();
        assert_eq!(read_block_input(None, Some(raw_file.path())).unwrap(), expected);

        assert!(read_block_input(None, None).is_err());
    }

    #[test]
    fn test_inspect_and_verify() {
        let bytes = hex::decode(FULL_HEX).unwrap();
        cmd_inspect(&bytes, false).unwrap();
        cmd_inspect(&bytes, true).unwrap();

        let now = i64::from(FIXTURE_TIME);
        assert!(cmd_verify(&bytes, Some(now), None).unwrap());
        assert!(!cmd_verify(&bytes, Some(now - 49 * 3600), None).unwrap());
        assert!(cmd_verify(&bytes[..100], Some(now), None).is_err());
    }

    #[test]
    fn test_merkle_command() {
        let root = cmd_merkle(&[tx_hex(b"tx1"), tx_hex(b"tx2"), tx_hex(b"tx3")]).unwrap();
        assert_eq!(root.to_string(), MERKLE_ROOT);
        assert!(cmd_merkle(&[]).is_err());
        assert!(cmd_merkle(&["abcd".to_string()]).is_err());
    }

    #[test]
    fn test_build_command() {
        let args = BuildArgs {
            plan_key: Some(PLAN_KEY.to_string()),
            prev_block: Some(tx_hex(b"prev")),
            time: Some(FIXTURE_TIME),
            transactions: vec![tx_hex(b"tx1"), tx_hex(b"tx2"), tx_hex(b"tx3")],
            ..Default::default()
        };
        let block = cmd_build(&args).unwrap();
        assert_eq!(block.hash_as_string(), BLOCK_HASH);

        let signer = KeyPair::generate();
        let signed = cmd_build(&BuildArgs {
            sign_key: Some(signer.private_key_hex()),
            ..args.clone()
        })
        .unwrap();
        assert_eq!(signed.hash_as_string(), BLOCK_HASH);
        assert!(signed.signature_matches(&signer.public_key_bytes()));

        let header_only = cmd_build(&BuildArgs {
            header_only: true,
            ..args
        })
        .unwrap();
        assert!(header_only.transactions().is_none());
    }

    #[test]
    fn test_derive_and_keygen() {
        let key = cmd_derive("110102119801234567890", "1aead", PLAN_KEY).unwrap();
        assert_eq!(
            key.common_address(&NetworkParams::default()),
            "HJ21wxKzAsrFzThJfowpug3pZYQxz2wRL4"
        );
        assert!(cmd_derive("", "1aead", PLAN_KEY).is_err());
        assert!(cmd_keygen().unwrap().plan_key.is_none());
    }
}
