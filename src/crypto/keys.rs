//! ECDSA key management
//!
//! Provides key pair generation, identity-derived keys, signing and
//! verification using the secp256k1 elliptic curve.

use hmac::{Hmac, Mac};
use rand::rngs::OsRng;
use secp256k1::ecdsa::Signature;
use secp256k1::{Message, PublicKey, Secp256k1, SecretKey};
use sha2::Sha256;
use thiserror::Error;

use super::address::{base58check, multisig_redeem_script, p2pkh_address, p2sh_address};
use super::hash::sha256;
use crate::core::{CodecError, CompactKey};
use crate::network::NetworkParams;

type HmacSha256 = Hmac<Sha256>;

/// Errors that can occur during key operations
#[derive(Error, Debug)]
pub enum KeyError {
    #[error("Invalid private key")]
    InvalidPrivateKey,
    #[error("Invalid public key")]
    InvalidPublicKey,
    #[error("Invalid signature")]
    InvalidSignature,
    #[error("Illegal identity input: {0}")]
    InvalidIdentity(&'static str),
    #[error("Not a plan key pair (no plan key)")]
    MissingPlanKey,
    #[error("Invalid plan key: {0}")]
    InvalidPlanKey(#[from] CodecError),
    #[error("Secp256k1 error: {0}")]
    Secp256k1Error(#[from] secp256k1::Error),
}

/// A key pair, optionally bound to the plan key it co-signs with
#[derive(Clone)]
pub struct KeyPair {
    pub secret_key: SecretKey,
    pub public_key: PublicKey,
    pub plan_key: Option<CompactKey>,
}

impl KeyPair {
    /// Generate a new random key pair
    pub fn generate() -> Self {
        let secp = Secp256k1::new();
        let (secret_key, _) = secp.generate_keypair(&mut OsRng);
        Self::from_secret_key(secret_key)
    }

    /// Create a key pair from an existing secret key
    pub fn from_secret_key(secret_key: SecretKey) -> Self {
        let secp = Secp256k1::new();
        let public_key = PublicKey::from_secret_key(&secp, &secret_key);
        Self {
            secret_key,
            public_key,
            plan_key: None,
        }
    }

    /// Create a key pair from a hex-encoded private key
    pub fn from_private_key_hex(hex_key: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(hex_key).map_err(|_| KeyError::InvalidPrivateKey)?;
        let secret_key =
            SecretKey::from_slice(&bytes).map_err(|_| KeyError::InvalidPrivateKey)?;
        Ok(Self::from_secret_key(secret_key))
    }

    /// Derive a key pair from an identity number.
    ///
    /// The HMAC-SHA256 of the lowercased `id_number + privacy_salt`, keyed by
    /// the text of `hmac_key`, seeds a SHA-256 chain; the first digest that is
    /// greater than one as a signed big-endian integer is the secret. The plan
    /// key is `hmac_key` decoded from hex.
    pub fn from_id_number(
        id_number: &str,
        privacy_salt: &str,
        hmac_key: &str,
    ) -> Result<Self, KeyError> {
        if id_number.is_empty() || privacy_salt.is_empty() || hmac_key.is_empty() {
            return Err(KeyError::InvalidIdentity(
                "id number, privacy salt and plan key are required",
            ));
        }

        let id_with_salt = format!("{}{}", id_number, privacy_salt).to_lowercase();
        let seed = hmac_sha256(hmac_key.as_bytes(), id_with_salt.as_bytes())?;

        let mut candidate = sha256(&seed);
        while !is_acceptable_secret(&candidate) {
            candidate = sha256(&candidate);
        }

        let mut key = Self::from_secret_key(SecretKey::from_slice(&candidate)?);
        key.plan_key = Some(CompactKey::from_hex(hmac_key)?);
        Ok(key)
    }

    /// Get the private key as a hex string
    pub fn private_key_hex(&self) -> String {
        hex::encode(self.secret_key.secret_bytes())
    }

    /// Compressed public key bytes
    pub fn public_key_bytes(&self) -> [u8; 33] {
        self.public_key.serialize()
    }

    /// Get the public key as a hex string (compressed format)
    pub fn public_key_hex(&self) -> String {
        hex::encode(self.public_key_bytes())
    }

    /// Withdrawal address (pay-to-pubkey-hash)
    pub fn common_address(&self, params: &NetworkParams) -> String {
        p2pkh_address(params, &self.public_key_bytes())
    }

    /// Deposit address: 1-of-2 multisig over this key and the plan key
    pub fn p2sh_address(&self, params: &NetworkParams) -> Result<String, KeyError> {
        let plan_key = self.plan_key.ok_or(KeyError::MissingPlanKey)?;
        let own = self.public_key_bytes();
        let script = multisig_redeem_script(1, &[&own[..], &plan_key.as_bytes()[..]]);
        Ok(p2sh_address(params, &script))
    }

    /// Wallet import format of the private key (compressed)
    pub fn to_wif(&self, params: &NetworkParams) -> String {
        let mut payload = self.secret_key.secret_bytes().to_vec();
        payload.push(0x01);
        base58check(params.dumped_private_key_header, &payload)
    }

    /// Sign a 32-byte hash, returning a DER signature
    pub fn sign(&self, hash: &[u8]) -> Result<Vec<u8>, KeyError> {
        sign_hash(&self.secret_key, hash)
    }

    /// Verify a DER signature against this key pair's public key
    pub fn verify(&self, hash: &[u8], signature: &[u8]) -> bool {
        verify_signature(hash, signature, &self.public_key_bytes())
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("public_key", &self.public_key_hex())
            .field("plan_key", &self.plan_key)
            .finish_non_exhaustive()
    }
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Result<[u8; 32], KeyError> {
    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|_| KeyError::InvalidIdentity("unusable hmac key"))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().into())
}

/// Positive as a signed big-endian integer and greater than one
fn is_acceptable_secret(digest: &[u8; 32]) -> bool {
    if digest[0] & 0x80 != 0 {
        return false;
    }
    digest[..31].iter().any(|b| *b != 0) || digest[31] > 1
}

/// Sign a message hash with a secret key. Inputs that are not 32 bytes are
/// hashed first.
pub fn sign_hash(secret_key: &SecretKey, hash: &[u8]) -> Result<Vec<u8>, KeyError> {
    let secp = Secp256k1::new();
    let message = to_message(hash)?;
    let signature = secp.sign_ecdsa(&message, secret_key);
    Ok(signature.serialize_der().to_vec())
}

/// Verify a DER signature against a serialized public key
pub fn verify_signature(hash: &[u8], signature: &[u8], public_key: &[u8]) -> bool {
    let secp = Secp256k1::verification_only();
    let (Ok(message), Ok(mut sig), Ok(key)) = (
        to_message(hash),
        Signature::from_der(signature),
        PublicKey::from_slice(public_key),
    ) else {
        return false;
    };
    sig.normalize_s();
    secp.verify_ecdsa(&message, &sig, &key).is_ok()
}

fn to_message(hash: &[u8]) -> Result<Message, KeyError> {
    let digest = if hash.len() == 32 {
        hash.to_vec()
    } else {
        sha256(hash).to_vec()
    };
    Ok(Message::from_digest_slice(&digest)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fixtures::PLAN_KEY;

    const ID_NUMBER: &str = "110102119801234567890";
    const SALT: &str = "1aead";

    #[test]
    fn test_key_pair_generation() {
        let kp = KeyPair::generate();
        assert_eq!(kp.private_key_hex().len(), 64);
        assert_eq!(kp.public_key_bytes().len(), 33);
        assert!(kp.common_address(&NetworkParams::default()).starts_with('H'));
        assert!(matches!(
            kp.p2sh_address(&NetworkParams::default()),
            Err(KeyError::MissingPlanKey)
        ));
    }

    #[test]
    fn test_sign_and_verify() {
        let kp = KeyPair::generate();
        let hash = sha256(b"Hello, blockchain!");

        let signature = kp.sign(&hash).unwrap();
        assert!(kp.verify(&hash, &signature));
        assert!(verify_signature(&hash, &signature, &kp.public_key_bytes()));
        assert!(!kp.verify(&sha256(b"other"), &signature));
        assert!(!verify_signature(&hash, &[0x30, 0x00], &kp.public_key_bytes()));
    }

    #[test]
    fn test_key_pair_from_hex() {
        let kp1 = KeyPair::generate();
        let kp2 = KeyPair::from_private_key_hex(&kp1.private_key_hex()).unwrap();
        assert_eq!(kp1.public_key_hex(), kp2.public_key_hex());
        assert!(KeyPair::from_private_key_hex("not hex").is_err());
    }

    #[test]
    fn test_from_id_number() {
        let params = NetworkParams::default();
        let kp = KeyPair::from_id_number(ID_NUMBER, SALT, PLAN_KEY).unwrap();

        assert_eq!(
            kp.private_key_hex(),
            "5d62842dc3e7bf32a1ae341825b58c115ce05c4bd36505dd3eef1968d9682c8a"
        );
        assert_eq!(
            kp.public_key_hex(),
            "0317fb4fdff603137161fa056f7e889b15001e89388a115812bc0784c382df9152"
        );
        assert_eq!(kp.common_address(&params), "HJ21wxKzAsrFzThJfowpug3pZYQxz2wRL4");
        assert_eq!(
            kp.p2sh_address(&params).unwrap(),
            "ZVjzHdbP1rHNB3mBeCkeWSE5DwPJmY73T1"
        );
        assert_eq!(
            kp.to_wif(&params),
            "KzMEoXnjhszpGgudSNGxMxCeANBhWrRnDSB5jMrXMR4nLuHxj5TP"
        );
    }

    #[test]
    fn test_from_id_number_is_case_insensitive() {
        let upper = KeyPair::from_id_number("11010211980123456789X", SALT, PLAN_KEY).unwrap();
        let lower = KeyPair::from_id_number("11010211980123456789x", SALT, PLAN_KEY).unwrap();
        assert_eq!(upper.private_key_hex(), lower.private_key_hex());
    }

    #[test]
    fn test_from_id_number_rejects_bad_input() {
        assert!(matches!(
            KeyPair::from_id_number("", SALT, PLAN_KEY),
            Err(KeyError::InvalidIdentity(_))
        ));
        assert!(matches!(
            KeyPair::from_id_number(ID_NUMBER, "", PLAN_KEY),
            Err(KeyError::InvalidIdentity(_))
        ));
        assert!(matches!(
            KeyPair::from_id_number(ID_NUMBER, SALT, "0335"),
            Err(KeyError::InvalidPlanKey(_))
        ));
    }

    #[test]
    fn test_acceptable_secret() {
        let mut digest = [0u8; 32];
        assert!(!is_acceptable_secret(&digest));
        digest[31] = 1;
        assert!(!is_acceptable_secret(&digest));
        digest[31] = 2;
        assert!(is_acceptable_secret(&digest));
        digest[0] = 0x80;
        assert!(!is_acceptable_secret(&digest));
        digest[0] = 0x7f;
        assert!(is_acceptable_secret(&digest));
    }
}
