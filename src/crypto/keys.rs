//! Ed25519 keys and signatures
//!
//! Requests are signed over the raw 32-byte request hash.

use ed25519_dalek::{Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use super::Hash;
use crate::codec::{address_from_public_key, public_key_from_address, AddressError};

/// Signature errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("Invalid private key: expected 32 bytes, got {0}")]
    InvalidPrivateKeyLength(usize),
    #[error("Invalid private key hex")]
    InvalidPrivateKeyHex,
    #[error("Invalid public key")]
    InvalidPublicKey,
    #[error("Invalid signature: {0}")]
    InvalidSignature(String),
}

/// 32-byte Ed25519 secret key
#[derive(Clone)]
pub struct PrivateKey(SigningKey);

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PrivateKey([REDACTED])")
    }
}

impl PrivateKey {
    /// Generate a new random private key
    pub fn generate() -> Self {
        let mut bytes = [0u8; 32];
        OsRng.fill_bytes(&mut bytes);
        PrivateKey(SigningKey::from_bytes(&bytes))
    }

    /// Create from exactly 32 bytes
    pub fn from_slice(bytes: &[u8]) -> Result<Self, SignatureError> {
        let arr: [u8; 32] = bytes
            .try_into()
            .map_err(|_| SignatureError::InvalidPrivateKeyLength(bytes.len()))?;
        Ok(PrivateKey(SigningKey::from_bytes(&arr)))
    }

    pub fn from_bytes(bytes: &[u8; 32]) -> Self {
        PrivateKey(SigningKey::from_bytes(bytes))
    }

    pub fn from_hex(hex_str: &str) -> Result<Self, SignatureError> {
        let bytes = hex::decode(hex_str).map_err(|_| SignatureError::InvalidPrivateKeyHex)?;
        Self::from_slice(&bytes)
    }

    /// Get the corresponding public key
    pub fn public_key(&self) -> PublicKey {
        PublicKey(self.0.verifying_key().to_bytes())
    }

    /// Sign a request hash
    pub fn sign(&self, message: &Hash) -> Signature {
        Signature(self.0.sign(&message.0).to_bytes())
    }

    /// Export to bytes
    pub fn to_bytes(&self) -> [u8; 32] {
        self.0.to_bytes()
    }

    pub fn to_hex(&self) -> String {
        hex::encode_upper(self.to_bytes())
    }
}

/// 32-byte Ed25519 public key; also the raw form of an account address
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PublicKey(pub [u8; 32]);

impl PublicKey {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        PublicKey(bytes)
    }

    /// Parse a 64 character hex key
    pub fn from_hex(hex_str: &str) -> Result<Self, SignatureError> {
        Hash::from_hex(hex_str)
            .map(|h| PublicKey(h.0))
            .map_err(|_| SignatureError::InvalidPublicKey)
    }

    /// Accept either a hex key or an `lgs_` address
    pub fn parse(input: &str) -> Result<Self, AddressError> {
        if input.len() == 64 {
            if let Ok(key) = PublicKey::from_hex(input) {
                return Ok(key);
            }
        }
        public_key_from_address(input)
    }

    /// Verify a signature over a request hash
    pub fn verify(&self, message: &Hash, signature: &Signature) -> bool {
        let verifying_key = match VerifyingKey::from_bytes(&self.0) {
            Ok(vk) => vk,
            Err(_) => return false,
        };
        let sig = ed25519_dalek::Signature::from_bytes(&signature.0);
        verifying_key.verify(&message.0, &sig).is_ok()
    }

    /// Account address for this key
    pub fn to_address(&self) -> String {
        address_from_public_key(self)
    }

    pub fn to_hex(&self) -> String {
        hex::encode_upper(self.0)
    }

    pub fn to_bytes(&self) -> [u8; 32] {
        self.0
    }
}

impl From<Hash> for PublicKey {
    fn from(hash: Hash) -> Self {
        PublicKey(hash.0)
    }
}

impl From<PublicKey> for Hash {
    fn from(key: PublicKey) -> Self {
        Hash(key.0)
    }
}

impl FromStr for PublicKey {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PublicKey::parse(s)
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", self.to_hex())
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_address())
    }
}

impl Serialize for PublicKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_address())
    }
}

impl<'de> Deserialize<'de> for PublicKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        PublicKey::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// 64-byte Ed25519 signature
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Signature(pub [u8; 64]);

impl Signature {
    pub fn from_bytes(bytes: [u8; 64]) -> Self {
        Signature(bytes)
    }

    pub fn from_hex(hex_str: &str) -> Result<Self, SignatureError> {
        if hex_str.len() != 128 {
            return Err(SignatureError::InvalidSignature(format!(
                "expected 128 hex characters, got {}",
                hex_str.len()
            )));
        }
        let mut arr = [0u8; 64];
        hex::decode_to_slice(hex_str, &mut arr)
            .map_err(|e| SignatureError::InvalidSignature(e.to_string()))?;
        Ok(Signature(arr))
    }

    pub fn to_hex(&self) -> String {
        hex::encode_upper(self.0)
    }

    pub fn to_bytes(&self) -> [u8; 64] {
        self.0
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({})", self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::blake2b_256;

    #[test]
    fn test_sign_verify() {
        let private = PrivateKey::generate();
        let public = private.public_key();
        let message = blake2b_256(b"test message");
        let signature = private.sign(&message);
        assert!(public.verify(&message, &signature));
    }

    #[test]
    fn test_wrong_key_fails() {
        let private1 = PrivateKey::generate();
        let public2 = PrivateKey::generate().public_key();
        let message = blake2b_256(b"test message");
        let signature = private1.sign(&message);
        assert!(!public2.verify(&message, &signature));
    }

    #[test]
    fn test_wrong_message_fails() {
        let private = PrivateKey::generate();
        let signature = private.sign(&blake2b_256(b"message 1"));
        assert!(!private.public_key().verify(&blake2b_256(b"message 2"), &signature));
    }

    #[test]
    fn test_private_key_length_checked() {
        assert_eq!(
            PrivateKey::from_slice(&[1u8; 31]).unwrap_err(),
            SignatureError::InvalidPrivateKeyLength(31)
        );
        assert!(PrivateKey::from_slice(&[1u8; 32]).is_ok());
    }

    #[test]
    fn test_key_serialization() {
        let private = PrivateKey::generate();
        let recovered = PrivateKey::from_hex(&private.to_hex()).unwrap();
        assert_eq!(private.public_key(), recovered.public_key());
    }

    #[test]
    fn test_public_key_parse_accepts_hex_and_address() {
        let public = PrivateKey::generate().public_key();
        assert_eq!(PublicKey::parse(&public.to_hex()).unwrap(), public);
        assert_eq!(PublicKey::parse(&public.to_address()).unwrap(), public);
    }

    #[test]
    fn test_signature_hex_roundtrip() {
        let sig = PrivateKey::generate().sign(&blake2b_256(b"x"));
        assert_eq!(Signature::from_hex(&sig.to_hex()).unwrap(), sig);
        assert!(Signature::from_hex("00").is_err());
    }

    #[test]
    fn test_key_errors_carry_into_request_errors() {
        let err = PrivateKey::from_slice(&[0; 31]).unwrap_err();
        let wrapped = crate::request::RequestError::from(err.clone());
        assert_eq!(wrapped.clone(), crate::request::RequestError::Signature(err));
    }
}
