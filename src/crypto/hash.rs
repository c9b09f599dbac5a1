//! BLAKE2b hashing
//!
//! Request hashes, token identifiers, key derivation and address checksums
//! all use BLAKE2b. Hashes are 32 bytes; checksums use shorter outputs.

use blake2::digest::consts::U32;
use blake2::digest::{Digest, Update, VariableOutput};
use blake2::{Blake2b, Blake2bVar};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

type Blake2b256 = Blake2b<U32>;

/// 32-byte hash output
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Hash(pub [u8; 32]);

impl Hash {
    /// Create a zero hash (the genesis `previous` sentinel)
    pub const fn zero() -> Self {
        Hash([0u8; 32])
    }

    /// Create hash from bytes
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Hash(bytes)
    }

    /// Create hash from a 64 character hex string (either case)
    pub fn from_hex(hex: &str) -> Result<Self, hex::FromHexError> {
        if hex.len() != 64 {
            return Err(hex::FromHexError::InvalidStringLength);
        }
        let mut arr = [0u8; 32];
        hex::decode_to_slice(hex, &mut arr)?;
        Ok(Hash(arr))
    }

    /// Convert to upper case hex, the form used on the wire
    pub fn to_hex(&self) -> String {
        hex::encode_upper(self.0)
    }

    /// Get as bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash({})", self.to_hex())
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl Default for Hash {
    fn default() -> Self {
        Self::zero()
    }
}

impl FromStr for Hash {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Hash::from_hex(s)
    }
}

impl Serialize for Hash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Hash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Hash::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Hash arbitrary bytes with 32-byte BLAKE2b
pub fn blake2b_256(data: &[u8]) -> Hash {
    let digest = Blake2b256::digest(data);
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest);
    Hash(out)
}

/// Hash the concatenation of several byte slices
pub fn blake2b_256_parts(parts: &[&[u8]]) -> Hash {
    let mut hasher = Blake2b256::new();
    for part in parts {
        Digest::update(&mut hasher, part);
    }
    let mut out = [0u8; 32];
    out.copy_from_slice(&hasher.finalize());
    Hash(out)
}

/// BLAKE2b with a caller chosen output length (1..=64 bytes)
pub fn blake2b(data: &[u8], output_len: usize) -> Vec<u8> {
    let len = output_len.clamp(1, 64);
    // 1..=64 is always a valid BLAKE2b output size
    let mut hasher = match Blake2bVar::new(len) {
        Ok(h) => h,
        Err(_) => unreachable!("blake2b output length {len} rejected"),
    };
    hasher.update(data);
    let mut out = vec![0u8; len];
    if hasher.finalize_variable(&mut out).is_err() {
        unreachable!("buffer sized to the requested output length");
    }
    out
}
