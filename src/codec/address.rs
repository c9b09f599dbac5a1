//! Account address codec
//!
//! Address = "lgs_" + base32(4 zero bits ‖ 32-byte key) + base32(reversed BLAKE2b-40 checksum)
//! using the 32 symbol alphabet below (no 0, 2, l, v).

use thiserror::Error;

use crate::constants::ADDRESS_PREFIX;
use crate::crypto::{blake2b, PublicKey};

const ALPHABET: &[u8; 32] = b"13456789abcdefghijkmnopqrstuwxyz";
const KEY_CHARS: usize = 52;
const CHECKSUM_CHARS: usize = 8;
const CHECKSUM_LEN: usize = 5;

/// Address decoding errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("Invalid address checksum")]
    Checksum,
    #[error("Invalid address format: {0}")]
    Format(String),
}

fn encode_base32(bytes: &[u8], pad_bits: u32) -> String {
    let mut out = String::with_capacity((bytes.len() * 8 + pad_bits as usize) / 5);
    let mut acc: u32 = 0;
    let mut bits = pad_bits;
    for &byte in bytes {
        acc = (acc << 8) | byte as u32;
        bits += 8;
        while bits >= 5 {
            bits -= 5;
            out.push(ALPHABET[((acc >> bits) & 31) as usize] as char);
        }
        acc &= (1 << bits) - 1;
    }
    out
}

fn decode_base32(chars: &str, pad_bits: u32, out_len: usize) -> Result<Vec<u8>, AddressError> {
    let mut out = Vec::with_capacity(out_len);
    let mut acc: u32 = 0;
    let mut bits: u32 = 0;
    let mut pad = pad_bits;
    for c in chars.bytes() {
        let value = ALPHABET
            .iter()
            .position(|&a| a == c)
            .ok_or_else(|| AddressError::Format(format!("invalid character '{}'", c as char)))?;
        acc = (acc << 5) | value as u32;
        bits += 5;
        if pad > 0 && bits >= pad {
            if acc >> (bits - pad) != 0 {
                return Err(AddressError::Format("non-zero padding bits".to_string()));
            }
            bits -= pad;
            pad = 0;
        }
        while bits >= 8 {
            bits -= 8;
            out.push((acc >> bits) as u8);
        }
        acc &= (1 << bits) - 1;
    }
    if out.len() != out_len {
        return Err(AddressError::Format("invalid length".to_string()));
    }
    Ok(out)
}

fn checksum(key: &[u8]) -> Vec<u8> {
    let mut sum = blake2b(key, CHECKSUM_LEN);
    sum.reverse();
    sum
}

/// Encode a public key as an account address
pub fn address_from_public_key(key: &PublicKey) -> String {
    format!(
        "{}{}{}",
        ADDRESS_PREFIX,
        encode_base32(&key.0, 4),
        encode_base32(&checksum(&key.0), 0)
    )
}

/// Decode an account address back to its public key
pub fn public_key_from_address(address: &str) -> Result<PublicKey, AddressError> {
    let body = address
        .strip_prefix(ADDRESS_PREFIX)
        .ok_or_else(|| AddressError::Format(format!("missing '{}' prefix", ADDRESS_PREFIX)))?;
    if body.len() != KEY_CHARS + CHECKSUM_CHARS {
        return Err(AddressError::Format(format!(
            "expected {} characters after prefix, got {}",
            KEY_CHARS + CHECKSUM_CHARS,
            body.len()
        )));
    }
    let key_bytes = decode_base32(&body[..KEY_CHARS], 4, 32)?;
    let sum = decode_base32(&body[KEY_CHARS..], 0, CHECKSUM_LEN)?;
    if sum != checksum(&key_bytes) {
        return Err(AddressError::Checksum);
    }
    let mut key = [0u8; 32];
    key.copy_from_slice(&key_bytes);
    Ok(PublicKey(key))
}

pub fn is_valid_address(address: &str) -> bool {
    public_key_from_address(address).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_vectors() {
        assert_eq!(
            address_from_public_key(&PublicKey([0u8; 32])),
            "lgs_1111111111111111111111111111111111111111111111111111hifc8npp"
        );
        let mut counting = [0u8; 32];
        for (i, b) in counting.iter_mut().enumerate() {
            *b = i as u8;
        }
        assert_eq!(
            address_from_public_key(&PublicKey(counting)),
            "lgs_11131a3ia3a81w61k4id3i8iw5ri46b3871o4rdji8at5eg3t9izij86w3hz"
        );
    }

    #[test]
    fn test_roundtrip() {
        let key = PublicKey([0xAB; 32]);
        let address = address_from_public_key(&key);
        assert_eq!(address.len(), 64);
        assert_eq!(public_key_from_address(&address).unwrap(), key);
    }

    #[test]
    fn test_checksum_mismatch() {
        let address = address_from_public_key(&PublicKey([7u8; 32]));
        let mut corrupted: Vec<char> = address.chars().collect();
        let last = corrupted.len() - 1;
        corrupted[last] = if corrupted[last] == '1' { '3' } else { '1' };
        let corrupted: String = corrupted.into_iter().collect();
        assert_eq!(public_key_from_address(&corrupted), Err(AddressError::Checksum));
    }

    #[test]
    fn test_format_errors() {
        assert!(matches!(
            public_key_from_address("xrb_1111"),
            Err(AddressError::Format(_))
        ));
        assert!(matches!(
            public_key_from_address("lgs_111"),
            Err(AddressError::Format(_))
        ));
        let bad_char = format!("lgs_{}", "0".repeat(60));
        assert!(matches!(
            public_key_from_address(&bad_char),
            Err(AddressError::Format(_))
        ));
        // first character above '3' sets a padding bit
        let bad_pad = format!("lgs_{}{}", "z", &"1".repeat(59));
        assert!(matches!(
            public_key_from_address(&bad_pad),
            Err(AddressError::Format(_))
        ));
    }
}
