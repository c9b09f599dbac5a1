//! Hex and byte-level helpers

use super::CodecError;

/// Reverse the byte order of a hex string.
///
/// Only packed boolean bitfields go through this before hashing; amounts and
/// keys are always big-endian.
pub fn reverse_byte_order(hex_str: &str) -> Result<String, CodecError> {
    let mut bytes = hex::decode(hex_str).map_err(|e| CodecError::InvalidHex(e.to_string()))?;
    bytes.reverse();
    Ok(hex::encode_upper(bytes))
}

/// Number of bytes `s` occupies as UTF-8. Size limits are byte limits.
pub fn utf8_byte_length(s: &str) -> usize {
    s.len()
}
