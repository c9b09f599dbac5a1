//! Hash preimage construction
//!
//! Every request hash is BLAKE2b-256 over
//! `type(1) ‖ origin(32) ‖ previous(32) ‖ fee(16 BE) ‖ sequence(4 LE)`
//! followed by the variant's own fields in a fixed order.

use super::{RequestBase, RequestError, RequestType};
use crate::codec::Amount;
use crate::crypto::{blake2b_256, Hash, PublicKey};

#[derive(Debug, Clone, Default)]
pub struct Preimage {
    bytes: Vec<u8>,
}

impl Preimage {
    /// Start a preimage with the shared prefix. Fails naming the first
    /// missing base field.
    pub fn base(request_type: RequestType, base: &RequestBase) -> Result<Self, RequestError> {
        let previous = base.previous().ok_or(RequestError::Missing("previous"))?;
        let sequence = base.sequence().ok_or(RequestError::Missing("sequence"))?;
        let fee = base.fee().ok_or(RequestError::Missing("fee"))?;
        let origin = base.origin().ok_or(RequestError::Missing("origin"))?;

        let mut preimage = Preimage {
            bytes: Vec::with_capacity(256),
        };
        preimage
            .byte(request_type.value())
            .key(&origin)
            .hash(&previous)
            .amount(fee)
            .sequence(sequence);
        Ok(preimage)
    }

    pub fn byte(&mut self, value: u8) -> &mut Self {
        self.bytes.push(value);
        self
    }

    pub fn flag(&mut self, value: bool) -> &mut Self {
        self.byte(value as u8)
    }

    pub fn key(&mut self, key: &PublicKey) -> &mut Self {
        self.bytes.extend_from_slice(&key.0);
        self
    }

    pub fn hash(&mut self, hash: &Hash) -> &mut Self {
        self.bytes.extend_from_slice(&hash.0);
        self
    }

    /// 16-byte big-endian quantity
    pub fn amount(&mut self, amount: Amount) -> &mut Self {
        self.bytes.extend_from_slice(&amount.to_be_bytes());
        self
    }

    /// Sequence numbers are written as their 4-byte big-endian form reversed
    pub fn sequence(&mut self, sequence: u32) -> &mut Self {
        self.bytes.extend_from_slice(&sequence.to_le_bytes());
        self
    }

    /// Packed boolean set rendered as an 8-byte integer then byte-reversed
    pub fn bitfield(&mut self, bits: u64) -> &mut Self {
        self.bytes.extend_from_slice(&bits.to_le_bytes());
        self
    }

    /// Raw UTF-8 bytes, no length prefix
    pub fn utf8(&mut self, text: &str) -> &mut Self {
        self.bytes.extend_from_slice(text.as_bytes());
        self
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn digest(&self) -> Hash {
        blake2b_256(&self.bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{decimal_to_fixed_hex, reverse_byte_order};

    #[test]
    fn test_prefix_layout() {
        let mut base = RequestBase::default();
        base.set_origin(PublicKey([1u8; 32]));
        base.set_previous(Hash([2u8; 32]));
        base.set_fee(Amount(3));
        base.set_sequence(0x0102_0304);
        let preimage = Preimage::base(RequestType::Burn, &base).unwrap();
        let bytes = preimage.as_bytes();
        assert_eq!(bytes.len(), 1 + 32 + 32 + 16 + 4);
        assert_eq!(bytes[0], 11);
        assert_eq!(&bytes[1..33], &[1u8; 32]);
        assert_eq!(&bytes[33..65], &[2u8; 32]);
        assert_eq!(bytes[80], 3);
        assert_eq!(&bytes[81..85], &[4, 3, 2, 1]);
    }

    #[test]
    fn test_missing_fields_named() {
        let mut base = RequestBase::default();
        assert_eq!(
            Preimage::base(RequestType::Send, &base).unwrap_err(),
            RequestError::Missing("previous")
        );
        base.set_previous(Hash::zero());
        base.set_sequence(0);
        base.set_fee(Amount::ZERO);
        assert_eq!(
            Preimage::base(RequestType::Send, &base).unwrap_err(),
            RequestError::Missing("origin")
        );
    }

    #[test]
    fn test_encodings_match_hex_codecs() {
        let mut preimage = Preimage::default();
        preimage.sequence(7).bitfield(0b101).amount(Amount(255));
        let expected = format!(
            "{}{}{}",
            reverse_byte_order(&decimal_to_fixed_hex("7", 4).unwrap()).unwrap(),
            reverse_byte_order(&decimal_to_fixed_hex("5", 8).unwrap()).unwrap(),
            decimal_to_fixed_hex("255", 16).unwrap()
        );
        assert_eq!(hex::encode_upper(preimage.as_bytes()), expected);
    }
}
