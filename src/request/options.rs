//! Reading request options
//!
//! Every field may be given under its canonical camelCase name or its
//! snake_case wire name. When both are present the canonical one wins.

use serde_json::{Map, Value};

use super::RequestError;
use crate::codec::Amount;
use crate::crypto::{Hash, PublicKey, Signature};

pub(crate) struct Options<'a> {
    map: &'a Map<String, Value>,
}

impl<'a> Options<'a> {
    pub fn new(value: &'a Value) -> Result<Self, RequestError> {
        match value {
            Value::Object(map) => Ok(Options { map }),
            _ => Err(RequestError::Json("request options must be an object".to_string())),
        }
    }

    /// Look up `canonical`, falling back to `wire`. Nulls count as absent.
    pub fn get(&self, canonical: &str, wire: &str) -> Option<&'a Value> {
        self.map
            .get(canonical)
            .filter(|v| !v.is_null())
            .or_else(|| self.map.get(wire).filter(|v| !v.is_null()))
    }

    pub fn str(&self, canonical: &str, wire: &str, field: &'static str) -> Result<Option<&'a str>, RequestError> {
        match self.get(canonical, wire) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.as_str())),
            Some(other) => Err(RequestError::invalid(field, format!("expected a string, got {}", other))),
        }
    }

    pub fn amount(&self, canonical: &str, wire: &str, field: &'static str) -> Result<Option<Amount>, RequestError> {
        self.get(canonical, wire)
            .map(|v| amount_from_value(v, field))
            .transpose()
    }

    pub fn u32(&self, canonical: &str, wire: &str, field: &'static str) -> Result<Option<u32>, RequestError> {
        match self.get(canonical, wire) {
            None => Ok(None),
            Some(Value::Number(n)) => n
                .as_u64()
                .and_then(|n| u32::try_from(n).ok())
                .map(Some)
                .ok_or_else(|| RequestError::invalid(field, format!("{} is not a 32-bit unsigned integer", n))),
            Some(Value::String(s)) => s
                .parse::<u32>()
                .map(Some)
                .map_err(|_| RequestError::invalid(field, format!("'{}' is not a 32-bit unsigned integer", s))),
            Some(other) => Err(RequestError::invalid(field, format!("expected an integer, got {}", other))),
        }
    }

    pub fn bool(&self, canonical: &str, wire: &str, field: &'static str) -> Result<Option<bool>, RequestError> {
        match self.get(canonical, wire) {
            None => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(*b)),
            Some(Value::String(s)) if s == "true" => Ok(Some(true)),
            Some(Value::String(s)) if s == "false" => Ok(Some(false)),
            Some(other) => Err(RequestError::invalid(field, format!("expected a boolean, got {}", other))),
        }
    }

    pub fn hash(&self, canonical: &str, wire: &str, field: &'static str) -> Result<Option<Hash>, RequestError> {
        self.str(canonical, wire, field)?
            .map(|s| parse_hash(s, field))
            .transpose()
    }

    /// Account fields accept a hex public key or an address
    pub fn key(&self, canonical: &str, wire: &str, field: &'static str) -> Result<Option<PublicKey>, RequestError> {
        self.str(canonical, wire, field)?
            .map(|s| PublicKey::parse(s).map_err(RequestError::from))
            .transpose()
    }

    pub fn signature(&self) -> Result<Option<Signature>, RequestError> {
        self.str("signature", "signature", "signature")?
            .map(|s| Signature::from_hex(s).map_err(RequestError::from))
            .transpose()
    }

    /// Token ID from its raw key or from the token account address
    pub fn token_id(&self) -> Result<Option<Hash>, RequestError> {
        if let Some(id) = self.hash("tokenID", "token_id", "tokenID")? {
            return Ok(Some(id));
        }
        Ok(self
            .key("tokenAccount", "token_account", "tokenAccount")?
            .map(Hash::from))
    }
}

pub(crate) fn parse_hash(s: &str, field: &'static str) -> Result<Hash, RequestError> {
    Hash::from_hex(s).map_err(|_| RequestError::invalid(field, format!("'{}' is not a 64 character hex string", s)))
}

pub(crate) fn amount_from_value(value: &Value, field: &'static str) -> Result<Amount, RequestError> {
    match value {
        Value::String(s) => s.parse().map_err(|e| RequestError::amount(field, e)),
        Value::Number(n) => n
            .as_u64()
            .map(Amount::from)
            .ok_or_else(|| RequestError::invalid(field, format!("{} is not an unsigned integer", n))),
        other => Err(RequestError::invalid(field, format!("expected a decimal string, got {}", other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_canonical_name_wins() {
        let value = json!({ "tokenFee": "5", "token_fee": "7" });
        let options = Options::new(&value).unwrap();
        assert_eq!(
            options.amount("tokenFee", "token_fee", "tokenFee").unwrap(),
            Some(Amount(5))
        );
    }

    #[test]
    fn test_wire_name_fallback() {
        let value = json!({ "token_fee": 7, "sequence": "3" });
        let options = Options::new(&value).unwrap();
        assert_eq!(
            options.amount("tokenFee", "token_fee", "tokenFee").unwrap(),
            Some(Amount(7))
        );
        assert_eq!(options.u32("sequence", "sequence", "sequence").unwrap(), Some(3));
    }

    #[test]
    fn test_null_is_absent() {
        let value = json!({ "previous": null });
        let options = Options::new(&value).unwrap();
        assert_eq!(options.hash("previous", "previous", "previous").unwrap(), None);
    }

    #[test]
    fn test_token_account_normalized_to_id() {
        let id = Hash([9u8; 32]);
        let value = json!({ "token_account": PublicKey::from(id).to_address() });
        let options = Options::new(&value).unwrap();
        assert_eq!(options.token_id().unwrap(), Some(id));
    }

    #[test]
    fn test_rejects_non_object() {
        assert!(Options::new(&json!([1, 2])).is_err());
    }
}
