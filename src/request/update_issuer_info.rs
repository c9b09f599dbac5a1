//! Replace a token's free-form issuer information

use serde_json::{json, Map, Value};

use super::base::{require_token_id, write_token_json};
use super::options::Options;
use super::{check_text, check_type, Preimage, RequestBase, RequestError, RequestKind, RequestType};
use crate::constants::MAX_ISSUER_INFO_BYTES;
use crate::crypto::Hash;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateIssuerInfo {
    base: RequestBase,
    token_id: Option<Hash>,
    issuer_info: Option<String>,
}

impl UpdateIssuerInfo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(value: &Value) -> Result<Self, RequestError> {
        check_type(value, RequestType::UpdateIssuerInfo)?;
        let options = Options::new(value)?;
        let mut request = UpdateIssuerInfo {
            base: RequestBase::from_options(&options)?,
            token_id: options.token_id()?,
            issuer_info: None,
        };
        if let Some(info) = options.str("issuerInfo", "new_info", "issuerInfo")? {
            request.set_issuer_info(info)?;
        }
        Ok(request)
    }

    pub fn token_id(&self) -> Option<Hash> {
        self.token_id
    }

    pub fn set_token_id(&mut self, token_id: Hash) {
        self.token_id = Some(token_id);
    }

    pub fn issuer_info(&self) -> Option<&str> {
        self.issuer_info.as_deref()
    }

    pub fn set_issuer_info(&mut self, info: impl Into<String>) -> Result<(), RequestError> {
        let info = info.into();
        check_text("issuerInfo", &info, MAX_ISSUER_INFO_BYTES)?;
        self.issuer_info = Some(info);
        Ok(())
    }
}

impl RequestKind for UpdateIssuerInfo {
    const TYPE: RequestType = RequestType::UpdateIssuerInfo;

    fn base(&self) -> &RequestBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut RequestBase {
        &mut self.base
    }

    fn write_fields(&self, preimage: &mut Preimage) -> Result<(), RequestError> {
        let token_id = require_token_id(self.token_id)?;
        let info = self
            .issuer_info
            .as_deref()
            .ok_or(RequestError::Missing("issuerInfo"))?;
        check_text("issuerInfo", info, MAX_ISSUER_INFO_BYTES)?;
        preimage.hash(&token_id).utf8(info);
        Ok(())
    }

    fn write_json(&self, json: &mut Map<String, Value>) {
        write_token_json(json, self.token_id);
        if let Some(info) = &self.issuer_info {
            json.insert("new_info".into(), json!(info));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::test_support::{fill_base, token_prefix_len};

    #[test]
    fn test_info_limit() {
        let mut request = UpdateIssuerInfo::new();
        assert!(request.set_issuer_info("a".repeat(512)).is_ok());
        assert_eq!(
            request.set_issuer_info("a".repeat(513)).unwrap_err(),
            RequestError::TooLong {
                field: "issuerInfo",
                len: 513,
                max: 512
            }
        );
    }

    #[test]
    fn test_empty_info_is_valid() {
        let mut request = UpdateIssuerInfo::new();
        fill_base(&mut request);
        request.set_token_id(Hash([4; 32]));
        request.set_issuer_info("").unwrap();
        assert_eq!(request.preimage().unwrap().len(), token_prefix_len());
    }

    #[test]
    fn test_json_roundtrip() {
        let mut request = UpdateIssuerInfo::new();
        fill_base(&mut request);
        request.set_token_id(Hash([4; 32]));
        request.set_issuer_info("https://example.org").unwrap();
        let json = request.to_json();
        assert_eq!(json["new_info"], "https://example.org");
        let parsed = UpdateIssuerInfo::from_json(&json).unwrap();
        assert_eq!(parsed.hash().unwrap(), request.hash().unwrap());
    }
}
