//! Permanently lock a token setting at its current value

use serde_json::{json, Map, Value};

use super::base::{require_token_id, write_token_json};
use super::options::Options;
use super::{check_type, Preimage, RequestBase, RequestError, RequestKind, RequestType, Setting};
use crate::crypto::Hash;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImmuteSetting {
    base: RequestBase,
    token_id: Option<Hash>,
    setting: Option<Setting>,
}

impl ImmuteSetting {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(value: &Value) -> Result<Self, RequestError> {
        check_type(value, RequestType::ImmuteSetting)?;
        let options = Options::new(value)?;
        let mut request = ImmuteSetting {
            base: RequestBase::from_options(&options)?,
            token_id: options.token_id()?,
            setting: None,
        };
        if let Some(setting) = options.str("setting", "setting", "setting")? {
            request.set_setting_str(setting)?;
        }
        Ok(request)
    }

    pub fn token_id(&self) -> Option<Hash> {
        self.token_id
    }

    pub fn set_token_id(&mut self, token_id: Hash) {
        self.token_id = Some(token_id);
    }

    pub fn setting(&self) -> Option<Setting> {
        self.setting
    }

    pub fn set_setting(&mut self, setting: Setting) -> Result<(), RequestError> {
        self.set_setting_str(setting.as_str())
    }

    pub fn set_setting_str(&mut self, setting: &str) -> Result<(), RequestError> {
        self.setting = Some(Setting::parse_base(setting)?);
        Ok(())
    }
}

impl RequestKind for ImmuteSetting {
    const TYPE: RequestType = RequestType::ImmuteSetting;

    fn base(&self) -> &RequestBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut RequestBase {
        &mut self.base
    }

    fn write_fields(&self, preimage: &mut Preimage) -> Result<(), RequestError> {
        let token_id = require_token_id(self.token_id)?;
        let setting = self.setting.ok_or(RequestError::Missing("setting"))?;
        preimage.hash(&token_id).byte(setting.code());
        Ok(())
    }

    fn write_json(&self, json: &mut Map<String, Value>) {
        write_token_json(json, self.token_id);
        if let Some(setting) = self.setting {
            json.insert("setting".into(), json!(setting.as_str()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::test_support::{fill_base, token_prefix_len};

    #[test]
    fn test_preimage_tail() {
        let mut request = ImmuteSetting::new();
        fill_base(&mut request);
        request.set_token_id(Hash([4; 32]));
        request.set_setting(Setting::Whitelist).unwrap();
        let preimage = request.preimage().unwrap();
        assert_eq!(&preimage.as_bytes()[token_prefix_len()..], &[8]);
        assert_eq!(preimage.as_bytes()[0], 5);
    }

    #[test]
    fn test_from_wire_json() {
        let json = json!({ "type": "immute_setting", "token_id": Hash([4; 32]).to_hex(), "setting": "revoke" });
        let request = ImmuteSetting::from_json(&json).unwrap();
        assert_eq!(request.setting(), Some(Setting::Revoke));
    }
}
