//! Turn a token setting on or off

use serde_json::{json, Map, Value};

use super::base::{require_token_id, write_token_json};
use super::options::Options;
use super::{check_type, Preimage, RequestBase, RequestError, RequestKind, RequestType, Setting};
use crate::crypto::Hash;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeSetting {
    base: RequestBase,
    token_id: Option<Hash>,
    setting: Option<Setting>,
    value: bool,
}

impl ChangeSetting {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(value: &Value) -> Result<Self, RequestError> {
        check_type(value, RequestType::ChangeSetting)?;
        let options = Options::new(value)?;
        let mut request = ChangeSetting {
            base: RequestBase::from_options(&options)?,
            token_id: options.token_id()?,
            setting: None,
            value: options.bool("value", "value", "value")?.unwrap_or(false),
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

    /// Only base settings can be changed; `modify_*` flags are immuted instead
    pub fn set_setting(&mut self, setting: Setting) -> Result<(), RequestError> {
        self.set_setting_str(setting.as_str())
    }

    pub fn set_setting_str(&mut self, setting: &str) -> Result<(), RequestError> {
        self.setting = Some(Setting::parse_base(setting)?);
        Ok(())
    }

    pub fn value(&self) -> bool {
        self.value
    }

    pub fn set_value(&mut self, value: bool) {
        self.value = value;
    }
}

impl RequestKind for ChangeSetting {
    const TYPE: RequestType = RequestType::ChangeSetting;

    fn base(&self) -> &RequestBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut RequestBase {
        &mut self.base
    }

    fn write_fields(&self, preimage: &mut Preimage) -> Result<(), RequestError> {
        let token_id = require_token_id(self.token_id)?;
        let setting = self.setting.ok_or(RequestError::Missing("setting"))?;
        preimage.hash(&token_id).byte(setting.code()).flag(self.value);
        Ok(())
    }

    fn write_json(&self, json: &mut Map<String, Value>) {
        write_token_json(json, self.token_id);
        if let Some(setting) = self.setting {
            json.insert("setting".into(), json!(setting.as_str()));
        }
        json.insert("value".into(), json!(self.value));
    }
}
