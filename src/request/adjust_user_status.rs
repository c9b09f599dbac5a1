//! Freeze, unfreeze or (un)whitelist a token holder

use serde_json::{json, Map, Value};

use super::base::{require_token_id, write_token_json};
use super::options::Options;
use super::{check_type, Preimage, RequestBase, RequestError, RequestKind, RequestType, UserStatus};
use crate::crypto::{Hash, PublicKey};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AdjustUserStatus {
    base: RequestBase,
    token_id: Option<Hash>,
    account: Option<PublicKey>,
    status: Option<UserStatus>,
}

impl AdjustUserStatus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(value: &Value) -> Result<Self, RequestError> {
        check_type(value, RequestType::AdjustUserStatus)?;
        let options = Options::new(value)?;
        Ok(AdjustUserStatus {
            base: RequestBase::from_options(&options)?,
            token_id: options.token_id()?,
            account: options.key("account", "account", "account")?,
            status: options
                .str("status", "status", "status")?
                .map(str::parse::<UserStatus>)
                .transpose()?,
        })
    }

    pub fn token_id(&self) -> Option<Hash> {
        self.token_id
    }

    pub fn set_token_id(&mut self, token_id: Hash) {
        self.token_id = Some(token_id);
    }

    pub fn account(&self) -> Option<PublicKey> {
        self.account
    }

    pub fn set_account(&mut self, account: PublicKey) {
        self.account = Some(account);
    }

    pub fn status(&self) -> Option<UserStatus> {
        self.status
    }

    pub fn set_status(&mut self, status: UserStatus) {
        self.status = Some(status);
    }

    pub fn set_status_str(&mut self, status: &str) -> Result<(), RequestError> {
        self.status = Some(status.parse()?);
        Ok(())
    }
}

impl RequestKind for AdjustUserStatus {
    const TYPE: RequestType = RequestType::AdjustUserStatus;

    fn base(&self) -> &RequestBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut RequestBase {
        &mut self.base
    }

    fn write_fields(&self, preimage: &mut Preimage) -> Result<(), RequestError> {
        let token_id = require_token_id(self.token_id)?;
        let account = self.account.ok_or(RequestError::Missing("account"))?;
        let status = self.status.ok_or(RequestError::Missing("status"))?;
        preimage.hash(&token_id).key(&account).byte(status.code());
        Ok(())
    }

    fn write_json(&self, json: &mut Map<String, Value>) {
        write_token_json(json, self.token_id);
        if let Some(account) = self.account {
            json.insert("account".into(), json!(account.to_address()));
        }
        if let Some(status) = self.status {
            json.insert("status".into(), json!(status.as_str()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::test_support::{fill_base, token_prefix_len};

    #[test]
    fn test_preimage_tail() {
        let mut request = AdjustUserStatus::new();
        fill_base(&mut request);
        request.set_token_id(Hash([4; 32]));
        request.set_account(PublicKey([8; 32]));
        request.set_status(UserStatus::Whitelisted);
        let preimage = request.preimage().unwrap();
        let tail = &preimage.as_bytes()[token_prefix_len()..];
        assert_eq!(&tail[..32], &[8u8; 32]);
        assert_eq!(tail[32], 2);
    }

    #[test]
    fn test_unknown_status() {
        let mut request = AdjustUserStatus::new();
        assert!(matches!(
            request.set_status_str("banned"),
            Err(RequestError::UnknownValue { field: "status", .. })
        ));
        let json = json!({ "status": "banned" });
        assert!(AdjustUserStatus::from_json(&json).is_err());
    }
}
