//! Mint additional supply into the token account

use serde_json::{json, Map, Value};

use super::base::{require_token_id, write_token_json};
use super::options::Options;
use super::{check_type, Preimage, RequestBase, RequestError, RequestKind, RequestType};
use crate::codec::Amount;
use crate::crypto::Hash;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct IssueAdditional {
    base: RequestBase,
    token_id: Option<Hash>,
    amount: Amount,
}

impl IssueAdditional {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(value: &Value) -> Result<Self, RequestError> {
        check_type(value, RequestType::IssueAdditional)?;
        let options = Options::new(value)?;
        Ok(IssueAdditional {
            base: RequestBase::from_options(&options)?,
            token_id: options.token_id()?,
            amount: options.amount("amount", "amount", "amount")?.unwrap_or_default(),
        })
    }

    pub fn token_id(&self) -> Option<Hash> {
        self.token_id
    }

    pub fn set_token_id(&mut self, token_id: Hash) {
        self.token_id = Some(token_id);
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    pub fn set_amount(&mut self, amount: Amount) {
        self.amount = amount;
    }
}

impl RequestKind for IssueAdditional {
    const TYPE: RequestType = RequestType::IssueAdditional;

    fn base(&self) -> &RequestBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut RequestBase {
        &mut self.base
    }

    fn write_fields(&self, preimage: &mut Preimage) -> Result<(), RequestError> {
        preimage.hash(&require_token_id(self.token_id)?).amount(self.amount);
        Ok(())
    }

    fn write_json(&self, json: &mut Map<String, Value>) {
        write_token_json(json, self.token_id);
        json.insert("amount".into(), json!(self.amount.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::test_support::{fill_base, token_prefix_len};

    #[test]
    fn test_preimage_and_roundtrip() {
        let mut request = IssueAdditional::new();
        fill_base(&mut request);
        request.set_token_id(Hash([4; 32]));
        request.set_amount(Amount(77));
        let preimage = request.preimage().unwrap();
        assert_eq!(preimage.len(), token_prefix_len() + 16);
        assert_eq!(preimage.as_bytes()[0], 3);

        let parsed = IssueAdditional::from_json(&request.to_json()).unwrap();
        assert_eq!(parsed.amount(), Amount(77));
        assert_eq!(parsed.hash().unwrap(), request.hash().unwrap());
    }
}
