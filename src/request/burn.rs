//! Destroy tokens held by the token account

use serde_json::{json, Map, Value};

use super::base::{require_token_id, write_token_json};
use super::options::Options;
use super::{check_type, Preimage, RequestBase, RequestError, RequestKind, RequestType};
use crate::codec::Amount;
use crate::crypto::Hash;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Burn {
    base: RequestBase,
    token_id: Option<Hash>,
    amount: Amount,
}

impl Burn {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(value: &Value) -> Result<Self, RequestError> {
        check_type(value, RequestType::Burn)?;
        let options = Options::new(value)?;
        Ok(Burn {
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

impl RequestKind for Burn {
    const TYPE: RequestType = RequestType::Burn;

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
    use crate::request::test_support::fill_base;

    #[test]
    fn test_amount_defaults_to_zero() {
        let request = Burn::from_json(&json!({ "token_id": Hash([1; 32]).to_hex() })).unwrap();
        assert_eq!(request.amount(), Amount::ZERO);
    }

    #[test]
    fn test_differs_from_issue_additional() {
        let mut burn = Burn::new();
        fill_base(&mut burn);
        burn.set_token_id(Hash([4; 32]));
        burn.set_amount(Amount(77));

        let mut issue = crate::request::IssueAdditional::new();
        fill_base(&mut issue);
        issue.set_token_id(Hash([4; 32]));
        issue.set_amount(Amount(77));

        assert_ne!(burn.hash().unwrap(), issue.hash().unwrap());
    }
}
