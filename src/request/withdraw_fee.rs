//! Collect accumulated token fees from the token account

use serde_json::{Map, Value};

use super::base::{require_token_id, write_token_json};
use super::options::Options;
use super::{check_type, Preimage, RequestBase, RequestError, RequestKind, RequestType, Transaction};
use crate::crypto::Hash;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WithdrawFee {
    base: RequestBase,
    token_id: Option<Hash>,
    transaction: Option<Transaction>,
}

impl WithdrawFee {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(value: &Value) -> Result<Self, RequestError> {
        check_type(value, RequestType::WithdrawFee)?;
        let options = Options::new(value)?;
        Ok(WithdrawFee {
            base: RequestBase::from_options(&options)?,
            token_id: options.token_id()?,
            transaction: options
                .get("transaction", "transaction")
                .map(Transaction::from_value)
                .transpose()?,
        })
    }

    pub fn token_id(&self) -> Option<Hash> {
        self.token_id
    }

    pub fn set_token_id(&mut self, token_id: Hash) {
        self.token_id = Some(token_id);
    }

    pub fn transaction(&self) -> Option<&Transaction> {
        self.transaction.as_ref()
    }

    pub fn set_transaction(&mut self, transaction: Transaction) {
        self.transaction = Some(transaction);
    }
}

impl RequestKind for WithdrawFee {
    const TYPE: RequestType = RequestType::WithdrawFee;

    fn base(&self) -> &RequestBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut RequestBase {
        &mut self.base
    }

    fn write_fields(&self, preimage: &mut Preimage) -> Result<(), RequestError> {
        let token_id = require_token_id(self.token_id)?;
        let tx = self.transaction.ok_or(RequestError::Missing("transaction"))?;
        preimage.hash(&token_id).key(&tx.destination).amount(tx.amount);
        Ok(())
    }

    fn write_json(&self, json: &mut Map<String, Value>) {
        write_token_json(json, self.token_id);
        if let Some(tx) = &self.transaction {
            json.insert("transaction".into(), tx.to_json());
        }
    }
}
