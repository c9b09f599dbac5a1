//! Claw tokens back from a holder

use serde_json::{json, Map, Value};

use super::base::{require_token_id, write_token_json};
use super::options::Options;
use super::{check_type, Preimage, RequestBase, RequestError, RequestKind, RequestType, Transaction};
use crate::crypto::{Hash, PublicKey};

/// Moves `transaction.amount` tokens from `source` to `transaction.destination`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Revoke {
    base: RequestBase,
    token_id: Option<Hash>,
    source: Option<PublicKey>,
    transaction: Option<Transaction>,
}

impl Revoke {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(value: &Value) -> Result<Self, RequestError> {
        check_type(value, RequestType::Revoke)?;
        let options = Options::new(value)?;
        Ok(Revoke {
            base: RequestBase::from_options(&options)?,
            token_id: options.token_id()?,
            source: options.key("source", "source", "source")?,
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

    pub fn source(&self) -> Option<PublicKey> {
        self.source
    }

    pub fn set_source(&mut self, source: PublicKey) {
        self.source = Some(source);
    }

    pub fn transaction(&self) -> Option<&Transaction> {
        self.transaction.as_ref()
    }

    pub fn set_transaction(&mut self, transaction: Transaction) {
        self.transaction = Some(transaction);
    }
}

impl RequestKind for Revoke {
    const TYPE: RequestType = RequestType::Revoke;

    fn base(&self) -> &RequestBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut RequestBase {
        &mut self.base
    }

    fn write_fields(&self, preimage: &mut Preimage) -> Result<(), RequestError> {
        let token_id = require_token_id(self.token_id)?;
        let source = self.source.ok_or(RequestError::Missing("source"))?;
        let tx = self.transaction.ok_or(RequestError::Missing("transaction"))?;
        preimage
            .hash(&token_id)
            .key(&source)
            .key(&tx.destination)
            .amount(tx.amount);
        Ok(())
    }

    fn write_json(&self, json: &mut Map<String, Value>) {
        write_token_json(json, self.token_id);
        if let Some(source) = self.source {
            json.insert("source".into(), json!(source.to_address()));
        }
        if let Some(tx) = &self.transaction {
            json.insert("transaction".into(), tx.to_json());
        }
    }
}
