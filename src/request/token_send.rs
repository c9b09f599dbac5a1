//! Token transfer between accounts

use serde_json::{json, Map, Value};

use super::base::{require_token_id, write_token_json};
use super::fields::transactions_from_value;
use super::options::Options;
use super::{check_transactions, check_type, Preimage, RequestBase, RequestError, RequestKind, RequestType, Transaction};
use crate::codec::Amount;
use crate::crypto::Hash;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenSend {
    base: RequestBase,
    token_id: Option<Hash>,
    transactions: Vec<Transaction>,
    token_fee: Amount,
}

impl TokenSend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(value: &Value) -> Result<Self, RequestError> {
        check_type(value, RequestType::TokenSend)?;
        let options = Options::new(value)?;
        let mut request = TokenSend {
            base: RequestBase::from_options(&options)?,
            token_id: options.token_id()?,
            transactions: Vec::new(),
            token_fee: options
                .amount("tokenFee", "token_fee", "tokenFee")?
                .unwrap_or_default(),
        };
        if let Some(txs) = options.get("transactions", "transactions") {
            request.set_transactions(transactions_from_value(txs)?)?;
        }
        Ok(request)
    }

    pub fn token_id(&self) -> Option<Hash> {
        self.token_id
    }

    pub fn set_token_id(&mut self, token_id: Hash) {
        self.token_id = Some(token_id);
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn set_transactions(&mut self, transactions: Vec<Transaction>) -> Result<(), RequestError> {
        check_transactions(transactions.len())?;
        self.transactions = transactions;
        Ok(())
    }

    pub fn add_transaction(&mut self, transaction: Transaction) -> Result<(), RequestError> {
        check_transactions(self.transactions.len() + 1)?;
        self.transactions.push(transaction);
        Ok(())
    }

    pub fn token_fee(&self) -> Amount {
        self.token_fee
    }

    pub fn set_token_fee(&mut self, token_fee: Amount) {
        self.token_fee = token_fee;
    }

    pub fn total_amount(&self) -> Amount {
        self.transactions.iter().map(|t| t.amount).sum()
    }
}

impl RequestKind for TokenSend {
    const TYPE: RequestType = RequestType::TokenSend;

    fn base(&self) -> &RequestBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut RequestBase {
        &mut self.base
    }

    fn write_fields(&self, preimage: &mut Preimage) -> Result<(), RequestError> {
        preimage.hash(&require_token_id(self.token_id)?);
        if self.transactions.is_empty() {
            return Err(RequestError::Missing("transactions"));
        }
        check_transactions(self.transactions.len())?;
        for tx in &self.transactions {
            preimage.key(&tx.destination).amount(tx.amount);
        }
        preimage.amount(self.token_fee);
        Ok(())
    }

    fn write_json(&self, json: &mut Map<String, Value>) {
        write_token_json(json, self.token_id);
        json.insert(
            "transactions".into(),
            Value::Array(self.transactions.iter().map(Transaction::to_json).collect()),
        );
        json.insert("token_fee".into(), json!(self.token_fee.to_string()));
    }
}
