//! Base currency send

use serde_json::{json, Map, Value};

use super::fields::transactions_from_value;
use super::options::Options;
use super::{check_transactions, check_type, Preimage, RequestBase, RequestError, RequestKind, RequestType, Transaction};
use crate::codec::Amount;

/// Pays up to eight destinations from the origin's balance
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Send {
    base: RequestBase,
    transactions: Vec<Transaction>,
}

impl Send {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(value: &Value) -> Result<Self, RequestError> {
        check_type(value, RequestType::Send)?;
        let options = Options::new(value)?;
        let mut request = Send {
            base: RequestBase::from_options(&options)?,
            transactions: Vec::new(),
        };
        if let Some(txs) = options.get("transactions", "transactions") {
            request.set_transactions(transactions_from_value(txs)?)?;
        }
        Ok(request)
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

    /// Sum of every transaction amount
    pub fn total_amount(&self) -> Amount {
        self.transactions.iter().map(|t| t.amount).sum()
    }
}

impl RequestKind for Send {
    const TYPE: RequestType = RequestType::Send;

    fn base(&self) -> &RequestBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut RequestBase {
        &mut self.base
    }

    fn write_fields(&self, preimage: &mut Preimage) -> Result<(), RequestError> {
        if self.transactions.is_empty() {
            return Err(RequestError::Missing("transactions"));
        }
        check_transactions(self.transactions.len())?;
        for tx in &self.transactions {
            preimage.key(&tx.destination).amount(tx.amount);
        }
        Ok(())
    }

    fn write_json(&self, json: &mut Map<String, Value>) {
        json.insert(
            "transactions".into(),
            Value::Array(self.transactions.iter().map(Transaction::to_json).collect()),
        );
        json.insert("total_amount".into(), json!(self.total_amount().to_string()));
    }
}
