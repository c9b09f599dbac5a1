//! Change how a token charges fees on token sends

use serde_json::{json, Map, Value};

use super::base::{require_token_id, write_token_json};
use super::fields::validate_fee_rate;
use super::options::Options;
use super::{check_type, FeeType, Preimage, RequestBase, RequestError, RequestKind, RequestType};
use crate::codec::Amount;
use crate::crypto::Hash;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AdjustFee {
    base: RequestBase,
    token_id: Option<Hash>,
    fee_type: FeeType,
    fee_rate: Amount,
}

impl AdjustFee {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(value: &Value) -> Result<Self, RequestError> {
        check_type(value, RequestType::AdjustFee)?;
        let options = Options::new(value)?;
        let mut request = AdjustFee {
            base: RequestBase::from_options(&options)?,
            token_id: options.token_id()?,
            ..AdjustFee::default()
        };
        if let Some(fee_type) = options.str("feeType", "fee_type", "feeType")? {
            request.fee_type = fee_type.parse()?;
        }
        if let Some(rate) = options.amount("feeRate", "fee_rate", "feeRate")? {
            request.set_fee_rate(rate)?;
        }
        Ok(request)
    }

    pub fn token_id(&self) -> Option<Hash> {
        self.token_id
    }

    pub fn set_token_id(&mut self, token_id: Hash) {
        self.token_id = Some(token_id);
    }

    pub fn fee_type(&self) -> FeeType {
        self.fee_type
    }

    pub fn set_fee_type(&mut self, fee_type: FeeType) -> Result<(), RequestError> {
        validate_fee_rate(fee_type, self.fee_rate)?;
        self.fee_type = fee_type;
        Ok(())
    }

    pub fn fee_rate(&self) -> Amount {
        self.fee_rate
    }

    pub fn set_fee_rate(&mut self, fee_rate: Amount) -> Result<(), RequestError> {
        validate_fee_rate(self.fee_type, fee_rate)?;
        self.fee_rate = fee_rate;
        Ok(())
    }
}

impl RequestKind for AdjustFee {
    const TYPE: RequestType = RequestType::AdjustFee;

    fn base(&self) -> &RequestBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut RequestBase {
        &mut self.base
    }

    fn write_fields(&self, preimage: &mut Preimage) -> Result<(), RequestError> {
        let token_id = require_token_id(self.token_id)?;
        validate_fee_rate(self.fee_type, self.fee_rate)?;
        preimage
            .hash(&token_id)
            .byte(self.fee_type.code())
            .amount(self.fee_rate);
        Ok(())
    }

    fn write_json(&self, json: &mut Map<String, Value>) {
        write_token_json(json, self.token_id);
        json.insert("fee_type".into(), json!(self.fee_type.as_str()));
        json.insert("fee_rate".into(), json!(self.fee_rate.to_string()));
    }
}
