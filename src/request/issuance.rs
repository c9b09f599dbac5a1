//! Token issuance
//!
//! Creates a token and its token account. Unless given explicitly, the token
//! ID is derived as `blake2b(origin ‖ previous ‖ utf8(symbol + name))`.

use serde_json::{json, Map, Value};

use super::base::write_token_json;
use super::fields::{controllers_from_value, validate_fee_rate};
use super::options::Options;
use super::{
    check_text, check_type, Controller, FeeType, Preimage, RequestBase, RequestError, RequestKind,
    RequestType, Settings,
};
use crate::codec::Amount;
use crate::constants::{MAX_CONTROLLERS, MAX_ISSUER_INFO_BYTES, MAX_NAME_BYTES, MAX_SYMBOL_BYTES};
use crate::crypto::{blake2b_256_parts, Hash, PublicKey};

#[derive(Debug, Clone, PartialEq)]
pub struct Issuance {
    base: RequestBase,
    token_id: Option<Hash>,
    symbol: Option<String>,
    name: Option<String>,
    total_supply: Amount,
    fee_type: FeeType,
    fee_rate: Amount,
    settings: Settings,
    controllers: Vec<Controller>,
    issuer_info: String,
}

impl Default for Issuance {
    fn default() -> Self {
        Issuance {
            base: RequestBase::default(),
            token_id: None,
            symbol: None,
            name: None,
            total_supply: Amount::MAX,
            fee_type: FeeType::Flat,
            fee_rate: Amount::ZERO,
            settings: Settings::empty(),
            controllers: Vec::new(),
            issuer_info: String::new(),
        }
    }
}

impl Issuance {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(value: &Value) -> Result<Self, RequestError> {
        check_type(value, RequestType::Issuance)?;
        let options = Options::new(value)?;
        let mut request = Issuance {
            base: RequestBase::from_options(&options)?,
            token_id: options.token_id()?,
            ..Issuance::default()
        };
        if let Some(symbol) = options.str("symbol", "symbol", "symbol")? {
            request.set_symbol(symbol)?;
        }
        if let Some(name) = options.str("name", "name", "name")? {
            request.set_name(name)?;
        }
        if let Some(supply) = options.amount("totalSupply", "total_supply", "totalSupply")? {
            request.set_total_supply(supply);
        }
        // fee type first so the rate is checked against it
        if let Some(fee_type) = options.str("feeType", "fee_type", "feeType")? {
            request.fee_type = fee_type.parse()?;
        }
        if let Some(rate) = options.amount("feeRate", "fee_rate", "feeRate")? {
            request.set_fee_rate(rate)?;
        }
        if let Some(settings) = options.get("settings", "settings") {
            request.set_settings(Settings::from_value(settings)?);
        }
        if let Some(controllers) = options.get("controllers", "controllers") {
            request.set_controllers(controllers_from_value(controllers)?)?;
        }
        if let Some(info) = options.str("issuerInfo", "issuer_info", "issuerInfo")? {
            request.set_issuer_info(info)?;
        }
        Ok(request)
    }

    /// Explicit token ID, or the derived one when origin, previous, symbol
    /// and name are all known. Derivation is recomputed on every call.
    pub fn token_id(&self) -> Option<Hash> {
        self.token_id.or_else(|| self.derived_token_id().ok())
    }

    pub fn set_token_id(&mut self, token_id: Hash) {
        self.token_id = Some(token_id);
    }

    /// Pin the current derived ID so later symbol/name edits keep it
    pub fn freeze_token_id(&mut self) -> Result<Hash, RequestError> {
        let id = match self.token_id {
            Some(id) => id,
            None => self.derived_token_id()?,
        };
        self.token_id = Some(id);
        Ok(id)
    }

    pub fn is_token_id_frozen(&self) -> bool {
        self.token_id.is_some()
    }

    fn derived_token_id(&self) -> Result<Hash, RequestError> {
        let origin = self.base.origin().ok_or(RequestError::Missing("origin"))?;
        let previous = self.base.previous().ok_or(RequestError::Missing("previous"))?;
        let symbol = self.symbol.as_deref().ok_or(RequestError::Missing("symbol"))?;
        let name = self.name.as_deref().ok_or(RequestError::Missing("name"))?;
        let label = format!("{}{}", symbol, name);
        Ok(blake2b_256_parts(&[&origin.0[..], &previous.0[..], label.as_bytes()]))
    }

    /// Address of the token account this issuance creates
    pub fn token_account(&self) -> Option<String> {
        self.token_id().map(|id| PublicKey::from(id).to_address())
    }

    pub fn symbol(&self) -> Option<&str> {
        self.symbol.as_deref()
    }

    /// At most 8 bytes, ASCII letters and digits only
    pub fn set_symbol(&mut self, symbol: &str) -> Result<(), RequestError> {
        validate_symbol(symbol)?;
        self.symbol = Some(symbol.to_string());
        Ok(())
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn set_name(&mut self, name: &str) -> Result<(), RequestError> {
        validate_name(name)?;
        self.name = Some(name.to_string());
        Ok(())
    }

    pub fn total_supply(&self) -> Amount {
        self.total_supply
    }

    /// Any 16-byte value is a valid supply; larger values fail when parsed
    pub fn set_total_supply(&mut self, total_supply: Amount) {
        self.total_supply = total_supply;
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

    pub fn settings(&self) -> Settings {
        self.settings
    }

    pub fn set_settings(&mut self, settings: Settings) {
        self.settings = settings;
    }

    pub fn controllers(&self) -> &[Controller] {
        &self.controllers
    }

    pub fn set_controllers(&mut self, controllers: Vec<Controller>) -> Result<(), RequestError> {
        validate_controllers(&controllers)?;
        self.controllers = controllers;
        Ok(())
    }

    pub fn issuer_info(&self) -> &str {
        &self.issuer_info
    }

    pub fn set_issuer_info(&mut self, issuer_info: &str) -> Result<(), RequestError> {
        check_text("issuerInfo", issuer_info, MAX_ISSUER_INFO_BYTES)?;
        self.issuer_info = issuer_info.to_string();
        Ok(())
    }
}

pub(crate) fn validate_symbol(symbol: &str) -> Result<(), RequestError> {
    if symbol.is_empty() {
        return Err(RequestError::Missing("symbol"));
    }
    check_text("symbol", symbol, MAX_SYMBOL_BYTES)?;
    if !symbol.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(RequestError::invalid("symbol", format!("'{}' must be alphanumeric", symbol)));
    }
    Ok(())
}

pub(crate) fn validate_name(name: &str) -> Result<(), RequestError> {
    if name.is_empty() {
        return Err(RequestError::Missing("name"));
    }
    check_text("name", name, MAX_NAME_BYTES)
}

fn validate_controllers(controllers: &[Controller]) -> Result<(), RequestError> {
    if controllers.len() > MAX_CONTROLLERS {
        return Err(RequestError::TooManyControllers(controllers.len()));
    }
    Ok(())
}

impl RequestKind for Issuance {
    const TYPE: RequestType = RequestType::Issuance;

    fn base(&self) -> &RequestBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut RequestBase {
        &mut self.base
    }

    fn write_fields(&self, preimage: &mut Preimage) -> Result<(), RequestError> {
        let symbol = self.symbol.as_deref().ok_or(RequestError::Missing("symbol"))?;
        let name = self.name.as_deref().ok_or(RequestError::Missing("name"))?;
        validate_symbol(symbol)?;
        validate_name(name)?;
        validate_fee_rate(self.fee_type, self.fee_rate)?;
        validate_controllers(&self.controllers)?;
        check_text("issuerInfo", &self.issuer_info, MAX_ISSUER_INFO_BYTES)?;
        let token_id = match self.token_id {
            Some(id) => id,
            None => self.derived_token_id()?,
        };

        preimage
            .hash(&token_id)
            .utf8(symbol)
            .utf8(name)
            .amount(self.total_supply)
            .byte(self.fee_type.code())
            .amount(self.fee_rate)
            .bitfield(self.settings.bits());
        for controller in &self.controllers {
            preimage
                .key(&controller.account)
                .bitfield(controller.privileges.bits());
        }
        preimage.utf8(&self.issuer_info);
        Ok(())
    }

    fn write_json(&self, json: &mut Map<String, Value>) {
        write_token_json(json, self.token_id());
        if let Some(symbol) = &self.symbol {
            json.insert("symbol".into(), json!(symbol));
        }
        if let Some(name) = &self.name {
            json.insert("name".into(), json!(name));
        }
        json.insert("total_supply".into(), json!(self.total_supply.to_string()));
        json.insert("fee_type".into(), json!(self.fee_type.as_str()));
        json.insert("fee_rate".into(), json!(self.fee_rate.to_string()));
        json.insert("settings".into(), self.settings.to_json());
        json.insert(
            "controllers".into(),
            Value::Array(self.controllers.iter().map(Controller::to_json).collect()),
        );
        json.insert("issuer_info".into(), json!(self.issuer_info));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{GENESIS_HASH, MINIMUM_FEE};
    use crate::crypto::blake2b_256;
    use crate::request::{Privilege, Privileges, Setting};

    fn fixture() -> Issuance {
        let mut request = Issuance::new();
        request.base_mut().set_origin(PublicKey([1; 32]));
        request.base_mut().set_previous(GENESIS_HASH);
        request.base_mut().set_fee(MINIMUM_FEE);
        request.base_mut().set_sequence(0);
        request.set_symbol("TEST").unwrap();
        request.set_name("Test Token").unwrap();
        request.set_total_supply(Amount(1_000_000));
        request
    }

    #[test]
    fn test_derived_token_id() {
        let request = fixture();
        let mut expected = vec![1u8; 32];
        expected.extend_from_slice(&[0u8; 32]);
        expected.extend_from_slice(b"TESTTest Token");
        assert_eq!(request.token_id().unwrap(), blake2b_256(&expected));
        assert!(!request.is_token_id_frozen());
    }

    #[test]
    fn test_derived_id_tracks_symbol_until_frozen() {
        let mut request = fixture();
        let first = request.token_id().unwrap();
        request.set_symbol("OTHER").unwrap();
        assert_ne!(request.token_id().unwrap(), first);

        let frozen = request.freeze_token_id().unwrap();
        request.set_symbol("THIRD").unwrap();
        assert_eq!(request.token_id().unwrap(), frozen);
    }

    #[test]
    fn test_symbol_rules() {
        let mut request = Issuance::new();
        assert!(request.set_symbol("ABCDEFGH").is_ok());
        assert!(matches!(
            request.set_symbol("ABCDEFGHI"),
            Err(RequestError::TooLong { field: "symbol", .. })
        ));
        assert!(matches!(
            request.set_symbol("AB-C"),
            Err(RequestError::Invalid { field: "symbol", .. })
        ));
        assert!(request.set_symbol("").is_err());
    }

    #[test]
    fn test_name_and_info_limits_are_bytes() {
        let mut request = Issuance::new();
        // 16 characters, 32 bytes
        assert!(request.set_name(&"é".repeat(16)).is_ok());
        assert!(request.set_name(&"é".repeat(17)).is_err());
        assert!(request.set_issuer_info(&"a".repeat(512)).is_ok());
        assert!(request.set_issuer_info(&"a".repeat(513)).is_err());
    }

    #[test]
    fn test_percentage_fee_bound() {
        let mut request = fixture();
        request.set_fee_type(FeeType::Percentage).unwrap();
        assert!(request.set_fee_rate(Amount(100)).is_ok());
        assert_eq!(
            request.set_fee_rate(Amount(101)).unwrap_err(),
            RequestError::FeeRateOutOfRange(Amount(101))
        );
        request.set_fee_type(FeeType::Flat).unwrap();
        request.set_fee_rate(Amount(500)).unwrap();
        assert!(request.set_fee_type(FeeType::Percentage).is_err());
    }

    #[test]
    fn test_hash_rechecks_mutated_fields() {
        let mut request = fixture();
        request.fee_type = FeeType::Percentage;
        request.fee_rate = Amount(250);
        assert!(matches!(request.hash(), Err(RequestError::FeeRateOutOfRange(_))));
    }

    #[test]
    fn test_missing_name_reported() {
        let mut request = fixture();
        request.name = None;
        assert_eq!(request.hash().unwrap_err(), RequestError::Missing("name"));
    }

    #[test]
    fn test_preimage_layout() {
        let mut request = fixture();
        request.set_settings(Settings::empty().with(Setting::Issuance).with(Setting::ModifyWhitelist));
        request
            .set_controllers(vec![Controller::new(
                PublicKey([7; 32]),
                Privileges::empty().with(Privilege::Burn),
            )])
            .unwrap();
        request.set_issuer_info("{}").unwrap();
        let token_id = request.token_id().unwrap();
        let preimage = request.preimage().unwrap();

        let mut expected = Preimage::base(RequestType::Issuance, request.base()).unwrap().as_bytes().to_vec();
        expected.extend_from_slice(&token_id.0);
        expected.extend_from_slice(b"TEST");
        expected.extend_from_slice(b"Test Token");
        expected.extend_from_slice(&1_000_000u128.to_be_bytes());
        expected.push(1);
        expected.extend_from_slice(&[0u8; 16]);
        expected.extend_from_slice(&[0x01, 0x02, 0, 0, 0, 0, 0, 0]);
        expected.extend_from_slice(&[7u8; 32]);
        expected.extend_from_slice(&[0, 0, 0x02, 0, 0, 0, 0, 0]);
        expected.extend_from_slice(b"{}");
        assert_eq!(preimage.as_bytes(), expected.as_slice());
    }

    #[test]
    fn test_json_roundtrip() {
        let mut request = fixture();
        request.set_settings(Settings::empty().with(Setting::Revoke));
        request
            .set_controllers(vec![Controller::new(PublicKey([7; 32]), Privileges::all())])
            .unwrap();
        let json = request.to_json();
        assert_eq!(json["settings"], json!(["revoke"]));
        assert_eq!(json["fee_type"], "flat");
        let parsed = Issuance::from_json(&json).unwrap();
        assert_eq!(parsed.hash().unwrap(), request.hash().unwrap());
        assert!(parsed.is_token_id_frozen());
    }

    #[test]
    fn test_canonical_options() {
        let value = json!({
            "origin": PublicKey([1; 32]).to_hex(),
            "previous": GENESIS_HASH.to_hex(),
            "sequence": 0,
            "fee": MINIMUM_FEE.to_string(),
            "symbol": "TEST",
            "name": "Test Token",
            "totalSupply": "1000000",
            "total_supply": "5",
            "feeType": "percentage",
            "feeRate": "10",
        });
        let request = Issuance::from_json(&value).unwrap();
        assert_eq!(request.total_supply(), Amount(1_000_000));
        assert_eq!(request.fee_type(), FeeType::Percentage);
    }
}
