//! Tagged union over every request variant

use serde_json::Value;

use super::{
    AdjustFee, AdjustUserStatus, Burn, ChangeSetting, Distribute, ImmuteSetting, Issuance,
    IssueAdditional, Preimage, RequestBase, RequestError, RequestKind, RequestType, Revoke, Send,
    TokenSend, Transaction, UpdateController, UpdateIssuerInfo, WithdrawFee, WithdrawLogos,
};
use crate::codec::Amount;
use crate::crypto::{Hash, PublicKey};

/// Any request an account chain can hold
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    Send(Send),
    Issuance(Issuance),
    IssueAdditional(IssueAdditional),
    ChangeSetting(ChangeSetting),
    ImmuteSetting(ImmuteSetting),
    Revoke(Revoke),
    AdjustUserStatus(AdjustUserStatus),
    AdjustFee(AdjustFee),
    UpdateIssuerInfo(UpdateIssuerInfo),
    UpdateController(UpdateController),
    Burn(Burn),
    Distribute(Distribute),
    WithdrawFee(WithdrawFee),
    WithdrawLogos(WithdrawLogos),
    TokenSend(TokenSend),
}

macro_rules! dispatch {
    ($self:expr, $r:ident => $body:expr) => {
        match $self {
            Request::Send($r) => $body,
            Request::Issuance($r) => $body,
            Request::IssueAdditional($r) => $body,
            Request::ChangeSetting($r) => $body,
            Request::ImmuteSetting($r) => $body,
            Request::Revoke($r) => $body,
            Request::AdjustUserStatus($r) => $body,
            Request::AdjustFee($r) => $body,
            Request::UpdateIssuerInfo($r) => $body,
            Request::UpdateController($r) => $body,
            Request::Burn($r) => $body,
            Request::Distribute($r) => $body,
            Request::WithdrawFee($r) => $body,
            Request::WithdrawLogos($r) => $body,
            Request::TokenSend($r) => $body,
        }
    };
}

macro_rules! impl_from {
    ($($variant:ident),+) => {
        $(
            impl From<$variant> for Request {
                fn from(request: $variant) -> Self {
                    Request::$variant(request)
                }
            }
        )+
    };
}

impl_from!(
    Send,
    Issuance,
    IssueAdditional,
    ChangeSetting,
    ImmuteSetting,
    Revoke,
    AdjustUserStatus,
    AdjustFee,
    UpdateIssuerInfo,
    UpdateController,
    Burn,
    Distribute,
    WithdrawFee,
    WithdrawLogos,
    TokenSend
);

impl Request {
    /// Build the variant named by the `type` field
    pub fn from_json(value: &Value) -> Result<Self, RequestError> {
        let tag = value
            .get("type")
            .and_then(Value::as_str)
            .ok_or(RequestError::Missing("type"))?;
        let request = match tag.parse::<RequestType>()? {
            RequestType::Send => Send::from_json(value)?.into(),
            RequestType::Issuance => Issuance::from_json(value)?.into(),
            RequestType::IssueAdditional => IssueAdditional::from_json(value)?.into(),
            RequestType::ChangeSetting => ChangeSetting::from_json(value)?.into(),
            RequestType::ImmuteSetting => ImmuteSetting::from_json(value)?.into(),
            RequestType::Revoke => Revoke::from_json(value)?.into(),
            RequestType::AdjustUserStatus => AdjustUserStatus::from_json(value)?.into(),
            RequestType::AdjustFee => AdjustFee::from_json(value)?.into(),
            RequestType::UpdateIssuerInfo => UpdateIssuerInfo::from_json(value)?.into(),
            RequestType::UpdateController => UpdateController::from_json(value)?.into(),
            RequestType::Burn => Burn::from_json(value)?.into(),
            RequestType::Distribute => Distribute::from_json(value)?.into(),
            RequestType::WithdrawFee => WithdrawFee::from_json(value)?.into(),
            RequestType::WithdrawLogos => WithdrawLogos::from_json(value)?.into(),
            RequestType::TokenSend => TokenSend::from_json(value)?.into(),
        };
        Ok(request)
    }

    pub fn from_json_str(json: &str) -> Result<Self, RequestError> {
        let value: Value =
            serde_json::from_str(json).map_err(|e| RequestError::Json(e.to_string()))?;
        Self::from_json(&value)
    }

    pub fn request_type(&self) -> RequestType {
        dispatch!(self, r => kind_of(r))
    }

    pub fn base(&self) -> &RequestBase {
        dispatch!(self, r => r.base())
    }

    pub fn base_mut(&mut self) -> &mut RequestBase {
        dispatch!(self, r => r.base_mut())
    }

    pub fn preimage(&self) -> Result<Preimage, RequestError> {
        dispatch!(self, r => r.preimage())
    }

    pub fn hash(&self) -> Result<Hash, RequestError> {
        dispatch!(self, r => r.hash())
    }

    pub fn sign(&mut self, private_key: &[u8]) -> Result<bool, RequestError> {
        dispatch!(self, r => r.sign(private_key))
    }

    pub fn verify(&self) -> Result<bool, RequestError> {
        dispatch!(self, r => r.verify())
    }

    pub fn to_json(&self) -> Value {
        dispatch!(self, r => r.to_json())
    }

    pub fn origin(&self) -> Option<PublicKey> {
        self.base().origin()
    }

    pub fn previous(&self) -> Option<Hash> {
        self.base().previous()
    }

    pub fn sequence(&self) -> Option<u32> {
        self.base().sequence()
    }

    pub fn fee(&self) -> Amount {
        self.base().fee().unwrap_or(Amount::ZERO)
    }

    pub fn published(&self) -> bool {
        self.base().published()
    }

    pub fn set_published(&mut self, published: bool) {
        self.base_mut().set_published(published);
    }

    /// `None` for plain sends
    pub fn token_id(&self) -> Option<Hash> {
        match self {
            Request::Send(_) => None,
            Request::Issuance(r) => r.token_id(),
            Request::IssueAdditional(r) => r.token_id(),
            Request::ChangeSetting(r) => r.token_id(),
            Request::ImmuteSetting(r) => r.token_id(),
            Request::Revoke(r) => r.token_id(),
            Request::AdjustUserStatus(r) => r.token_id(),
            Request::AdjustFee(r) => r.token_id(),
            Request::UpdateIssuerInfo(r) => r.token_id(),
            Request::UpdateController(r) => r.token_id(),
            Request::Burn(r) => r.token_id(),
            Request::Distribute(r) => r.token_id(),
            Request::WithdrawFee(r) => r.token_id(),
            Request::WithdrawLogos(r) => r.token_id(),
            Request::TokenSend(r) => r.token_id(),
        }
    }

    /// Token account key, for requests that carry a token ID
    pub fn token_account(&self) -> Option<PublicKey> {
        self.token_id().map(PublicKey::from)
    }

    /// Every payment this request makes, empty for requests that move
    /// nothing
    pub fn transactions(&self) -> Vec<Transaction> {
        match self {
            Request::Send(r) => r.transactions().to_vec(),
            Request::TokenSend(r) => r.transactions().to_vec(),
            Request::Revoke(r) => r.transaction().copied().into_iter().collect(),
            Request::Distribute(r) => r.transaction().copied().into_iter().collect(),
            Request::WithdrawFee(r) => r.transaction().copied().into_iter().collect(),
            Request::WithdrawLogos(r) => r.transaction().copied().into_iter().collect(),
            _ => Vec::new(),
        }
    }

    /// Accounts that receive something from this request
    pub fn destinations(&self) -> Vec<PublicKey> {
        let mut out: Vec<PublicKey> = Vec::new();
        for tx in self.transactions() {
            if !out.contains(&tx.destination) {
                out.push(tx.destination);
            }
        }
        out
    }
}

fn kind_of<R: RequestKind>(_: &R) -> RequestType {
    R::TYPE
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::test_support::fill_base;
    use serde_json::json;

    #[test]
    fn test_from_json_dispatches_on_type() {
        let mut burn = Burn::new();
        fill_base(&mut burn);
        burn.set_token_id(Hash([4; 32]));
        burn.set_amount(Amount(3));
        let parsed = Request::from_json(&burn.to_json()).unwrap();
        assert_eq!(parsed.request_type(), RequestType::Burn);
        assert_eq!(parsed.hash().unwrap(), burn.hash().unwrap());
        assert_eq!(parsed.token_id(), Some(Hash([4; 32])));
    }

    #[test]
    fn test_unknown_and_missing_type() {
        assert_eq!(
            Request::from_json(&json!({ "type": "mint" })).unwrap_err(),
            RequestError::UnknownType("mint".into())
        );
        assert_eq!(
            Request::from_json(&json!({})).unwrap_err(),
            RequestError::Missing("type")
        );
        assert!(matches!(
            Request::from_json_str("{not json"),
            Err(RequestError::Json(_))
        ));
    }

    #[test]
    fn test_transactions_projection() {
        let mut revoke = Revoke::new();
        revoke.set_source(PublicKey([1; 32]));
        revoke.set_transaction(Transaction::new(PublicKey([2; 32]), Amount(5)));
        let request = Request::from(revoke);
        assert_eq!(request.destinations(), vec![PublicKey([2; 32])]);
        assert!(Request::from(Burn::new()).transactions().is_empty());
    }

    #[test]
    fn test_published_flag_survives_clone() {
        let mut request = Request::from(Send::new());
        assert!(!request.published());
        request.set_published(true);
        assert!(request.clone().published());
    }
}
