//! Fields shared by every request and the behaviour built on them

use serde_json::{json, Map, Value};

use super::options::Options;
use super::{Preimage, RequestError, RequestType};
use crate::codec::Amount;
use crate::constants::REQUEST_VERSION;
use crate::crypto::{Hash, PrivateKey, PublicKey, Signature};

/// Work value sent when no proof of work has been attached
pub const EMPTY_WORK: &str = "0000000000000000";

/// Base request fields. `work`, `timestamp` and `published` never enter the
/// hash preimage.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestBase {
    origin: Option<PublicKey>,
    previous: Option<Hash>,
    sequence: Option<u32>,
    fee: Option<Amount>,
    signature: Option<Signature>,
    work: Option<String>,
    timestamp: Option<u64>,
    published: bool,
}

impl RequestBase {
    pub(crate) fn from_options(options: &Options<'_>) -> Result<Self, RequestError> {
        Ok(RequestBase {
            origin: options.key("origin", "origin", "origin")?,
            previous: options.hash("previous", "previous", "previous")?,
            sequence: options.u32("sequence", "sequence", "sequence")?,
            fee: options.amount("fee", "fee", "fee")?,
            signature: options.signature()?,
            work: options.str("work", "work", "work")?.map(str::to_string),
            timestamp: timestamp_from(options)?,
            published: false,
        })
    }

    pub fn version(&self) -> u8 {
        REQUEST_VERSION
    }

    pub fn origin(&self) -> Option<PublicKey> {
        self.origin
    }

    pub fn set_origin(&mut self, origin: PublicKey) {
        self.origin = Some(origin);
    }

    /// Accepts a hex key or an address
    pub fn set_origin_str(&mut self, origin: &str) -> Result<(), RequestError> {
        self.origin = Some(PublicKey::parse(origin)?);
        Ok(())
    }

    pub fn origin_address(&self) -> Option<String> {
        self.origin.map(|o| o.to_address())
    }

    pub fn previous(&self) -> Option<Hash> {
        self.previous
    }

    pub fn set_previous(&mut self, previous: Hash) {
        self.previous = Some(previous);
    }

    pub fn set_previous_str(&mut self, previous: &str) -> Result<(), RequestError> {
        self.previous = Some(super::options::parse_hash(previous, "previous")?);
        Ok(())
    }

    pub fn sequence(&self) -> Option<u32> {
        self.sequence
    }

    pub fn set_sequence(&mut self, sequence: u32) {
        self.sequence = Some(sequence);
    }

    pub fn fee(&self) -> Option<Amount> {
        self.fee
    }

    pub fn set_fee(&mut self, fee: Amount) {
        self.fee = Some(fee);
    }

    pub fn set_fee_str(&mut self, fee: &str) -> Result<(), RequestError> {
        self.fee = Some(fee.parse().map_err(|e| RequestError::amount("fee", e))?);
        Ok(())
    }

    pub fn signature(&self) -> Option<Signature> {
        self.signature
    }

    pub fn set_signature(&mut self, signature: Option<Signature>) {
        self.signature = signature;
    }

    pub fn work(&self) -> Option<&str> {
        self.work.as_deref()
    }

    pub fn set_work(&mut self, work: impl Into<String>) {
        self.work = Some(work.into());
    }

    pub fn timestamp(&self) -> Option<u64> {
        self.timestamp
    }

    pub fn set_timestamp(&mut self, timestamp: u64) {
        self.timestamp = Some(timestamp);
    }

    pub fn published(&self) -> bool {
        self.published
    }

    pub fn set_published(&mut self, published: bool) {
        self.published = published;
    }

    fn write_json(&self, request_type: RequestType, json: &mut Map<String, Value>) {
        json.insert("type".into(), json!(request_type.as_str()));
        if let Some(origin) = self.origin {
            json.insert("origin".into(), json!(origin.to_address()));
        }
        if let Some(previous) = self.previous {
            json.insert("previous".into(), json!(previous.to_hex()));
        }
        if let Some(sequence) = self.sequence {
            json.insert("sequence".into(), json!(sequence));
        }
        if let Some(fee) = self.fee {
            json.insert("fee".into(), json!(fee.to_string()));
        }
        json.insert(
            "work".into(),
            json!(self.work.as_deref().unwrap_or(EMPTY_WORK)),
        );
        if let Some(signature) = self.signature {
            json.insert("signature".into(), json!(signature.to_hex()));
        }
        if let Some(timestamp) = self.timestamp {
            json.insert("timestamp".into(), json!(timestamp.to_string()));
        }
    }
}

/// Network timestamps are milliseconds and arrive as strings
fn timestamp_from(options: &Options<'_>) -> Result<Option<u64>, RequestError> {
    match options.get("timestamp", "timestamp") {
        None => Ok(None),
        Some(Value::String(s)) => s
            .parse()
            .map(Some)
            .map_err(|_| RequestError::invalid("timestamp", format!("'{}' is not an integer", s))),
        Some(Value::Number(n)) => n
            .as_u64()
            .map(Some)
            .ok_or_else(|| RequestError::invalid("timestamp", format!("{} is not an integer", n))),
        Some(other) => Err(RequestError::invalid("timestamp", format!("unexpected {}", other))),
    }
}

/// Behaviour shared by every concrete request.
///
/// Implementors supply their tag, base fields, the variant tail of the
/// preimage and their JSON fields; hashing, signing and verification are
/// provided.
pub trait RequestKind {
    const TYPE: RequestType;

    fn base(&self) -> &RequestBase;

    fn base_mut(&mut self) -> &mut RequestBase;

    /// Append the variant fields after the shared prefix. This re-checks
    /// every field, so it is the authority on whether the request is
    /// well formed.
    fn write_fields(&self, preimage: &mut Preimage) -> Result<(), RequestError>;

    fn write_json(&self, json: &mut Map<String, Value>);

    fn preimage(&self) -> Result<Preimage, RequestError> {
        let mut preimage = Preimage::base(Self::TYPE, self.base())?;
        self.write_fields(&mut preimage)?;
        Ok(preimage)
    }

    /// Recomputed on every call
    fn hash(&self) -> Result<Hash, RequestError> {
        Ok(self.preimage()?.digest())
    }

    /// Sign the request hash and return the result of verifying it
    fn sign(&mut self, private_key: &[u8]) -> Result<bool, RequestError> {
        let key = PrivateKey::from_slice(private_key)?;
        let hash = self.hash()?;
        self.base_mut().set_signature(Some(key.sign(&hash)));
        self.verify()
    }

    fn verify(&self) -> Result<bool, RequestError> {
        let hash = self.hash()?;
        let signature = self
            .base()
            .signature()
            .ok_or(RequestError::Missing("signature"))?;
        let origin = self.base().origin().ok_or(RequestError::Missing("origin"))?;
        Ok(origin.verify(&hash, &signature))
    }

    fn to_json(&self) -> Value {
        let mut json = Map::new();
        self.base().write_json(Self::TYPE, &mut json);
        if let Ok(hash) = self.hash() {
            json.insert("hash".into(), json!(hash.to_hex()));
        }
        self.write_json(&mut json);
        Value::Object(json)
    }
}

/// Token ID plus its derived token account address
pub(crate) fn write_token_json(json: &mut Map<String, Value>, token_id: Option<Hash>) {
    if let Some(id) = token_id {
        json.insert("token_id".into(), json!(id.to_hex()));
        json.insert(
            "token_account".into(),
            json!(PublicKey::from(id).to_address()),
        );
    }
}

pub(crate) fn require_token_id(token_id: Option<Hash>) -> Result<Hash, RequestError> {
    token_id.ok_or(RequestError::Missing("tokenID"))
}
