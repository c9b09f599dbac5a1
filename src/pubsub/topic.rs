use serde_json::Value;
use thiserror::Error;

use crate::codec::{is_valid_address, AddressError};
use crate::request::{Request, RequestError};

/// Topic carrying delegate list updates
pub const DELEGATE_CHANGE_TOPIC: &str = "delegateChange";

const ACCOUNT_TOPIC_PREFIX: &str = "account/";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PubSubError {
    #[error("Unknown topic '{0}'")]
    UnknownTopic(String),
    #[error("Malformed payload: {0}")]
    Payload(String),
    #[error(transparent)]
    Address(#[from] AddressError),
    #[error(transparent)]
    Request(#[from] RequestError),
}

/// Parsed subscription topic
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Topic {
    Account(String),
    DelegateChange,
}

impl Topic {
    pub fn parse(topic: &str) -> Result<Self, PubSubError> {
        if topic == DELEGATE_CHANGE_TOPIC {
            return Ok(Topic::DelegateChange);
        }
        match topic.strip_prefix(ACCOUNT_TOPIC_PREFIX) {
            Some(address) if is_valid_address(address) => Ok(Topic::Account(address.to_string())),
            Some(_) => Err(AddressError::Format(format!("bad address in topic '{}'", topic)).into()),
            None => Err(PubSubError::UnknownTopic(topic.to_string())),
        }
    }

    pub fn name(&self) -> String {
        match self {
            Topic::Account(address) => format!("{}{}", ACCOUNT_TOPIC_PREFIX, address),
            Topic::DelegateChange => DELEGATE_CHANGE_TOPIC.to_string(),
        }
    }
}

/// One delivery from the broker
#[derive(Debug, Clone, PartialEq)]
pub enum PubSubMessage {
    /// A request confirmed on the account named by the topic
    Request { topic: String, request: Request },
    DelegateChange(Vec<String>),
}

impl PubSubMessage {
    pub fn parse(topic: &str, payload: &[u8]) -> Result<Self, PubSubError> {
        let value: Value =
            serde_json::from_slice(payload).map_err(|e| PubSubError::Payload(e.to_string()))?;
        match Topic::parse(topic)? {
            Topic::Account(address) => Ok(PubSubMessage::Request {
                topic: address,
                request: Request::from_json(&value)?,
            }),
            Topic::DelegateChange => Ok(PubSubMessage::DelegateChange(delegates_from(&value)?)),
        }
    }
}

/// Topics a wallet subscribes to: the delegate feed plus one per address
pub fn subscription_topics<'a, I>(addresses: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    std::iter::once(DELEGATE_CHANGE_TOPIC.to_string())
        .chain(addresses.into_iter().map(|a| Topic::Account(a.to_string()).name()))
        .collect()
}

/// Delegate lists arrive either as an array or as an index-keyed object
fn delegates_from(value: &Value) -> Result<Vec<String>, PubSubError> {
    let items: Vec<&Value> = match value {
        Value::Array(items) => items.iter().collect(),
        Value::Object(map) => map.values().collect(),
        other => return Err(PubSubError::Payload(format!("expected delegates, got {}", other))),
    };
    items
        .into_iter()
        .map(|v| {
            v.as_str()
                .map(str::to_string)
                .ok_or_else(|| PubSubError::Payload(format!("delegate {} is not a string", v)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::PublicKey;
    use crate::request::{RequestKind, Send};

    fn address() -> String {
        PublicKey([3; 32]).to_address()
    }

    #[test]
    fn test_topic_parse() {
        let topic = format!("account/{}", address());
        assert_eq!(Topic::parse(&topic).unwrap(), Topic::Account(address()));
        assert_eq!(Topic::parse("delegateChange").unwrap(), Topic::DelegateChange);
        assert!(matches!(Topic::parse("blocks"), Err(PubSubError::UnknownTopic(_))));
        assert!(matches!(Topic::parse("account/lgs_nope"), Err(PubSubError::Address(_))));
    }

    #[test]
    fn test_delegate_change_payload() {
        let message = PubSubMessage::parse("delegateChange", br#"{"0":"10.0.0.1","1":"10.0.0.2"}"#).unwrap();
        match message {
            PubSubMessage::DelegateChange(mut list) => {
                list.sort();
                assert_eq!(list, vec!["10.0.0.1", "10.0.0.2"]);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_request_payload() {
        let send = Send::new();
        let payload = send.to_json().to_string();
        let topic = format!("account/{}", address());
        match PubSubMessage::parse(&topic, payload.as_bytes()).unwrap() {
            PubSubMessage::Request { topic, request } => {
                assert_eq!(topic, address());
                assert!(matches!(request, Request::Send(_)));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_subscription_topics() {
        let a = address();
        let topics = subscription_topics([a.as_str()]);
        assert_eq!(topics, vec!["delegateChange".to_string(), format!("account/{}", a)]);
    }
}
