//! In-memory delegate shared by the integration tests

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use logos_sdk::codec::Amount;
use logos_sdk::constants::MINIMUM_FEE;
use logos_sdk::crypto::{Hash, PrivateKey, PublicKey};
use logos_sdk::request::{self, Request, RequestKind, Transaction};
use logos_sdk::rpc::{AccountInfo, Rpc, RpcError};

/// Records every publish and answers lookups from canned data
#[derive(Default)]
pub struct RecordingRpc {
    pub published: Mutex<Vec<Request>>,
    pub infos: Mutex<HashMap<String, AccountInfo>>,
    pub histories: Mutex<HashMap<String, Vec<Value>>>,
    pub delegates: Mutex<Vec<String>>,
    pub fail_publish: AtomicBool,
}

impl RecordingRpc {
    pub fn set_info(&self, address: &str, info: AccountInfo) {
        self.infos.lock().unwrap().insert(address.to_string(), info);
    }

    pub fn set_history(&self, address: &str, requests: &[Request]) {
        let raw = requests.iter().map(|r| r.to_json()).collect();
        self.histories.lock().unwrap().insert(address.to_string(), raw);
    }

    pub fn published(&self) -> Vec<Request> {
        self.published.lock().unwrap().clone()
    }

    pub fn fail_publishing(&self) {
        self.fail_publish.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl Rpc for RecordingRpc {
    async fn accounts_info(&self, address: &str) -> Result<Option<AccountInfo>, RpcError> {
        Ok(self.infos.lock().unwrap().get(address).cloned())
    }

    async fn accounts_history(&self, address: &str, _count: Option<u32>) -> Result<Vec<Value>, RpcError> {
        Ok(self.histories.lock().unwrap().get(address).cloned().unwrap_or_default())
    }

    async fn requests_info(&self, hash: &Hash) -> Result<Option<Value>, RpcError> {
        let histories = self.histories.lock().unwrap();
        let found = histories
            .values()
            .flatten()
            .find(|raw| raw.get("hash").and_then(|h| h.as_str()) == Some(hash.to_hex().as_str()))
            .cloned();
        Ok(found)
    }

    async fn requests_publish(&self, request: &Request) -> Result<Hash, RpcError> {
        if self.fail_publish.load(Ordering::SeqCst) {
            return Err(RpcError::Transport("connection refused".into()));
        }
        let hash = request.hash().map_err(|e| RpcError::Node(e.to_string()))?;
        self.published.lock().unwrap().push(request.clone());
        Ok(hash)
    }

    fn update_delegates(&self, delegates: Vec<String>) {
        *self.delegates.lock().unwrap() = delegates;
    }
}

pub fn key(seed: u8) -> PrivateKey {
    PrivateKey::from_bytes(&[seed; 32])
}

/// A signed base-currency send from `from`
pub fn signed_send(from: &PrivateKey, previous: Hash, sequence: u32, payments: &[(PublicKey, u128)]) -> Request {
    let mut send = request::Send::new();
    let base = send.base_mut();
    base.set_origin(from.public_key());
    base.set_previous(previous);
    base.set_sequence(sequence);
    base.set_fee(MINIMUM_FEE);
    send.set_transactions(
        payments
            .iter()
            .map(|(to, amount)| Transaction::new(*to, Amount(*amount)))
            .collect(),
    )
    .unwrap();
    send.sign(&from.to_bytes()).unwrap();
    send.into()
}

/// A signed token send from `from`
pub fn signed_token_send(
    from: &PrivateKey,
    previous: Hash,
    sequence: u32,
    token_id: Hash,
    token_fee: u128,
    payments: &[(PublicKey, u128)],
) -> Request {
    let mut send = request::TokenSend::new();
    let base = send.base_mut();
    base.set_origin(from.public_key());
    base.set_previous(previous);
    base.set_sequence(sequence);
    base.set_fee(MINIMUM_FEE);
    send.set_token_id(token_id);
    send.set_token_fee(Amount(token_fee));
    send.set_transactions(
        payments
            .iter()
            .map(|(to, amount)| Transaction::new(*to, Amount(*amount)))
            .collect(),
    )
    .unwrap();
    send.sign(&from.to_bytes()).unwrap();
    send.into()
}

/// `n` minimum fees
pub fn fees(n: u128) -> u128 {
    MINIMUM_FEE.0 * n
}
