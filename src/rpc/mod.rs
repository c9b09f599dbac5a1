//! RPC collaborator - account lookups, history and request publishing
//!
//! Accounts only ever talk to the network through the [`Rpc`] trait, so the
//! HTTP client can be swapped for an in-memory double in tests.

mod client;
mod types;

pub use client::*;
pub use types::*;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::constants::GENESIS_HASH;
use crate::crypto::Hash;
use crate::request::Request;

/// RPC errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RpcError {
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Delegate answered with HTTP status {0}")]
    Status(u16),
    #[error("Could not decode response: {0}")]
    Decode(String),
    #[error("Node rejected the call: {0}")]
    Node(String),
    #[error("No delegates configured")]
    NoDelegates,
}

impl From<reqwest::Error> for RpcError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            RpcError::Decode(e.to_string())
        } else if let Some(status) = e.status() {
            RpcError::Status(status.as_u16())
        } else {
            RpcError::Transport(e.to_string())
        }
    }
}

impl From<serde_json::Error> for RpcError {
    fn from(e: serde_json::Error) -> Self {
        RpcError::Decode(e.to_string())
    }
}

/// Network operations an account depends on. Every call is a suspension
/// point; callers re-read chain state after awaiting one.
#[async_trait]
pub trait Rpc: std::marker::Send + Sync {
    /// `None` when the node has never seen the account
    async fn accounts_info(&self, address: &str) -> Result<Option<AccountInfo>, RpcError>;

    /// Raw wire requests for an account, oldest first. `count` of `None`
    /// asks for the whole history.
    async fn accounts_history(&self, address: &str, count: Option<u32>) -> Result<Vec<Value>, RpcError>;

    async fn requests_info(&self, hash: &Hash) -> Result<Option<Value>, RpcError>;

    /// Hand a signed request to its delegate, returning the hash the node
    /// computed
    async fn requests_publish(&self, request: &Request) -> Result<Hash, RpcError>;

    /// Replace the delegate list
    fn update_delegates(&self, delegates: Vec<String>);
}

/// Index of the delegate responsible for a request: the last byte of
/// `previous` (or of `origin` for a chain's first request) modulo the
/// delegate count
pub fn select_delegate(request: &Request, delegate_count: usize) -> Result<usize, RpcError> {
    if delegate_count == 0 {
        return Err(RpcError::NoDelegates);
    }
    let previous = request.previous().unwrap_or(GENESIS_HASH);
    let last = if previous == GENESIS_HASH {
        request.origin().map(|o| o.0[31]).unwrap_or(0)
    } else {
        previous.0[31]
    };
    Ok(last as usize % delegate_count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::PublicKey;
    use crate::request::{RequestKind, Send};

    #[test]
    fn test_select_delegate_uses_previous() {
        let mut send = Send::new();
        send.base_mut().set_origin(PublicKey([0xff; 32]));
        let mut previous = [0u8; 32];
        previous[31] = 0x2b;
        send.base_mut().set_previous(Hash(previous));
        let request = Request::from(send);
        assert_eq!(select_delegate(&request, 32).unwrap(), 0x2b % 32);
        assert_eq!(select_delegate(&request, 1).unwrap(), 0);
    }

    #[test]
    fn test_select_delegate_genesis_falls_back_to_origin() {
        let mut send = Send::new();
        let mut origin = [0u8; 32];
        origin[31] = 0x07;
        send.base_mut().set_origin(PublicKey(origin));
        send.base_mut().set_previous(GENESIS_HASH);
        let request = Request::from(send);
        assert_eq!(select_delegate(&request, 4).unwrap(), 3);
    }

    #[test]
    fn test_select_delegate_requires_delegates() {
        let request = Request::from(Send::new());
        assert_eq!(select_delegate(&request, 0).unwrap_err(), RpcError::NoDelegates);
    }
}
