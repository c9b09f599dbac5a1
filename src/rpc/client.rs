//! HTTP client for delegate nodes

use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::debug;

use super::{select_delegate, AccountInfo, PublishResponse, Rpc, RpcError, RpcOptions};
use crate::crypto::Hash;
use crate::request::Request;

/// Talks to delegates with `rpc_action` JSON posts, directly or through a
/// proxy that forwards to `targetURL`
pub struct HttpRpc {
    inner: Client,
    delegates: RwLock<Vec<String>>,
    proxy: Option<String>,
    port: u16,
}

impl HttpRpc {
    pub fn new(options: &RpcOptions) -> Result<Self, RpcError> {
        let inner = Client::builder()
            .timeout(Duration::from_secs(options.timeout_secs))
            .build()?;
        Ok(HttpRpc {
            inner,
            delegates: RwLock::new(options.delegates.clone()),
            proxy: options.proxy.clone(),
            port: options.port,
        })
    }

    pub fn delegates(&self) -> Vec<String> {
        self.delegates
            .read()
            .map(|d| d.clone())
            .unwrap_or_default()
    }

    fn delegate(&self, index: usize) -> Result<String, RpcError> {
        self.delegates()
            .get(index)
            .cloned()
            .ok_or(RpcError::NoDelegates)
    }

    /// POST one action to a delegate and return the decoded body
    async fn call(&self, delegate: &str, mut body: Value) -> Result<Value, RpcError> {
        let target = format!("http://{}:{}", delegate, self.port);
        let url = match &self.proxy {
            Some(proxy) => {
                body["targetURL"] = json!(target);
                proxy.clone()
            }
            None => target,
        };
        debug!(action = %body["rpc_action"], url = %url, "rpc call");

        let response = self.inner.post(&url).json(&body).send().await?;
        if !response.status().is_success() {
            return Err(RpcError::Status(response.status().as_u16()));
        }
        let value: Value = response.json().await?;
        if let Some(error) = value.get("error") {
            return Err(RpcError::Node(
                error.as_str().map(str::to_string).unwrap_or_else(|| error.to_string()),
            ));
        }
        Ok(value)
    }

    /// Reads go to the first delegate
    async fn read(&self, body: Value) -> Result<Value, RpcError> {
        let delegate = self.delegate(0)?;
        self.call(&delegate, body).await
    }
}

#[async_trait]
impl Rpc for HttpRpc {
    async fn accounts_info(&self, address: &str) -> Result<Option<AccountInfo>, RpcError> {
        match self
            .read(json!({ "rpc_action": "account_info", "account": address }))
            .await
        {
            Ok(value) => Ok(Some(serde_json::from_value(value)?)),
            Err(RpcError::Node(message)) if message.contains("not found") => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn accounts_history(&self, address: &str, count: Option<u32>) -> Result<Vec<Value>, RpcError> {
        let mut body = json!({
            "rpc_action": "account_history",
            "account": address,
            "raw": true,
        });
        if let Some(count) = count {
            body["count"] = json!(count.to_string());
        }
        let value = self.read(body).await?;
        let mut history = match value.get("history") {
            Some(Value::Array(items)) => items.clone(),
            Some(Value::String(s)) if s.is_empty() => Vec::new(),
            None | Some(Value::Null) => Vec::new(),
            Some(other) => return Err(RpcError::Decode(format!("history is not a list: {}", other))),
        };
        // nodes answer newest first
        history.reverse();
        Ok(history)
    }

    async fn requests_info(&self, hash: &Hash) -> Result<Option<Value>, RpcError> {
        match self
            .read(json!({ "rpc_action": "request_info", "hash": hash.to_hex() }))
            .await
        {
            Ok(value) => Ok(Some(value)),
            Err(RpcError::Node(message)) if message.contains("not found") => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn requests_publish(&self, request: &Request) -> Result<Hash, RpcError> {
        let index = select_delegate(request, self.delegates().len())?;
        let delegate = self.delegate(index)?;
        let body = json!({
            "rpc_action": "process",
            "request": request.to_json().to_string(),
        });
        let value = self.call(&delegate, body).await?;
        let response: PublishResponse = serde_json::from_value(value)?;
        Ok(response.hash)
    }

    fn update_delegates(&self, delegates: Vec<String>) {
        if let Ok(mut current) = self.delegates.write() {
            *current = delegates;
        }
    }
}
