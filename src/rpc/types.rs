//! Wire types returned by delegates

use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::codec::Amount;
use crate::constants::{DEFAULT_RPC_PORT, DEFAULT_RPC_TIMEOUT_SECS, GENESIS_HASH};
use crate::crypto::Hash;

/// How to reach the delegates
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RpcOptions {
    pub delegates: Vec<String>,
    pub proxy: Option<String>,
    pub port: u16,
    #[serde(alias = "timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for RpcOptions {
    fn default() -> Self {
        RpcOptions {
            delegates: Vec::new(),
            proxy: None,
            port: DEFAULT_RPC_PORT,
            timeout_secs: DEFAULT_RPC_TIMEOUT_SECS,
        }
    }
}

/// `account_info` response. Token accounts fill the token fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountInfo {
    #[serde(rename = "type")]
    pub account_type: Option<String>,
    pub frontier: Hash,
    pub receive_tip: Hash,
    pub balance: Amount,
    #[serde(deserialize_with = "u32_or_string")]
    pub sequence: Option<u32>,
    pub tokens: HashMap<String, TokenEntry>,

    pub token_balance: Option<Amount>,
    pub token_fee_balance: Option<Amount>,
    pub total_supply: Option<Amount>,
    pub symbol: Option<String>,
    pub name: Option<String>,
    pub issuer_info: Option<String>,
    pub fee_type: Option<String>,
    pub fee_rate: Option<Amount>,
    pub settings: Option<Value>,
    pub controllers: Option<Vec<Value>>,
}

impl Default for AccountInfo {
    fn default() -> Self {
        AccountInfo {
            account_type: None,
            frontier: GENESIS_HASH,
            receive_tip: GENESIS_HASH,
            balance: Amount::ZERO,
            sequence: None,
            tokens: HashMap::new(),
            token_balance: None,
            token_fee_balance: None,
            total_supply: None,
            symbol: None,
            name: None,
            issuer_info: None,
            fee_type: None,
            fee_rate: None,
            settings: None,
            controllers: None,
        }
    }
}

impl AccountInfo {
    pub fn is_token_account(&self) -> bool {
        self.account_type.as_deref() == Some("TokenAccount")
    }

    /// Holdings of one token, keyed by its hex ID
    pub fn token(&self, token_id: &Hash) -> Option<&TokenEntry> {
        self.tokens
            .get(&token_id.to_hex())
            .or_else(|| self.tokens.get(&token_id.to_hex().to_lowercase()))
    }
}

/// A user's standing with one token
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenEntry {
    pub balance: Amount,
    #[serde(deserialize_with = "bool_or_string")]
    pub frozen: bool,
    #[serde(deserialize_with = "bool_or_string")]
    pub whitelisted: bool,
}

/// `process` response
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PublishResponse {
    pub hash: Hash,
}

/// Nodes render some flags as `"true"` / `"false"`
fn bool_or_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Text(String),
    }
    match Flag::deserialize(deserializer)? {
        Flag::Bool(b) => Ok(b),
        Flag::Text(s) => match s.as_str() {
            "true" => Ok(true),
            "false" | "" => Ok(false),
            other => Err(serde::de::Error::custom(format!("expected a boolean, got '{}'", other))),
        },
    }
}

fn u32_or_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Number {
        Int(u32),
        Text(String),
    }
    match Option::<Number>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Number::Int(n)) => Ok(Some(n)),
        Some(Number::Text(s)) => s.parse().map(Some).map_err(serde::de::Error::custom),
    }
}
