//! Account module - local mirrors of account chains
//!
//! An account keeps three ordered request lists: its confirmed chain, the
//! confirmed requests it received, and the speculative pending chain it has
//! yet to see confirmed. Balances are derived from those lists, either by a
//! full replay or incrementally as confirmations arrive.

mod balance;
mod chain;
mod combine;
mod logos;
mod token;

pub use balance::{Ledger, Tally};
pub use chain::*;
pub use logos::LogosAccount;
pub use token::{AccountStatus, TokenAccount, TokenAccounts, TokenState};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::crypto::{Hash, SignatureError};
use crate::request::RequestError;
use crate::rpc::RpcError;

/// Chain integrity failures, naming the broken invariant
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChainError {
    #[error("Request {index} links to {found}, expected {expected}")]
    Linkage { index: usize, expected: Hash, found: Hash },
    #[error("Request {index} has sequence {found}, expected {expected}")]
    Sequence { index: usize, expected: u32, found: u32 },
    #[error("Request {index} ({hash}) has an invalid signature")]
    Signature { index: usize, hash: Hash },
    #[error("Request {index} belongs to another token")]
    TokenMismatch { index: usize },
    #[error("Request {index} ({hash}) does not concern this account")]
    Unrelated { index: usize, hash: Hash },
    #[error("Request {index} is malformed: {source}")]
    Malformed { index: usize, source: RequestError },
    #[error("Chain has used every sequence number")]
    SequenceExhausted,
}

/// Account level errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AccountError {
    /// The request is well formed but the account state does not allow it
    #[error("Request rejected: {reason}")]
    Rejected { reason: String },
    #[error("Request {0} does not carry a valid signature")]
    BadSignature(Hash),
    #[error("Token accounts hold no private key and cannot sign")]
    NoPrivateKey,
    #[error("No token account for {0}")]
    UnknownTokenAccount(Hash),
    #[error(transparent)]
    Request(#[from] RequestError),
    #[error(transparent)]
    Chain(#[from] ChainError),
    #[error(transparent)]
    Rpc(#[from] RpcError),
    #[error(transparent)]
    Signature(#[from] SignatureError),
}

impl AccountError {
    pub(crate) fn rejected(reason: impl Into<String>) -> Self {
        AccountError::Rejected {
            reason: reason.into(),
        }
    }
}

/// Per-account behaviour switches, copied from the wallet options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountOptions {
    /// Replay the whole history on sync instead of loading the frontier only
    pub full_sync: bool,
    /// Verify linkage and signatures after a full sync
    pub validate_sync: bool,
    /// Repack pending sends after each confirmation
    pub batch_sends: bool,
    /// Queue requests that fail local validation instead of rejecting them
    pub lazy_errors: bool,
    /// Load every token account the account holds during sync
    pub token_sync: bool,
}

impl Default for AccountOptions {
    fn default() -> Self {
        AccountOptions {
            full_sync: true,
            validate_sync: true,
            batch_sends: true,
            lazy_errors: false,
            token_sync: false,
        }
    }
}
