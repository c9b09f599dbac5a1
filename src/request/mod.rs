//! Request module - the signed state transitions an account issues
//!
//! Each variant owns its field set and the tail of its hash preimage; the
//! shared prefix, signing and verification come from [`RequestKind`].

mod adjust_fee;
mod adjust_user_status;
mod base;
mod burn;
mod change_setting;
mod distribute;
mod fields;
mod immute_setting;
mod issuance;
mod issue_additional;
mod kind;
mod options;
mod preimage;
mod request;
mod revoke;
mod send;
mod token_send;
mod update_controller;
mod update_issuer_info;
mod withdraw_fee;
mod withdraw_logos;

pub use adjust_fee::AdjustFee;
pub use adjust_user_status::AdjustUserStatus;
pub use base::{RequestBase, RequestKind, EMPTY_WORK};
pub use burn::Burn;
pub use change_setting::ChangeSetting;
pub use distribute::Distribute;
pub use fields::*;
pub use immute_setting::ImmuteSetting;
pub use issuance::Issuance;
pub use issue_additional::IssueAdditional;
pub use kind::RequestType;
pub use preimage::Preimage;
pub use request::Request;
pub use revoke::Revoke;
pub use send::Send;
pub use token_send::TokenSend;
pub use update_controller::UpdateController;
pub use update_issuer_info::UpdateIssuerInfo;
pub use withdraw_fee::WithdrawFee;
pub use withdraw_logos::WithdrawLogos;

use thiserror::Error;

use crate::codec::{utf8_byte_length, AddressError, Amount, CodecError};
use crate::constants::{MAX_CONTROLLERS, MAX_TRANSACTIONS};
use crate::crypto::SignatureError;

/// Request validation errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RequestError {
    #[error("{0} is not set")]
    Missing(&'static str),
    #[error("Invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
    #[error("{field} is {len} bytes, the limit is {max}")]
    TooLong {
        field: &'static str,
        len: usize,
        max: usize,
    },
    #[error("Unknown {field} '{value}'")]
    UnknownValue { field: &'static str, value: String },
    #[error("Incomplete {kind} record: missing '{flag}'")]
    IncompleteFlags {
        kind: &'static str,
        flag: &'static str,
    },
    #[error("Too many transactions: {0}, the limit is {max}", max = MAX_TRANSACTIONS)]
    TooManyTransactions(usize),
    #[error("Too many controllers: {0}, the limit is {max}", max = MAX_CONTROLLERS)]
    TooManyControllers(usize),
    #[error("Fee rate {0} exceeds 100 for a percentage fee")]
    FeeRateOutOfRange(Amount),
    #[error("Unknown request type '{0}'")]
    UnknownType(String),
    #[error("Expected a {expected} request, got {found}")]
    TypeMismatch { expected: RequestType, found: String },
    #[error("Malformed request JSON: {0}")]
    Json(String),
    #[error(transparent)]
    Address(#[from] AddressError),
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error(transparent)]
    Signature(#[from] SignatureError),
}

impl RequestError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        RequestError::Invalid {
            field,
            reason: reason.into(),
        }
    }

    pub(crate) fn amount(field: &'static str, err: CodecError) -> Self {
        RequestError::Invalid {
            field,
            reason: err.to_string(),
        }
    }
}

/// Enforce a UTF-8 byte limit on a text field
pub(crate) fn check_text(field: &'static str, text: &str, max: usize) -> Result<(), RequestError> {
    let len = utf8_byte_length(text);
    if len > max {
        return Err(RequestError::TooLong { field, len, max });
    }
    Ok(())
}

pub(crate) fn check_transactions(count: usize) -> Result<(), RequestError> {
    if count > MAX_TRANSACTIONS {
        return Err(RequestError::TooManyTransactions(count));
    }
    Ok(())
}

/// Confirm that wire JSON names the expected variant, when it names one
pub(crate) fn check_type(value: &serde_json::Value, expected: RequestType) -> Result<(), RequestError> {
    match value.get("type").and_then(|t| t.as_str()) {
        Some(found) if found != expected.as_str() => Err(RequestError::TypeMismatch {
            expected,
            found: found.to_string(),
        }),
        _ => Ok(()),
    }
}
