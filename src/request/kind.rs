//! Request type tags

use std::fmt;
use std::str::FromStr;

use super::RequestError;

/// Request variant tag. The discriminant is the byte written at the head of
/// every request preimage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestType {
    Send = 0,
    Issuance = 2,
    IssueAdditional = 3,
    ChangeSetting = 4,
    ImmuteSetting = 5,
    Revoke = 6,
    AdjustUserStatus = 7,
    AdjustFee = 8,
    UpdateIssuerInfo = 9,
    UpdateController = 10,
    Burn = 11,
    Distribute = 12,
    WithdrawFee = 13,
    WithdrawLogos = 14,
    TokenSend = 15,
}

impl RequestType {
    pub const ALL: [RequestType; 15] = [
        RequestType::Send,
        RequestType::Issuance,
        RequestType::IssueAdditional,
        RequestType::ChangeSetting,
        RequestType::ImmuteSetting,
        RequestType::Revoke,
        RequestType::AdjustUserStatus,
        RequestType::AdjustFee,
        RequestType::UpdateIssuerInfo,
        RequestType::UpdateController,
        RequestType::Burn,
        RequestType::Distribute,
        RequestType::WithdrawFee,
        RequestType::WithdrawLogos,
        RequestType::TokenSend,
    ];

    pub fn value(self) -> u8 {
        self as u8
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RequestType::Send => "send",
            RequestType::Issuance => "issuance",
            RequestType::IssueAdditional => "issue_additional",
            RequestType::ChangeSetting => "change_setting",
            RequestType::ImmuteSetting => "immute_setting",
            RequestType::Revoke => "revoke",
            RequestType::AdjustUserStatus => "adjust_user_status",
            RequestType::AdjustFee => "adjust_fee",
            RequestType::UpdateIssuerInfo => "update_issuer_info",
            RequestType::UpdateController => "update_controller",
            RequestType::Burn => "burn",
            RequestType::Distribute => "distribute",
            RequestType::WithdrawFee => "withdraw_fee",
            RequestType::WithdrawLogos => "withdraw_logos",
            RequestType::TokenSend => "token_send",
        }
    }

    /// Every variant except a plain send carries a token ID
    pub fn is_token_request(self) -> bool {
        self != RequestType::Send
    }

    /// Token requests that change token account state and need controller
    /// authority. Issuance and token sends are excluded.
    pub fn is_token_admin(self) -> bool {
        !matches!(
            self,
            RequestType::Send | RequestType::Issuance | RequestType::TokenSend
        )
    }
}

impl FromStr for RequestType {
    type Err = RequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RequestType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| RequestError::UnknownType(s.to_string()))
    }
}

impl fmt::Display for RequestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
