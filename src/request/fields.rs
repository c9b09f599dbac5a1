//! Shared request field types: transactions, controllers, enumerations and
//! packed flag sets.

use serde_json::{json, Map, Value};
use std::fmt;
use std::str::FromStr;

use super::options::{amount_from_value, Options};
use super::RequestError;
use crate::codec::Amount;
use crate::crypto::PublicKey;

/// Declares a flag enum plus its packed set type. Bit `i` of the set is the
/// flag with discriminant `i`.
macro_rules! flag_set {
    (
        $(#[$meta:meta])*
        $flag:ident, $set:ident, $kind:literal {
            $($variant:ident => $text:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum $flag {
            $($variant),+
        }

        impl $flag {
            pub const ALL: &'static [$flag] = &[$($flag::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($flag::$variant => $text),+
                }
            }

            pub fn code(self) -> u8 {
                self as u8
            }

            fn bit(self) -> u64 {
                1u64 << (self as u32)
            }
        }

        impl FromStr for $flag {
            type Err = RequestError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                $flag::ALL
                    .iter()
                    .copied()
                    .find(|f| f.as_str() == s)
                    .ok_or_else(|| RequestError::UnknownValue {
                        field: $kind,
                        value: s.to_string(),
                    })
            }
        }

        impl fmt::Display for $flag {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        #[doc = concat!("Packed set of [`", stringify!($flag), "`] values")]
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
        pub struct $set(u64);

        impl $set {
            pub fn empty() -> Self {
                $set(0)
            }

            pub fn all() -> Self {
                $flag::ALL.iter().fold($set(0), |set, f| set.with(*f))
            }

            pub fn contains(self, flag: $flag) -> bool {
                self.0 & flag.bit() != 0
            }

            pub fn set(&mut self, flag: $flag, value: bool) {
                if value {
                    self.0 |= flag.bit();
                } else {
                    self.0 &= !flag.bit();
                }
            }

            pub fn with(mut self, flag: $flag) -> Self {
                self.set(flag, true);
                self
            }

            pub fn bits(self) -> u64 {
                self.0
            }

            /// Names of the flags that are set, in flag order
            pub fn names(self) -> Vec<&'static str> {
                $flag::ALL
                    .iter()
                    .filter(|f| self.contains(**f))
                    .map(|f| f.as_str())
                    .collect()
            }

            pub fn from_names<I, S>(names: I) -> Result<Self, RequestError>
            where
                I: IntoIterator<Item = S>,
                S: AsRef<str>,
            {
                names
                    .into_iter()
                    .try_fold($set(0), |set, name| Ok(set.with(name.as_ref().parse()?)))
            }

            /// Parse either the wire form (array of set flag names) or a
            /// record carrying every flag as an explicit boolean. A record
            /// missing any flag is rejected.
            pub fn from_value(value: &Value) -> Result<Self, RequestError> {
                match value {
                    Value::Array(items) => {
                        let names = items
                            .iter()
                            .map(|item| {
                                item.as_str().ok_or_else(|| {
                                    RequestError::invalid($kind, format!("expected a flag name, got {}", item))
                                })
                            })
                            .collect::<Result<Vec<_>, _>>()?;
                        Self::from_names(names)
                    }
                    Value::Object(map) => Self::from_record(map),
                    other => Err(RequestError::invalid(
                        $kind,
                        format!("expected a list of names or a flag record, got {}", other),
                    )),
                }
            }

            fn from_record(map: &Map<String, Value>) -> Result<Self, RequestError> {
                if let Some(unknown) = map.keys().find(|k| k.parse::<$flag>().is_err()) {
                    return Err(RequestError::UnknownValue {
                        field: $kind,
                        value: unknown.clone(),
                    });
                }
                let mut set = $set(0);
                for flag in $flag::ALL {
                    match map.get(flag.as_str()) {
                        Some(Value::Bool(b)) => set.set(*flag, *b),
                        Some(other) => {
                            return Err(RequestError::invalid(
                                $kind,
                                format!("'{}' must be a boolean, got {}", flag, other),
                            ))
                        }
                        None => {
                            return Err(RequestError::IncompleteFlags {
                                kind: $kind,
                                flag: flag.as_str(),
                            })
                        }
                    }
                }
                Ok(set)
            }

            /// Wire projection: names of the true flags only
            pub fn to_json(self) -> Value {
                json!(self.names())
            }
        }
    };
}

flag_set! {
    /// Token settings. A `modify_*` setting controls whether its base
    /// setting may still be changed.
    Setting, Settings, "setting" {
        Issuance => "issuance",
        ModifyIssuance => "modify_issuance",
        Revoke => "revoke",
        ModifyRevoke => "modify_revoke",
        Freeze => "freeze",
        ModifyFreeze => "modify_freeze",
        AdjustFee => "adjust_fee",
        ModifyAdjustFee => "modify_adjust_fee",
        Whitelist => "whitelist",
        ModifyWhitelist => "modify_whitelist",
    }
}

flag_set! {
    /// Controller privileges
    Privilege, Privileges, "privilege" {
        ChangeIssuance => "change_issuance",
        ChangeModifyIssuance => "change_modify_issuance",
        ChangeRevoke => "change_revoke",
        ChangeModifyRevoke => "change_modify_revoke",
        ChangeFreeze => "change_freeze",
        ChangeModifyFreeze => "change_modify_freeze",
        ChangeAdjustFee => "change_adjust_fee",
        ChangeModifyAdjustFee => "change_modify_adjust_fee",
        ChangeWhitelist => "change_whitelist",
        ChangeModifyWhitelist => "change_modify_whitelist",
        Issuance => "issuance",
        Revoke => "revoke",
        Freeze => "freeze",
        AdjustFee => "adjust_fee",
        Whitelist => "whitelist",
        UpdateIssuerInfo => "update_issuer_info",
        UpdateController => "update_controller",
        Burn => "burn",
        Distribute => "distribute",
        WithdrawFee => "withdraw_fee",
    }
}

impl Setting {
    pub fn is_modifier(self) -> bool {
        (self as u8) % 2 == 1
    }

    /// `issuance` -> `modify_issuance`; modifiers map to themselves
    pub fn modifier(self) -> Setting {
        if self.is_modifier() {
            self
        } else {
            Setting::ALL[self as usize + 1]
        }
    }

    /// Privilege needed to flip this setting
    pub fn change_privilege(self) -> Privilege {
        Privilege::ALL[self as usize]
    }

    /// Privilege needed to flip this setting's modifier
    pub fn change_modify_privilege(self) -> Privilege {
        self.modifier().change_privilege()
    }

    /// Parse a setting that a change/immute request may target
    pub fn parse_base(s: &str) -> Result<Setting, RequestError> {
        let setting: Setting = s.parse()?;
        if setting.is_modifier() {
            return Err(RequestError::UnknownValue {
                field: "setting",
                value: s.to_string(),
            });
        }
        Ok(setting)
    }
}

/// How token fees are charged on token sends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FeeType {
    Percentage = 0,
    #[default]
    Flat = 1,
}

impl FeeType {
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FeeType::Percentage => "percentage",
            FeeType::Flat => "flat",
        }
    }
}

impl FromStr for FeeType {
    type Err = RequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "percentage" => Ok(FeeType::Percentage),
            "flat" => Ok(FeeType::Flat),
            _ => Err(RequestError::UnknownValue {
                field: "feeType",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for FeeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Percentage fee rates are capped at 100
pub fn validate_fee_rate(fee_type: FeeType, fee_rate: Amount) -> Result<(), RequestError> {
    if fee_type == FeeType::Percentage && fee_rate > Amount(100) {
        return Err(RequestError::FeeRateOutOfRange(fee_rate));
    }
    Ok(())
}

/// Per-account token status set by adjust_user_status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserStatus {
    Frozen = 0,
    Unfrozen = 1,
    Whitelisted = 2,
    NotWhitelisted = 3,
}

impl UserStatus {
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn as_str(self) -> &'static str {
        match self {
            UserStatus::Frozen => "frozen",
            UserStatus::Unfrozen => "unfrozen",
            UserStatus::Whitelisted => "whitelisted",
            UserStatus::NotWhitelisted => "not_whitelisted",
        }
    }

    /// Freeze statuses need the freeze setting, whitelist statuses the
    /// whitelist setting
    pub fn governing_setting(self) -> Setting {
        match self {
            UserStatus::Frozen | UserStatus::Unfrozen => Setting::Freeze,
            UserStatus::Whitelisted | UserStatus::NotWhitelisted => Setting::Whitelist,
        }
    }

    pub fn required_privilege(self) -> Privilege {
        match self.governing_setting() {
            Setting::Freeze => Privilege::Freeze,
            _ => Privilege::Whitelist,
        }
    }
}

impl FromStr for UserStatus {
    type Err = RequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "frozen" => Ok(UserStatus::Frozen),
            "unfrozen" => Ok(UserStatus::Unfrozen),
            "whitelisted" => Ok(UserStatus::Whitelisted),
            "not_whitelisted" => Ok(UserStatus::NotWhitelisted),
            _ => Err(RequestError::UnknownValue {
                field: "status",
                value: s.to_string(),
            }),
        }
    }
}

/// update_controller action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ControllerAction {
    Remove = 0,
    #[default]
    Add = 1,
}

impl ControllerAction {
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ControllerAction::Remove => "remove",
            ControllerAction::Add => "add",
        }
    }
}

impl FromStr for ControllerAction {
    type Err = RequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "remove" => Ok(ControllerAction::Remove),
            "add" => Ok(ControllerAction::Add),
            _ => Err(RequestError::UnknownValue {
                field: "action",
                value: s.to_string(),
            }),
        }
    }
}

/// An account with privileges over a token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Controller {
    pub account: PublicKey,
    pub privileges: Privileges,
}

impl Controller {
    pub fn new(account: PublicKey, privileges: Privileges) -> Self {
        Controller { account, privileges }
    }

    /// Both `account` and a complete `privileges` entry are required
    pub fn from_value(value: &Value) -> Result<Self, RequestError> {
        let options = Options::new(value)?;
        let account = options
            .key("account", "account", "controller account")?
            .ok_or(RequestError::Missing("controller account"))?;
        let privileges = options
            .get("privileges", "privileges")
            .ok_or(RequestError::Missing("controller privileges"))
            .and_then(Privileges::from_value)?;
        Ok(Controller { account, privileges })
    }

    pub fn has(&self, privilege: Privilege) -> bool {
        self.privileges.contains(privilege)
    }

    pub fn to_json(&self) -> Value {
        json!({
            "account": self.account.to_address(),
            "privileges": self.privileges.to_json(),
        })
    }
}

/// One payment instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Transaction {
    pub destination: PublicKey,
    pub amount: Amount,
}

impl Transaction {
    pub fn new(destination: PublicKey, amount: Amount) -> Self {
        Transaction { destination, amount }
    }

    pub fn from_value(value: &Value) -> Result<Self, RequestError> {
        let options = Options::new(value)?;
        let destination = options
            .key("destination", "destination", "destination")?
            .ok_or(RequestError::Missing("transaction destination"))?;
        let amount = options
            .get("amount", "amount")
            .ok_or(RequestError::Missing("transaction amount"))
            .and_then(|v| amount_from_value(v, "amount"))?;
        Ok(Transaction { destination, amount })
    }

    pub fn to_json(&self) -> Value {
        json!({
            "destination": self.destination.to_address(),
            "amount": self.amount.to_string(),
        })
    }
}

pub(crate) fn transactions_from_value(value: &Value) -> Result<Vec<Transaction>, RequestError> {
    match value {
        Value::Array(items) => items.iter().map(Transaction::from_value).collect(),
        other => Err(RequestError::invalid(
            "transactions",
            format!("expected an array, got {}", other),
        )),
    }
}

pub(crate) fn controllers_from_value(value: &Value) -> Result<Vec<Controller>, RequestError> {
    match value {
        Value::Array(items) => items.iter().map(Controller::from_value).collect(),
        other => Err(RequestError::invalid(
            "controllers",
            format!("expected an array, got {}", other),
        )),
    }
}
