use serde::{Deserialize, Serialize};

use crate::account::AccountOptions;
use crate::rpc::RpcOptions;

/// Wallet configuration
///
/// Field names are read in camelCase, with snake_case accepted as well.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WalletOptions {
    #[serde(alias = "full_sync")]
    pub full_sync: bool,
    #[serde(alias = "validate_sync")]
    pub validate_sync: bool,
    #[serde(alias = "batch_sends")]
    pub batch_sends: bool,
    #[serde(alias = "lazy_errors")]
    pub lazy_errors: bool,
    #[serde(alias = "token_sync")]
    pub token_sync: bool,
    /// Hex encoded 32 byte seed; a random one is drawn when absent
    pub seed: Option<String>,
    pub rpc: Option<RpcOptions>,
}

impl Default for WalletOptions {
    fn default() -> Self {
        let account = AccountOptions::default();
        WalletOptions {
            full_sync: account.full_sync,
            validate_sync: account.validate_sync,
            batch_sends: account.batch_sends,
            lazy_errors: account.lazy_errors,
            token_sync: account.token_sync,
            seed: None,
            rpc: None,
        }
    }
}

impl WalletOptions {
    pub fn account_options(&self) -> AccountOptions {
        AccountOptions {
            full_sync: self.full_sync,
            validate_sync: self.validate_sync,
            batch_sends: self.batch_sends,
            lazy_errors: self.lazy_errors,
            token_sync: self.token_sync,
        }
    }
}
