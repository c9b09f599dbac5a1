//! Wallet implementation
//!
//! Holds the deterministic seed, the user accounts derived from it and the
//! token accounts they interact with. Confirmations delivered over pub/sub
//! are routed to every account they touch.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use super::WalletOptions;
use crate::account::{Account, AccountError, LogosAccount, TokenAccount, TokenAccounts};
use crate::codec::{public_key_from_address, AddressError, Amount};
use crate::crypto::{blake2b_256_parts, Hash, PrivateKey, PublicKey};
use crate::pubsub::{subscription_topics, PubSubMessage};
use crate::request::{
    Controller, ControllerAction, FeeType, Issuance, Request, RequestError, Setting, Transaction,
    UserStatus,
};
use crate::rpc::{HttpRpc, Rpc, RpcError};

/// Wallet errors
#[derive(Debug, Error)]
pub enum WalletError {
    #[error("No account with address {0}")]
    UnknownAccount(String),
    #[error("Invalid seed: {0}")]
    InvalidSeed(String),
    #[error(transparent)]
    Account(#[from] AccountError),
    #[error(transparent)]
    Request(#[from] RequestError),
    #[error(transparent)]
    Rpc(#[from] RpcError),
    #[error(transparent)]
    Address(#[from] AddressError),
}

pub struct Wallet {
    seed: [u8; 32],
    options: WalletOptions,
    accounts: HashMap<PublicKey, LogosAccount>,
    /// Account keys in the order they were added
    order: Vec<PublicKey>,
    next_index: u32,
    token_accounts: TokenAccounts,
    rpc: Option<Arc<dyn Rpc>>,
}

impl fmt::Debug for Wallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wallet")
            .field("accounts", &self.order.len())
            .field("token_accounts", &self.token_accounts.len())
            .field("next_index", &self.next_index)
            .field("options", &self.options)
            .finish()
    }
}

fn parse_seed(seed: Option<&str>) -> Result<[u8; 32], WalletError> {
    let seed = match seed {
        Some(seed) => seed,
        None => return Ok(rand::random()),
    };
    let bytes = hex::decode(seed).map_err(|e| WalletError::InvalidSeed(e.to_string()))?;
    bytes
        .try_into()
        .map_err(|b: Vec<u8>| WalletError::InvalidSeed(format!("expected 32 bytes, got {}", b.len())))
}

impl Wallet {
    /// Create a wallet talking to the delegates named in `options.rpc`
    pub fn new(options: WalletOptions) -> Result<Self, WalletError> {
        let rpc = match &options.rpc {
            Some(rpc) => Some(Arc::new(HttpRpc::new(rpc)?) as Arc<dyn Rpc>),
            None => None,
        };
        Self::with_rpc(options, rpc)
    }

    /// Create a wallet around an existing collaborator, or none at all for
    /// offline use
    pub fn with_rpc(mut options: WalletOptions, rpc: Option<Arc<dyn Rpc>>) -> Result<Self, WalletError> {
        let seed = parse_seed(options.seed.as_deref())?;
        // the seed lives only in `seed`
        options.seed = None;
        Ok(Wallet {
            seed,
            options,
            accounts: HashMap::new(),
            order: Vec::new(),
            next_index: 0,
            token_accounts: TokenAccounts::new(),
            rpc,
        })
    }

    pub fn seed(&self) -> String {
        hex::encode(self.seed)
    }

    pub fn options(&self) -> &WalletOptions {
        &self.options
    }

    pub fn rpc(&self) -> Option<&Arc<dyn Rpc>> {
        self.rpc.as_ref()
    }

    /// Key for account `index`: blake2b(seed ‖ index as big endian u32)
    pub fn derive_key(&self, index: u32) -> PrivateKey {
        let hash = blake2b_256_parts(&[&self.seed[..], &index.to_be_bytes()[..]]);
        PrivateKey::from_bytes(&hash.0)
    }

    /// Derive the next account from the seed and add it
    pub async fn create_account(&mut self, label: Option<&str>) -> Result<PublicKey, WalletError> {
        let index = self.next_index;
        let label = label.map(str::to_string).unwrap_or_else(|| format!("Account {}", index));
        let key = self.derive_key(index);
        let public_key = self.add_account(key, label).await?;
        self.next_index = index + 1;
        Ok(public_key)
    }

    /// Add an account for a key that did not come from the seed
    pub async fn add_account(&mut self, private_key: PrivateKey, label: impl Into<String>) -> Result<PublicKey, WalletError> {
        let key = private_key.public_key();
        if self.accounts.contains_key(&key) {
            return Ok(key);
        }
        let mut account = LogosAccount::new(private_key, label, self.options.account_options(), self.rpc.clone());
        account.sync().await?;
        info!(address = %account.address(), label = %account.label(), "added account");
        self.accounts.insert(key, account);
        self.order.push(key);
        if self.options.token_sync {
            self.sync_token_accounts().await?;
        }
        Ok(key)
    }

    pub fn remove_account(&mut self, address: &str) -> Result<LogosAccount, WalletError> {
        let key = public_key_from_address(address)?;
        let account = self
            .accounts
            .remove(&key)
            .ok_or_else(|| WalletError::UnknownAccount(address.to_string()))?;
        self.order.retain(|k| *k != key);
        Ok(account)
    }

    pub fn account(&self, address: &str) -> Option<&LogosAccount> {
        let key = public_key_from_address(address).ok()?;
        self.accounts.get(&key)
    }

    pub fn account_mut(&mut self, address: &str) -> Option<&mut LogosAccount> {
        let key = public_key_from_address(address).ok()?;
        self.accounts.get_mut(&key)
    }

    /// Accounts in the order they were added
    pub fn accounts(&self) -> impl Iterator<Item = &LogosAccount> {
        self.order.iter().filter_map(move |key| self.accounts.get(key))
    }

    pub fn token_accounts(&self) -> &TokenAccounts {
        &self.token_accounts
    }

    /// Confirmed base-currency balance across all accounts
    pub fn balance(&self) -> Amount {
        self.accounts.values().map(|a| a.balance()).sum()
    }

    /// The token account for `token_id`, loaded on first use
    pub async fn token_account(&mut self, token_id: Hash) -> Result<&mut TokenAccount, WalletError> {
        if !self.token_accounts.contains_key(&token_id) {
            let mut token = TokenAccount::new(token_id, self.options.account_options(), self.rpc.clone());
            token.sync().await?;
            debug!(address = %token.address(), "loaded token account");
            self.token_accounts.insert(token_id, token);
        }
        self.token_accounts
            .get_mut(&token_id)
            .ok_or(WalletError::Account(AccountError::UnknownTokenAccount(token_id)))
    }

    /// Load a token account for every token the wallet's accounts have seen
    pub async fn sync_token_accounts(&mut self) -> Result<(), WalletError> {
        let mut missing: Vec<Hash> = Vec::new();
        for account in self.accounts.values() {
            for token_id in account.tokens() {
                if !self.token_accounts.contains_key(token_id) && !missing.contains(token_id) {
                    missing.push(*token_id);
                }
            }
        }
        for token_id in missing {
            self.token_account(token_id).await?;
        }
        Ok(())
    }

    /// Reload every account and token account from the network
    pub async fn sync(&mut self) -> Result<(), WalletError> {
        for account in self.accounts.values_mut() {
            account.sync().await?;
        }
        for token in self.token_accounts.values_mut() {
            token.sync().await?;
        }
        if self.options.token_sync {
            self.sync_token_accounts().await?;
        }
        Ok(())
    }

    /// Topics to subscribe to for this wallet's deliveries
    pub fn subscription_topics(&self) -> Vec<String> {
        subscription_topics(
            self.accounts()
                .map(|a| a.address())
                .chain(self.token_accounts.values().map(|t| t.address())),
        )
    }

    /// Consume pub/sub deliveries until the sender goes away
    pub async fn run(&mut self, mut receiver: mpsc::Receiver<PubSubMessage>) {
        while let Some(message) = receiver.recv().await {
            if let Err(e) = self.handle_message(message).await {
                error!(error = %e, "failed to handle delivery");
            }
        }
        debug!("delivery channel closed");
    }

    pub async fn handle_message(&mut self, message: PubSubMessage) -> Result<(), WalletError> {
        match message {
            PubSubMessage::DelegateChange(delegates) => {
                info!(count = delegates.len(), "delegates changed");
                if let Some(rpc) = &self.rpc {
                    rpc.update_delegates(delegates);
                }
                Ok(())
            }
            PubSubMessage::Request { topic, request } => {
                debug!(topic = %topic, kind = %request.request_type(), "confirmation delivered");
                self.process_request(request).await
            }
        }
    }

    /// Route a confirmed request to the token accounts and then the user
    /// accounts it touches. Failures inside one account are logged and do
    /// not stop delivery to the others.
    pub async fn process_request(&mut self, request: Request) -> Result<(), WalletError> {
        let hash = request.hash()?;
        if !request.verify()? {
            return Err(AccountError::BadSignature(hash).into());
        }

        if let Request::Issuance(issuance) = &request {
            let ours = request.origin().map_or(false, |o| self.accounts.contains_key(&o));
            if let Some(token_id) = issuance.token_id() {
                if ours && !self.token_accounts.contains_key(&token_id) {
                    let token =
                        TokenAccount::from_issuance(issuance.clone(), self.options.account_options(), self.rpc.clone())?;
                    info!(address = %token.address(), symbol = %token.symbol(), "issued token");
                    self.token_accounts.insert(token_id, token);
                }
            }
        }

        let destinations = request.destinations();
        let mut tokens: Vec<Hash> = request.token_id().into_iter().collect();
        for key in &destinations {
            let id = Hash::from(*key);
            if !tokens.contains(&id) {
                tokens.push(id);
            }
        }
        for token_id in tokens {
            if let Some(token) = self.token_accounts.get_mut(&token_id) {
                if let Err(e) = token.process_request(request.clone()).await {
                    warn!(address = %token.address(), hash = %hash, error = %e, "token account rejected confirmation");
                }
            }
        }

        let mut keys: Vec<PublicKey> = request.origin().into_iter().collect();
        if let Request::Revoke(revoke) = &request {
            keys.extend(revoke.source());
        }
        keys.extend(destinations);
        let mut seen = Vec::with_capacity(keys.len());
        for key in keys {
            if seen.contains(&key) {
                continue;
            }
            seen.push(key);
            if let Some(account) = self.accounts.get_mut(&key) {
                if let Err(e) = account.process_request(request.clone(), &self.token_accounts).await {
                    warn!(address = %account.address(), hash = %hash, error = %e, "account rejected confirmation");
                }
            }
        }

        if self.options.token_sync {
            self.sync_token_accounts().await?;
        }
        Ok(())
    }

    /// Key of a wallet account able to sign
    fn signer(&self, address: &str) -> Result<PublicKey, WalletError> {
        let key = public_key_from_address(address)?;
        if self.token_accounts.contains_key(&Hash::from(key)) {
            return Err(AccountError::NoPrivateKey.into());
        }
        if !self.accounts.contains_key(&key) {
            return Err(WalletError::UnknownAccount(address.to_string()));
        }
        Ok(key)
    }

    fn signer_mut(&mut self, address: &str) -> Result<&mut LogosAccount, WalletError> {
        let key = self.signer(address)?;
        self.accounts
            .get_mut(&key)
            .ok_or_else(|| WalletError::UnknownAccount(address.to_string()))
    }

    async fn controller_and_token(
        &mut self,
        controller: &str,
        token_id: Hash,
    ) -> Result<(&mut LogosAccount, &mut TokenAccount), WalletError> {
        self.token_account(token_id).await?;
        let key = self.signer(controller)?;
        let account = self
            .accounts
            .get_mut(&key)
            .ok_or_else(|| WalletError::UnknownAccount(controller.to_string()))?;
        let token = self
            .token_accounts
            .get_mut(&token_id)
            .ok_or(WalletError::Account(AccountError::UnknownTokenAccount(token_id)))?;
        Ok((account, token))
    }

    pub async fn create_send_request(&mut self, from: &str, transactions: Vec<Transaction>) -> Result<Request, WalletError> {
        Ok(self.signer_mut(from)?.create_send_request(transactions).await?)
    }

    pub async fn create_token_send_request(
        &mut self,
        from: &str,
        token_id: Hash,
        transactions: Vec<Transaction>,
        token_fee: Option<Amount>,
    ) -> Result<Request, WalletError> {
        let (account, token) = self.controller_and_token(from, token_id).await?;
        Ok(account.create_token_send_request(token, transactions, token_fee).await?)
    }

    pub async fn create_issuance_request(&mut self, from: &str, issuance: Issuance) -> Result<Request, WalletError> {
        Ok(self.signer_mut(from)?.create_issuance_request(issuance).await?)
    }

    pub async fn create_issue_additional_request(
        &mut self,
        controller: &str,
        token_id: Hash,
        amount: Amount,
    ) -> Result<Request, WalletError> {
        let (account, token) = self.controller_and_token(controller, token_id).await?;
        Ok(account.create_issue_additional_request(token, amount).await?)
    }

    pub async fn create_change_setting_request(
        &mut self,
        controller: &str,
        token_id: Hash,
        setting: Setting,
        value: bool,
    ) -> Result<Request, WalletError> {
        let (account, token) = self.controller_and_token(controller, token_id).await?;
        Ok(account.create_change_setting_request(token, setting, value).await?)
    }

    pub async fn create_immute_setting_request(
        &mut self,
        controller: &str,
        token_id: Hash,
        setting: Setting,
    ) -> Result<Request, WalletError> {
        let (account, token) = self.controller_and_token(controller, token_id).await?;
        Ok(account.create_immute_setting_request(token, setting).await?)
    }

    pub async fn create_revoke_request(
        &mut self,
        controller: &str,
        token_id: Hash,
        source: &str,
        transaction: Transaction,
    ) -> Result<Request, WalletError> {
        let source = public_key_from_address(source)?;
        let (account, token) = self.controller_and_token(controller, token_id).await?;
        Ok(account.create_revoke_request(token, source, transaction).await?)
    }

    pub async fn create_adjust_user_status_request(
        &mut self,
        controller: &str,
        token_id: Hash,
        target: &str,
        status: UserStatus,
    ) -> Result<Request, WalletError> {
        let target = public_key_from_address(target)?;
        let (account, token) = self.controller_and_token(controller, token_id).await?;
        Ok(account.create_adjust_user_status_request(token, target, status).await?)
    }

    pub async fn create_adjust_fee_request(
        &mut self,
        controller: &str,
        token_id: Hash,
        fee_type: FeeType,
        fee_rate: Amount,
    ) -> Result<Request, WalletError> {
        let (account, token) = self.controller_and_token(controller, token_id).await?;
        Ok(account.create_adjust_fee_request(token, fee_type, fee_rate).await?)
    }

    pub async fn create_update_issuer_info_request(
        &mut self,
        controller: &str,
        token_id: Hash,
        issuer_info: &str,
    ) -> Result<Request, WalletError> {
        let (account, token) = self.controller_and_token(controller, token_id).await?;
        Ok(account.create_update_issuer_info_request(token, issuer_info).await?)
    }

    pub async fn create_update_controller_request(
        &mut self,
        controller: &str,
        token_id: Hash,
        action: ControllerAction,
        target: Controller,
    ) -> Result<Request, WalletError> {
        let (account, token) = self.controller_and_token(controller, token_id).await?;
        Ok(account.create_update_controller_request(token, action, target).await?)
    }

    pub async fn create_burn_request(&mut self, controller: &str, token_id: Hash, amount: Amount) -> Result<Request, WalletError> {
        let (account, token) = self.controller_and_token(controller, token_id).await?;
        Ok(account.create_burn_request(token, amount).await?)
    }

    pub async fn create_distribute_request(
        &mut self,
        controller: &str,
        token_id: Hash,
        transaction: Transaction,
    ) -> Result<Request, WalletError> {
        let (account, token) = self.controller_and_token(controller, token_id).await?;
        Ok(account.create_distribute_request(token, transaction).await?)
    }

    pub async fn create_withdraw_fee_request(
        &mut self,
        controller: &str,
        token_id: Hash,
        transaction: Transaction,
    ) -> Result<Request, WalletError> {
        let (account, token) = self.controller_and_token(controller, token_id).await?;
        Ok(account.create_withdraw_fee_request(token, transaction).await?)
    }

    pub async fn create_withdraw_logos_request(
        &mut self,
        controller: &str,
        token_id: Hash,
        transaction: Transaction,
    ) -> Result<Request, WalletError> {
        let (account, token) = self.controller_and_token(controller, token_id).await?;
        Ok(account.create_withdraw_logos_request(token, transaction).await?)
    }
}
