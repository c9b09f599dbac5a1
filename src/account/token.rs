//! Token accounts
//!
//! A token account mirrors a token's issuance state. It holds no key: its
//! chain is written by controllers, each request signed by the controller
//! that issued it. Fees for those requests come out of the token account's
//! own base-currency balance.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::{Account, AccountCore, AccountError, AccountOptions, ChainError, Tally};
use crate::codec::Amount;
use crate::constants::{GENESIS_HASH, MAX_CONTROLLERS};
use crate::crypto::{Hash, PublicKey};
use crate::request::{
    Controller, ControllerAction, FeeType, Issuance, Privilege, Request, RequestError, Setting,
    Settings, TokenSend, UserStatus,
};
use crate::rpc::{AccountInfo, Rpc};

/// Token accounts known to a wallet, keyed by token ID
pub type TokenAccounts = HashMap<Hash, TokenAccount>;

/// A holder's standing with a token
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccountStatus {
    pub frozen: bool,
    pub whitelisted: bool,
}

/// Everything a token account's requests change
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenState {
    /// Base currency held by the token account
    balance: Tally,
    /// Tokens not yet distributed
    token_balance: Tally,
    /// Token fees collected from token sends
    token_fee_balance: Tally,
    total_supply: Tally,
    pub symbol: String,
    pub name: String,
    pub issuer_info: String,
    pub fee_type: FeeType,
    pub fee_rate: Amount,
    pub settings: Settings,
    pub controllers: Vec<Controller>,
    pub account_statuses: HashMap<PublicKey, AccountStatus>,
}

impl TokenState {
    /// State right after issuance: the whole supply sits in the token
    /// account
    pub fn from_issuance(issuance: &Issuance) -> Self {
        TokenState {
            token_balance: issuance.total_supply().into(),
            total_supply: issuance.total_supply().into(),
            symbol: issuance.symbol().unwrap_or_default().to_string(),
            name: issuance.name().unwrap_or_default().to_string(),
            issuer_info: issuance.issuer_info().to_string(),
            fee_type: issuance.fee_type(),
            fee_rate: issuance.fee_rate(),
            settings: issuance.settings(),
            controllers: issuance.controllers().to_vec(),
            ..TokenState::default()
        }
    }

    /// State reported by a delegate for a lazily synced token account
    pub fn from_info(info: &AccountInfo) -> Result<Self, RequestError> {
        let controllers = info
            .controllers
            .iter()
            .flatten()
            .map(Controller::from_value)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(TokenState {
            balance: info.balance.into(),
            token_balance: info.token_balance.unwrap_or_default().into(),
            token_fee_balance: info.token_fee_balance.unwrap_or_default().into(),
            total_supply: info.total_supply.unwrap_or_default().into(),
            symbol: info.symbol.clone().unwrap_or_default(),
            name: info.name.clone().unwrap_or_default(),
            issuer_info: info.issuer_info.clone().unwrap_or_default(),
            fee_type: info
                .fee_type
                .as_deref()
                .map(str::parse::<FeeType>)
                .transpose()?
                .unwrap_or_default(),
            fee_rate: info.fee_rate.unwrap_or_default(),
            settings: info
                .settings
                .as_ref()
                .map(Settings::from_value)
                .transpose()?
                .unwrap_or_default(),
            controllers,
            account_statuses: HashMap::new(),
        })
    }

    pub fn balance(&self) -> Amount {
        self.balance.amount()
    }

    pub fn token_balance(&self) -> Amount {
        self.token_balance.amount()
    }

    pub fn token_fee_balance(&self) -> Amount {
        self.token_fee_balance.amount()
    }

    pub fn total_supply(&self) -> Amount {
        self.total_supply.amount()
    }

    pub fn controller(&self, account: &PublicKey) -> Option<&Controller> {
        self.controllers.iter().find(|c| c.account == *account)
    }

    /// Apply a controller request from the token account's chain
    fn apply_chain(&mut self, token_account: &PublicKey, request: &Request) {
        self.balance.debit(request.fee());
        match request {
            Request::IssueAdditional(r) => {
                self.token_balance.credit(r.amount());
                self.total_supply.credit(r.amount());
            }
            Request::ChangeSetting(r) => {
                if let Some(setting) = r.setting() {
                    self.settings.set(setting, r.value());
                }
            }
            Request::ImmuteSetting(r) => {
                if let Some(setting) = r.setting() {
                    self.settings.set(setting.modifier(), false);
                }
            }
            Request::Revoke(r) => {
                if let Some(tx) = r.transaction() {
                    if tx.destination == *token_account {
                        self.token_balance.credit(tx.amount);
                    }
                }
            }
            Request::AdjustUserStatus(r) => {
                if let (Some(account), Some(status)) = (r.account(), r.status()) {
                    let entry = self.account_statuses.entry(account).or_default();
                    match status {
                        UserStatus::Frozen => entry.frozen = true,
                        UserStatus::Unfrozen => entry.frozen = false,
                        UserStatus::Whitelisted => entry.whitelisted = true,
                        UserStatus::NotWhitelisted => entry.whitelisted = false,
                    }
                }
            }
            Request::AdjustFee(r) => {
                self.fee_type = r.fee_type();
                self.fee_rate = r.fee_rate();
            }
            Request::UpdateIssuerInfo(r) => {
                self.issuer_info = r.issuer_info().unwrap_or_default().to_string();
            }
            Request::UpdateController(r) => {
                if let Some(controller) = r.controller() {
                    self.controllers.retain(|c| c.account != controller.account);
                    if r.action() == ControllerAction::Add {
                        self.controllers.push(*controller);
                    }
                }
            }
            Request::Burn(r) => {
                self.token_balance.debit(r.amount());
                self.total_supply.debit(r.amount());
            }
            Request::Distribute(r) => {
                if let Some(tx) = r.transaction() {
                    self.token_balance.debit(tx.amount);
                }
            }
            Request::WithdrawFee(r) => {
                if let Some(tx) = r.transaction() {
                    self.token_fee_balance.debit(tx.amount);
                }
            }
            Request::WithdrawLogos(r) => {
                if let Some(tx) = r.transaction() {
                    self.balance.debit(tx.amount);
                }
            }
            _ => {}
        }
    }

    /// Apply a request paying into the token account
    fn apply_received(&mut self, token_account: &PublicKey, token_id: &Hash, request: &Request) {
        match request {
            Request::Send(send) => {
                for tx in send.transactions() {
                    if tx.destination == *token_account {
                        self.balance.credit(tx.amount);
                    }
                }
            }
            Request::TokenSend(send) if send.token_id().as_ref() == Some(token_id) => {
                self.token_fee_balance.credit(send.token_fee());
                for tx in send.transactions() {
                    if tx.destination == *token_account {
                        self.token_balance.credit(tx.amount);
                    }
                }
            }
            _ => {}
        }
    }
}

/// Mirror of one token's account
#[derive(Debug)]
pub struct TokenAccount {
    core: AccountCore,
    token_id: Hash,
    issuance: Option<Issuance>,
    state: TokenState,
    pending_state: TokenState,
}

impl TokenAccount {
    pub fn new(token_id: Hash, options: AccountOptions, rpc: Option<Arc<dyn Rpc>>) -> Self {
        TokenAccount {
            core: AccountCore::new(PublicKey::from(token_id), "", options, rpc),
            token_id,
            issuance: None,
            state: TokenState::default(),
            pending_state: TokenState::default(),
        }
    }

    /// Token account created by a confirmed issuance
    pub fn from_issuance(
        issuance: Issuance,
        options: AccountOptions,
        rpc: Option<Arc<dyn Rpc>>,
    ) -> Result<Self, AccountError> {
        let token_id = issuance
            .token_id()
            .ok_or(RequestError::Missing("tokenID"))?;
        let mut account = TokenAccount::new(token_id, options, rpc);
        account.set_issuance(issuance);
        Ok(account)
    }

    fn set_issuance(&mut self, issuance: Issuance) {
        if let Some(symbol) = issuance.symbol() {
            self.set_label(symbol);
        }
        self.issuance = Some(issuance);
        self.update_balances_from_chain();
    }

    pub fn token_id(&self) -> Hash {
        self.token_id
    }

    pub fn issuance(&self) -> Option<&Issuance> {
        self.issuance.as_ref()
    }

    /// Confirmed token state
    pub fn state(&self) -> &TokenState {
        &self.state
    }

    /// Token state after every pending request
    pub fn pending_state(&self) -> &TokenState {
        &self.pending_state
    }

    pub fn token_balance(&self) -> Amount {
        self.state.token_balance()
    }

    pub fn token_fee_balance(&self) -> Amount {
        self.state.token_fee_balance()
    }

    pub fn total_supply(&self) -> Amount {
        self.state.total_supply()
    }

    pub fn symbol(&self) -> &str {
        &self.state.symbol
    }

    pub fn name(&self) -> &str {
        &self.state.name
    }

    pub fn account_statuses(&self) -> &HashMap<PublicKey, AccountStatus> {
        &self.pending_state.account_statuses
    }

    /// Whether `account` controls this token with `privilege`
    pub fn controller_privilege(&self, account: &PublicKey, privilege: Privilege) -> bool {
        self.pending_state
            .controller(account)
            .map_or(false, |c| c.has(privilege))
    }

    pub fn has_setting(&self, setting: Setting) -> bool {
        self.pending_state.settings.contains(setting)
    }

    /// Smallest token fee a token send moving `total` must carry: the rate
    /// itself for flat fees, `total * rate / 100` rounded down for
    /// percentage fees
    pub fn minimum_token_fee(&self, total: Amount) -> Amount {
        let state = &self.pending_state;
        match state.fee_type {
            FeeType::Flat => state.fee_rate,
            FeeType::Percentage => match total.0.checked_mul(state.fee_rate.0) {
                Some(product) => Amount(product / 100),
                None => Amount((total.0 / 100).saturating_mul(state.fee_rate.0)),
            },
        }
    }

    /// Whether `account` may receive this token: not frozen, and
    /// whitelisted when the token requires it. Local statuses win; unknown
    /// accounts are looked up over RPC.
    pub async fn valid_token_destination(&self, account: &PublicKey) -> Result<bool, AccountError> {
        let status = self.status_of(&self.pending_state, account).await?;
        Ok(admissible(&self.pending_state, status))
    }

    /// Checks a token send from `origin` against the token's rules
    pub async fn validate_token_send(&self, origin: &PublicKey, send: &TokenSend) -> Result<(), AccountError> {
        if send.token_id() != Some(self.token_id) {
            return Err(AccountError::rejected("token send names another token"));
        }
        let minimum = self.minimum_token_fee(send.total_amount());
        if send.token_fee() < minimum {
            return Err(AccountError::rejected(format!(
                "token fee {} is below the minimum {}",
                send.token_fee(),
                minimum
            )));
        }
        let state = &self.pending_state;
        if !admissible(state, self.status_of(state, origin).await?) {
            return Err(AccountError::rejected(format!(
                "{} may not send {}",
                origin, state.symbol
            )));
        }
        for tx in send.transactions() {
            self.check_destination(state, &tx.destination).await?;
        }
        Ok(())
    }

    /// Rebuild the confirmed state from the issuance and both chains
    pub fn update_balances_from_chain(&mut self) {
        let key = self.public_key();
        let mut state = self
            .issuance
            .as_ref()
            .map(TokenState::from_issuance)
            .unwrap_or_default();
        for request in &self.core.receive_chain {
            state.apply_received(&key, &self.token_id, request);
        }
        for request in &self.core.chain {
            state.apply_chain(&key, request);
        }
        self.state = state;
        self.update_pending_balances();
    }

    /// Apply one newly confirmed request to the confirmed state
    pub fn update_balances_from_request(&mut self, request: &Request) {
        let key = self.public_key();
        if self.owns(request) {
            self.state.apply_chain(&key, request);
        } else if self.receives(request) {
            self.state.apply_received(&key, &self.token_id, request);
        }
        self.update_pending_balances();
    }

    /// Handle a confirmed request delivered for this token
    pub async fn process_request(&mut self, request: Request) -> Result<(), AccountError> {
        let hash = request.hash()?;
        if !request.verify()? {
            return Err(AccountError::BadSignature(hash));
        }
        match &request {
            Request::Issuance(issuance) if request.token_id() == Some(self.token_id) => {
                self.set_issuance(issuance.clone());
            }
            _ if self.owns(&request) => {
                if !self.settle_confirmed(&request, &hash) {
                    return Ok(());
                }
                self.add_to_send_chain(request.clone());
                self.apply_confirmed(&request);
            }
            _ if self.receives(&request) => {
                if !self.add_to_receive_chain(request.clone()) {
                    return Ok(());
                }
                self.apply_confirmed(&request);
            }
            _ => {
                debug!(address = %self.address(), hash = %hash, "request does not concern token account");
                return Ok(());
            }
        }
        self.broadcast_request().await;
        Ok(())
    }

    fn apply_confirmed(&mut self, request: &Request) {
        if self.core.options.full_sync {
            self.update_balances_from_chain();
        } else {
            self.update_balances_from_request(request);
        }
    }

    /// Load the token account from the network
    pub async fn sync(&mut self) -> Result<(), AccountError> {
        let rpc = match &self.core.rpc {
            Some(rpc) => Arc::clone(rpc),
            None => {
                self.core.synced = true;
                return Ok(());
            }
        };
        let address = self.address().to_string();
        let info = match rpc.accounts_info(&address).await? {
            Some(info) => info,
            None => {
                self.core.synced = true;
                return Ok(());
            }
        };

        self.core.chain.clear();
        self.core.receive_chain.clear();
        if self.core.options.full_sync {
            for raw in rpc.accounts_history(&address, None).await? {
                let request = Request::from_json(&raw)?;
                match &request {
                    Request::Issuance(issuance) if request.token_id() == Some(self.token_id) => {
                        self.issuance = Some(issuance.clone());
                    }
                    _ if self.owns(&request) => self.core.chain.push(request),
                    _ if self.receives(&request) => self.core.receive_chain.push(request),
                    _ => {}
                }
            }
            if self.core.options.validate_sync {
                self.verify_chain()?;
                self.verify_receive_chain()?;
            }
            self.update_balances_from_chain();
        } else {
            self.state = TokenState::from_info(&info)?;
            if info.frontier != GENESIS_HASH {
                if let Some(raw) = rpc.requests_info(&info.frontier).await? {
                    self.core.chain.push(Request::from_json(&raw)?);
                }
            }
            self.update_pending_balances();
        }
        if !self.state.symbol.is_empty() {
            let symbol = self.state.symbol.clone();
            self.set_label(symbol);
        }
        self.core.synced = true;
        debug!(address = %address, requests = self.core.chain.len(), "synced token account");
        Ok(())
    }

    /// Compare the local frontier and balances with the delegate's view
    pub async fn is_synced(&mut self) -> Result<bool, AccountError> {
        let rpc = match &self.core.rpc {
            Some(rpc) => Arc::clone(rpc),
            None => return Ok(self.core.synced),
        };
        let info = rpc.accounts_info(self.address()).await?;
        let frontier = self
            .core
            .chain
            .last()
            .and_then(|r| r.hash().ok())
            .unwrap_or(GENESIS_HASH);
        let synced = match info {
            None => self.core.chain.is_empty(),
            Some(info) => {
                info.frontier == frontier
                    && info.balance == self.state.balance()
                    && info.token_balance.map_or(true, |b| b == self.state.token_balance())
            }
        };
        self.core.synced = synced;
        Ok(synced)
    }

    fn state_before(&self, position: usize) -> TokenState {
        let key = self.public_key();
        let mut state = self.state.clone();
        for request in self.core.pending_chain.iter().take(position) {
            state.apply_chain(&key, request);
        }
        state
    }

    async fn status_of(&self, state: &TokenState, account: &PublicKey) -> Result<AccountStatus, AccountError> {
        if let Some(status) = state.account_statuses.get(account) {
            return Ok(*status);
        }
        let rpc = match &self.core.rpc {
            Some(rpc) => Arc::clone(rpc),
            None => return Ok(AccountStatus::default()),
        };
        let entry = rpc
            .accounts_info(&account.to_address())
            .await?
            .and_then(|info| info.token(&self.token_id).cloned());
        Ok(entry
            .map(|e| AccountStatus {
                frozen: e.frozen,
                whitelisted: e.whitelisted,
            })
            .unwrap_or_default())
    }

    async fn check_destination(&self, state: &TokenState, account: &PublicKey) -> Result<(), AccountError> {
        if admissible(state, self.status_of(state, account).await?) {
            Ok(())
        } else {
            Err(AccountError::rejected(format!(
                "{} is not a valid {} destination",
                account, state.symbol
            )))
        }
    }

    async fn source_token_balance(&self, source: &PublicKey) -> Result<Amount, AccountError> {
        let rpc = self
            .core
            .rpc
            .as_ref()
            .ok_or_else(|| AccountError::rejected("revoke source balance needs an rpc connection"))?;
        Ok(rpc
            .accounts_info(&source.to_address())
            .await?
            .and_then(|info| info.token(&self.token_id).map(|e| e.balance))
            .unwrap_or_default())
    }
}

fn admissible(state: &TokenState, status: AccountStatus) -> bool {
    !status.frozen && (!state.settings.contains(Setting::Whitelist) || status.whitelisted)
}

fn require(ok: bool, reason: impl FnOnce() -> String) -> Result<(), AccountError> {
    if ok {
        Ok(())
    } else {
        Err(AccountError::rejected(reason()))
    }
}

#[async_trait]
impl Account for TokenAccount {
    fn core(&self) -> &AccountCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut AccountCore {
        &mut self.core
    }

    fn balance(&self) -> Amount {
        self.state.balance()
    }

    fn pending_balance(&self) -> Amount {
        self.pending_state.balance()
    }

    fn update_pending_balances(&mut self) {
        self.pending_state = self.state_before(self.core.pending_chain.len());
    }

    fn owns(&self, request: &Request) -> bool {
        request.request_type().is_token_admin() && request.token_id() == Some(self.token_id)
    }

    fn receives(&self, request: &Request) -> bool {
        match request {
            Request::Send(_) => request.destinations().contains(&self.public_key()),
            Request::TokenSend(_) => request.token_id() == Some(self.token_id),
            _ => false,
        }
    }

    fn check_chain_entry(&self, index: usize, request: &Request) -> Result<(), ChainError> {
        if self.owns(request) {
            Ok(())
        } else {
            Err(ChainError::TokenMismatch { index })
        }
    }

    async fn validate_request(&self, request: &Request, position: usize) -> Result<(), AccountError> {
        if !self.owns(request) {
            return Err(AccountError::rejected(format!(
                "{} request does not belong to token {}",
                request.request_type(),
                self.token_id
            )));
        }
        let state = self.state_before(position);
        let origin = request.origin().ok_or(RequestError::Missing("origin"))?;
        let controller = state
            .controller(&origin)
            .copied()
            .ok_or_else(|| AccountError::rejected(format!("{} is not a controller of {}", origin, state.symbol)))?;
        let privileged = |privilege: Privilege| {
            require(controller.has(privilege), || {
                format!("controller {} lacks the {} privilege", origin, privilege)
            })
        };
        let enabled = |setting: Setting| {
            require(state.settings.contains(setting), || {
                format!("{} does not have the {} setting", state.symbol, setting)
            })
        };
        let fee = request.fee();
        require(state.balance() >= fee, || {
            format!("token account balance {} cannot cover fee {}", state.balance(), fee)
        })?;

        match request {
            Request::IssueAdditional(r) => {
                privileged(Privilege::Issuance)?;
                enabled(Setting::Issuance)?;
                require(state.total_supply().checked_add(r.amount()).is_some(), || {
                    "total supply would exceed 2^128 - 1".to_string()
                })
            }
            Request::ChangeSetting(r) => {
                let setting = r.setting().ok_or(RequestError::Missing("setting"))?;
                privileged(setting.change_privilege())?;
                require(state.settings.contains(setting.modifier()), || {
                    format!("{} can no longer be modified ({} is off)", setting, setting.modifier())
                })
            }
            Request::ImmuteSetting(r) => {
                let setting = r.setting().ok_or(RequestError::Missing("setting"))?;
                privileged(setting.change_modify_privilege())?;
                require(state.settings.contains(setting.modifier()), || {
                    format!("{} is already immutable", setting)
                })
            }
            Request::Revoke(r) => {
                privileged(Privilege::Revoke)?;
                enabled(Setting::Revoke)?;
                let source = r.source().ok_or(RequestError::Missing("source"))?;
                let tx = *r.transaction().ok_or(RequestError::Missing("transaction"))?;
                let held = self.source_token_balance(&source).await?;
                require(held >= tx.amount, || {
                    format!("{} holds {} {}, cannot revoke {}", source, held, state.symbol, tx.amount)
                })?;
                self.check_destination(&state, &tx.destination).await
            }
            Request::AdjustUserStatus(r) => {
                let status = r.status().ok_or(RequestError::Missing("status"))?;
                privileged(status.required_privilege())?;
                enabled(status.governing_setting())
            }
            Request::AdjustFee(_) => {
                privileged(Privilege::AdjustFee)?;
                enabled(Setting::AdjustFee)
            }
            Request::UpdateIssuerInfo(_) => privileged(Privilege::UpdateIssuerInfo),
            Request::UpdateController(r) => {
                privileged(Privilege::UpdateController)?;
                let target = r.controller().ok_or(RequestError::Missing("controller"))?;
                let existing = state.controller(&target.account).is_some();
                match r.action() {
                    ControllerAction::Add => require(existing || state.controllers.len() < MAX_CONTROLLERS, || {
                        format!("{} already has {} controllers", state.symbol, MAX_CONTROLLERS)
                    }),
                    ControllerAction::Remove => require(existing, || {
                        format!("{} is not a controller", target.account)
                    }),
                }
            }
            Request::Burn(r) => {
                privileged(Privilege::Burn)?;
                require(state.token_balance() >= r.amount(), || {
                    format!("cannot burn {} of {} undistributed tokens", r.amount(), state.token_balance())
                })
            }
            Request::Distribute(r) => {
                privileged(Privilege::Distribute)?;
                let tx = *r.transaction().ok_or(RequestError::Missing("transaction"))?;
                require(state.token_balance() >= tx.amount, || {
                    format!("cannot distribute {} of {} undistributed tokens", tx.amount, state.token_balance())
                })?;
                self.check_destination(&state, &tx.destination).await
            }
            Request::WithdrawFee(r) => {
                privileged(Privilege::WithdrawFee)?;
                let tx = *r.transaction().ok_or(RequestError::Missing("transaction"))?;
                require(state.token_fee_balance() >= tx.amount, || {
                    format!("cannot withdraw {} of {} collected fees", tx.amount, state.token_fee_balance())
                })?;
                self.check_destination(&state, &tx.destination).await
            }
            Request::WithdrawLogos(r) => {
                privileged(Privilege::WithdrawFee)?;
                let tx = *r.transaction().ok_or(RequestError::Missing("transaction"))?;
                let needed = tx.amount.checked_add(fee);
                require(needed.map_or(false, |n| state.balance() >= n), || {
                    format!("token account balance {} cannot cover {} plus fee", state.balance(), tx.amount)
                })
            }
            _ => Err(AccountError::rejected(format!(
                "{} is not a token account request",
                request.request_type()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::MINIMUM_FEE;
    use crate::crypto::PrivateKey;
    use crate::request::{self, ChangeSetting, Privileges, RequestKind, Transaction};

    fn controller_key() -> PrivateKey {
        PrivateKey::from_bytes(&[7; 32])
    }

    fn issuance(settings: Settings, privileges: Privileges) -> Issuance {
        let key = controller_key();
        let mut issuance = Issuance::new();
        issuance.base_mut().set_origin(key.public_key());
        issuance.base_mut().set_previous(GENESIS_HASH);
        issuance.base_mut().set_sequence(0);
        issuance.base_mut().set_fee(MINIMUM_FEE);
        issuance.set_symbol("TST").unwrap();
        issuance.set_name("Test").unwrap();
        issuance.set_total_supply(Amount(1_000));
        issuance.set_settings(settings);
        issuance
            .set_controllers(vec![Controller::new(key.public_key(), privileges)])
            .unwrap();
        issuance.freeze_token_id().unwrap();
        issuance.sign(&key.to_bytes()).unwrap();
        issuance
    }

    /// Ten fees' worth of base currency paid into `token_account`
    fn funding(token_account: PublicKey) -> Request {
        let funder = PrivateKey::from_bytes(&[8; 32]);
        let mut send = request::Send::new();
        send.base_mut().set_origin(funder.public_key());
        send.base_mut().set_previous(GENESIS_HASH);
        send.base_mut().set_sequence(0);
        send.base_mut().set_fee(MINIMUM_FEE);
        send.add_transaction(Transaction::new(token_account, Amount(MINIMUM_FEE.0 * 10)))
            .unwrap();
        send.sign(&funder.to_bytes()).unwrap();
        send.into()
    }

    /// Token account funded with enough base currency for a few fees
    fn token_account(settings: Settings, privileges: Privileges) -> TokenAccount {
        let mut account =
            TokenAccount::from_issuance(issuance(settings, privileges), AccountOptions::default(), None).unwrap();
        account.add_to_receive_chain(funding(account.public_key()));
        account.update_balances_from_chain();
        account
    }

    fn change_issuance(account: &TokenAccount) -> Request {
        let key = controller_key();
        let mut change = ChangeSetting::new();
        change.base_mut().set_origin(key.public_key());
        change.base_mut().set_previous(account.previous());
        change.base_mut().set_sequence(account.sequence().unwrap());
        change.base_mut().set_fee(MINIMUM_FEE);
        change.set_token_id(account.token_id());
        change.set_setting(Setting::Issuance).unwrap();
        change.set_value(true);
        change.sign(&key.to_bytes()).unwrap();
        change.into()
    }

    fn run<F: std::future::Future>(future: F) -> F::Output {
        tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap()
            .block_on(future)
    }

    #[test]
    fn test_state_from_issuance() {
        let account = token_account(Settings::empty(), Privileges::empty());
        assert_eq!(account.token_balance(), Amount(1_000));
        assert_eq!(account.total_supply(), Amount(1_000));
        assert_eq!(account.symbol(), "TST");
        assert_eq!(account.label(), "TST");
        assert_eq!(account.balance(), Amount(MINIMUM_FEE.0 * 10));
    }

    #[test]
    fn test_change_setting_needs_privilege_and_modifier() {
        let both = token_account(
            Settings::empty().with(Setting::ModifyIssuance),
            Privileges::empty().with(Privilege::ChangeIssuance),
        );
        let request = change_issuance(&both);
        assert!(run(both.validate_request(&request, 0)).is_ok());

        let no_privilege = token_account(Settings::empty().with(Setting::ModifyIssuance), Privileges::empty());
        let request = change_issuance(&no_privilege);
        match run(no_privilege.validate_request(&request, 0)) {
            Err(AccountError::Rejected { reason }) => assert!(reason.contains("change_issuance")),
            other => panic!("unexpected {:?}", other),
        }

        let locked = token_account(Settings::empty(), Privileges::empty().with(Privilege::ChangeIssuance));
        let request = change_issuance(&locked);
        match run(locked.validate_request(&request, 0)) {
            Err(AccountError::Rejected { reason }) => assert!(reason.contains("modify_issuance")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_confirmed_admin_request_updates_state() {
        let mut account = token_account(
            Settings::empty().with(Setting::ModifyIssuance),
            Privileges::empty().with(Privilege::ChangeIssuance),
        );
        let before = account.balance();
        let request = change_issuance(&account);
        run(account.process_request(request.clone())).unwrap();
        assert!(account.has_setting(Setting::Issuance));
        assert_eq!(account.chain().len(), 1);
        assert_eq!(account.balance(), before.saturating_sub(MINIMUM_FEE));
        // duplicate delivery is ignored
        run(account.process_request(request)).unwrap();
        assert_eq!(account.chain().len(), 1);
        assert!(account.verify_chain().is_ok());
    }

    #[test]
    fn test_fee_charged_before_funding_arrives() {
        let settings = Settings::empty().with(Setting::ModifyIssuance);
        let privileges = Privileges::empty().with(Privilege::ChangeIssuance);
        let lazy = AccountOptions {
            full_sync: false,
            ..AccountOptions::default()
        };
        let mut incremental = TokenAccount::from_issuance(issuance(settings, privileges), lazy, None).unwrap();
        let mut replay =
            TokenAccount::from_issuance(issuance(settings, privileges), AccountOptions::default(), None).unwrap();
        let change = change_issuance(&incremental);
        let funds = funding(incremental.public_key());

        for account in [&mut incremental, &mut replay] {
            run(account.process_request(change.clone())).unwrap();
            assert_eq!(account.balance(), Amount::ZERO);
            run(account.process_request(funds.clone())).unwrap();
            assert_eq!(account.balance(), Amount(MINIMUM_FEE.0 * 9));
        }
        assert_eq!(incremental.state(), replay.state());
    }

    #[test]
    fn test_minimum_token_fee() {
        let mut account = token_account(Settings::empty(), Privileges::empty());
        account.state.fee_type = FeeType::Percentage;
        account.state.fee_rate = Amount(3);
        account.update_pending_balances();
        assert_eq!(account.minimum_token_fee(Amount(250)), Amount(7));

        account.state.fee_type = FeeType::Flat;
        account.update_pending_balances();
        assert_eq!(account.minimum_token_fee(Amount(250)), Amount(3));
    }

    #[test]
    fn test_destination_rules() {
        let mut account = token_account(Settings::empty().with(Setting::Whitelist), Privileges::empty());
        let holder = PublicKey([5; 32]);
        assert!(!run(account.valid_token_destination(&holder)).unwrap());
        account.state.account_statuses.insert(
            holder,
            AccountStatus {
                frozen: false,
                whitelisted: true,
            },
        );
        account.update_pending_balances();
        assert!(run(account.valid_token_destination(&holder)).unwrap());
        account.state.account_statuses.get_mut(&holder).unwrap().frozen = true;
        account.update_pending_balances();
        assert!(!run(account.valid_token_destination(&holder)).unwrap());
    }
}
