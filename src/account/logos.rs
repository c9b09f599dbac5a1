//! User accounts: key holders that send, receive and control tokens

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use super::balance::Ledger;
use super::combine::{self, Batch};
use super::{Account, AccountCore, AccountError, AccountOptions, TokenAccount, TokenAccounts};
use crate::codec::Amount;
use crate::constants::{GENESIS_HASH, MINIMUM_FEE};
use crate::crypto::{Hash, PrivateKey, PublicKey};
use crate::request::{
    self, AdjustFee, AdjustUserStatus, Burn, ChangeSetting, Controller, ControllerAction, Distribute,
    FeeType, ImmuteSetting, Issuance, IssueAdditional, Request, Revoke, Setting,
    TokenSend, Transaction, UpdateController, UpdateIssuerInfo, UserStatus, WithdrawFee,
    WithdrawLogos,
};
use crate::rpc::Rpc;

/// An account backed by a private key
#[derive(Debug)]
pub struct LogosAccount {
    core: AccountCore,
    private_key: PrivateKey,
    ledger: Ledger,
    pending_ledger: Ledger,
    tokens: Vec<Hash>,
}

impl LogosAccount {
    pub fn new(
        private_key: PrivateKey,
        label: impl Into<String>,
        options: AccountOptions,
        rpc: Option<Arc<dyn Rpc>>,
    ) -> Self {
        LogosAccount {
            core: AccountCore::new(private_key.public_key(), label, options, rpc),
            private_key,
            ledger: Ledger::default(),
            pending_ledger: Ledger::default(),
            tokens: Vec::new(),
        }
    }

    pub fn private_key(&self) -> &PrivateKey {
        &self.private_key
    }

    pub fn token_balance(&self, token_id: &Hash) -> Amount {
        self.ledger.token(token_id)
    }

    pub fn pending_token_balance(&self, token_id: &Hash) -> Amount {
        self.pending_ledger.token(token_id)
    }

    pub fn token_balances(&self) -> HashMap<Hash, Amount> {
        self.ledger.tokens()
    }

    /// Tokens this account has held or handled
    pub fn tokens(&self) -> &[Hash] {
        &self.tokens
    }

    fn note_token(&mut self, token_id: Hash) {
        if !self.tokens.contains(&token_id) {
            self.tokens.push(token_id);
        }
    }

    /// Balances left once the pending requests ahead of `position` settle
    fn ledger_before(&self, position: usize) -> Ledger {
        let key = self.public_key();
        let mut ledger = self.ledger.clone();
        for request in self.core.pending_chain.iter().take(position) {
            ledger.apply_sent(&key, request);
        }
        ledger
    }

    /// Recompute confirmed balances from scratch: credits from the receive
    /// chain, then debits from the chain
    pub fn update_balances_from_chain(&mut self) {
        let key = self.public_key();
        let mut ledger = Ledger::default();
        for request in &self.core.receive_chain {
            ledger.apply_received(&key, request);
        }
        for request in &self.core.chain {
            ledger.apply_sent(&key, request);
        }
        self.ledger = ledger;
        self.update_pending_balances();
    }

    /// Apply only the change one newly confirmed request makes
    pub fn update_balances_from_request(&mut self, request: &Request) {
        let key = self.public_key();
        if self.owns(request) {
            self.ledger.apply_sent(&key, request);
        } else if self.receives(request) {
            self.ledger.apply_received(&key, request);
        }
        self.update_pending_balances();
    }

    fn apply_confirmed(&mut self, request: &Request) {
        if self.core.options.full_sync {
            self.update_balances_from_chain();
        } else {
            self.update_balances_from_request(request);
        }
    }

    /// Handle a confirmed request delivered for this account.
    ///
    /// Own requests settle against the pending chain, received ones go to
    /// the receive chain. Afterwards the next pending request is published,
    /// repacked first when batching is on.
    pub async fn process_request(&mut self, request: Request, tokens: &TokenAccounts) -> Result<(), AccountError> {
        let hash = request.hash()?;
        if !request.verify()? {
            return Err(AccountError::BadSignature(hash));
        }
        if self.owns(&request) {
            if !self.settle_confirmed(&request, &hash) {
                return Ok(());
            }
            self.add_to_send_chain(request.clone());
        } else if self.receives(&request) {
            if !self.add_to_receive_chain(request.clone()) {
                return Ok(());
            }
        } else {
            debug!(address = %self.address(), hash = %hash, "request does not concern account");
            return Ok(());
        }
        if let Some(token_id) = request.token_id() {
            if !matches!(request, Request::Issuance(_)) {
                self.note_token(token_id);
            }
        }
        self.apply_confirmed(&request);

        if self.core.options.batch_sends {
            self.combine_requests(tokens).await;
        } else {
            self.broadcast_request().await;
        }
        Ok(())
    }

    /// Replace the pending chain with the fewest sends carrying the same
    /// transactions, then publish the new head.
    ///
    /// Nothing is repacked while a pending request is published, when the
    /// chain holds other request types, or when a token's account is
    /// unknown.
    pub async fn combine_requests(&mut self, tokens: &TokenAccounts) {
        if let Some(batches) = combine::plan(&self.core.pending_chain) {
            let known = batches
                .iter()
                .filter_map(|b| b.token_id)
                .all(|id| tokens.contains_key(&id));
            if known {
                let before = self.core.pending_chain.len();
                match self.repack(batches, tokens) {
                    Ok(()) => debug!(
                        address = %self.address(),
                        before,
                        after = self.core.pending_chain.len(),
                        "combined pending requests"
                    ),
                    Err(e) => {
                        warn!(address = %self.address(), error = %e, "could not combine pending requests");
                        self.remove_pending_requests();
                    }
                }
            }
        }
        self.broadcast_request().await;
    }

    /// Each replacement keeps the highest fee and token fee among the
    /// requests it absorbed, raised to the minimums when those are higher.
    fn repack(&mut self, batches: Vec<Batch>, tokens: &TokenAccounts) -> Result<(), AccountError> {
        self.core.pending_chain.clear();
        for batch in batches {
            let fee = batch.fee.max(MINIMUM_FEE);
            let mut request: Request = match batch.token_id {
                None => {
                    let mut send = request::Send::new();
                    send.set_transactions(batch.transactions)?;
                    send.into()
                }
                Some(token_id) => {
                    let token = tokens
                        .get(&token_id)
                        .ok_or(AccountError::UnknownTokenAccount(token_id))?;
                    let mut send = TokenSend::new();
                    send.set_token_id(token_id);
                    send.set_transactions(batch.transactions)?;
                    send.set_token_fee(batch.token_fee.max(token.minimum_token_fee(send.total_amount())));
                    send.into()
                }
            };
            self.prepare(&mut request)?;
            request.base_mut().set_fee(fee);
            self.sign(&mut request)?;
            self.core.pending_chain.push(request);
        }
        self.update_pending_balances();
        Ok(())
    }

    /// Point a request at this account's tip
    fn prepare(&self, request: &mut Request) -> Result<(), AccountError> {
        let previous = self.previous();
        let sequence = self.sequence()?;
        let origin = self.public_key();
        let base = request.base_mut();
        base.set_origin(origin);
        base.set_previous(previous);
        base.set_sequence(sequence);
        base.set_fee(MINIMUM_FEE);
        Ok(())
    }

    fn sign(&self, request: &mut Request) -> Result<(), AccountError> {
        if request.sign(&self.private_key.to_bytes())? {
            Ok(())
        } else {
            Err(AccountError::BadSignature(request.hash()?))
        }
    }

    /// With lazy errors, state rejections are logged and the request is
    /// queued anyway
    fn tolerate(&self, result: Result<(), AccountError>) -> Result<(), AccountError> {
        match result {
            Err(AccountError::Rejected { reason }) if self.core.options.lazy_errors => {
                warn!(address = %self.address(), reason = %reason, "queueing request that fails validation");
                Ok(())
            }
            other => other,
        }
    }

    /// Validate, sign and queue a request already pointed at this account's
    /// tip
    async fn submit(&mut self, mut request: Request) -> Result<Request, AccountError> {
        request.hash()?;
        let position = self.core.pending_chain.len();
        let checked = self.validate_request(&request, position).await;
        self.tolerate(checked)?;
        self.sign(&mut request)?;
        self.add_request(request.clone()).await;
        Ok(request)
    }

    /// Controller requests chain onto the token account and queue there
    async fn submit_to_token(&mut self, token: &mut TokenAccount, mut request: Request) -> Result<Request, AccountError> {
        let sequence = token.sequence()?;
        let base = request.base_mut();
        base.set_origin(self.public_key());
        base.set_previous(token.previous());
        base.set_sequence(sequence);
        base.set_fee(MINIMUM_FEE);
        request.hash()?;
        let position = token.pending_chain().len();
        let checked = token.validate_request(&request, position).await;
        self.tolerate(checked)?;
        self.sign(&mut request)?;
        token.add_request(request.clone()).await;
        Ok(request)
    }

    pub async fn create_send_request(&mut self, transactions: Vec<Transaction>) -> Result<Request, AccountError> {
        let mut send = request::Send::new();
        send.set_transactions(transactions)?;
        let mut request = Request::from(send);
        self.prepare(&mut request)?;
        self.submit(request).await
    }

    /// Token fee defaults to the token's minimum for the total sent
    pub async fn create_token_send_request(
        &mut self,
        token: &TokenAccount,
        transactions: Vec<Transaction>,
        token_fee: Option<Amount>,
    ) -> Result<Request, AccountError> {
        let mut send = TokenSend::new();
        send.set_token_id(token.token_id());
        send.set_transactions(transactions)?;
        let fee = token_fee.unwrap_or_else(|| token.minimum_token_fee(send.total_amount()));
        send.set_token_fee(fee);
        let checked = token.validate_token_send(&self.public_key(), &send).await;
        self.tolerate(checked)?;
        let mut request = Request::from(send);
        self.prepare(&mut request)?;
        self.submit(request).await
    }

    /// Issue a new token. The token ID is fixed from this account's tip.
    pub async fn create_issuance_request(&mut self, issuance: Issuance) -> Result<Request, AccountError> {
        let mut request = Request::from(issuance);
        self.prepare(&mut request)?;
        if let Request::Issuance(issuance) = &mut request {
            issuance.freeze_token_id()?;
        }
        self.submit(request).await
    }

    pub async fn create_issue_additional_request(
        &mut self,
        token: &mut TokenAccount,
        amount: Amount,
    ) -> Result<Request, AccountError> {
        let mut request = IssueAdditional::new();
        request.set_token_id(token.token_id());
        request.set_amount(amount);
        self.submit_to_token(token, request.into()).await
    }

    pub async fn create_change_setting_request(
        &mut self,
        token: &mut TokenAccount,
        setting: Setting,
        value: bool,
    ) -> Result<Request, AccountError> {
        let mut request = ChangeSetting::new();
        request.set_token_id(token.token_id());
        request.set_setting(setting)?;
        request.set_value(value);
        self.submit_to_token(token, request.into()).await
    }

    pub async fn create_immute_setting_request(
        &mut self,
        token: &mut TokenAccount,
        setting: Setting,
    ) -> Result<Request, AccountError> {
        let mut request = ImmuteSetting::new();
        request.set_token_id(token.token_id());
        request.set_setting(setting)?;
        self.submit_to_token(token, request.into()).await
    }

    pub async fn create_revoke_request(
        &mut self,
        token: &mut TokenAccount,
        source: PublicKey,
        transaction: Transaction,
    ) -> Result<Request, AccountError> {
        let mut request = Revoke::new();
        request.set_token_id(token.token_id());
        request.set_source(source);
        request.set_transaction(transaction);
        self.submit_to_token(token, request.into()).await
    }

    pub async fn create_adjust_user_status_request(
        &mut self,
        token: &mut TokenAccount,
        account: PublicKey,
        status: UserStatus,
    ) -> Result<Request, AccountError> {
        let mut request = AdjustUserStatus::new();
        request.set_token_id(token.token_id());
        request.set_account(account);
        request.set_status(status);
        self.submit_to_token(token, request.into()).await
    }

    pub async fn create_adjust_fee_request(
        &mut self,
        token: &mut TokenAccount,
        fee_type: FeeType,
        fee_rate: Amount,
    ) -> Result<Request, AccountError> {
        let mut request = AdjustFee::new();
        request.set_token_id(token.token_id());
        // rate first so a percentage type is checked against the new rate
        request.set_fee_type(FeeType::Flat)?;
        request.set_fee_rate(fee_rate)?;
        request.set_fee_type(fee_type)?;
        self.submit_to_token(token, request.into()).await
    }

    pub async fn create_update_issuer_info_request(
        &mut self,
        token: &mut TokenAccount,
        issuer_info: &str,
    ) -> Result<Request, AccountError> {
        let mut request = UpdateIssuerInfo::new();
        request.set_token_id(token.token_id());
        request.set_issuer_info(issuer_info)?;
        self.submit_to_token(token, request.into()).await
    }

    pub async fn create_update_controller_request(
        &mut self,
        token: &mut TokenAccount,
        action: ControllerAction,
        controller: Controller,
    ) -> Result<Request, AccountError> {
        let mut request = UpdateController::new();
        request.set_token_id(token.token_id());
        request.set_action(action);
        request.set_controller(controller);
        self.submit_to_token(token, request.into()).await
    }

    pub async fn create_burn_request(&mut self, token: &mut TokenAccount, amount: Amount) -> Result<Request, AccountError> {
        let mut request = Burn::new();
        request.set_token_id(token.token_id());
        request.set_amount(amount);
        self.submit_to_token(token, request.into()).await
    }

    pub async fn create_distribute_request(
        &mut self,
        token: &mut TokenAccount,
        transaction: Transaction,
    ) -> Result<Request, AccountError> {
        let mut request = Distribute::new();
        request.set_token_id(token.token_id());
        request.set_transaction(transaction);
        self.submit_to_token(token, request.into()).await
    }

    pub async fn create_withdraw_fee_request(
        &mut self,
        token: &mut TokenAccount,
        transaction: Transaction,
    ) -> Result<Request, AccountError> {
        let mut request = WithdrawFee::new();
        request.set_token_id(token.token_id());
        request.set_transaction(transaction);
        self.submit_to_token(token, request.into()).await
    }

    pub async fn create_withdraw_logos_request(
        &mut self,
        token: &mut TokenAccount,
        transaction: Transaction,
    ) -> Result<Request, AccountError> {
        let mut request = WithdrawLogos::new();
        request.set_token_id(token.token_id());
        request.set_transaction(transaction);
        self.submit_to_token(token, request.into()).await
    }

    /// Load the account from the network: the whole history with
    /// `full_sync`, otherwise only the two tips plus the reported balances
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
        for key in info.tokens.keys() {
            match Hash::from_hex(key) {
                Ok(token_id) => self.note_token(token_id),
                Err(_) => warn!(address = %address, token = %key, "ignoring malformed token id"),
            }
        }

        if self.core.options.full_sync {
            for raw in rpc.accounts_history(&address, None).await? {
                let request = Request::from_json(&raw)?;
                if self.owns(&request) {
                    self.core.chain.push(request);
                } else if self.receives(&request) {
                    if let Some(token_id) = request.token_id() {
                        self.note_token(token_id);
                    }
                    self.core.receive_chain.push(request);
                }
            }
            if self.core.options.validate_sync {
                self.verify_chain()?;
                self.verify_receive_chain()?;
            }
            self.update_balances_from_chain();
        } else {
            for tip in [info.frontier, info.receive_tip] {
                if tip == GENESIS_HASH {
                    continue;
                }
                if let Some(raw) = rpc.requests_info(&tip).await? {
                    let request = Request::from_json(&raw)?;
                    if self.owns(&request) {
                        self.core.chain.push(request);
                    } else {
                        self.core.receive_chain.push(request);
                    }
                }
            }
            let tokens = info
                .tokens
                .iter()
                .filter_map(|(key, entry)| Hash::from_hex(key).ok().map(|id| (id, entry.balance)));
            self.ledger = Ledger::with_balances(info.balance, tokens);
            self.update_pending_balances();
        }
        self.core.synced = true;
        debug!(
            address = %address,
            requests = self.core.chain.len(),
            received = self.core.receive_chain.len(),
            "synced account"
        );
        Ok(())
    }

    /// Compare the local tips and balance with the delegate's view
    pub async fn is_synced(&mut self) -> Result<bool, AccountError> {
        let rpc = match &self.core.rpc {
            Some(rpc) => Arc::clone(rpc),
            None => return Ok(self.core.synced),
        };
        let info = rpc.accounts_info(self.address()).await?;
        let tip = |chain: &[Request]| chain.last().and_then(|r| r.hash().ok()).unwrap_or(GENESIS_HASH);
        let synced = match info {
            None => self.core.chain.is_empty() && self.core.receive_chain.is_empty(),
            Some(info) => {
                info.frontier == tip(&self.core.chain)
                    && info.receive_tip == tip(&self.core.receive_chain)
                    && info.balance == self.ledger.balance()
            }
        };
        self.core.synced = synced;
        Ok(synced)
    }
}

fn require_balance(what: &str, have: Amount, need: Option<Amount>) -> Result<(), AccountError> {
    match need {
        Some(need) if have >= need => Ok(()),
        Some(need) => Err(AccountError::rejected(format!(
            "{} balance {} is below the required {}",
            what, have, need
        ))),
        None => Err(AccountError::rejected(format!("{} amount overflows", what))),
    }
}

#[async_trait]
impl Account for LogosAccount {
    fn core(&self) -> &AccountCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut AccountCore {
        &mut self.core
    }

    fn balance(&self) -> Amount {
        self.ledger.balance()
    }

    fn pending_balance(&self) -> Amount {
        self.pending_ledger.balance()
    }

    fn update_pending_balances(&mut self) {
        self.pending_ledger = self.ledger_before(self.core.pending_chain.len());
    }

    fn owns(&self, request: &Request) -> bool {
        matches!(
            request,
            Request::Send(_) | Request::TokenSend(_) | Request::Issuance(_)
        ) && request.origin() == Some(self.public_key())
    }

    fn receives(&self, request: &Request) -> bool {
        if self.owns(request) {
            return false;
        }
        let key = self.public_key();
        match request {
            Request::Revoke(revoke) if revoke.source() == Some(key) => true,
            _ => request.destinations().contains(&key),
        }
    }

    /// Balance sufficiency only; token rules are checked against the token
    /// account when the request is created
    async fn validate_request(&self, request: &Request, position: usize) -> Result<(), AccountError> {
        let ledger = self.ledger_before(position);
        let fee = request.fee();
        match request {
            Request::Send(send) => require_balance("base", ledger.balance(), send.total_amount().checked_add(fee)),
            Request::TokenSend(send) => {
                require_balance("base", ledger.balance(), Some(fee))?;
                let token_id = send.token_id().ok_or(request::RequestError::Missing("tokenID"))?;
                require_balance(
                    "token",
                    ledger.token(&token_id),
                    send.total_amount().checked_add(send.token_fee()),
                )
            }
            Request::Issuance(_) => require_balance("base", ledger.balance(), Some(fee)),
            other => Err(AccountError::rejected(format!(
                "{} requests are issued against a token account",
                other.request_type()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::ChainError;
    use crate::request::RequestKind;

    fn funded(amount: u128) -> LogosAccount {
        let mut account = LogosAccount::new(PrivateKey::from_bytes(&[1; 32]), "main", AccountOptions::default(), None);
        account.ledger = Ledger::new(Amount(amount));
        account.update_pending_balances();
        account
    }

    fn run<F: std::future::Future>(future: F) -> F::Output {
        tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap()
            .block_on(future)
    }

    fn pay(amount: u128) -> Vec<Transaction> {
        vec![Transaction::new(PublicKey([9; 32]), Amount(amount))]
    }

    #[test]
    fn test_requests_chain_onto_pending_tail() {
        let mut account = funded(MINIMUM_FEE.0 * 10);
        let first = run(account.create_send_request(pay(1))).unwrap();
        let second = run(account.create_send_request(pay(2))).unwrap();
        assert_eq!(first.previous(), Some(GENESIS_HASH));
        assert_eq!(first.sequence(), Some(0));
        assert_eq!(second.previous(), Some(first.hash().unwrap()));
        assert_eq!(second.sequence(), Some(1));
        assert_eq!(account.previous(), second.hash().unwrap());
        assert_eq!(account.pending_balance(), Amount(MINIMUM_FEE.0 * 8 - 3));
        assert!(second.verify().unwrap());
    }

    #[test]
    fn test_send_rejected_without_funds() {
        let mut account = funded(MINIMUM_FEE.0);
        let err = run(account.create_send_request(pay(1))).unwrap_err();
        assert!(matches!(err, AccountError::Rejected { .. }));
        assert!(account.pending_chain().is_empty());
    }

    #[test]
    fn test_lazy_errors_queue_invalid_requests() {
        let mut account = LogosAccount::new(
            PrivateKey::from_bytes(&[1; 32]),
            "main",
            AccountOptions {
                lazy_errors: true,
                ..AccountOptions::default()
            },
            None,
        );
        run(account.create_send_request(pay(1))).unwrap();
        assert_eq!(account.pending_chain().len(), 1);
    }

    #[test]
    fn test_validation_uses_balance_before_position() {
        let mut account = funded(MINIMUM_FEE.0 * 2 + 10);
        let first = run(account.create_send_request(pay(10))).unwrap();
        // head is checked against the confirmed balance, not the pending one
        assert!(run(account.validate_request(&first, 0)).is_ok());
        assert!(run(account.validate_request(&first, 1)).is_err());
    }

    #[test]
    fn test_confirmation_clears_pending() {
        let mut account = funded(MINIMUM_FEE.0 * 10);
        let request = run(account.create_send_request(pay(5))).unwrap();
        run(account.process_request(request.clone(), &TokenAccounts::new())).unwrap();
        assert!(account.pending_chain().is_empty());
        assert_eq!(account.chain().len(), 1);
        assert!(account.verify_chain().is_ok());
    }

    #[test]
    fn test_foreign_confirmation_discards_pending() {
        let mut account = funded(MINIMUM_FEE.0 * 10);
        run(account.create_send_request(pay(1))).unwrap();
        run(account.create_send_request(pay(2))).unwrap();

        // same key, different content: someone else wrote to this chain
        let mut rogue = request::Send::new();
        rogue.base_mut().set_origin(account.public_key());
        rogue.base_mut().set_previous(GENESIS_HASH);
        rogue.base_mut().set_sequence(0);
        rogue.base_mut().set_fee(MINIMUM_FEE);
        rogue.set_transactions(pay(77)).unwrap();
        rogue.sign(&account.private_key().to_bytes()).unwrap();

        run(account.process_request(rogue.into(), &TokenAccounts::new())).unwrap();
        assert!(account.pending_chain().is_empty());
        assert_eq!(account.chain().len(), 1);
        assert_eq!(account.pending_balance(), account.balance());
    }

    #[test]
    fn test_rejects_unsigned_confirmation() {
        let mut account = funded(0);
        let mut send = request::Send::new();
        send.base_mut().set_origin(PublicKey([3; 32]));
        send.base_mut().set_previous(GENESIS_HASH);
        send.base_mut().set_sequence(0);
        send.base_mut().set_fee(MINIMUM_FEE);
        send.set_transactions(vec![Transaction::new(account.public_key(), Amount(1))])
            .unwrap();
        let err = run(account.process_request(send.into(), &TokenAccounts::new())).unwrap_err();
        assert!(matches!(err, AccountError::Request(_)));
    }

    #[test]
    fn test_combine_repacks_pending_sends() {
        let mut account = funded(MINIMUM_FEE.0 * 10);
        for amount in 1..=5 {
            run(account.create_send_request(pay(amount))).unwrap();
        }
        run(account.combine_requests(&TokenAccounts::new()));
        assert_eq!(account.pending_chain().len(), 1);
        let combined = &account.pending_chain()[0];
        assert_eq!(combined.transactions().len(), 5);
        assert_eq!(combined.previous(), Some(GENESIS_HASH));
        assert!(combined.verify().unwrap());
        assert_eq!(account.pending_balance(), Amount(MINIMUM_FEE.0 * 9 - 15));
    }

    #[test]
    fn test_exhausted_sequence_is_an_error() {
        let mut account = funded(MINIMUM_FEE.0 * 10);
        let mut last = request::Send::new();
        last.base_mut().set_origin(account.public_key());
        last.base_mut().set_previous(Hash([4; 32]));
        last.base_mut().set_sequence(u32::MAX);
        last.base_mut().set_fee(MINIMUM_FEE);
        last.set_transactions(pay(1)).unwrap();
        last.sign(&account.private_key().to_bytes()).unwrap();
        account.add_to_send_chain(last.into());

        assert_eq!(account.sequence(), Err(ChainError::SequenceExhausted));
        let err = run(account.create_send_request(pay(1))).unwrap_err();
        assert_eq!(err, AccountError::Chain(ChainError::SequenceExhausted));
        assert!(account.pending_chain().is_empty());
        assert!(account.verify_chain().is_ok());
    }

    #[test]
    fn test_combine_keeps_raised_fee() {
        let mut account = funded(MINIMUM_FEE.0 * 10);
        run(account.create_send_request(pay(1))).unwrap();
        run(account.create_send_request(pay(2))).unwrap();
        // raise the fee on the queued tail
        let mut tail = account.core.pending_chain.pop().unwrap();
        tail.base_mut().set_fee(Amount(MINIMUM_FEE.0 * 2));
        account.sign(&mut tail).unwrap();
        account.core.pending_chain.push(tail);

        run(account.combine_requests(&TokenAccounts::new()));
        assert_eq!(account.pending_chain().len(), 1);
        assert_eq!(account.pending_chain()[0].fee(), Amount(MINIMUM_FEE.0 * 2));
        assert_eq!(account.pending_balance(), Amount(MINIMUM_FEE.0 * 8 - 3));
    }

    #[test]
    fn test_recent_and_up_to() {
        let mut account = funded(MINIMUM_FEE.0 * 10);
        let mut hashes = Vec::new();
        for amount in 1..=4 {
            let request = run(account.create_send_request(pay(amount))).unwrap();
            hashes.push(request.hash().unwrap());
        }
        let recent = account.recent_pending_requests(2, 1);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].hash().unwrap(), hashes[2]);
        assert_eq!(account.recent_pending_requests(10, 0).len(), 4);

        let up_to = account.get_pending_requests_up_to(&hashes[1]);
        assert!(up_to.found);
        assert_eq!(up_to.requests.len(), 3);
        let missing = account.get_pending_requests_up_to(&Hash([0xee; 32]));
        assert!(!missing.found);
        assert_eq!(missing.requests.len(), 4);

        assert!(account.get_pending_request(&hashes[0]).is_some());
        assert!(account.get_request(&hashes[0]).is_none());
        assert!(account.remove_pending_request(&hashes[3]));
        assert!(!account.remove_pending_request(&hashes[3]));
    }
}
