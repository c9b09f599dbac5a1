//! Balance bookkeeping for user accounts
//!
//! Replaying a chain and applying confirmations one at a time go through the
//! same two functions and the same order-independent tallies, so both
//! strategies agree whatever order confirmations arrive in.

use std::collections::HashMap;

use crate::codec::Amount;
use crate::crypto::{Hash, PublicKey};
use crate::request::Request;

/// Net of the credits and debits applied so far.
///
/// Debits may arrive before the credits that cover them. The tally keeps the
/// shortfall instead of clamping, so the settled amount does not depend on
/// delivery order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    surplus: u128,
    shortfall: u128,
}

impl Tally {
    pub fn new(amount: Amount) -> Self {
        Tally {
            surplus: amount.0,
            shortfall: 0,
        }
    }

    pub fn credit(&mut self, amount: Amount) {
        if amount.0 >= self.shortfall {
            self.surplus = self.surplus.saturating_add(amount.0 - self.shortfall);
            self.shortfall = 0;
        } else {
            self.shortfall -= amount.0;
        }
    }

    pub fn debit(&mut self, amount: Amount) {
        if amount.0 <= self.surplus {
            self.surplus -= amount.0;
        } else {
            self.shortfall = self.shortfall.saturating_add(amount.0 - self.surplus);
            self.surplus = 0;
        }
    }

    /// Settled amount; zero while debits run ahead of credits
    pub fn amount(&self) -> Amount {
        Amount(self.surplus)
    }

    /// Debits still waiting for the credits that cover them
    pub fn shortfall(&self) -> Amount {
        Amount(self.shortfall)
    }
}

impl From<Amount> for Tally {
    fn from(amount: Amount) -> Self {
        Tally::new(amount)
    }
}

/// Base-currency and per-token balances
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ledger {
    balance: Tally,
    tokens: HashMap<Hash, Tally>,
}

impl Ledger {
    pub fn new(balance: Amount) -> Self {
        Ledger {
            balance: Tally::new(balance),
            tokens: HashMap::new(),
        }
    }

    /// Ledger seeded with balances reported by a delegate
    pub fn with_balances(balance: Amount, tokens: impl IntoIterator<Item = (Hash, Amount)>) -> Self {
        Ledger {
            balance: Tally::new(balance),
            tokens: tokens.into_iter().map(|(id, amount)| (id, Tally::new(amount))).collect(),
        }
    }

    pub fn balance(&self) -> Amount {
        self.balance.amount()
    }

    pub fn token(&self, token_id: &Hash) -> Amount {
        self.tokens.get(token_id).map_or(Amount::ZERO, Tally::amount)
    }

    pub fn tokens(&self) -> HashMap<Hash, Amount> {
        self.tokens.iter().map(|(id, tally)| (*id, tally.amount())).collect()
    }

    fn credit(&mut self, amount: Amount) {
        self.balance.credit(amount);
    }

    fn debit(&mut self, amount: Amount) {
        self.balance.debit(amount);
    }

    fn credit_token(&mut self, token_id: Hash, amount: Amount) {
        self.tokens.entry(token_id).or_default().credit(amount);
    }

    fn debit_token(&mut self, token_id: Hash, amount: Amount) {
        self.tokens.entry(token_id).or_default().debit(amount);
    }

    /// Effect of a request on `account`'s own chain: fees and amounts out,
    /// plus anything the request pays back to `account` itself
    pub(crate) fn apply_sent(&mut self, account: &PublicKey, request: &Request) {
        match request {
            Request::Send(send) => {
                self.debit(request.fee());
                for tx in send.transactions() {
                    self.debit(tx.amount);
                    if tx.destination == *account {
                        self.credit(tx.amount);
                    }
                }
            }
            Request::TokenSend(send) => {
                self.debit(request.fee());
                if let Some(token_id) = send.token_id() {
                    self.debit_token(token_id, send.token_fee());
                    for tx in send.transactions() {
                        self.debit_token(token_id, tx.amount);
                        if tx.destination == *account {
                            self.credit_token(token_id, tx.amount);
                        }
                    }
                }
            }
            Request::Issuance(_) => self.debit(request.fee()),
            _ => {}
        }
    }

    /// Effect of a confirmed request issued elsewhere
    pub(crate) fn apply_received(&mut self, account: &PublicKey, request: &Request) {
        let to_me = |destination: &PublicKey| destination == account;
        match request {
            Request::Send(send) => {
                for tx in send.transactions().iter().filter(|tx| to_me(&tx.destination)) {
                    self.credit(tx.amount);
                }
            }
            Request::TokenSend(send) => {
                if let Some(token_id) = send.token_id() {
                    for tx in send.transactions().iter().filter(|tx| to_me(&tx.destination)) {
                        self.credit_token(token_id, tx.amount);
                    }
                }
            }
            Request::Revoke(revoke) => {
                if let (Some(token_id), Some(tx)) = (revoke.token_id(), revoke.transaction()) {
                    if revoke.source().as_ref() == Some(account) {
                        self.debit_token(token_id, tx.amount);
                    }
                    if to_me(&tx.destination) {
                        self.credit_token(token_id, tx.amount);
                    }
                }
            }
            Request::Distribute(_) | Request::WithdrawFee(_) => {
                if let Some(token_id) = request.token_id() {
                    for tx in request.transactions().iter().filter(|tx| to_me(&tx.destination)) {
                        self.credit_token(token_id, tx.amount);
                    }
                }
            }
            Request::WithdrawLogos(_) => {
                for tx in request.transactions().iter().filter(|tx| to_me(&tx.destination)) {
                    self.credit(tx.amount);
                }
            }
            _ => {}
        }
    }
}
