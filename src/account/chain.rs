//! Chain storage and the behaviour every account shares

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error, warn};

use super::{AccountError, AccountOptions, ChainError};
use crate::codec::Amount;
use crate::constants::GENESIS_HASH;
use crate::crypto::{Hash, PublicKey};
use crate::request::Request;
use crate::rpc::Rpc;

/// Requests from the tip back to a searched hash, newest first
#[derive(Debug, Clone, PartialEq)]
pub struct RequestsUpTo<'a> {
    pub requests: Vec<&'a Request>,
    /// `false` when the hash was never met and `requests` is the whole chain
    pub found: bool,
}

/// State common to every account: identity, the three chains and the
/// collaborator handle
pub struct AccountCore {
    address: String,
    public_key: PublicKey,
    label: String,
    pub(crate) chain: Vec<Request>,
    pub(crate) receive_chain: Vec<Request>,
    pub(crate) pending_chain: Vec<Request>,
    pub(crate) options: AccountOptions,
    pub(crate) rpc: Option<Arc<dyn Rpc>>,
    pub(crate) synced: bool,
}

impl AccountCore {
    pub fn new(
        public_key: PublicKey,
        label: impl Into<String>,
        options: AccountOptions,
        rpc: Option<Arc<dyn Rpc>>,
    ) -> Self {
        AccountCore {
            address: public_key.to_address(),
            public_key,
            label: label.into(),
            chain: Vec::new(),
            receive_chain: Vec::new(),
            pending_chain: Vec::new(),
            options,
            rpc,
            synced: false,
        }
    }
}

impl std::fmt::Debug for AccountCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountCore")
            .field("address", &self.address)
            .field("label", &self.label)
            .field("chain", &self.chain.len())
            .field("receive_chain", &self.receive_chain.len())
            .field("pending_chain", &self.pending_chain.len())
            .field("synced", &self.synced)
            .finish()
    }
}

/// Shared account behaviour.
///
/// Implementors supply their balance bookkeeping and validation rules; chain
/// linkage, lookups, pending-chain management and broadcasting are provided.
#[async_trait]
pub trait Account: std::marker::Send + Sync {
    fn core(&self) -> &AccountCore;

    fn core_mut(&mut self) -> &mut AccountCore;

    /// Confirmed base-currency balance
    fn balance(&self) -> Amount;

    /// Balance after every pending request
    fn pending_balance(&self) -> Amount;

    /// Re-derive pending balances from the confirmed ones plus the pending
    /// chain
    fn update_pending_balances(&mut self);

    /// Whether a confirmed request belongs on this account's own chain
    fn owns(&self, request: &Request) -> bool;

    /// Whether a confirmed request credits or debits this account without
    /// being on its chain
    fn receives(&self, request: &Request) -> bool;

    /// Extra per-entry check run by [`Account::verify_chain`]
    fn check_chain_entry(&self, _index: usize, _request: &Request) -> Result<(), ChainError> {
        Ok(())
    }

    /// Check `request` against the state left by the pending requests in
    /// front of `position`
    async fn validate_request(&self, request: &Request, position: usize) -> Result<(), AccountError>;

    fn address(&self) -> &str {
        &self.core().address
    }

    fn public_key(&self) -> PublicKey {
        self.core().public_key
    }

    fn label(&self) -> &str {
        &self.core().label
    }

    fn set_label(&mut self, label: impl Into<String>)
    where
        Self: Sized,
    {
        self.core_mut().label = label.into();
    }

    fn options(&self) -> AccountOptions {
        self.core().options
    }

    fn synced(&self) -> bool {
        self.core().synced
    }

    fn chain(&self) -> &[Request] {
        &self.core().chain
    }

    fn receive_chain(&self) -> &[Request] {
        &self.core().receive_chain
    }

    fn pending_chain(&self) -> &[Request] {
        &self.core().pending_chain
    }

    /// Tip a new request must link to: the pending tail, else the chain
    /// tail, else genesis
    fn previous(&self) -> Hash {
        let core = self.core();
        core.pending_chain
            .last()
            .or_else(|| core.chain.last())
            .and_then(|r| r.hash().ok())
            .unwrap_or(GENESIS_HASH)
    }

    /// Sequence of the next request. Sequences are four bytes, so a chain
    /// whose tip sits at `u32::MAX` takes no more requests.
    fn sequence(&self) -> Result<u32, ChainError> {
        let core = self.core();
        match core
            .pending_chain
            .last()
            .or_else(|| core.chain.last())
            .and_then(Request::sequence)
        {
            Some(tip) => tip.checked_add(1).ok_or(ChainError::SequenceExhausted),
            None => Ok(0),
        }
    }

    /// Walk the chain checking linkage, sequence and signatures. A chain
    /// whose first entry is not sequence 0 (a lazily synced frontier) is
    /// checked from that entry onwards.
    fn verify_chain(&self) -> Result<(), ChainError> {
        let mut expected: Option<(Hash, Option<u32>)> = None;
        for (index, request) in self.chain().iter().enumerate() {
            let hash = request
                .hash()
                .map_err(|source| ChainError::Malformed { index, source })?;
            let previous = request.previous().unwrap_or(GENESIS_HASH);
            let sequence = request.sequence().unwrap_or(0);
            let (expected_previous, expected_sequence) = match expected {
                Some((_, None)) => return Err(ChainError::SequenceExhausted),
                Some((hash, Some(next))) => (hash, next),
                None if sequence == 0 => (GENESIS_HASH, 0),
                None => (previous, sequence),
            };
            if previous != expected_previous {
                return Err(ChainError::Linkage {
                    index,
                    expected: expected_previous,
                    found: previous,
                });
            }
            if sequence != expected_sequence {
                return Err(ChainError::Sequence {
                    index,
                    expected: expected_sequence,
                    found: sequence,
                });
            }
            if !request.verify().unwrap_or(false) {
                return Err(ChainError::Signature { index, hash });
            }
            self.check_chain_entry(index, request)?;
            expected = Some((hash, sequence.checked_add(1)));
        }
        Ok(())
    }

    /// Received requests come from many chains, so only signatures and
    /// relevance are checked
    fn verify_receive_chain(&self) -> Result<(), ChainError> {
        for (index, request) in self.receive_chain().iter().enumerate() {
            let hash = request
                .hash()
                .map_err(|source| ChainError::Malformed { index, source })?;
            if !request.verify().unwrap_or(false) {
                return Err(ChainError::Signature { index, hash });
            }
            if !self.receives(request) {
                return Err(ChainError::Unrelated { index, hash });
            }
        }
        Ok(())
    }

    fn recent_requests(&self, count: usize, offset: usize) -> Vec<&Request> {
        recent(self.chain(), count, offset)
    }

    fn recent_pending_requests(&self, count: usize, offset: usize) -> Vec<&Request> {
        recent(self.pending_chain(), count, offset)
    }

    fn recent_receive_requests(&self, count: usize, offset: usize) -> Vec<&Request> {
        recent(self.receive_chain(), count, offset)
    }

    fn get_requests_up_to(&self, hash: &Hash) -> RequestsUpTo<'_> {
        up_to(self.chain(), hash)
    }

    fn get_pending_requests_up_to(&self, hash: &Hash) -> RequestsUpTo<'_> {
        up_to(self.pending_chain(), hash)
    }

    fn get_receive_requests_up_to(&self, hash: &Hash) -> RequestsUpTo<'_> {
        up_to(self.receive_chain(), hash)
    }

    fn get_request(&self, hash: &Hash) -> Option<&Request> {
        find(self.chain(), hash)
    }

    fn get_pending_request(&self, hash: &Hash) -> Option<&Request> {
        find(self.pending_chain(), hash)
    }

    fn get_receive_request(&self, hash: &Hash) -> Option<&Request> {
        find(self.receive_chain(), hash)
    }

    /// Append unless a request with the same hash is already there
    fn add_to_send_chain(&mut self, request: Request) -> bool {
        push_unique(&mut self.core_mut().chain, request)
    }

    fn add_to_receive_chain(&mut self, request: Request) -> bool {
        push_unique(&mut self.core_mut().receive_chain, request)
    }

    /// Drop the first pending request with this hash
    fn remove_pending_request(&mut self, hash: &Hash) -> bool {
        let core = self.core_mut();
        match core
            .pending_chain
            .iter()
            .position(|r| r.hash().ok().as_ref() == Some(hash))
        {
            Some(index) => {
                core.pending_chain.remove(index);
                self.update_pending_balances();
                true
            }
            None => {
                debug!(address = %self.address(), hash = %hash, "pending request not found");
                false
            }
        }
    }

    /// Discard the whole pending chain; pending balances fall back to the
    /// confirmed ones
    fn remove_pending_requests(&mut self) {
        let dropped = self.core().pending_chain.len();
        self.core_mut().pending_chain.clear();
        self.update_pending_balances();
        if dropped > 0 {
            warn!(address = %self.address(), dropped, "discarded pending requests");
        }
    }

    /// Reconcile a confirmed request from this account's own chain with the
    /// pending chain. Returns `false` for a duplicate delivery.
    ///
    /// A confirmation that matches no pending entry while requests are
    /// pending means someone else is writing to this chain; every pending
    /// request was built on a stale tip and is discarded.
    fn settle_confirmed(&mut self, request: &Request, hash: &Hash) -> bool {
        if self.get_request(hash).is_some() {
            return false;
        }
        if self.get_pending_request(hash).is_some() {
            self.remove_pending_request(hash);
        } else if !self.pending_chain().is_empty() {
            error!(
                address = %self.address(),
                hash = %hash,
                sequence = ?request.sequence(),
                "confirmed request conflicts with pending chain"
            );
            self.remove_pending_requests();
        }
        true
    }

    /// Queue a signed request and try to publish the head of the queue
    async fn add_request(&mut self, request: Request) {
        debug!(
            address = %self.address(),
            sequence = ?request.sequence(),
            kind = %request.request_type(),
            "queued request"
        );
        self.core_mut().pending_chain.push(request);
        self.update_pending_balances();
        self.broadcast_request().await;
    }

    /// Publish the head of the pending chain if it has not been published.
    ///
    /// Validation or transport failure discards every pending request,
    /// unless lazy errors are enabled, in which case an invalid head stays
    /// queued until a later confirmation makes it valid.
    async fn broadcast_request(&mut self) {
        let rpc = match &self.core().rpc {
            Some(rpc) => Arc::clone(rpc),
            None => return,
        };
        let request = match self.pending_chain().first() {
            Some(head) if !head.published() => head.clone(),
            _ => return,
        };
        let hash = match request.hash() {
            Ok(hash) => hash,
            Err(e) => {
                error!(address = %self.address(), error = %e, "pending request is malformed");
                self.remove_pending_requests();
                return;
            }
        };

        if let Err(e) = self.validate_request(&request, 0).await {
            if self.options().lazy_errors {
                warn!(address = %self.address(), hash = %hash, error = %e, "holding invalid request");
            } else {
                error!(address = %self.address(), hash = %hash, error = %e, "invalid pending request");
                self.remove_pending_requests();
            }
            return;
        }

        match rpc.requests_publish(&request).await {
            Ok(published) => {
                if published != hash {
                    warn!(address = %self.address(), local = %hash, remote = %published, "delegate reported a different hash");
                }
                // the queue may have changed while the publish was in flight
                let core = self.core_mut();
                if let Some(head) = core.pending_chain.first_mut() {
                    if head.hash().ok() == Some(hash) {
                        head.set_published(true);
                    }
                }
                debug!(address = %self.address(), hash = %hash, "published request");
            }
            Err(e) => {
                error!(address = %self.address(), hash = %hash, error = %e, "publish failed");
                self.remove_pending_requests();
            }
        }
    }
}

fn recent(chain: &[Request], count: usize, offset: usize) -> Vec<&Request> {
    chain.iter().rev().skip(offset).take(count).collect()
}

fn up_to<'a>(chain: &'a [Request], hash: &Hash) -> RequestsUpTo<'a> {
    let mut requests = Vec::new();
    for request in chain.iter().rev() {
        requests.push(request);
        if request.hash().ok().as_ref() == Some(hash) {
            return RequestsUpTo {
                requests,
                found: true,
            };
        }
    }
    RequestsUpTo {
        requests,
        found: false,
    }
}

fn find<'a>(chain: &'a [Request], hash: &Hash) -> Option<&'a Request> {
    chain.iter().find(|r| r.hash().ok().as_ref() == Some(hash))
}

fn push_unique(chain: &mut Vec<Request>, request: Request) -> bool {
    let hash = match request.hash() {
        Ok(hash) => hash,
        Err(_) => return false,
    };
    if chain.iter().any(|r| r.hash().ok() == Some(hash)) {
        return false;
    }
    chain.push(request);
    true
}
