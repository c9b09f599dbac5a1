//! Repacking pending sends into fewer requests

use crate::codec::Amount;
use crate::constants::MAX_TRANSACTIONS;
use crate::crypto::Hash;
use crate::request::{Request, Transaction};

/// Transactions for one replacement request. `token_id` is `None` for a
/// base-currency send.
///
/// `fee` and `token_fee` are the highest the merged requests carried, so a
/// caller's raised fee survives repacking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Batch {
    pub token_id: Option<Hash>,
    pub transactions: Vec<Transaction>,
    pub fee: Amount,
    pub token_fee: Amount,
}

/// Transactions merged from every pending request of one kind
#[derive(Default)]
struct Group {
    transactions: Vec<Transaction>,
    fee: Amount,
    token_fee: Amount,
}

impl Group {
    fn absorb(&mut self, transactions: &[Transaction], fee: Amount, token_fee: Amount) {
        self.transactions.extend_from_slice(transactions);
        self.fee = self.fee.max(fee);
        self.token_fee = self.token_fee.max(token_fee);
    }
}

/// Plan the repacking of a pending chain.
///
/// Only chains made entirely of unpublished sends and token sends are
/// repacked, and only when the result has fewer requests. Transactions keep
/// their relative order; base-currency batches come first, then each token
/// in order of first appearance.
pub(crate) fn plan(pending: &[Request]) -> Option<Vec<Batch>> {
    if pending.len() < 2 {
        return None;
    }
    let mut logos = Group::default();
    let mut tokens: Vec<(Hash, Group)> = Vec::new();
    for request in pending {
        if request.published() {
            return None;
        }
        match request {
            Request::Send(send) => logos.absorb(send.transactions(), request.fee(), Amount::ZERO),
            Request::TokenSend(send) => {
                let token_id = send.token_id()?;
                let index = match tokens.iter().position(|(id, _)| *id == token_id) {
                    Some(index) => index,
                    None => {
                        tokens.push((token_id, Group::default()));
                        tokens.len() - 1
                    }
                };
                tokens[index]
                    .1
                    .absorb(send.transactions(), request.fee(), send.token_fee());
            }
            _ => return None,
        }
    }

    let batches: Vec<Batch> = chunk(None, &logos)
        .chain(tokens.iter().flat_map(|(id, group)| chunk(Some(*id), group)))
        .collect();
    if batches.len() < pending.len() {
        Some(batches)
    } else {
        None
    }
}

fn chunk(token_id: Option<Hash>, group: &Group) -> impl Iterator<Item = Batch> + '_ {
    group.transactions.chunks(MAX_TRANSACTIONS).map(move |txs| Batch {
        token_id,
        transactions: txs.to_vec(),
        fee: group.fee,
        token_fee: group.token_fee,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::Amount;
    use crate::crypto::PublicKey;
    use crate::request::{self, TokenSend};

    fn send(count: u8) -> Request {
        let mut send = request::Send::new();
        for i in 0..count {
            send.add_transaction(Transaction::new(PublicKey([i; 32]), Amount(i as u128 + 1)))
                .unwrap();
        }
        send.into()
    }

    fn token_send(token: u8, count: u8) -> Request {
        let mut send = TokenSend::new();
        send.set_token_id(Hash([token; 32]));
        for i in 0..count {
            send.add_transaction(Transaction::new(PublicKey([i; 32]), Amount(1)))
                .unwrap();
        }
        send.into()
    }

    #[test]
    fn test_small_sends_merge() {
        let pending = vec![send(3), send(2), send(4)];
        let batches = plan(&pending).unwrap();
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0].transactions.len(), 8);
        assert_eq!(batches[1].transactions.len(), 1);
    }

    #[test]
    fn test_tokens_grouped_separately() {
        let pending = vec![token_send(1, 2), send(1), token_send(2, 1), token_send(1, 3)];
        let batches = plan(&pending).unwrap();
        assert_eq!(batches.len(), 3);
        assert_eq!(batches[0].token_id, None);
        assert_eq!(batches[1].token_id, Some(Hash([1; 32])));
        assert_eq!(batches[1].transactions.len(), 5);
        assert_eq!(batches[2].token_id, Some(Hash([2; 32])));
    }

    #[test]
    fn test_highest_fees_carried() {
        let mut generous = send(1);
        generous.base_mut().set_fee(Amount(50));
        let mut token_generous = token_send(1, 1);
        if let Request::TokenSend(send) = &mut token_generous {
            send.set_token_fee(Amount(9));
        }
        let pending = vec![send(2), generous, token_send(1, 1), token_generous];
        let batches = plan(&pending).unwrap();
        assert_eq!(batches[0].fee, Amount(50));
        assert_eq!(batches[1].token_fee, Amount(9));
    }

    #[test]
    fn test_no_gain_no_plan() {
        assert!(plan(&[send(8), send(8)]).is_none());
        assert!(plan(&[send(1)]).is_none());
    }

    #[test]
    fn test_published_or_foreign_requests_block_repacking() {
        let mut published = send(1);
        published.set_published(true);
        assert!(plan(&[published, send(1)]).is_none());
        assert!(plan(&[send(1), Request::from(request::Burn::new()), send(1)]).is_none());
    }
}
