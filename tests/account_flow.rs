//! Accounts and the wallet driven through an in-memory delegate

mod common;

use std::sync::Arc;

use tokio::sync::mpsc;

use common::{fees, key, signed_send, RecordingRpc};
use logos_sdk::account::{Account, AccountOptions, LogosAccount, TokenAccounts};
use logos_sdk::codec::Amount;
use logos_sdk::constants::GENESIS_HASH;
use logos_sdk::pubsub::PubSubMessage;
use logos_sdk::request::Transaction;
use logos_sdk::rpc::{AccountInfo, Rpc};
use logos_sdk::wallet::{Wallet, WalletOptions};

fn lazy_sync_options() -> AccountOptions {
    AccountOptions {
        full_sync: false,
        batch_sends: false,
        ..AccountOptions::default()
    }
}

async fn funded_account(rpc: &Arc<RecordingRpc>, seed: u8, balance: u128, options: AccountOptions) -> LogosAccount {
    let private_key = key(seed);
    let address = private_key.public_key().to_address();
    rpc.set_info(
        &address,
        AccountInfo {
            balance: Amount(balance),
            ..AccountInfo::default()
        },
    );
    let mut account = LogosAccount::new(private_key, "test", options, Some(rpc.clone() as Arc<dyn Rpc>));
    account.sync().await.unwrap();
    account
}

#[tokio::test]
async fn test_only_the_head_is_published() {
    let rpc = Arc::new(RecordingRpc::default());
    let mut account = funded_account(&rpc, 1, fees(10), lazy_sync_options()).await;
    assert_eq!(account.balance(), Amount(fees(10)));
    let to = key(2).public_key();

    let first = account.create_send_request(vec![Transaction::new(to, Amount(1))]).await.unwrap();
    let second = account.create_send_request(vec![Transaction::new(to, Amount(2))]).await.unwrap();
    assert_eq!(second.previous(), Some(first.hash().unwrap()));
    assert_eq!(rpc.published().len(), 1);
    assert!(account.pending_chain()[0].published());
    assert!(!account.pending_chain()[1].published());

    account.process_request(first.clone(), &TokenAccounts::new()).await.unwrap();
    let published = rpc.published();
    assert_eq!(published.len(), 2);
    assert_eq!(published[1].hash().unwrap(), second.hash().unwrap());
    assert_eq!(account.chain().len(), 1);
    assert_eq!(account.balance(), Amount(fees(9) - 1));

    account.process_request(second, &TokenAccounts::new()).await.unwrap();
    assert!(account.pending_chain().is_empty());
    assert!(account.verify_chain().is_ok());
    assert_eq!(account.balance(), Amount(fees(8) - 3));
}

#[tokio::test]
async fn test_duplicate_confirmation_is_ignored() {
    let rpc = Arc::new(RecordingRpc::default());
    let mut account = funded_account(&rpc, 1, fees(10), lazy_sync_options()).await;
    let request = account
        .create_send_request(vec![Transaction::new(key(2).public_key(), Amount(5))])
        .await
        .unwrap();
    account.process_request(request.clone(), &TokenAccounts::new()).await.unwrap();
    account.process_request(request, &TokenAccounts::new()).await.unwrap();
    assert_eq!(account.chain().len(), 1);
    assert_eq!(account.balance(), Amount(fees(9) - 5));
}

#[tokio::test]
async fn test_publish_failure_discards_pending() {
    let rpc = Arc::new(RecordingRpc::default());
    let mut account = funded_account(&rpc, 1, fees(10), lazy_sync_options()).await;
    rpc.fail_publishing();

    let request = account
        .create_send_request(vec![Transaction::new(key(2).public_key(), Amount(5))])
        .await;
    assert!(request.is_ok());
    assert!(account.pending_chain().is_empty());
    assert_eq!(account.pending_balance(), account.balance());
}

#[tokio::test]
async fn test_conflicting_confirmation_discards_pending() {
    let rpc = Arc::new(RecordingRpc::default());
    let mut account = funded_account(&rpc, 1, fees(10), lazy_sync_options()).await;
    let to = key(2).public_key();
    account.create_send_request(vec![Transaction::new(to, Amount(1))]).await.unwrap();
    account.create_send_request(vec![Transaction::new(to, Amount(2))]).await.unwrap();

    // the same key signed something else at sequence 0 from another device
    let rogue = signed_send(&key(1), GENESIS_HASH, 0, &[(to, 42)]);
    account.process_request(rogue.clone(), &TokenAccounts::new()).await.unwrap();

    assert!(account.pending_chain().is_empty());
    assert_eq!(account.chain()[0].hash().unwrap(), rogue.hash().unwrap());
    assert_eq!(account.balance(), Amount(fees(9) - 42));
}

#[tokio::test]
async fn test_spend_confirmed_before_its_funding() {
    let me = key(1);
    let stranger = key(9);
    let funding = signed_send(&stranger, GENESIS_HASH, 0, &[(me.public_key(), fees(10))]);
    let spend = signed_send(&me, GENESIS_HASH, 0, &[(stranger.public_key(), fees(3))]);
    let tokens = TokenAccounts::new();
    let replay_options = AccountOptions {
        batch_sends: false,
        ..AccountOptions::default()
    };
    let mut replay = LogosAccount::new(me.clone(), "replay", replay_options, None);
    let mut incremental = LogosAccount::new(me, "incremental", lazy_sync_options(), None);

    for account in [&mut replay, &mut incremental] {
        account.process_request(spend.clone(), &tokens).await.unwrap();
        assert_eq!(account.balance(), Amount::ZERO);
        account.process_request(funding.clone(), &tokens).await.unwrap();
        assert_eq!(account.balance(), Amount(fees(6)));
    }
}

#[tokio::test]
async fn test_lazy_errors_hold_head_until_funded() {
    let rpc = Arc::new(RecordingRpc::default());
    let options = AccountOptions {
        lazy_errors: true,
        ..lazy_sync_options()
    };
    let mut account = funded_account(&rpc, 1, fees(2), options).await;
    let to = key(2).public_key();

    account
        .create_send_request(vec![Transaction::new(to, Amount(fees(5)))])
        .await
        .unwrap();
    assert_eq!(account.pending_chain().len(), 1);
    assert!(rpc.published().is_empty());

    let payment = signed_send(&key(9), GENESIS_HASH, 0, &[(account.public_key(), fees(10))]);
    account.process_request(payment, &TokenAccounts::new()).await.unwrap();
    assert_eq!(account.balance(), Amount(fees(12)));
    assert_eq!(rpc.published().len(), 1);
    assert!(account.pending_chain()[0].published());
}

#[tokio::test]
async fn test_overdraft_rejected_without_lazy_errors() {
    let rpc = Arc::new(RecordingRpc::default());
    let mut account = funded_account(&rpc, 1, fees(2), lazy_sync_options()).await;
    assert!(account
        .create_send_request(vec![Transaction::new(key(2).public_key(), Amount(fees(5)))])
        .await
        .is_err());
    assert!(account.pending_chain().is_empty());
    assert!(rpc.published().is_empty());
}

#[tokio::test]
async fn test_full_sync_replays_history() {
    let rpc = Arc::new(RecordingRpc::default());
    let me = key(1);
    let stranger = key(9);
    let address = me.public_key().to_address();

    let received = signed_send(&stranger, GENESIS_HASH, 0, &[(me.public_key(), fees(5))]);
    let sent = signed_send(&me, GENESIS_HASH, 0, &[(stranger.public_key(), 100)]);
    rpc.set_history(&address, &[received.clone(), sent.clone()]);
    rpc.set_info(
        &address,
        AccountInfo {
            frontier: sent.hash().unwrap(),
            receive_tip: received.hash().unwrap(),
            balance: Amount(fees(4) - 100),
            ..AccountInfo::default()
        },
    );

    let mut account = LogosAccount::new(me, "synced", AccountOptions::default(), Some(rpc.clone() as Arc<dyn Rpc>));
    account.sync().await.unwrap();
    assert_eq!(account.chain().len(), 1);
    assert_eq!(account.receive_chain().len(), 1);
    assert_eq!(account.balance(), Amount(fees(4) - 100));
    assert!(account.is_synced().await.unwrap());
    assert_eq!(account.previous(), sent.hash().unwrap());
    assert_eq!(account.sequence(), Ok(1));
}

#[tokio::test]
async fn test_sync_rejects_broken_chain() {
    let rpc = Arc::new(RecordingRpc::default());
    let me = key(1);
    let address = me.public_key().to_address();
    let first = signed_send(&me, GENESIS_HASH, 0, &[(key(2).public_key(), 1)]);
    // second request skips over the first
    let second = signed_send(&me, GENESIS_HASH, 1, &[(key(2).public_key(), 1)]);
    rpc.set_history(&address, &[first, second]);
    rpc.set_info(&address, AccountInfo::default());

    let mut account = LogosAccount::new(me, "broken", AccountOptions::default(), Some(rpc.clone() as Arc<dyn Rpc>));
    assert!(account.sync().await.is_err());
}

#[tokio::test]
async fn test_wallet_routes_deliveries() {
    let rpc = Arc::new(RecordingRpc::default());
    let options = WalletOptions {
        seed: Some("ab".repeat(32)),
        full_sync: false,
        ..WalletOptions::default()
    };
    let mut wallet = Wallet::with_rpc(options, Some(rpc.clone() as Arc<dyn Rpc>)).unwrap();
    let alice = wallet.create_account(Some("alice")).await.unwrap();
    let stranger = key(9);

    let (sender, receiver) = mpsc::channel(8);
    let payment = signed_send(&stranger, GENESIS_HASH, 0, &[(alice, fees(3))]);
    sender
        .send(PubSubMessage::Request {
            topic: format!("account/{}", alice.to_address()),
            request: payment,
        })
        .await
        .unwrap();
    sender
        .send(PubSubMessage::DelegateChange(vec!["10.0.0.7".to_string()]))
        .await
        .unwrap();
    drop(sender);

    wallet.run(receiver).await;

    let account = wallet.account(&alice.to_address()).unwrap();
    assert_eq!(account.receive_chain().len(), 1);
    assert_eq!(account.balance(), Amount(fees(3)));
    assert_eq!(*rpc.delegates.lock().unwrap(), vec!["10.0.0.7".to_string()]);
}

#[tokio::test]
async fn test_failed_add_keeps_derivation_index() {
    let rpc = Arc::new(RecordingRpc::default());
    let options = WalletOptions {
        seed: Some("cd".repeat(32)),
        ..WalletOptions::default()
    };
    let mut wallet = Wallet::with_rpc(options, Some(rpc.clone() as Arc<dyn Rpc>)).unwrap();
    let first = wallet.derive_key(0);
    let address = first.public_key().to_address();
    let to = key(2).public_key();
    rpc.set_history(
        &address,
        &[
            signed_send(&first, GENESIS_HASH, 0, &[(to, 1)]),
            signed_send(&first, GENESIS_HASH, 1, &[(to, 1)]),
        ],
    );
    rpc.set_info(&address, AccountInfo::default());

    assert!(wallet.create_account(None).await.is_err());
    assert_eq!(wallet.accounts().count(), 0);

    rpc.set_history(&address, &[]);
    let added = wallet.create_account(None).await.unwrap();
    assert_eq!(added, first.public_key());
    assert_eq!(wallet.account(&address).unwrap().label(), "Account 0");
}
