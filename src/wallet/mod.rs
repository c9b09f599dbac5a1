//! Wallet module - seed-derived accounts and confirmation routing

mod options;
mod wallet;

pub use options::WalletOptions;
pub use wallet::*;
