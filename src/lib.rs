//! Logos Client SDK
//!
//! Builds, signs and tracks requests for the Logos block-lattice network:
//! account chains, token accounts and the wallet that keeps them in sync
//! with a delegate over RPC and pub/sub.
//!
//! Every account owns its own chain of requests. Requests are hashed with
//! BLAKE2b-256 and signed with Ed25519.

pub mod account;
pub mod codec;
pub mod crypto;
pub mod pubsub;
pub mod request;
pub mod rpc;
pub mod wallet;

/// Protocol constants, fixed by the network
pub mod constants {
    use crate::codec::Amount;
    use crate::crypto::Hash;

    /// Human readable address prefix
    pub const ADDRESS_PREFIX: &str = "lgs_";

    /// `previous` of the first request on every chain
    pub const GENESIS_HASH: Hash = Hash([0; 32]);

    /// Smallest base-currency fee a request may carry (10^22 raw)
    pub const MINIMUM_FEE: Amount = Amount(10_000_000_000_000_000_000_000);

    /// Payment instructions per send or token send
    pub const MAX_TRANSACTIONS: usize = 8;

    /// Controllers listed on an issuance
    pub const MAX_CONTROLLERS: usize = 10;

    pub const MAX_SYMBOL_BYTES: usize = 8;
    pub const MAX_NAME_BYTES: usize = 32;
    pub const MAX_ISSUER_INFO_BYTES: usize = 512;

    /// Request format version
    pub const REQUEST_VERSION: u8 = 1;

    /// Delegate RPC port
    pub const DEFAULT_RPC_PORT: u16 = 55000;

    /// Seconds before an RPC call is abandoned
    pub const DEFAULT_RPC_TIMEOUT_SECS: u64 = 10;
}
