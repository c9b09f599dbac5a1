//! Cryptography module - BLAKE2b hashing, Ed25519 keys and signatures

mod hash;
mod keys;

pub use hash::*;
pub use keys::*;
