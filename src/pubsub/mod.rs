//! Pub/sub deliveries - confirmed requests and delegate list changes
//!
//! The transport itself lives outside the crate. Whatever receives a
//! `(topic, payload)` pair turns it into a [`PubSubMessage`] and hands it to
//! the wallet.

mod topic;

pub use topic::*;
