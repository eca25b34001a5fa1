// Path: crates/services/src/lib.rs
//! # xcall Services Crate Lints
//!
//! Panics are disallowed in non-test code; every failure surfaces as a
//! `TransactionError` so the host can discard the transaction cleanly.
#![forbid(unsafe_code)]
#![cfg_attr(
    not(test),
    deny(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::todo,
        clippy::unimplemented,
        clippy::indexing_slicing
    )
)]
//! # xcall Services
//!
//! The chain-local half of the cross-chain call protocol:
//!
//! - [`bank`]: the token ledger fees and the vault settle against.
//! - [`connection`]: relay pathways (fees, sequence counters, replay protection).
//! - [`xcall`]: the call router and its request/result/rollback state machine.
//! - [`xcall_manager`]: the governance-controlled protocol registry.
//! - [`asset_manager`]: the rate-limited asset vault.
//! - [`balanced_dollar`]: the bridged stablecoin, minted and burned across networks.
//! - [`genesis`]: builds a network's services and initial state from a `ChainConfig`.

pub mod asset_manager;
pub mod balanced_dollar;
pub mod bank;
pub mod connection;
pub mod genesis;
pub mod xcall;
pub mod xcall_manager;

use parity_scale_codec::{Decode, Encode};
use xcall_types::app::AccountId;

/// Parameters for every service's `set_admin@v1` method.
#[derive(Encode, Decode, Debug, Clone, PartialEq, Eq)]
pub struct SetAdminParams {
    /// The new admin.
    pub admin: AccountId,
}

/// Looks up a singleton service another service depends on.
pub(crate) fn require<'a, T: xcall_api::services::BlockchainService>(
    services: &'a xcall_api::services::access::ServiceDirectory,
    name: &str,
) -> Result<&'a T, xcall_types::error::TransactionError> {
    services.get::<T>().ok_or_else(|| {
        xcall_types::error::TransactionError::Unsupported(format!(
            "{} service is not registered",
            name
        ))
    })
}
