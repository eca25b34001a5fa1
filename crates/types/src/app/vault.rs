// Path: crates/types/src/app/vault.rs
use crate::app::{AccountId, NetworkAddress};
use parity_scale_codec::{Decode, Encode};
use serde::{Deserialize, Serialize};

/// Basis-point denominator for rate-limit percentages.
pub const POINTS: u128 = 10_000;

/// Singleton configuration of the asset vault.
#[derive(Serialize, Deserialize, Encode, Decode, Debug, Clone, PartialEq, Eq)]
pub struct VaultConfig {
    /// Account allowed to configure rate limits and force rollbacks.
    pub admin: AccountId,
    /// The local call router's network address; refunds must come from it.
    pub xcall: NetworkAddress,
    /// The paired vault on the remote network; withdrawals must come from it.
    pub remote_vault: NetworkAddress,
    /// The protocol registry consulted for every inbound message.
    pub registry: AccountId,
}

/// Withdrawal rate-limit state of one bridged asset.
#[derive(Serialize, Deserialize, Encode, Decode, Debug, Clone, PartialEq, Eq)]
pub struct TokenState {
    /// Seconds it takes the limit to recover fully.
    pub period: u64,
    /// Share of the vault balance that may be withdrawn per period, in basis points.
    pub percentage: u128,
    /// Unix timestamp of the last configuration or withdrawal.
    pub last_update: u64,
    /// The withdrawable amount as of `last_update`.
    pub current_limit: u128,
}
