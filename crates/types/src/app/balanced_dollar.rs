// Path: crates/types/src/app/balanced_dollar.rs
use crate::app::{AccountId, NetworkAddress};
use parity_scale_codec::{Decode, Encode};
use serde::{Deserialize, Serialize};

/// Singleton configuration of the bridged stablecoin.
#[derive(Serialize, Deserialize, Encode, Decode, Debug, Clone, PartialEq, Eq)]
pub struct BalancedDollarConfig {
    /// Account allowed to reconfigure the token.
    pub admin: AccountId,
    /// The local call router's network address; reverts must come from it.
    pub xcall: NetworkAddress,
    /// The token contract on the hub network; inbound transfers must come from it.
    pub hub_token: NetworkAddress,
    /// The protocol registry consulted for every inbound message.
    pub registry: AccountId,
    /// The ledger denomination minted and burned here.
    pub denom: String,
}
