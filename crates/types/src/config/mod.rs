// Path: crates/types/src/config/mod.rs

//! Genesis configuration of a single network.
//!
//! A `ChainConfig` describes everything needed to bring one network's services
//! up: the router, its connections, the optional registry and vault, and the
//! initial token balances. It is usually loaded from TOML:
//!
//! ```toml
//! network_id = "0x2.sol"
//!
//! [xcall]
//! admin = "admin"
//! default_connections = { "0x1.icon" = "centralized" }
//!
//! [[connections]]
//! id = "centralized"
//! admin = "relayer"
//! fees = [{ network_id = "0x1.icon", message_fee = 10, response_fee = 5 }]
//! ```
//!
//! TOML integers are 64-bit, so amounts here are `u64`; genesis widens them.
use crate::app::{AccountId, NetworkAddress};
use crate::NATIVE_DENOM;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Genesis of one network.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChainConfig {
    /// The network id, e.g. `"0x1.icon"`.
    pub network_id: String,
    /// Unix timestamp of the genesis block.
    #[serde(default = "default_genesis_time")]
    pub genesis_time: u64,
    /// Router configuration.
    pub xcall: XCallGenesis,
    /// Connection instances.
    #[serde(default)]
    pub connections: Vec<ConnectionGenesis>,
    /// Protocol registry, if deployed.
    #[serde(default)]
    pub xcall_manager: Option<RegistryGenesis>,
    /// Asset vault, if deployed. Requires `xcall_manager`.
    #[serde(default)]
    pub asset_manager: Option<VaultGenesis>,
    /// Bridged stablecoin, if deployed. Requires `xcall_manager`.
    #[serde(default)]
    pub balanced_dollar: Option<BalancedDollarGenesis>,
    /// Initial token balances.
    #[serde(default)]
    pub balances: Vec<BalanceGenesis>,
}

fn default_genesis_time() -> u64 {
    1_700_000_000
}

impl ChainConfig {
    /// Parses a configuration from TOML.
    pub fn from_toml_str(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    /// Checks cross-field constraints that serde cannot express.
    pub fn validate(&self) -> Result<(), String> {
        if let Some(registry) = &self.xcall_manager {
            if registry.sources.len() != registry.destinations.len() {
                return Err("xcall_manager sources and destinations differ in length".into());
            }
        }
        if self.asset_manager.is_some() && self.xcall_manager.is_none() {
            return Err("asset_manager requires xcall_manager".into());
        }
        if self.balanced_dollar.is_some() && self.xcall_manager.is_none() {
            return Err("balanced_dollar requires xcall_manager".into());
        }
        for (nid, conn) in &self.xcall.default_connections {
            if !self.connections.iter().any(|c| &c.id == conn) {
                return Err(format!(
                    "default connection '{}' for {} is not configured",
                    conn, nid
                ));
            }
        }
        Ok(())
    }
}

/// Router genesis.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct XCallGenesis {
    /// Router admin.
    pub admin: AccountId,
    /// Protocol fee recipient; defaults to the admin.
    #[serde(default)]
    pub fee_handler: Option<AccountId>,
    /// Flat protocol fee per call.
    #[serde(default)]
    pub protocol_fee: u64,
    /// Default connection per destination network id.
    #[serde(default)]
    pub default_connections: BTreeMap<String, String>,
}

/// Connection instance genesis.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConnectionGenesis {
    /// Service id of the instance; also the protocol name used in envelopes.
    pub id: String,
    /// The relayer/admin account.
    pub admin: AccountId,
    /// Fees per remote network.
    #[serde(default)]
    pub fees: Vec<NetworkFeeGenesis>,
}

/// Fees for one remote network.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NetworkFeeGenesis {
    /// The remote network id.
    pub network_id: String,
    /// Fee per request message.
    #[serde(default)]
    pub message_fee: u64,
    /// Fee per result message.
    #[serde(default)]
    pub response_fee: u64,
}

/// Protocol registry genesis.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RegistryGenesis {
    /// Registry admin.
    pub admin: AccountId,
    /// The remote governance address.
    pub governance: NetworkAddress,
    /// Trusted inbound protocols.
    pub sources: Vec<String>,
    /// Trusted outbound protocols.
    pub destinations: Vec<String>,
}

/// Asset vault genesis.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VaultGenesis {
    /// Vault admin.
    pub admin: AccountId,
    /// The paired vault on the remote network.
    pub remote_vault: NetworkAddress,
    /// Initial rate limits.
    #[serde(default)]
    pub rate_limits: Vec<RateLimitGenesis>,
}

/// Bridged stablecoin genesis.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BalancedDollarGenesis {
    /// Token admin.
    pub admin: AccountId,
    /// The token contract on the hub network.
    pub hub_token: NetworkAddress,
    /// The ledger denomination.
    #[serde(default = "default_stable_denom")]
    pub denom: String,
}

fn default_stable_denom() -> String {
    "bnusd".to_string()
}

/// Initial rate limit of one token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RateLimitGenesis {
    /// The denomination.
    pub token: String,
    /// Recovery period in seconds.
    pub period: u64,
    /// Withdrawable share in basis points.
    pub percentage: u64,
}

/// Initial balance of one account.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BalanceGenesis {
    /// The account.
    pub account: AccountId,
    /// The denomination; defaults to the native token.
    #[serde(default = "default_denom")]
    pub denom: String,
    /// The amount.
    pub amount: u64,
}

fn default_denom() -> String {
    NATIVE_DENOM.to_string()
}
