// Path: crates/test_utils/src/fixtures/mod.rs
//! Fixtures for two-network tests.
//!
//! Both networks run the router and two connections, `centralized` and
//! `wormhole`. The "spoke" network (`0x2.sol`) additionally runs the protocol
//! registry, the asset vault and the bridged stablecoin, governed by and
//! paired with the application `dapp` on the "hub" network (`0x1.icon`).
//! Tests register their own `dapp` on either network.

use std::collections::BTreeMap;
use xcall_types::app::{AccountId, NetworkAddress};
use xcall_types::config::{
    BalanceGenesis, BalancedDollarGenesis, ChainConfig, ConnectionGenesis, NetworkFeeGenesis, RateLimitGenesis,
    RegistryGenesis, VaultGenesis, XCallGenesis,
};
use xcall_types::wire::{AnyMessage, Envelope};
use xcall_types::NATIVE_DENOM;

/// Network id of the hub network.
pub const HUB_NID: &str = "0x1.icon";
/// Network id of the spoke network.
pub const SPOKE_NID: &str = "0x2.sol";
/// The primary connection, deployed under the same id on both networks.
pub const CENTRALIZED: &str = "centralized";
/// The secondary connection, deployed under the same id on both networks.
pub const WORMHOLE: &str = "wormhole";
/// Account of the test application on either network.
pub const DAPP: &str = "dapp";
/// Genesis time of both networks.
pub const GENESIS_TIME: u64 = 1_700_000_000;
/// Initial native balance of every user account.
pub const USER_FUNDS: u64 = 10_000_000_000;
/// Native tokens the spoke vault holds at genesis.
pub const VAULT_FUNDS: u64 = 5_000_000_000;
/// Per-message connection fee on both networks.
pub const MESSAGE_FEE: u64 = 10;
/// Per-result connection fee on both networks.
pub const RESPONSE_FEE: u64 = 5;
/// Recovery period of the spoke vault's native rate limit, in seconds.
pub const RATE_PERIOD: u64 = 300;
/// Withdrawable share of the spoke vault's native balance, in basis points.
pub const RATE_PERCENTAGE: u64 = 9_000;
/// Ledger denomination of the spoke's bridged stablecoin.
pub const BNUSD: &str = "bnusd";
/// Stablecoins alice holds on the spoke at genesis.
pub const ALICE_BNUSD: u64 = 1_000;

/// Admin of every service.
pub fn admin() -> AccountId {
    AccountId::new("admin")
}

/// The relayer, which administers every connection.
pub fn relayer() -> AccountId {
    AccountId::new("relayer")
}

/// A funded user.
pub fn alice() -> AccountId {
    AccountId::new("alice")
}

/// A second funded user.
pub fn bob() -> AccountId {
    AccountId::new("bob")
}

/// The test application's account; it signs the calls it originates.
pub fn dapp_account() -> AccountId {
    AccountId::new(DAPP)
}

/// The test application's address on `network_id`.
pub fn dapp(network_id: &str) -> NetworkAddress {
    NetworkAddress::new(network_id, DAPP)
}

fn connections(remote_nid: &str) -> Vec<ConnectionGenesis> {
    [CENTRALIZED, WORMHOLE]
        .into_iter()
        .map(|id| ConnectionGenesis {
            id: id.to_string(),
            admin: relayer(),
            fees: vec![NetworkFeeGenesis {
                network_id: remote_nid.to_string(),
                message_fee: MESSAGE_FEE,
                response_fee: RESPONSE_FEE,
            }],
        })
        .collect()
}

fn balances(accounts: &[AccountId]) -> Vec<BalanceGenesis> {
    accounts
        .iter()
        .map(|account| BalanceGenesis {
            account: account.clone(),
            denom: NATIVE_DENOM.to_string(),
            amount: USER_FUNDS,
        })
        .collect()
}

fn xcall_genesis(remote_nid: &str) -> XCallGenesis {
    XCallGenesis {
        admin: admin(),
        fee_handler: None,
        protocol_fee: 0,
        default_connections: BTreeMap::from([(remote_nid.to_string(), CENTRALIZED.to_string())]),
    }
}

/// Genesis of the hub network.
pub fn hub_config() -> ChainConfig {
    ChainConfig {
        network_id: HUB_NID.to_string(),
        genesis_time: GENESIS_TIME,
        xcall: xcall_genesis(SPOKE_NID),
        connections: connections(SPOKE_NID),
        xcall_manager: None,
        asset_manager: None,
        balanced_dollar: None,
        balances: balances(&[admin(), alice(), bob(), relayer(), dapp_account()]),
    }
}

/// Genesis of the spoke network, trusting only `centralized`.
pub fn spoke_config() -> ChainConfig {
    let mut balances = balances(&[admin(), alice(), bob(), relayer(), dapp_account()]);
    balances.push(BalanceGenesis {
        account: AccountId::new("asset_manager"),
        denom: NATIVE_DENOM.to_string(),
        amount: VAULT_FUNDS,
    });
    balances.push(BalanceGenesis {
        account: alice(),
        denom: BNUSD.to_string(),
        amount: ALICE_BNUSD,
    });
    ChainConfig {
        network_id: SPOKE_NID.to_string(),
        genesis_time: GENESIS_TIME,
        xcall: xcall_genesis(HUB_NID),
        connections: connections(HUB_NID),
        xcall_manager: Some(RegistryGenesis {
            admin: admin(),
            governance: dapp(HUB_NID),
            sources: vec![CENTRALIZED.to_string()],
            destinations: vec![CENTRALIZED.to_string()],
        }),
        asset_manager: Some(VaultGenesis {
            admin: admin(),
            remote_vault: dapp(HUB_NID),
            rate_limits: vec![RateLimitGenesis {
                token: NATIVE_DENOM.to_string(),
                period: RATE_PERIOD,
                percentage: RATE_PERCENTAGE,
            }],
        }),
        balanced_dollar: Some(BalancedDollarGenesis {
            admin: admin(),
            hub_token: dapp(HUB_NID),
            denom: BNUSD.to_string(),
        }),
        balances,
    }
}

/// A one-way call out over the default connection, to be delivered by
/// `centralized` on the destination.
pub fn call_message(data: impl Into<Vec<u8>>) -> Envelope {
    Envelope::new(
        AnyMessage::CallMessage { data: data.into() },
        vec![],
        vec![CENTRALIZED.to_string()],
    )
}

/// A call whose failure hands `rollback` back; routed like [`call_message`].
pub fn call_with_rollback(data: impl Into<Vec<u8>>, rollback: impl Into<Vec<u8>>) -> Envelope {
    Envelope::new(
        AnyMessage::CallMessageWithRollback {
            data: data.into(),
            rollback: rollback.into(),
        },
        vec![],
        vec![CENTRALIZED.to_string()],
    )
}

/// A call the destination must execute successfully; routed like [`call_message`].
pub fn persisted_call(data: impl Into<Vec<u8>>) -> Envelope {
    Envelope::new(
        AnyMessage::CallMessagePersisted { data: data.into() },
        vec![],
        vec![CENTRALIZED.to_string()],
    )
}

/// Re-routes `envelope` through `protocols` on both sides.
pub fn over(mut envelope: Envelope, protocols: &[&str]) -> Envelope {
    let protocols: Vec<String> = protocols.iter().map(|p| p.to_string()).collect();
    envelope.sources = protocols.clone();
    envelope.destinations = protocols;
    envelope
}
