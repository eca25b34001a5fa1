// Path: crates/services/src/genesis.rs
//! Builds one network's services and initial state from its `ChainConfig`.

use crate::asset_manager::AssetManagerService;
use crate::balanced_dollar::{BalancedDollarService, BALANCED_DOLLAR_SERVICE_ID};
use crate::bank::BankService;
use crate::connection::ConnectionService;
use crate::xcall::{XCallService, XCALL_SERVICE_ID};
use crate::xcall_manager::{XCallManagerService, XCALL_MANAGER_SERVICE_ID};
use std::sync::Arc;
use xcall_api::services::BlockchainService;
use xcall_api::state::StateAccess;
use xcall_types::app::{AccountId, NetworkAddress, NetworkFee};
use xcall_types::config::ChainConfig;
use xcall_types::error::TransactionError;

const RESERVED_IDS: [&str; 5] = [
    "bank",
    XCALL_SERVICE_ID,
    XCALL_MANAGER_SERVICE_ID,
    "asset_manager",
    BALANCED_DOLLAR_SERVICE_ID,
];

/// Writes the genesis state described by `config` and returns the services to
/// register, in no particular order.
///
/// Balances are minted first so that rate limits start from the vault's
/// genesis balance.
pub fn build(
    config: &ChainConfig,
    state: &mut dyn StateAccess,
) -> Result<Vec<Arc<dyn BlockchainService>>, TransactionError> {
    config.validate().map_err(TransactionError::Invalid)?;
    if let Some(conn) = config
        .connections
        .iter()
        .find(|c| RESERVED_IDS.contains(&c.id.as_str()))
    {
        return Err(TransactionError::Invalid(format!(
            "connection id '{}' is reserved",
            conn.id
        )));
    }

    let bank = BankService;
    for balance in &config.balances {
        bank.mint(state, &balance.denom, &balance.account, u128::from(balance.amount))?;
    }

    let xcall = XCallService;
    let xcall_genesis = &config.xcall;
    xcall.initialize(
        state,
        &config.network_id,
        xcall_genesis.admin.clone(),
        xcall_genesis
            .fee_handler
            .clone()
            .unwrap_or_else(|| xcall_genesis.admin.clone()),
        u128::from(xcall_genesis.protocol_fee),
    )?;
    let mut services: Vec<Arc<dyn BlockchainService>> =
        vec![Arc::new(BankService), Arc::new(XCallService)];

    for conn in &config.connections {
        let service = ConnectionService::new(conn.id.as_str());
        service.initialize(state, conn.admin.clone())?;
        for fee in &conn.fees {
            service.write_network_fee(
                state,
                &fee.network_id,
                NetworkFee {
                    message_fee: u128::from(fee.message_fee),
                    response_fee: u128::from(fee.response_fee),
                },
            )?;
        }
        services.push(Arc::new(service));
    }
    for (network_id, connection) in &xcall_genesis.default_connections {
        xcall.write_default_connection(state, network_id, connection)?;
    }

    if let Some(registry) = &config.xcall_manager {
        XCallManagerService.initialize(
            state,
            registry.admin.clone(),
            AccountId::new(XCALL_SERVICE_ID),
            registry.governance.clone(),
            registry.sources.clone(),
            registry.destinations.clone(),
        )?;
        services.push(Arc::new(XCallManagerService));
    }

    if let Some(vault) = &config.asset_manager {
        let asset_manager = AssetManagerService;
        asset_manager.initialize(
            state,
            vault.admin.clone(),
            NetworkAddress::new(config.network_id.as_str(), XCALL_SERVICE_ID),
            vault.remote_vault.clone(),
            AccountId::new(XCALL_MANAGER_SERVICE_ID),
        )?;
        for limit in &vault.rate_limits {
            asset_manager.write_rate_limit(
                state,
                &bank,
                &limit.token,
                limit.period,
                u128::from(limit.percentage),
                config.genesis_time,
            )?;
        }
        services.push(Arc::new(AssetManagerService));
    }

    if let Some(token) = &config.balanced_dollar {
        BalancedDollarService.initialize(
            state,
            token.admin.clone(),
            NetworkAddress::new(config.network_id.as_str(), XCALL_SERVICE_ID),
            token.hub_token.clone(),
            AccountId::new(XCALL_MANAGER_SERVICE_ID),
            token.denom.clone(),
        )?;
        services.push(Arc::new(BalancedDollarService));
    }

    log::info!(
        "[Genesis] {} ready with {} services",
        config.network_id,
        services.len()
    );
    Ok(services)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset_manager::ASSET_MANAGER_SERVICE_ID;
    use xcall_state::memory::MemoryState;
    use xcall_types::config::{ConnectionGenesis, VaultGenesis, XCallGenesis};
    use xcall_types::NATIVE_DENOM;

    const SOLANA: &str = r#"
network_id = "0x2.sol"

[xcall]
admin = "admin"
default_connections = { "0x1.icon" = "centralized" }

[[connections]]
id = "centralized"
admin = "relayer"
fees = [{ network_id = "0x1.icon", message_fee = 10, response_fee = 5 }]

[xcall_manager]
admin = "admin"
governance = "0x1.icon/cx-governance"
sources = ["centralized"]
destinations = ["cx-centralized"]

[asset_manager]
admin = "admin"
remote_vault = "0x1.icon/cx-asset-manager"
rate_limits = [{ token = "native", period = 300, percentage = 9000 }]

[balanced_dollar]
admin = "admin"
hub_token = "0x1.icon/cx-bnusd"

[[balances]]
account = "asset_manager"
amount = 1000
"#;

    #[test]
    fn builds_every_configured_service() {
        let config = ChainConfig::from_toml_str(SOLANA).unwrap();
        let mut state = MemoryState::new();
        let services = build(&config, &mut state).unwrap();

        let mut ids: Vec<&str> = services.iter().map(|s| s.id()).collect();
        ids.sort_unstable();
        assert_eq!(
            ids,
            vec![
                "asset_manager",
                "balanced_dollar",
                "bank",
                "centralized",
                "xcall",
                "xcall_manager",
            ]
        );

        let xcall = XCallService.config(&state).unwrap();
        assert_eq!(xcall.fee_handler, AccountId::new("admin"));
        assert_eq!(
            XCallService
                .get_default_connection(&state, "0x1.icon")
                .unwrap()
                .as_deref(),
            Some("centralized")
        );
        let limit = AssetManagerService
            .token_state(&state, NATIVE_DENOM)
            .unwrap()
            .unwrap();
        assert_eq!(limit.current_limit, 900);
        assert_eq!(limit.last_update, config.genesis_time);
        assert_eq!(
            AssetManagerService.config(&state).unwrap().xcall,
            NetworkAddress::new("0x2.sol", XCALL_SERVICE_ID)
        );
        assert!(services
            .iter()
            .any(|s| s.id() == ASSET_MANAGER_SERVICE_ID && s.as_call_receiver().is_some()));
        assert_eq!(
            BalancedDollarService.config(&state).unwrap().hub_token,
            NetworkAddress::new("0x1.icon", "cx-bnusd")
        );
    }

    #[test]
    fn reserved_connection_ids_are_rejected() {
        let config = ChainConfig {
            network_id: "0x1.icon".into(),
            genesis_time: 0,
            xcall: XCallGenesis {
                admin: AccountId::new("admin"),
                fee_handler: None,
                protocol_fee: 0,
                default_connections: Default::default(),
            },
            connections: vec![ConnectionGenesis {
                id: "bank".into(),
                admin: AccountId::new("relayer"),
                fees: Vec::new(),
            }],
            xcall_manager: None,
            asset_manager: None,
            balanced_dollar: None,
            balances: Vec::new(),
        };
        assert!(matches!(
            build(&config, &mut MemoryState::new()),
            Err(TransactionError::Invalid(_))
        ));
    }

    #[test]
    fn a_vault_without_a_registry_is_rejected() {
        let mut config = ChainConfig::from_toml_str(SOLANA).unwrap();
        config.xcall_manager = None;
        config.balanced_dollar = None;
        config.asset_manager = Some(VaultGenesis {
            admin: AccountId::new("admin"),
            remote_vault: NetworkAddress::new("0x1.icon", "cx-asset-manager"),
            rate_limits: Vec::new(),
        });
        assert!(build(&config, &mut MemoryState::new()).is_err());
    }
}
