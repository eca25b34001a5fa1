// Path: crates/services/tests/genesis_chain.rs
//! A network booted from TOML genesis, exercised through the host.

use anyhow::Result;
use xcall_execution::{Chain, ExecutionError};
use xcall_services::genesis;
use xcall_services::xcall::{SetDefaultConnectionParams, SetProtocolFeeParams, XCallService};
use xcall_services::SetAdminParams;
use xcall_test_utils::{assert_err, assert_ok};
use xcall_types::app::AccountId;
use xcall_types::config::ChainConfig;
use xcall_types::error::{TransactionError, XCallError};

const GENESIS: &str = r#"
network_id = "0x1.icon"
genesis_time = 1000

[xcall]
admin = "admin"
protocol_fee = 7
default_connections = { "0x2.sol" = "centralized" }

[[connections]]
id = "centralized"
admin = "relayer"
fees = [{ network_id = "0x2.sol", message_fee = 10, response_fee = 5 }]

[[connections]]
id = "wormhole"
admin = "relayer"
fees = [{ network_id = "0x2.sol", message_fee = 20, response_fee = 9 }]

[[balances]]
account = "alice"
amount = 1000
"#;

fn boot() -> Result<Chain> {
    let config = ChainConfig::from_toml_str(GENESIS)?;
    Ok(Chain::genesis(config.network_id.clone(), config.genesis_time, |state| {
        genesis::build(&config, state)
    })?)
}

fn total_fee(chain: &Chain, sources: &[String]) -> Result<u128> {
    Ok(chain.query(|state, services| XCallService.get_fee(state, services, "0x2.sol", sources))?)
}

#[tokio::test]
async fn genesis_fees_add_up_per_source() -> Result<()> {
    let chain = boot()?;
    assert_eq!(chain.timestamp(), 1000);
    assert_eq!(total_fee(&chain, &[])?, 7 + 10);
    assert_eq!(
        total_fee(&chain, &["centralized".into(), "wormhole".into()])?,
        7 + 10 + 20
    );
    Ok(())
}

#[tokio::test]
async fn router_administration_is_admin_only() -> Result<()> {
    let mut chain = boot()?;
    let admin = AccountId::new("admin");
    let alice = AccountId::new("alice");

    // 1. Strangers are refused and nothing is committed.
    let err = assert_err!(
        chain
            .call(&alice, "xcall", "set_protocol_fee@v1", &SetProtocolFeeParams { fee: 0 })
            .await
    );
    assert_eq!(
        err,
        ExecutionError::Transaction(TransactionError::XCall(XCallError::OnlyAdmin))
    );
    assert_eq!(chain.height(), 0);

    // 2. The admin may change the fee and hand over the role.
    assert_ok!(
        chain
            .call(&admin, "xcall", "set_protocol_fee@v1", &SetProtocolFeeParams { fee: 1 })
            .await
    );
    assert_eq!(total_fee(&chain, &[])?, 1 + 10);
    assert_ok!(
        chain
            .call(&admin, "xcall", "set_admin@v1", &SetAdminParams { admin: alice.clone() })
            .await
    );
    assert_err!(
        chain
            .call(&admin, "xcall", "set_protocol_fee@v1", &SetProtocolFeeParams { fee: 2 })
            .await
    );

    // 3. Default connections must name a registered connection.
    let unknown = SetDefaultConnectionParams {
        network_id: "0x3.eth".into(),
        connection: "layerzero".into(),
    };
    assert_err!(
        chain
            .call(&alice, "xcall", "set_default_connection@v1", &unknown)
            .await,
        ExecutionError::Transaction(TransactionError::XCall(XCallError::UnknownConnection(_)))
    );
    Ok(())
}

#[test]
fn reserved_connection_ids_are_rejected() {
    let config = ChainConfig::from_toml_str(&GENESIS.replace("\"wormhole\"", "\"bank\"")).unwrap();
    let err = Chain::genesis("0x1.icon", 0, |state| genesis::build(&config, state)).unwrap_err();
    assert!(matches!(
        err,
        ExecutionError::Transaction(TransactionError::Invalid(_))
    ));
}
