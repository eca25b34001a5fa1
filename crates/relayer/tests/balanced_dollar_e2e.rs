// Path: crates/relayer/tests/balanced_dollar_e2e.rs
//! End-to-end flows of the spoke's bridged stablecoin, paired with the hub
//! application acting as the hub token.

mod common;

use anyhow::Result;
use common::*;
use xcall_services::balanced_dollar::{CrossTransferParams, BALANCED_DOLLAR_SERVICE_ID};
use xcall_services::xcall::XCallService;
use xcall_test_utils::fixtures::{
    alice, bob, call_message, dapp_account, ALICE_BNUSD, BNUSD, HUB_NID, SPOKE_NID,
};
use xcall_types::app::{AccountId, Event, NetworkAddress};
use xcall_types::wire::TransferMessage;

fn spoke_token() -> NetworkAddress {
    NetworkAddress::new(SPOKE_NID, BALANCED_DOLLAR_SERVICE_ID)
}

fn bnusd(net: &Networks, account: &AccountId) -> Result<u128> {
    balance_of(&net.spoke, BNUSD, account)
}

async fn cross_transfer(net: &mut Networks, value: u128, data: &[u8]) -> Result<u128> {
    let params = CrossTransferParams {
        to: format!("{}/hx-bob", HUB_NID),
        value,
        data: data.to_vec(),
    };
    net.spoke
        .call(&alice(), BALANCED_DOLLAR_SERVICE_ID, "cross_transfer@v1", &params)
        .await?;
    last_sent_sn(&net.spoke)
}

fn hub_transfer(to: &str, value: u128) -> Vec<u8> {
    TransferMessage::CrossTransfer {
        from: format!("{}/hx-alice", HUB_NID),
        to: to.to_string(),
        value,
        data: Vec::new(),
    }
    .to_bytes()
}

#[tokio::test]
async fn outbound_transfer_burns_and_reaches_the_hub() -> Result<()> {
    let mut net = Networks::new()?;
    let start = u128::from(ALICE_BNUSD);

    // 1. Alice burns part of her balance.
    let sn = cross_transfer(&mut net, 400, b"").await?;
    assert_eq!(bnusd(&net, &alice())?, start - 400);
    assert!(has_event(
        &net.spoke,
        &Event::CrossTransferSent {
            from: alice(),
            to: format!("{}/hx-bob", HUB_NID),
            value: 400,
            sn,
        }
    ));

    // 2. The hub token accepts it and the success result settles the transfer.
    assert_eq!(net.spoke_to_hub().await.delivered, 1);
    let (req_id, data) = last_call_message(&net.hub)?;
    execute_call(&mut net.hub, &bob(), req_id, data.clone()).await?;
    assert_eq!(inbox(&net.hub)?, vec![(spoke_token().to_string(), data)]);
    net.hub_to_spoke().await;
    assert!(XCallService.is_successful_response(net.spoke.state(), sn)?);
    assert!(XCallService.rollback_record(net.spoke.state(), sn)?.is_none());
    assert_eq!(bnusd(&net, &alice())?, start - 400);
    Ok(())
}

#[tokio::test]
async fn refused_transfer_is_minted_back() -> Result<()> {
    let mut net = Networks::new()?;
    let start = u128::from(ALICE_BNUSD);

    let sn = cross_transfer(&mut net, 250, FAIL).await?;
    assert_eq!(bnusd(&net, &alice())?, start - 250);

    net.spoke_to_hub().await;
    let (req_id, data) = last_call_message(&net.hub)?;
    execute_call(&mut net.hub, &bob(), req_id, data).await?;
    assert!(failed(&net.hub, req_id).is_some());

    net.hub_to_spoke().await;
    assert!(has_event(&net.spoke, &Event::RollbackMessage { sn }));
    execute_rollback(&mut net.spoke, &bob(), sn).await?;
    assert!(has_event(
        &net.spoke,
        &Event::CrossTransferReverted {
            account: alice(),
            amount: 250,
        }
    ));
    assert_eq!(bnusd(&net, &alice())?, start);
    Ok(())
}

#[tokio::test]
async fn hub_transfers_mint_on_the_spoke() -> Result<()> {
    let mut net = Networks::new()?;

    send_call(
        &mut net.hub,
        &dapp_account(),
        call_message(hub_transfer(&format!("{}/bob", SPOKE_NID), 75)),
        spoke_token(),
    )
    .await?;
    net.hub_to_spoke().await;
    let (req_id, data) = last_call_message(&net.spoke)?;
    execute_call(&mut net.spoke, &alice(), req_id, data).await?;
    assert!(failed(&net.spoke, req_id).is_none());
    assert_eq!(bnusd(&net, &bob())?, 75);
    Ok(())
}

#[tokio::test]
async fn transfers_from_anyone_but_the_hub_token_mint_nothing() -> Result<()> {
    let mut net = Networks::new()?;

    send_call(&mut net.hub, &alice(), call_message(hub_transfer("bob", 75)), spoke_token()).await?;
    net.hub_to_spoke().await;
    let (req_id, data) = last_call_message(&net.spoke)?;
    execute_call(&mut net.spoke, &alice(), req_id, data).await?;
    let reason = failed(&net.spoke, req_id).ok_or_else(|| anyhow::anyhow!("transfer minted"))?;
    assert!(reason.contains("may not send"), "unexpected failure: {reason}");
    assert_eq!(bnusd(&net, &bob())?, 0);
    Ok(())
}
