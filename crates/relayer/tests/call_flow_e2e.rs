// Path: crates/relayer/tests/call_flow_e2e.rs
//! End-to-end call flows between the hub and spoke networks.

mod common;

use anyhow::Result;
use common::*;
use xcall_execution::ExecutionError;
use xcall_services::xcall::XCallService;
use xcall_test_utils::fixtures::{
    alice, bob, call_message, call_with_rollback, dapp_account, over, persisted_call, relayer,
    CENTRALIZED, HUB_NID, MESSAGE_FEE, SPOKE_NID, USER_FUNDS, WORMHOLE,
};
use xcall_test_utils::{assert_err, assert_ok};
use xcall_types::app::Event;
use xcall_types::error::{ConnectionError, TransactionError, XCallError};
use xcall_types::app::{NetworkAddress, MAX_DATA_SIZE, MAX_ROLLBACK_SIZE};
use xcall_types::wire::{CSMessage, CSMessageResult, CSResponseType, DecodedMessage};

/// The router error behind a failed transaction, if that is what failed it.
fn xcall_error(err: &anyhow::Error) -> Option<&XCallError> {
    match err.downcast_ref::<ExecutionError>() {
        Some(ExecutionError::Transaction(TransactionError::XCall(e))) => Some(e),
        _ => None,
    }
}

fn router_error(err: &ExecutionError) -> Option<&XCallError> {
    match err {
        ExecutionError::Transaction(TransactionError::XCall(e)) => Some(e),
        _ => None,
    }
}

#[tokio::test]
async fn one_way_call_is_delivered_once() -> Result<()> {
    let mut net = Networks::new()?;

    // 1. Alice calls the spoke application; she pays the connection fee.
    send_call(&mut net.hub, &alice(), call_message(b"hello".to_vec()), spoke_dapp()).await?;
    assert_eq!(
        balance(&net.hub, &alice())?,
        u128::from(USER_FUNDS - MESSAGE_FEE)
    );

    // 2. Relay: the request is materialized, not yet executed.
    let report = net.hub_to_spoke().await;
    assert_eq!(report.delivered, 1);
    assert!(report.is_clean());
    let (req_id, data) = last_call_message(&net.spoke)?;
    assert_eq!(data, b"hello");
    assert!(inbox(&net.spoke)?.is_empty());

    // 3. Anyone may execute; the application sees the qualified sender.
    execute_call(&mut net.spoke, &bob(), req_id, data.clone()).await?;
    assert_eq!(
        inbox(&net.spoke)?,
        vec![(format!("{}/alice", HUB_NID), b"hello".to_vec())]
    );
    assert!(has_event(
        &net.spoke,
        &Event::CallExecuted {
            req_id,
            code: CSResponseType::Success.code(),
            msg: String::new()
        }
    ));

    // 4. The request was consumed.
    let err = assert_err!(execute_call(&mut net.spoke, &bob(), req_id, data).await);
    assert!(matches!(
        err.downcast_ref::<ExecutionError>(),
        Some(ExecutionError::Transaction(TransactionError::XCall(
            XCallError::CallRequestNotFound(id)
        ))) if *id == req_id
    ));

    // 5. A second relay pass has nothing new to carry.
    assert_eq!(net.hub_to_spoke().await.delivered, 0);
    Ok(())
}

#[tokio::test]
async fn redelivery_is_rejected_by_connection_receipts() -> Result<()> {
    let mut net = Networks::new()?;

    // 1. Send and relay once.
    send_call(&mut net.hub, &alice(), call_message(b"once".to_vec()), spoke_dapp()).await?;
    assert_eq!(net.hub_to_spoke().await.delivered, 1);

    // 2. Replaying the same (network, conn_sn) fails and leaves no trace.
    let message = xcall_relayer::outbound(&net.hub, SPOKE_NID)
        .pop()
        .ok_or_else(|| anyhow::anyhow!("nothing queued"))?;
    let root = net.spoke.state().root_hash();
    let err = net
        .relayer
        .deliver(&mut net.spoke, HUB_NID, &message.connection, message.conn_sn, message.msg)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        ExecutionError::Transaction(TransactionError::Connection(
            ConnectionError::DuplicateMessage {
                network_id: HUB_NID.to_string(),
                conn_sn: message.conn_sn,
            }
        ))
    );
    assert_eq!(net.spoke.state().root_hash(), root);

    // 3. Only the connection admin may deliver at all.
    let outsider = xcall_relayer::Relayer::new(alice());
    assert!(outsider
        .deliver(&mut net.spoke, HUB_NID, CENTRALIZED, message.conn_sn + 1, vec![])
        .await
        .is_err());
    Ok(())
}

#[tokio::test]
async fn failed_call_rolls_back_to_the_sender() -> Result<()> {
    let mut net = Networks::new()?;

    // 1. The hub application sends a call the spoke application refuses.
    send_call(
        &mut net.hub,
        &dapp_account(),
        call_with_rollback(FAIL.to_vec(), b"undo".to_vec()),
        spoke_dapp(),
    )
    .await?;
    let sn = last_sent_sn(&net.hub)?;
    assert!(XCallService.rollback_record(net.hub.state(), sn)?.is_some());

    // 2. Execution fails on the spoke; the failure is recorded, not reverted.
    net.hub_to_spoke().await;
    let (req_id, data) = last_call_message(&net.spoke)?;
    execute_call(&mut net.spoke, &bob(), req_id, data).await?;
    assert!(inbox(&net.spoke)?.is_empty());
    assert!(net.spoke.events().iter().any(|c| matches!(
        &c.event,
        Event::CallExecuted { req_id: id, code: 0, msg } if *id == req_id && msg.contains("refused")
    )));

    // 3. The failure result enables the rollback on the hub.
    assert_eq!(net.spoke_to_hub().await.delivered, 1);
    assert!(has_event(&net.hub, &Event::RollbackMessage { sn }));
    assert!(has_event(
        &net.hub,
        &Event::ResponseMessage {
            code: CSResponseType::Failure,
            sn
        }
    ));

    // 4. Executing the rollback hands the payload back, from the router.
    execute_rollback(&mut net.hub, &bob(), sn).await?;
    assert_eq!(
        inbox(&net.hub)?,
        vec![(format!("{}/xcall", HUB_NID), b"undo".to_vec())]
    );
    assert!(has_event(&net.hub, &Event::RollbackExecuted { sn }));

    // 5. A rollback runs once.
    let err = assert_err!(execute_rollback(&mut net.hub, &bob(), sn).await);
    assert_eq!(xcall_error(&err), Some(&XCallError::NoRollbackData));
    Ok(())
}

#[tokio::test]
async fn reply_travels_inside_the_success_result() -> Result<()> {
    let mut net = Networks::new()?;

    // 1. The hub application asks the spoke application to answer.
    send_call(
        &mut net.hub,
        &dapp_account(),
        call_with_rollback(b"reply:pong".to_vec(), b"undo".to_vec()),
        spoke_dapp(),
    )
    .await?;
    let sn = last_sent_sn(&net.hub)?;
    net.hub_to_spoke().await;

    // 2. The answer is captured instead of being sent on its own.
    let (req_id, data) = last_call_message(&net.spoke)?;
    let spoke_conn_messages = xcall_relayer::outbound(&net.spoke, HUB_NID).len();
    execute_call(&mut net.spoke, &bob(), req_id, data).await?;
    assert_eq!(
        xcall_relayer::outbound(&net.spoke, HUB_NID).len(),
        spoke_conn_messages + 1
    );

    // 3. The success result clears the rollback and delivers the reply.
    assert_eq!(net.spoke_to_hub().await.delivered, 1);
    assert!(XCallService.rollback_record(net.hub.state(), sn)?.is_none());
    assert!(XCallService.is_successful_response(net.hub.state(), sn)?);
    let (reply_id, reply) = last_call_message(&net.hub)?;
    assert_eq!(reply, b"pong");

    // 4. The reply executes like any inbound call.
    execute_call(&mut net.hub, &alice(), reply_id, reply).await?;
    assert_eq!(
        inbox(&net.hub)?,
        vec![(format!("{}/dapp", SPOKE_NID), b"pong".to_vec())]
    );
    Ok(())
}

#[tokio::test]
async fn multi_protocol_call_waits_for_every_protocol() -> Result<()> {
    let mut net = Networks::new()?;

    // 1. Alice sends over both connections and pays both fees.
    send_call(
        &mut net.hub,
        &alice(),
        over(call_message(b"quorum".to_vec()), &[CENTRALIZED, WORMHOLE]),
        spoke_dapp(),
    )
    .await?;
    assert_eq!(
        balance(&net.hub, &alice())?,
        u128::from(USER_FUNDS - 2 * MESSAGE_FEE)
    );

    // 2. One delivery alone is held back.
    let report = net
        .relayer
        .relay_connection(&net.hub, &mut net.spoke, CENTRALIZED)
        .await;
    assert_eq!(report.delivered, 1);
    assert!(last_call_message(&net.spoke).is_err());

    // 3. The second protocol completes the quorum.
    let report = net
        .relayer
        .relay_connection(&net.hub, &mut net.spoke, WORMHOLE)
        .await;
    assert_eq!(report.delivered, 1);
    let (req_id, data) = last_call_message(&net.spoke)?;
    assert_eq!(data, b"quorum");
    assert_ok!(execute_call(&mut net.spoke, &bob(), req_id, data).await);
    assert_eq!(inbox(&net.spoke)?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn persisted_call_failure_keeps_the_request() -> Result<()> {
    let mut net = Networks::new()?;

    // 1. Deliver a persisted call the application refuses.
    send_call(&mut net.hub, &alice(), persisted_call(FAIL.to_vec()), spoke_dapp()).await?;
    net.hub_to_spoke().await;
    let (req_id, data) = last_call_message(&net.spoke)?;

    // 2. Execution fails as a whole, so the request can be retried.
    assert_err!(execute_call(&mut net.spoke, &bob(), req_id, data).await);
    assert!(XCallService.proxy_request(net.spoke.state(), req_id)?.is_some());
    Ok(())
}

#[tokio::test]
async fn undeliverable_call_is_reverted_by_the_connection() -> Result<()> {
    let mut net = Networks::new()?;

    // 1. A rollback-enabled call that will never be relayed.
    send_call(
        &mut net.hub,
        &dapp_account(),
        call_with_rollback(b"lost".to_vec(), b"undo".to_vec()),
        spoke_dapp(),
    )
    .await?;
    let sn = last_sent_sn(&net.hub)?;

    // 2. The relayer reports it failed; the rollback becomes executable.
    net.relayer.revert(&mut net.hub, CENTRALIZED, sn).await?;
    assert!(has_event(&net.hub, &Event::RollbackMessage { sn }));
    execute_rollback(&mut net.hub, &alice(), sn).await?;
    assert_eq!(inbox(&net.hub)?.len(), 1);

    // 3. Reverting an unknown call fails.
    assert!(net.relayer.revert(&mut net.hub, CENTRALIZED, sn + 10).await.is_err());
    Ok(())
}

#[tokio::test]
async fn connection_fees_are_claimable_by_the_relayer() -> Result<()> {
    let mut net = Networks::new()?;

    // 1. Two calls leave two fees with the connection.
    for _ in 0..2 {
        send_call(&mut net.hub, &alice(), call_message(b"fee".to_vec()), spoke_dapp()).await?;
    }
    let connection = xcall_types::app::AccountId::new(CENTRALIZED);
    assert_eq!(balance(&net.hub, &connection)?, u128::from(2 * MESSAGE_FEE));

    // 2. The relayer claims them.
    let before = balance(&net.hub, &relayer())?;
    net.hub.submit(&relayer(), CENTRALIZED, "claim_fees@v1", &[]).await?;
    assert_eq!(balance(&net.hub, &relayer())?, before + u128::from(2 * MESSAGE_FEE));
    assert_eq!(balance(&net.hub, &connection)?, 0);
    Ok(())
}

#[tokio::test]
async fn oversized_calls_leave_no_trace() -> Result<()> {
    let mut net = Networks::new()?;
    let root = net.hub.state().root_hash();

    // 1. Data over the limit.
    let err = assert_err!(
        send_call(
            &mut net.hub,
            &alice(),
            call_message(vec![7; MAX_DATA_SIZE + 1]),
            spoke_dapp()
        )
        .await
    );
    assert_eq!(
        xcall_error(&err),
        Some(&XCallError::MaxDataSizeExceeded {
            max: MAX_DATA_SIZE,
            got: MAX_DATA_SIZE + 1
        })
    );

    // 2. Rollback over the limit.
    let err = assert_err!(
        send_call(
            &mut net.hub,
            &dapp_account(),
            call_with_rollback(b"ok".to_vec(), vec![7; MAX_ROLLBACK_SIZE + 1]),
            spoke_dapp()
        )
        .await
    );
    assert_eq!(
        xcall_error(&err),
        Some(&XCallError::MaxRollbackSizeExceeded {
            max: MAX_ROLLBACK_SIZE,
            got: MAX_ROLLBACK_SIZE + 1
        })
    );

    // 3. Neither allocated a sequence number nor charged a fee.
    assert_eq!(net.hub.state().root_hash(), root);
    assert!(last_sent_sn(&net.hub).is_err());
    assert_eq!(balance(&net.hub, &alice())?, u128::from(USER_FUNDS));

    // 4. Exactly at the limit is fine.
    assert_ok!(
        send_call(
            &mut net.hub,
            &alice(),
            call_message(vec![7; MAX_DATA_SIZE]),
            spoke_dapp()
        )
        .await
    );
    assert!(last_sent_sn(&net.hub).is_ok());
    Ok(())
}

#[tokio::test]
async fn calls_need_a_route() -> Result<()> {
    let mut net = Networks::new()?;
    let root = net.hub.state().root_hash();

    // 1. No destination protocols.
    let mut envelope = call_message(b"nowhere".to_vec());
    envelope.destinations.clear();
    let err = assert_err!(send_call(&mut net.hub, &alice(), envelope, spoke_dapp()).await);
    assert_eq!(xcall_error(&err), Some(&XCallError::ProtocolNotSpecified));

    // 2. No sources and no default connection for the network.
    let unknown = NetworkAddress::new("0x3.eth", "dapp");
    let err = assert_err!(
        send_call(&mut net.hub, &alice(), call_message(b"far".to_vec()), unknown).await
    );
    assert_eq!(xcall_error(&err), Some(&XCallError::ProtocolNotSpecified));
    assert_eq!(net.hub.state().root_hash(), root);
    Ok(())
}

#[tokio::test]
async fn execution_needs_the_delivered_data() -> Result<()> {
    let mut net = Networks::new()?;
    send_call(&mut net.hub, &alice(), call_message(b"exact".to_vec()), spoke_dapp()).await?;
    net.hub_to_spoke().await;
    let (req_id, data) = last_call_message(&net.spoke)?;

    // 1. Different bytes are refused and the request stays.
    let err = assert_err!(execute_call(&mut net.spoke, &bob(), req_id, b"other".to_vec()).await);
    assert_eq!(xcall_error(&err), Some(&XCallError::DataMismatch));
    assert!(XCallService.proxy_request(net.spoke.state(), req_id)?.is_some());

    // 2. The delivered bytes still execute.
    execute_call(&mut net.spoke, &bob(), req_id, data).await?;
    assert_eq!(inbox(&net.spoke)?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn rollback_waits_for_a_failure_result() -> Result<()> {
    let mut net = Networks::new()?;
    send_call(
        &mut net.hub,
        &dapp_account(),
        call_with_rollback(b"pending".to_vec(), b"undo".to_vec()),
        spoke_dapp(),
    )
    .await?;
    let sn = last_sent_sn(&net.hub)?;

    let err = assert_err!(execute_rollback(&mut net.hub, &bob(), sn).await);
    assert_eq!(xcall_error(&err), Some(&XCallError::RollbackNotEnabled(sn)));
    assert!(XCallService.rollback_record(net.hub.state(), sn)?.is_some());
    assert!(inbox(&net.hub)?.is_empty());
    Ok(())
}

#[tokio::test]
async fn results_for_unknown_calls_are_rejected() -> Result<()> {
    let mut net = Networks::new()?;
    let result = CSMessageResult {
        sequence_no: 42,
        response_code: CSResponseType::Success,
        message: Vec::new(),
    };
    let msg = CSMessage::result(&result).to_bytes();

    let err = net
        .relayer
        .deliver(&mut net.hub, SPOKE_NID, CENTRALIZED, 1, msg)
        .await
        .unwrap_err();
    assert_eq!(router_error(&err), Some(&XCallError::InvalidSn(42)));
    assert!(!XCallService.is_successful_response(net.hub.state(), 42)?);
    Ok(())
}

#[tokio::test]
async fn one_protocol_cannot_vote_twice() -> Result<()> {
    let mut net = Networks::new()?;
    send_call(
        &mut net.hub,
        &alice(),
        over(call_message(b"twice".to_vec()), &[CENTRALIZED, WORMHOLE]),
        spoke_dapp(),
    )
    .await?;
    let first = xcall_relayer::outbound(&net.hub, SPOKE_NID)
        .into_iter()
        .find(|m| m.connection == CENTRALIZED)
        .ok_or_else(|| anyhow::anyhow!("nothing queued on {CENTRALIZED}"))?;

    // 1. The first delivery is held back.
    net.relayer
        .deliver(&mut net.spoke, HUB_NID, CENTRALIZED, first.conn_sn, first.msg.clone())
        .await?;

    // 2. The same connection delivering again under a fresh receipt is refused.
    let err = net
        .relayer
        .deliver(&mut net.spoke, HUB_NID, CENTRALIZED, first.conn_sn + 100, first.msg)
        .await
        .unwrap_err();
    assert_eq!(
        router_error(&err),
        Some(&XCallError::RequestPending(CENTRALIZED.to_string()))
    );
    assert!(last_call_message(&net.spoke).is_err());
    Ok(())
}

#[tokio::test]
async fn diverging_protocols_discard_the_pending_request() -> Result<()> {
    let mut net = Networks::new()?;
    send_call(
        &mut net.hub,
        &alice(),
        over(call_message(b"honest".to_vec()), &[CENTRALIZED, WORMHOLE]),
        spoke_dapp(),
    )
    .await?;
    let sn = last_sent_sn(&net.hub)?;
    let queued = xcall_relayer::outbound(&net.hub, SPOKE_NID);
    let by = |connection: &str| {
        queued
            .iter()
            .find(|m| m.connection == connection)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("nothing queued on {connection}"))
    };
    let (honest, other) = (by(CENTRALIZED)?, by(WORMHOLE)?);

    // 1. Wormhole carries a tampered copy of the request.
    let DecodedMessage::Request(mut request) = CSMessage::from_bytes(&other.msg)?.decode_payload()?
    else {
        anyhow::bail!("expected a request");
    };
    request.data = b"forged".to_vec();
    let forged = CSMessage::request(&request).to_bytes();

    // 2. The honest copy is held, the forged one drops the partial quorum.
    net.relayer
        .deliver(&mut net.spoke, HUB_NID, CENTRALIZED, honest.conn_sn, honest.msg.clone())
        .await?;
    net.relayer
        .deliver(&mut net.spoke, HUB_NID, WORMHOLE, other.conn_sn, forged)
        .await?;
    assert!(has_event(
        &net.spoke,
        &Event::PendingDiscarded {
            from_nid: HUB_NID.to_string(),
            sn
        }
    ));
    assert!(last_call_message(&net.spoke).is_err());

    // 3. Nothing carried over: the honest copy starts a fresh quorum.
    net.relayer
        .deliver(&mut net.spoke, HUB_NID, CENTRALIZED, honest.conn_sn + 100, honest.msg)
        .await?;
    assert!(last_call_message(&net.spoke).is_err());
    net.relayer
        .deliver(&mut net.spoke, HUB_NID, WORMHOLE, other.conn_sn + 100, other.msg)
        .await?;
    let (_, data) = last_call_message(&net.spoke)?;
    assert_eq!(data, b"honest");
    Ok(())
}

#[tokio::test]
async fn multi_protocol_failure_needs_every_connection() -> Result<()> {
    let mut net = Networks::new()?;
    send_call(
        &mut net.hub,
        &dapp_account(),
        over(
            call_with_rollback(b"stuck".to_vec(), b"undo".to_vec()),
            &[CENTRALIZED, WORMHOLE],
        ),
        spoke_dapp(),
    )
    .await?;
    let sn = last_sent_sn(&net.hub)?;

    // 1. One connection reporting the failure is only a partial quorum.
    net.relayer.revert(&mut net.hub, CENTRALIZED, sn).await?;
    assert!(!has_event(&net.hub, &Event::RollbackMessage { sn }));
    let err = assert_err!(execute_rollback(&mut net.hub, &bob(), sn).await);
    assert_eq!(xcall_error(&err), Some(&XCallError::RollbackNotEnabled(sn)));

    // 2. The other connection completes it.
    net.relayer.revert(&mut net.hub, WORMHOLE, sn).await?;
    assert!(has_event(&net.hub, &Event::RollbackMessage { sn }));
    execute_rollback(&mut net.hub, &bob(), sn).await?;
    assert_eq!(
        inbox(&net.hub)?,
        vec![(format!("{}/xcall", HUB_NID), b"undo".to_vec())]
    );
    Ok(())
}
