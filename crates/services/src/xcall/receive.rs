// Path: crates/services/src/xcall/receive.rs
//! Inbound deliveries from connections.

use super::{load_config, store_config, XCallService};
use std::collections::BTreeSet;
use xcall_api::state::{StateAccess, StateAccessExt};
use xcall_api::transaction::context::TxContext;
use xcall_types::app::{AccountId, Event, PendingAggregate, ProxyRequest, RollbackRecord};
use xcall_types::error::{TransactionError, XCallError};
use xcall_types::keys::{
    keccak256, pending_request_key, pending_response_key, proxy_request_key, rollback_key,
    successful_response_key,
};
use xcall_types::wire::{
    self, CSMessage, CSMessageRequest, CSMessageResult, CSResponseType, DecodedMessage,
};

/// Where a multi-protocol delivery stands after one more protocol reported.
#[derive(Debug, PartialEq, Eq)]
enum Quorum {
    /// Other protocols still have to deliver.
    Pending,
    /// Every listed protocol delivered the same payload.
    Reached,
    /// The payload diverged; the partial quorum was dropped.
    Discarded,
}

fn contains(protocols: &[String], connection: &str) -> bool {
    protocols.iter().any(|p| p == connection)
}

impl XCallService {
    /// Entry point for connections: `msg` arrived from `from_nid` through the
    /// local connection `connection` with the connection's own sequence `conn_sn`.
    pub fn handle_message(
        &self,
        state: &mut dyn StateAccess,
        ctx: &mut TxContext<'_>,
        connection: &str,
        from_nid: &str,
        msg: &[u8],
        conn_sn: u128,
    ) -> Result<(), TransactionError> {
        let config = load_config(state)?;
        if from_nid == config.network_id {
            return Err(XCallError::InvalidSource(from_nid.to_string()).into());
        }
        let message = CSMessage::from_bytes(msg)?;
        tracing::debug!(
            target: "xcall",
            connection,
            from_nid,
            conn_sn = %conn_sn,
            kind = ?message.message_type,
            "message delivered"
        );
        match message.decode_payload()? {
            DecodedMessage::Request(request) => {
                self.handle_request(state, ctx, connection, from_nid, request, &message.payload)
            }
            DecodedMessage::Result(result) => {
                self.handle_result(state, ctx, connection, from_nid, result, &message.payload)
            }
        }
    }

    fn handle_request(
        &self,
        state: &mut dyn StateAccess,
        ctx: &mut TxContext<'_>,
        connection: &str,
        from_nid: &str,
        request: CSMessageRequest,
        payload: &[u8],
    ) -> Result<(), TransactionError> {
        if request.from.network_id() != from_nid {
            return Err(XCallError::InvalidSource(request.from.to_string()).into());
        }
        if request.sequence_no == 0 {
            return Err(XCallError::InvalidSn(0).into());
        }
        if request.protocols.is_empty() {
            return Err(XCallError::ProtocolNotSpecified.into());
        }
        if !contains(&request.protocols, connection) {
            return Err(XCallError::ProtocolMismatch(connection.to_string()).into());
        }
        if request.protocols.len() > 1 {
            let key = pending_request_key(from_nid, request.sequence_no);
            let quorum = self.aggregate(
                state,
                ctx,
                &key,
                connection,
                payload,
                &request.protocols,
                (from_nid, request.sequence_no),
            )?;
            if quorum != Quorum::Reached {
                return Ok(());
            }
        }
        self.materialize(state, ctx, request)
    }

    /// Records one protocol's delivery of a multi-protocol message.
    ///
    /// Quorum is N-of-N: every protocol in `protocols` must deliver a payload
    /// with the same hash. A protocol reporting twice is rejected; a diverging
    /// payload drops the whole aggregate.
    #[allow(clippy::too_many_arguments)]
    fn aggregate(
        &self,
        state: &mut dyn StateAccess,
        ctx: &mut TxContext<'_>,
        key: &[u8],
        connection: &str,
        payload: &[u8],
        protocols: &[String],
        (from_nid, sn): (&str, u128),
    ) -> Result<Quorum, TransactionError> {
        let hash = keccak256(payload);
        let mut pending = state
            .get_decoded::<PendingAggregate>(key)?
            .unwrap_or_else(|| PendingAggregate {
                payload_hash: hash,
                seen_protocols: BTreeSet::new(),
            });

        if pending.payload_hash != hash {
            state.delete(key)?;
            tracing::warn!(
                target: "xcall",
                from_nid,
                sn = %sn,
                connection,
                "payload diverged across protocols; pending quorum discarded"
            );
            ctx.emit(Event::PendingDiscarded {
                from_nid: from_nid.to_string(),
                sn,
            });
            return Ok(Quorum::Discarded);
        }
        if !pending.seen_protocols.insert(connection.to_string()) {
            return Err(XCallError::RequestPending(connection.to_string()).into());
        }
        if protocols.iter().all(|p| pending.seen_protocols.contains(p)) {
            state.delete(key)?;
            Ok(Quorum::Reached)
        } else {
            state.insert_encoded(key, &pending)?;
            Ok(Quorum::Pending)
        }
    }

    /// Turns an accepted request into a `ProxyRequest` awaiting `execute_call`.
    fn materialize(
        &self,
        state: &mut dyn StateAccess,
        ctx: &mut TxContext<'_>,
        request: CSMessageRequest,
    ) -> Result<(), TransactionError> {
        let mut config = load_config(state)?;
        config.last_request_id += 1;
        let request_id = config.last_request_id;
        let key = proxy_request_key(request_id);
        if state.get(&key)?.is_some() {
            return Err(XCallError::InvalidRequestId(request_id).into());
        }
        store_config(state, &config)?;

        ctx.emit(Event::CallMessage {
            from: request.from.clone(),
            to: request.to.clone(),
            sn: request.sequence_no,
            req_id: request_id,
            data: request.data.clone(),
        });
        let proxy = ProxyRequest {
            request_id,
            owner: AccountId::new(request.to.as_str()),
            request,
        };
        state.insert_encoded(&key, &proxy)?;
        Ok(())
    }

    pub(crate) fn handle_result(
        &self,
        state: &mut dyn StateAccess,
        ctx: &mut TxContext<'_>,
        connection: &str,
        from_nid: &str,
        result: CSMessageResult,
        payload: &[u8],
    ) -> Result<(), TransactionError> {
        let sn = result.sequence_no;
        let key = rollback_key(sn);
        let mut record: RollbackRecord = state
            .get_decoded(&key)?
            .ok_or(XCallError::InvalidSn(sn))?;
        if !contains(&record.protocols, connection) {
            return Err(XCallError::ProtocolMismatch(connection.to_string()).into());
        }
        if record.to.network_id() != from_nid {
            return Err(XCallError::InvalidSource(from_nid.to_string()).into());
        }
        if record.protocols.len() > 1 {
            let quorum = self.aggregate(
                state,
                ctx,
                &pending_response_key(sn),
                connection,
                payload,
                &record.protocols,
                (from_nid, sn),
            )?;
            if quorum != Quorum::Reached {
                return Ok(());
            }
        }

        ctx.emit(Event::ResponseMessage {
            code: result.response_code,
            sn,
        });
        match result.response_code {
            CSResponseType::Success => {
                state.delete(&key)?;
                state.insert_encoded(&successful_response_key(sn), &true)?;
                if !result.message.is_empty() {
                    let mut reply: CSMessageRequest = wire::decode(&result.message)?;
                    if reply.from.network_id() != record.to.network_id() {
                        return Err(XCallError::InvalidReplyReceived.into());
                    }
                    reply.protocols = record.protocols;
                    self.materialize(state, ctx, reply)?;
                }
            }
            CSResponseType::Failure => {
                record.enabled = true;
                state.insert_encoded(&key, &record)?;
                tracing::info!(target: "xcall", sn = %sn, "call failed remotely; rollback enabled");
                ctx.emit(Event::RollbackMessage { sn });
            }
        }
        Ok(())
    }
}
