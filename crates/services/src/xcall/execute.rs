// Path: crates/services/src/xcall/execute.rs
//! Executing delivered requests and rollbacks.

use super::XCallService;
use xcall_api::state::{StateAccess, StateAccessExt, StateOverlay};
use xcall_api::transaction::context::TxContext;
use xcall_types::app::{AccountId, Event, NetworkAddress, ProxyRequest, ReplyState, RollbackRecord};
use xcall_types::error::{TransactionError, XCallError};
use xcall_types::keys::{
    proxy_request_key, rollback_key, XCALL_CALL_REPLY_KEY, XCALL_REPLY_STATE_KEY,
};
use xcall_types::wire::{CSMessage, CSMessageResult, CSResponseType, MessageType};

/// The outcome of an application handler run in a sandbox. The outer `Result`
/// of [`XCallService::invoke_sandboxed`] carries host failures; this one
/// carries the application's own.
type AppOutcome = Result<(), TransactionError>;

fn executed(ctx: &mut TxContext<'_>, req_id: u128, outcome: &AppOutcome) {
    let (code, msg) = match outcome {
        Ok(()) => (CSResponseType::Success.code(), String::new()),
        Err(e) => (CSResponseType::Failure.code(), e.to_string()),
    };
    ctx.emit(Event::CallExecuted { req_id, code, msg });
}

impl XCallService {
    /// Delivers `data` to the local application `owner`.
    fn invoke(
        &self,
        state: &mut dyn StateAccess,
        ctx: &mut TxContext<'_>,
        owner: &AccountId,
        from: &NetworkAddress,
        data: &[u8],
        protocols: &[String],
    ) -> Result<(), TransactionError> {
        let services = ctx.services;
        let receiver = services
            .call_receiver(owner.as_str())
            .ok_or_else(|| XCallError::UnknownApplication(owner.to_string()))?;
        receiver.handle_call_message(state, ctx, from, data, protocols)
    }

    /// Runs the application handler on a copy-on-write overlay. Its writes and
    /// events are kept only if it succeeds.
    fn invoke_sandboxed(
        &self,
        state: &mut dyn StateAccess,
        ctx: &mut TxContext<'_>,
        owner: &AccountId,
        from: &NetworkAddress,
        data: &[u8],
        protocols: &[String],
    ) -> Result<AppOutcome, TransactionError> {
        let mark = ctx.events_len();
        let outcome = {
            let mut overlay = StateOverlay::new(&*state);
            self.invoke(&mut overlay, ctx, owner, from, data, protocols)
                .map(|()| overlay.into_ordered_batch())
        };
        match outcome {
            Ok((inserts, deletes)) => {
                state.batch_apply(&inserts, &deletes)?;
                Ok(Ok(()))
            }
            Err(e) => {
                ctx.truncate_events(mark);
                tracing::warn!(target: "xcall", app = %owner, error = %e, "application handler failed");
                Ok(Err(e))
            }
        }
    }

    /// Executes proxy request `request_id`; `data` must equal the delivered payload.
    ///
    /// - `CallMessage`: the outcome is only reported in `CallExecuted`.
    /// - `CallMessagePersisted`: a failing handler fails the whole transaction,
    ///   leaving the request in place to be retried.
    /// - `CallMessageWithRollback`: the outcome, plus any reply the handler
    ///   sent back, travels to the origin as a `CSMessageResult`.
    pub(crate) fn execute_proxy_request(
        &self,
        state: &mut dyn StateAccess,
        ctx: &mut TxContext<'_>,
        request_id: u128,
        data: &[u8],
    ) -> Result<(), TransactionError> {
        let key = proxy_request_key(request_id);
        let proxy: ProxyRequest = state
            .get_decoded(&key)?
            .ok_or(XCallError::CallRequestNotFound(request_id))?;
        if proxy.request.data != data {
            return Err(XCallError::DataMismatch.into());
        }
        state.delete(&key)?;

        let ProxyRequest { owner, request, .. } = proxy;
        match request.msg_type {
            MessageType::CallMessage => {
                let outcome = self.invoke_sandboxed(
                    state,
                    ctx,
                    &owner,
                    &request.from,
                    &request.data,
                    &request.protocols,
                )?;
                executed(ctx, request_id, &outcome);
            }
            MessageType::CallMessagePersisted => {
                self.invoke(state, ctx, &owner, &request.from, &request.data, &request.protocols)?;
                executed(ctx, request_id, &Ok(()));
            }
            MessageType::CallMessageWithRollback => {
                state.insert_encoded(
                    XCALL_REPLY_STATE_KEY,
                    &ReplyState {
                        from: request.from.clone(),
                        sequence_no: request.sequence_no,
                    },
                )?;
                let outcome = self.invoke_sandboxed(
                    state,
                    ctx,
                    &owner,
                    &request.from,
                    &request.data,
                    &request.protocols,
                )?;
                state.delete(XCALL_REPLY_STATE_KEY)?;
                let reply = state.get(XCALL_CALL_REPLY_KEY)?;
                state.delete(XCALL_CALL_REPLY_KEY)?;

                let result = match &outcome {
                    Ok(()) => CSMessageResult {
                        sequence_no: request.sequence_no,
                        response_code: CSResponseType::Success,
                        message: reply.unwrap_or_default(),
                    },
                    Err(_) => CSMessageResult {
                        sequence_no: request.sequence_no,
                        response_code: CSResponseType::Failure,
                        message: Vec::new(),
                    },
                };
                executed(ctx, request_id, &outcome);
                self.send_result(
                    state,
                    ctx,
                    request.from.network_id(),
                    &request.protocols,
                    &result,
                )?;
            }
        }
        tracing::info!(target: "xcall", req_id = %request_id, app = %owner, "request executed");
        Ok(())
    }

    /// Hands the rollback payload of failed outbound call `sn` back to its sender.
    ///
    /// The record is consumed even if the sender's handler fails.
    pub(crate) fn execute_rollback_record(
        &self,
        state: &mut dyn StateAccess,
        ctx: &mut TxContext<'_>,
        sn: u128,
    ) -> Result<(), TransactionError> {
        let key = rollback_key(sn);
        let record: RollbackRecord = state
            .get_decoded(&key)?
            .ok_or(XCallError::NoRollbackData)?;
        if !record.enabled {
            return Err(XCallError::RollbackNotEnabled(sn).into());
        }
        state.delete(&key)?;

        let from = self.get_network_address(state)?;
        let outcome = self.invoke_sandboxed(
            state,
            ctx,
            &record.from,
            &from,
            &record.rollback,
            &record.protocols,
        )?;
        if let Err(e) = &outcome {
            tracing::warn!(target: "xcall", sn = %sn, error = %e, "rollback handler failed");
        }
        ctx.emit(Event::RollbackExecuted { sn });
        Ok(())
    }

    /// Treats outbound call `sn` as failed, as if `connection` had delivered a
    /// `Failure` result for it.
    pub fn handle_error(
        &self,
        state: &mut dyn StateAccess,
        ctx: &mut TxContext<'_>,
        connection: &str,
        sn: u128,
    ) -> Result<(), TransactionError> {
        let record: RollbackRecord = state
            .get_decoded(&rollback_key(sn))?
            .ok_or(XCallError::InvalidSn(sn))?;
        let result = CSMessageResult {
            sequence_no: sn,
            response_code: CSResponseType::Failure,
            message: Vec::new(),
        };
        let msg = CSMessage::result(&result);
        self.handle_result(
            state,
            ctx,
            connection,
            record.to.network_id(),
            result,
            &msg.payload,
        )
    }

    /// Drops stuck proxy request `request_id` without running its handler and
    /// sends a `Failure` result back over `connection` so the origin can roll back.
    ///
    /// Only the request's destination application may do this, and only for a
    /// rollback-enabled request that `connection` actually delivered as
    /// `conn_sn` from `from_nid`.
    #[allow(clippy::too_many_arguments)]
    pub fn handle_forced_rollback(
        &self,
        state: &mut dyn StateAccess,
        ctx: &mut TxContext<'_>,
        caller: &AccountId,
        request_id: u128,
        from_nid: &str,
        conn_sn: u128,
        connection: &str,
    ) -> Result<(), TransactionError> {
        let key = proxy_request_key(request_id);
        let proxy: ProxyRequest = state
            .get_decoded(&key)?
            .ok_or(XCallError::CallRequestNotFound(request_id))?;
        if &proxy.owner != caller {
            return Err(XCallError::OnlyApplication.into());
        }
        let request = proxy.request;
        if request.msg_type != MessageType::CallMessageWithRollback {
            return Err(XCallError::RollbackNotPossible.into());
        }
        if request.from.network_id() != from_nid {
            return Err(XCallError::InvalidSource(from_nid.to_string()).into());
        }
        if !request.protocols.iter().any(|p| p == connection) {
            return Err(XCallError::ProtocolMismatch(connection.to_string()).into());
        }
        let services = ctx.services;
        let conn = services
            .connection(connection)
            .ok_or_else(|| XCallError::UnknownConnection(connection.to_string()))?;
        if !conn.has_receipt(state, from_nid, conn_sn)? {
            return Err(XCallError::InvalidMessageSequence {
                network_id: from_nid.to_string(),
                conn_sn,
            }
            .into());
        }
        state.delete(&key)?;

        let result = CSMessageResult {
            sequence_no: request.sequence_no,
            response_code: CSResponseType::Failure,
            message: Vec::new(),
        };
        self.send_result(state, ctx, from_nid, &[connection.to_string()], &result)?;
        ctx.emit(Event::CallExecuted {
            req_id: request_id,
            code: CSResponseType::Failure.code(),
            msg: "forced rollback".to_string(),
        });
        tracing::warn!(target: "xcall", req_id = %request_id, by = %caller, "forced rollback");
        Ok(())
    }
}
