// Path: crates/services/src/xcall/send.rs
//! Outbound calls and results.

use super::{load_config, store_config, XCallService};
use crate::bank::BankService;
use crate::require;
use xcall_api::services::access::ServiceDirectory;
use xcall_api::services::CrossChainConnection;
use xcall_api::state::{StateAccess, StateAccessExt};
use xcall_api::transaction::context::TxContext;
use xcall_types::app::{
    AccountId, Event, NetworkAddress, ReplyState, RollbackRecord, MAX_DATA_SIZE,
    MAX_ROLLBACK_SIZE,
};
use xcall_types::error::{TransactionError, XCallError};
use xcall_types::keys::{rollback_key, XCALL_CALL_REPLY_KEY, XCALL_REPLY_STATE_KEY};
use xcall_types::wire::{self, CSMessage, CSMessageRequest, CSMessageResult, Envelope, MessageType};
use xcall_types::NATIVE_DENOM;

/// Resolves connection ids to the registered connections, in order.
fn connections<'s>(
    services: &'s ServiceDirectory,
    ids: &[String],
) -> Result<Vec<&'s dyn CrossChainConnection>, TransactionError> {
    ids.iter()
        .map(|id| {
            services
                .connection(id)
                .ok_or_else(|| TransactionError::from(XCallError::UnknownConnection(id.clone())))
        })
        .collect()
}

/// The connection view of a sequence number: negative for results.
fn signed_sn(sn: u128, negate: bool) -> Result<i128, TransactionError> {
    let sn = i128::try_from(sn).map_err(|_| XCallError::InvalidSn(sn))?;
    Ok(if negate { -sn } else { sn })
}

impl XCallService {
    /// The local connections a call to `network_id` goes out on: `sources` as
    /// given, or the default connection for the network.
    fn resolve_sources(
        &self,
        state: &dyn StateAccess,
        sources: &[String],
        network_id: &str,
    ) -> Result<Vec<String>, TransactionError> {
        if !sources.is_empty() {
            return Ok(sources.to_vec());
        }
        match self.get_default_connection(state, network_id)? {
            Some(connection) => Ok(vec![connection]),
            None => Err(XCallError::ProtocolNotSpecified.into()),
        }
    }

    /// The total fee of a request to `network_id`: the protocol fee plus the
    /// request fee of every source connection.
    pub fn get_fee(
        &self,
        state: &dyn StateAccess,
        services: &ServiceDirectory,
        network_id: &str,
        sources: &[String],
    ) -> Result<u128, TransactionError> {
        let config = load_config(state)?;
        let sources = self.resolve_sources(state, sources, network_id)?;
        let mut total = config.protocol_fee;
        for conn in connections(services, &sources)? {
            total = total.saturating_add(conn.get_fee(state, network_id, false)?);
        }
        Ok(total)
    }

    /// Sends `envelope` from the local application `from` to `to` and returns
    /// the allocated sequence number.
    ///
    /// The transaction signer pays the protocol fee and each connection's fee.
    /// Validation happens before any write, so a rejected call leaves no trace.
    pub fn send_call(
        &self,
        state: &mut dyn StateAccess,
        ctx: &mut TxContext<'_>,
        from: &AccountId,
        envelope: Envelope,
        to: &NetworkAddress,
    ) -> Result<u128, TransactionError> {
        let data_len = envelope.data().len();
        if data_len > MAX_DATA_SIZE {
            return Err(XCallError::MaxDataSizeExceeded {
                max: MAX_DATA_SIZE,
                got: data_len,
            }
            .into());
        }
        if let Some(rollback) = envelope.rollback() {
            if rollback.is_empty() {
                return Err(XCallError::NoRollbackData.into());
            }
            if rollback.len() > MAX_ROLLBACK_SIZE {
                return Err(XCallError::MaxRollbackSizeExceeded {
                    max: MAX_ROLLBACK_SIZE,
                    got: rollback.len(),
                }
                .into());
            }
        }
        if envelope.destinations.is_empty() {
            return Err(XCallError::ProtocolNotSpecified.into());
        }
        let sources = self.resolve_sources(state, &envelope.sources, to.network_id())?;
        let services = ctx.services;
        let conns = connections(services, &sources)?;
        let bank = require::<BankService>(services, "bank")?;

        let mut config = load_config(state)?;
        config.sequence_no += 1;
        let sn = config.sequence_no;
        store_config(state, &config)?;

        let msg_type = envelope.message_type();
        if let Some(rollback) = envelope.rollback() {
            state.insert_encoded(
                &rollback_key(sn),
                &RollbackRecord {
                    from: from.clone(),
                    to: to.clone(),
                    enabled: false,
                    rollback: rollback.to_vec(),
                    protocols: sources.clone(),
                },
            )?;
        }

        let request = CSMessageRequest {
            from: NetworkAddress::new(config.network_id.as_str(), from.as_str()),
            to: to.account().to_string(),
            sequence_no: sn,
            msg_type,
            data: envelope.data().to_vec(),
            protocols: envelope.destinations.clone(),
        };
        let sent = Event::CallMessageSent {
            from: from.clone(),
            to: to.to_string(),
            sn,
        };

        // A plain call back to the origin of the rollback-enabled request being
        // executed rides inside that request's result instead of going out alone.
        if msg_type == MessageType::CallMessage {
            if let Some(reply) = state.get_decoded::<ReplyState>(XCALL_REPLY_STATE_KEY)? {
                if reply.from.network_id() == to.network_id() {
                    state.insert(XCALL_CALL_REPLY_KEY, &wire::encode(&request))?;
                    tracing::debug!(target: "xcall", sn = %sn, origin_sn = %reply.sequence_no, "captured call reply");
                    ctx.emit(sent);
                    return Ok(sn);
                }
            }
        }

        let payer = ctx.signer_account_id.clone();
        if config.protocol_fee > 0 {
            bank.transfer_from(
                state,
                NATIVE_DENOM,
                &payer,
                &config.fee_handler,
                config.protocol_fee,
            )?;
        }
        let conn_sn = if msg_type == MessageType::CallMessageWithRollback {
            signed_sn(sn, false)?
        } else {
            0
        };
        let msg = CSMessage::request(&request).to_bytes();
        for conn in conns {
            conn.send_message(state, ctx, &payer, to.network_id(), conn_sn, &msg)?;
        }
        tracing::info!(target: "xcall", sn = %sn, from = %from, to = %to, "call sent");
        ctx.emit(sent);
        Ok(sn)
    }

    /// Sends `result` for the origin's call `sn` back to `network_id` over `protocols`.
    pub(crate) fn send_result(
        &self,
        state: &mut dyn StateAccess,
        ctx: &mut TxContext<'_>,
        network_id: &str,
        protocols: &[String],
        result: &CSMessageResult,
    ) -> Result<(), TransactionError> {
        let services = ctx.services;
        let sn = signed_sn(result.sequence_no, true)?;
        let msg = CSMessage::result(result).to_bytes();
        let payer = ctx.signer_account_id.clone();
        for conn in connections(services, protocols)? {
            conn.send_message(state, ctx, &payer, network_id, sn, &msg)?;
        }
        Ok(())
    }
}
