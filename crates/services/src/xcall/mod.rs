// Path: crates/services/src/xcall/mod.rs
//! The call router.
//!
//! Two independent state machines share this service's state:
//!
//! - Outbound, per sequence number: `send_call` creates a `RollbackRecord` when
//!   the call asks for rollback semantics; a `Success` result deletes it, a
//!   `Failure` result enables it and `execute_rollback` consumes it.
//! - Inbound, per request id: a delivered request (after quorum, if it lists
//!   several protocols) becomes a `ProxyRequest`; `execute_call` or a forced
//!   rollback consumes it.
//!
//! Records are deleted on use, so each one is acted on exactly once.

mod execute;
mod receive;
mod send;

use crate::SetAdminParams;
use parity_scale_codec::{Decode, Encode};
use xcall_api::state::{StateAccess, StateAccessExt};
use xcall_api::transaction::context::TxContext;
use xcall_macros::service_interface;
use xcall_types::app::{AccountId, NetworkAddress, ProxyRequest, RollbackRecord, XCallConfig};
use xcall_types::error::{CodecError, TransactionError, XCallError};
use xcall_types::keys::{
    default_connection_key, proxy_request_key, rollback_key, successful_response_key,
    XCALL_CONFIG_KEY,
};
use xcall_types::wire::{CSMessage, DecodedMessage, Envelope};

/// The router's service id, which is also its account and the address part of
/// its network address.
pub const XCALL_SERVICE_ID: &str = "xcall";

// --- Service Method Parameter Structs (The Service's Public ABI) ---

#[derive(Encode, Decode, Debug, Clone, PartialEq, Eq)]
pub struct SetProtocolFeeParams {
    pub fee: u128,
}

#[derive(Encode, Decode, Debug, Clone, PartialEq, Eq)]
pub struct SetProtocolFeeHandlerParams {
    pub handler: AccountId,
}

#[derive(Encode, Decode, Debug, Clone, PartialEq, Eq)]
pub struct SetDefaultConnectionParams {
    pub network_id: String,
    pub connection: String,
}

/// Parameters for `send_call_message@v1`; the signer is the sender.
#[derive(Encode, Decode, Debug, Clone, PartialEq, Eq)]
pub struct SendCallParams {
    pub envelope: Envelope,
    pub to: NetworkAddress,
}

#[derive(Encode, Decode, Debug, Clone, PartialEq, Eq)]
pub struct ExecuteCallParams {
    pub request_id: u128,
    pub data: Vec<u8>,
}

#[derive(Encode, Decode, Debug, Clone, PartialEq, Eq)]
pub struct ExecuteRollbackParams {
    pub sn: u128,
}

#[derive(Default, Debug)]
pub struct XCallService;

pub(crate) fn load_config(state: &dyn StateAccess) -> Result<XCallConfig, TransactionError> {
    state
        .get_decoded(XCALL_CONFIG_KEY)?
        .ok_or_else(|| XCallError::NotInitialized.into())
}

pub(crate) fn store_config(
    state: &mut dyn StateAccess,
    config: &XCallConfig,
) -> Result<(), TransactionError> {
    state.insert_encoded(XCALL_CONFIG_KEY, config)?;
    Ok(())
}

impl XCallService {
    /// Writes the initial configuration. Later calls leave an existing
    /// configuration (and its counters) untouched.
    pub fn initialize(
        &self,
        state: &mut dyn StateAccess,
        network_id: &str,
        admin: AccountId,
        fee_handler: AccountId,
        protocol_fee: u128,
    ) -> Result<(), TransactionError> {
        if state.get(XCALL_CONFIG_KEY)?.is_some() {
            log::warn!("[XCall] already initialized; ignoring");
            return Ok(());
        }
        store_config(
            state,
            &XCallConfig {
                admin,
                fee_handler,
                network_id: network_id.to_string(),
                protocol_fee,
                sequence_no: 0,
                last_request_id: 0,
            },
        )
    }

    fn ensure_admin(
        &self,
        state: &dyn StateAccess,
        ctx: &TxContext<'_>,
    ) -> Result<XCallConfig, TransactionError> {
        let config = load_config(state)?;
        if config.admin != ctx.signer_account_id {
            return Err(XCallError::OnlyAdmin.into());
        }
        Ok(config)
    }

    // --- Queries ---

    pub fn config(&self, state: &dyn StateAccess) -> Result<XCallConfig, TransactionError> {
        load_config(state)
    }

    pub fn get_protocol_fee(&self, state: &dyn StateAccess) -> Result<u128, TransactionError> {
        Ok(load_config(state)?.protocol_fee)
    }

    pub fn get_protocol_fee_handler(
        &self,
        state: &dyn StateAccess,
    ) -> Result<AccountId, TransactionError> {
        Ok(load_config(state)?.fee_handler)
    }

    /// The router's own address, `"<network id>/xcall"`. Rollbacks are
    /// delivered to applications as coming from it.
    pub fn get_network_address(
        &self,
        state: &dyn StateAccess,
    ) -> Result<NetworkAddress, TransactionError> {
        let config = load_config(state)?;
        Ok(NetworkAddress::new(config.network_id, XCALL_SERVICE_ID))
    }

    pub fn get_default_connection(
        &self,
        state: &dyn StateAccess,
        network_id: &str,
    ) -> Result<Option<String>, TransactionError> {
        Ok(state.get_decoded(&default_connection_key(network_id))?)
    }

    pub(crate) fn write_default_connection(
        &self,
        state: &mut dyn StateAccess,
        network_id: &str,
        connection: &str,
    ) -> Result<(), TransactionError> {
        state.insert_encoded(&default_connection_key(network_id), &connection.to_string())?;
        Ok(())
    }

    pub fn proxy_request(
        &self,
        state: &dyn StateAccess,
        request_id: u128,
    ) -> Result<Option<ProxyRequest>, TransactionError> {
        Ok(state.get_decoded(&proxy_request_key(request_id))?)
    }

    pub fn rollback_record(
        &self,
        state: &dyn StateAccess,
        sn: u128,
    ) -> Result<Option<RollbackRecord>, TransactionError> {
        Ok(state.get_decoded(&rollback_key(sn))?)
    }

    /// True once a `Success` result for outbound call `sn` has been accepted.
    pub fn is_successful_response(
        &self,
        state: &dyn StateAccess,
        sn: u128,
    ) -> Result<bool, TransactionError> {
        Ok(state.get(&successful_response_key(sn))?.is_some())
    }

    /// Decodes a relayed message, for inspection.
    pub fn decode_cs_message(bytes: &[u8]) -> Result<DecodedMessage, CodecError> {
        CSMessage::from_bytes(bytes)?.decode_payload()
    }
}

#[service_interface(id = "xcall", abi_version = 1, state_schema = "v1")]
impl XCallService {
    #[method]
    pub fn set_admin(
        &self,
        state: &mut dyn StateAccess,
        params: SetAdminParams,
        ctx: &mut TxContext<'_>,
    ) -> Result<(), TransactionError> {
        let mut config = self.ensure_admin(state, ctx)?;
        config.admin = params.admin;
        store_config(state, &config)
    }

    #[method]
    pub fn set_protocol_fee(
        &self,
        state: &mut dyn StateAccess,
        params: SetProtocolFeeParams,
        ctx: &mut TxContext<'_>,
    ) -> Result<(), TransactionError> {
        let mut config = self.ensure_admin(state, ctx)?;
        config.protocol_fee = params.fee;
        store_config(state, &config)
    }

    #[method]
    pub fn set_protocol_fee_handler(
        &self,
        state: &mut dyn StateAccess,
        params: SetProtocolFeeHandlerParams,
        ctx: &mut TxContext<'_>,
    ) -> Result<(), TransactionError> {
        let mut config = self.ensure_admin(state, ctx)?;
        config.fee_handler = params.handler;
        store_config(state, &config)
    }

    #[method]
    pub fn set_default_connection(
        &self,
        state: &mut dyn StateAccess,
        params: SetDefaultConnectionParams,
        ctx: &mut TxContext<'_>,
    ) -> Result<(), TransactionError> {
        self.ensure_admin(state, ctx)?;
        if ctx.services.connection(&params.connection).is_none() {
            return Err(XCallError::UnknownConnection(params.connection).into());
        }
        self.write_default_connection(state, &params.network_id, &params.connection)
    }

    #[method]
    pub fn send_call_message(
        &self,
        state: &mut dyn StateAccess,
        params: SendCallParams,
        ctx: &mut TxContext<'_>,
    ) -> Result<(), TransactionError> {
        let from = ctx.signer_account_id.clone();
        self.send_call(state, ctx, &from, params.envelope, &params.to)?;
        Ok(())
    }

    #[method]
    pub fn execute_call(
        &self,
        state: &mut dyn StateAccess,
        params: ExecuteCallParams,
        ctx: &mut TxContext<'_>,
    ) -> Result<(), TransactionError> {
        self.execute_proxy_request(state, ctx, params.request_id, &params.data)
    }

    #[method]
    pub fn execute_rollback(
        &self,
        state: &mut dyn StateAccess,
        params: ExecuteRollbackParams,
        ctx: &mut TxContext<'_>,
    ) -> Result<(), TransactionError> {
        self.execute_rollback_record(state, ctx, params.sn)
    }
}
