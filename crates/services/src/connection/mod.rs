// Path: crates/services/src/connection/mod.rs
//! The connection ledger.
//!
//! A connection is one relay pathway. Several instances can be registered on a
//! chain side by side; each keeps its own config, fees, outbound counter and
//! delivery receipts under `conn::<id>::`, and collects its fees into the
//! account named after its id. Only the instance admin (the relayer) delivers
//! messages.

use crate::bank::BankService;
use crate::xcall::XCallService;
use crate::{require, SetAdminParams};
use parity_scale_codec::{Decode, Encode};
use xcall_api::services::CrossChainConnection;
use xcall_api::state::{StateAccess, StateAccessExt};
use xcall_api::transaction::context::TxContext;
use xcall_macros::service_interface;
use xcall_types::app::{AccountId, ConnectionConfig, Event, NetworkFee};
use xcall_types::error::{ConnectionError, TransactionError};
use xcall_types::keys::{
    connection_config_key, connection_fee_key, connection_receipt_key, connection_sn_key,
};
use xcall_types::NATIVE_DENOM;

// --- Service Method Parameter Structs (The Service's Public ABI) ---

#[derive(Encode, Decode, Debug, Clone, PartialEq, Eq)]
pub struct SetFeeParams {
    pub network_id: String,
    pub message_fee: u128,
    pub response_fee: u128,
}

/// Parameters for `recv_message@v1`: a message the relayer picked up on
/// `src_network` with that network's connection sequence `conn_sn`.
#[derive(Encode, Decode, Debug, Clone, PartialEq, Eq)]
pub struct RecvMessageParams {
    pub src_network: String,
    pub conn_sn: u128,
    pub msg: Vec<u8>,
}

#[derive(Encode, Decode, Debug, Clone, PartialEq, Eq)]
pub struct RevertMessageParams {
    pub sn: u128,
}

#[derive(Debug, Clone)]
pub struct ConnectionService {
    id: String,
}

impl ConnectionService {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    /// The account this instance collects fees into.
    pub fn account(&self) -> AccountId {
        AccountId::new(self.id.as_str())
    }

    fn load_config(&self, state: &dyn StateAccess) -> Result<ConnectionConfig, TransactionError> {
        state
            .get_decoded(&connection_config_key(&self.id))?
            .ok_or_else(|| ConnectionError::NotInitialized(self.id.clone()).into())
    }

    fn ensure_admin(
        &self,
        state: &dyn StateAccess,
        ctx: &TxContext<'_>,
    ) -> Result<ConnectionConfig, TransactionError> {
        let config = self.load_config(state)?;
        if config.admin != ctx.signer_account_id {
            return Err(ConnectionError::OnlyAdmin.into());
        }
        Ok(config)
    }

    pub fn initialize(
        &self,
        state: &mut dyn StateAccess,
        admin: AccountId,
    ) -> Result<(), TransactionError> {
        let key = connection_config_key(&self.id);
        if state.get(&key)?.is_some() {
            log::warn!("[Connection {}] already initialized; ignoring", self.id);
            return Ok(());
        }
        state.insert_encoded(&key, &ConnectionConfig { admin })?;
        Ok(())
    }

    pub fn admin(&self, state: &dyn StateAccess) -> Result<AccountId, TransactionError> {
        Ok(self.load_config(state)?.admin)
    }

    /// Fees for `network_id`; zero if none were configured.
    pub fn network_fee(
        &self,
        state: &dyn StateAccess,
        network_id: &str,
    ) -> Result<NetworkFee, TransactionError> {
        Ok(state
            .get_decoded(&connection_fee_key(&self.id, network_id))?
            .unwrap_or_default())
    }

    pub fn write_network_fee(
        &self,
        state: &mut dyn StateAccess,
        network_id: &str,
        fee: NetworkFee,
    ) -> Result<(), TransactionError> {
        state.insert_encoded(&connection_fee_key(&self.id, network_id), &fee)?;
        Ok(())
    }

    /// The last sequence number this instance assigned to an outbound message.
    pub fn connection_sn(&self, state: &dyn StateAccess) -> Result<u128, TransactionError> {
        Ok(state
            .get_decoded(&connection_sn_key(&self.id))?
            .unwrap_or(0))
    }
}

#[service_interface(
    id_field = "id",
    abi_version = 1,
    state_schema = "v1",
    capabilities = "CONNECTION"
)]
impl ConnectionService {
    #[method]
    pub fn set_admin(
        &self,
        state: &mut dyn StateAccess,
        params: SetAdminParams,
        ctx: &mut TxContext<'_>,
    ) -> Result<(), TransactionError> {
        let mut config = self.ensure_admin(state, ctx)?;
        config.admin = params.admin;
        state.insert_encoded(&connection_config_key(&self.id), &config)?;
        Ok(())
    }

    #[method]
    pub fn set_fee(
        &self,
        state: &mut dyn StateAccess,
        params: SetFeeParams,
        ctx: &mut TxContext<'_>,
    ) -> Result<(), TransactionError> {
        self.ensure_admin(state, ctx)?;
        self.write_network_fee(
            state,
            &params.network_id,
            NetworkFee {
                message_fee: params.message_fee,
                response_fee: params.response_fee,
            },
        )
    }

    /// Delivers a relayed message to the router. A `(src_network, conn_sn)`
    /// pair is accepted once; the receipt is never removed.
    #[method]
    pub fn recv_message(
        &self,
        state: &mut dyn StateAccess,
        params: RecvMessageParams,
        ctx: &mut TxContext<'_>,
    ) -> Result<(), TransactionError> {
        self.ensure_admin(state, ctx)?;
        let receipt = connection_receipt_key(&self.id, &params.src_network, params.conn_sn);
        if state.get(&receipt)?.is_some() {
            return Err(ConnectionError::DuplicateMessage {
                network_id: params.src_network,
                conn_sn: params.conn_sn,
            }
            .into());
        }
        state.insert_encoded(&receipt, &true)?;
        tracing::debug!(
            target: "connection",
            connection = %self.id,
            src_network = %params.src_network,
            conn_sn = %params.conn_sn,
            "message received"
        );

        let services = ctx.services;
        let xcall = require::<XCallService>(services, "xcall")?;
        xcall.handle_message(
            state,
            ctx,
            &self.id,
            &params.src_network,
            &params.msg,
            params.conn_sn,
        )
    }

    /// Reports that outbound call `sn` failed without a result message.
    #[method]
    pub fn revert_message(
        &self,
        state: &mut dyn StateAccess,
        params: RevertMessageParams,
        ctx: &mut TxContext<'_>,
    ) -> Result<(), TransactionError> {
        self.ensure_admin(state, ctx)?;
        let services = ctx.services;
        let xcall = require::<XCallService>(services, "xcall")?;
        xcall.handle_error(state, ctx, &self.id, params.sn)
    }

    /// Sends everything the instance collected to its admin.
    #[method]
    pub fn claim_fees(
        &self,
        state: &mut dyn StateAccess,
        ctx: &mut TxContext<'_>,
    ) -> Result<(), TransactionError> {
        let config = self.ensure_admin(state, ctx)?;
        let services = ctx.services;
        let bank = require::<BankService>(services, "bank")?;
        let account = self.account();
        let collected = bank.balance_of(state, NATIVE_DENOM, &account)?;
        bank.transfer_from(state, NATIVE_DENOM, &account, &config.admin, collected)?;
        log::info!("[Connection {}] {} in fees claimed by {}", self.id, collected, config.admin);
        Ok(())
    }
}

impl CrossChainConnection for ConnectionService {
    fn get_fee(
        &self,
        state: &dyn StateAccess,
        network_id: &str,
        is_response: bool,
    ) -> Result<u128, TransactionError> {
        Ok(self.network_fee(state, network_id)?.for_message(is_response))
    }

    fn send_message(
        &self,
        state: &mut dyn StateAccess,
        ctx: &mut TxContext<'_>,
        payer: &AccountId,
        to: &str,
        sn: i128,
        msg: &[u8],
    ) -> Result<(), TransactionError> {
        self.load_config(state)?;
        let services = ctx.services;
        let bank = require::<BankService>(services, "bank")?;
        let fee = self.get_fee(state, to, sn < 0)?;
        bank.transfer_from(state, NATIVE_DENOM, payer, &self.account(), fee)?;

        let conn_sn = self.connection_sn(state)? + 1;
        state.insert_encoded(&connection_sn_key(&self.id), &conn_sn)?;
        tracing::debug!(
            target: "connection",
            connection = %self.id,
            to,
            conn_sn = %conn_sn,
            sn = %sn,
            fee = %fee,
            "message queued for relay"
        );
        ctx.emit(Event::SendMessage {
            connection: self.id.clone(),
            target_network: to.to_string(),
            conn_sn,
            sn,
            msg: msg.to_vec(),
        });
        Ok(())
    }

    fn has_receipt(
        &self,
        state: &dyn StateAccess,
        network_id: &str,
        conn_sn: u128,
    ) -> Result<bool, TransactionError> {
        Ok(state
            .get(&connection_receipt_key(&self.id, network_id, conn_sn))?
            .is_some())
    }
}
