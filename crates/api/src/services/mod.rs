// Path: crates/api/src/services/mod.rs
//! Traits for pluggable services.
//!
//! Every service implements [`BlockchainService`], the dispatch entry point for
//! user transactions. Services that other services need to talk to directly
//! additionally expose a capability trait, reachable through the `as_*`
//! downcasters so the caller never needs the concrete type:
//!
//! - [`CallServiceReceiver`]: applications the router delivers calls to.
//! - [`CrossChainConnection`]: relay pathways the router sends messages through.

use crate::state::StateAccess;
use crate::transaction::context::TxContext;
use async_trait::async_trait;
use std::any::Any;
use xcall_types::app::{AccountId, NetworkAddress};
use xcall_types::error::TransactionError;
use xcall_types::service_configs::Capabilities;

pub mod access;

/// The base trait for any service managed by the chain.
#[async_trait]
pub trait BlockchainService: Any + Send + Sync {
    /// A unique, lowercase string identifier for the service.
    ///
    /// The id doubles as the service's `AccountId`: fees paid to a connection
    /// and tokens held by the vault live under it, and cross-chain calls
    /// address the service by it.
    fn id(&self) -> &str;

    /// The version of the ABI the service expects from the host.
    fn abi_version(&self) -> u32;

    /// A string identifying the schema of the state this service reads/writes.
    fn state_schema(&self) -> &str;

    /// Returns a bitmask of the capability interfaces this service implements.
    fn capabilities(&self) -> Capabilities;

    /// Provides access to the concrete type for downcasting.
    fn as_any(&self) -> &dyn Any;

    /// Handles a dispatched call. `method` is of the form `name@v1` and `params`
    /// is the SCALE encoding of the method's parameter type.
    ///
    /// # Default Implementation
    /// The default implementation returns an `Unsupported` error. Services must override
    /// this method to expose callable functions.
    async fn handle_service_call(
        &self,
        state: &mut dyn StateAccess,
        method: &str,
        params: &[u8],
        ctx: &mut TxContext<'_>,
    ) -> Result<(), TransactionError> {
        let _ = (state, params, ctx);
        Err(TransactionError::Unsupported(format!(
            "Service '{}' does not implement the method '{}'",
            self.id(),
            method
        )))
    }

    /// Attempts to downcast this service to a `CallServiceReceiver` trait object.
    fn as_call_receiver(&self) -> Option<&dyn CallServiceReceiver> {
        None
    }

    /// Attempts to downcast this service to a `CrossChainConnection` trait object.
    fn as_connection(&self) -> Option<&dyn CrossChainConnection> {
        None
    }
}

/// An application that can receive cross-chain calls from the router.
pub trait CallServiceReceiver: Send + Sync {
    /// Handles a call from `from`.
    ///
    /// `protocols` are the connections that delivered the call (for a rollback,
    /// the connections the original request was sent over). An `Err` marks the
    /// call as failed; the router discards every write and event the handler made.
    fn handle_call_message(
        &self,
        state: &mut dyn StateAccess,
        ctx: &mut TxContext<'_>,
        from: &NetworkAddress,
        data: &[u8],
        protocols: &[String],
    ) -> Result<(), TransactionError>;

    /// Lists the state keys a call with this payload would touch, so an
    /// off-chain executor can prefetch them. Purely advisory.
    fn query_call_message_keys(
        &self,
        state: &dyn StateAccess,
        from: &NetworkAddress,
        data: &[u8],
    ) -> Result<Vec<Vec<u8>>, TransactionError> {
        let _ = (state, from, data);
        Ok(Vec::new())
    }
}

/// A relay pathway between this chain and remote networks.
pub trait CrossChainConnection: Send + Sync {
    /// The fee this connection charges for one message to `network_id`.
    fn get_fee(
        &self,
        state: &dyn StateAccess,
        network_id: &str,
        is_response: bool,
    ) -> Result<u128, TransactionError>;

    /// Charges `payer` the connection fee and queues `msg` for relay to `to`.
    ///
    /// `sn` is the router's view of the message: positive for a request that
    /// expects a result, zero for a one-way request and negative for a result.
    fn send_message(
        &self,
        state: &mut dyn StateAccess,
        ctx: &mut TxContext<'_>,
        payer: &AccountId,
        to: &str,
        sn: i128,
        msg: &[u8],
    ) -> Result<(), TransactionError>;

    /// True if the connection has delivered `conn_sn` from `network_id`.
    fn has_receipt(
        &self,
        state: &dyn StateAccess,
        network_id: &str,
        conn_sn: u128,
    ) -> Result<bool, TransactionError>;
}
