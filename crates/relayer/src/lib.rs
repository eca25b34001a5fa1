// Path: crates/relayer/src/lib.rs
#![cfg_attr(
    not(test),
    deny(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::unimplemented,
        clippy::todo,
        clippy::indexing_slicing
    )
)]

//! # xcall Relayer
//!
//! Carries `SendMessage` events from one network's connections to the
//! same-named connections on the destination network, signing each delivery
//! as the connection admin. Deliveries are independent: one rejected message
//! is logged and counted and does not hold back the rest.

use serde::Serialize;
use std::collections::BTreeMap;
use xcall_execution::{Chain, ExecutionError, TxReceipt};
use xcall_services::connection::{RecvMessageParams, RevertMessageParams};
use xcall_types::app::{AccountId, Event};

/// A message a connection emitted for another network.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Outbound {
    /// Index of the event in the source network's log.
    pub index: usize,
    /// The connection instance that carries it.
    pub connection: String,
    /// The destination network.
    pub target_network: String,
    /// The connection's sequence number on the source network.
    pub conn_sn: u128,
    /// The router's sequence number; negative for results.
    pub sn: i128,
    /// The encoded `CSMessage`.
    pub msg: Vec<u8>,
}

/// What one relay pass did.
#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct RelayReport {
    /// Messages the destination accepted.
    pub delivered: usize,
    /// Messages the destination rejected, with the reason.
    pub failed: Vec<(u128, String)>,
}

impl RelayReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Lists every message in `chain`'s log addressed to `target_network`.
pub fn outbound(chain: &Chain, target_network: &str) -> Vec<Outbound> {
    chain
        .events()
        .iter()
        .enumerate()
        .filter_map(|(index, committed)| match &committed.event {
            Event::SendMessage {
                connection,
                target_network: target,
                conn_sn,
                sn,
                msg,
            } if target == target_network => Some(Outbound {
                index,
                connection: connection.clone(),
                target_network: target.clone(),
                conn_sn: *conn_sn,
                sn: *sn,
                msg: msg.clone(),
            }),
            _ => None,
        })
        .collect()
}

/// Relays between any number of networks, remembering per source network,
/// destination network and connection how far it has read.
#[derive(Debug, Clone)]
pub struct Relayer {
    account: AccountId,
    cursors: BTreeMap<(String, String, String), usize>,
}

impl Relayer {
    /// A relayer signing as `account`, which must administer the connections.
    pub fn new(account: AccountId) -> Self {
        Self {
            account,
            cursors: BTreeMap::new(),
        }
    }

    pub fn account(&self) -> &AccountId {
        &self.account
    }

    /// Delivers every new message from `src` to `dst`, over all connections.
    pub async fn relay(&mut self, src: &Chain, dst: &mut Chain) -> RelayReport {
        self.relay_filtered(src, dst, None).await
    }

    /// Delivers new messages from `src` to `dst` carried by `connection` only.
    /// Messages on other connections stay queued.
    pub async fn relay_connection(
        &mut self,
        src: &Chain,
        dst: &mut Chain,
        connection: &str,
    ) -> RelayReport {
        self.relay_filtered(src, dst, Some(connection)).await
    }

    async fn relay_filtered(
        &mut self,
        src: &Chain,
        dst: &mut Chain,
        only: Option<&str>,
    ) -> RelayReport {
        let mut report = RelayReport::default();
        for message in outbound(src, dst.network_id()) {
            if only.is_some_and(|c| c != message.connection) {
                continue;
            }
            let cursor_key = (
                src.network_id().to_string(),
                dst.network_id().to_string(),
                message.connection.clone(),
            );
            if self.cursors.get(&cursor_key).is_some_and(|next| message.index < *next) {
                continue;
            }
            self.cursors.insert(cursor_key, message.index + 1);

            match self
                .deliver(dst, src.network_id(), &message.connection, message.conn_sn, message.msg)
                .await
            {
                Ok(_) => report.delivered += 1,
                Err(e) => {
                    tracing::warn!(
                        target: "relayer",
                        src = %src.network_id(),
                        dst = %dst.network_id(),
                        connection = %message.connection,
                        conn_sn = message.conn_sn,
                        sn = message.sn,
                        error = %e,
                        "delivery rejected"
                    );
                    report.failed.push((message.conn_sn, e.to_string()));
                }
            }
        }
        tracing::debug!(
            target: "relayer",
            src = %src.network_id(),
            dst = %dst.network_id(),
            delivered = report.delivered,
            failed = report.failed.len(),
            "relay pass finished"
        );
        report
    }

    /// Submits one message to `connection` on `dst`, as if read from
    /// `src_network`. Re-submitting a delivered message is rejected by the
    /// connection's receipts.
    pub async fn deliver(
        &self,
        dst: &mut Chain,
        src_network: &str,
        connection: &str,
        conn_sn: u128,
        msg: Vec<u8>,
    ) -> Result<TxReceipt, ExecutionError> {
        let params = RecvMessageParams {
            src_network: src_network.to_string(),
            conn_sn,
            msg,
        };
        dst.call(&self.account, connection, "recv_message@v1", &params)
            .await
    }

    /// Reports that outbound call `sn` on `chain` can never be delivered,
    /// which fails it locally and enables its rollback.
    pub async fn revert(
        &self,
        chain: &mut Chain,
        connection: &str,
        sn: u128,
    ) -> Result<TxReceipt, ExecutionError> {
        tracing::info!(
            target: "relayer",
            network = %chain.network_id(),
            %connection,
            sn,
            "reverting undeliverable call"
        );
        chain
            .call(&self.account, connection, "revert_message@v1", &RevertMessageParams { sn })
            .await
    }
}
