// Path: crates/relayer/tests/common/mod.rs
#![allow(dead_code)]

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::any::Any;
use std::sync::Arc;
use xcall_api::services::{BlockchainService, CallServiceReceiver};
use xcall_api::state::{StateAccess, StateAccessExt};
use xcall_api::transaction::context::TxContext;
use xcall_execution::{Chain, TxReceipt};
use xcall_relayer::{RelayReport, Relayer};
use xcall_services::bank::BankService;
use xcall_services::genesis;
use xcall_services::xcall::{
    ExecuteCallParams, ExecuteRollbackParams, SendCallParams, XCallService, XCALL_SERVICE_ID,
};
use xcall_test_utils::fixtures::{self, CENTRALIZED, DAPP, HUB_NID, SPOKE_NID};
use xcall_types::app::{AccountId, Event, NetworkAddress};
use xcall_types::config::ChainConfig;
use xcall_types::error::TransactionError;
use xcall_types::service_configs::Capabilities;
use xcall_types::wire::{AnyMessage, Envelope, TransferMessage, VaultMessage};
use xcall_types::NATIVE_DENOM;

const INBOX_KEY: &[u8] = b"dapp::inbox";

/// Payload the test application refuses.
pub const FAIL: &[u8] = b"fail";
/// Prefix asking the test application to answer the sender with the rest.
pub const REPLY_PREFIX: &[u8] = b"reply:";

/// The test application. It records every call it accepts, refuses `FAIL`
/// (and deposits or cross transfers carrying `FAIL`), and answers `reply:<text>` with a plain
/// call carrying `<text>`.
#[derive(Debug, Default)]
pub struct Dapp;

#[async_trait]
impl BlockchainService for Dapp {
    fn id(&self) -> &str {
        DAPP
    }
    fn abi_version(&self) -> u32 {
        1
    }
    fn state_schema(&self) -> &str {
        "v1"
    }
    fn capabilities(&self) -> Capabilities {
        Capabilities::CALL_RECEIVER
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn as_call_receiver(&self) -> Option<&dyn CallServiceReceiver> {
        Some(self)
    }
}

impl CallServiceReceiver for Dapp {
    fn handle_call_message(
        &self,
        state: &mut dyn StateAccess,
        ctx: &mut TxContext<'_>,
        from: &NetworkAddress,
        data: &[u8],
        _protocols: &[String],
    ) -> Result<(), TransactionError> {
        let refused = match (VaultMessage::from_bytes(data), TransferMessage::from_bytes(data)) {
            (Ok(VaultMessage::Deposit { data, .. }), _) => data == FAIL,
            (_, Ok(TransferMessage::CrossTransfer { data, .. })) => data == FAIL,
            _ => data == FAIL,
        };
        if refused {
            return Err(TransactionError::Invalid("dapp refused the call".into()));
        }
        if let Some(text) = data.strip_prefix(REPLY_PREFIX) {
            let services = ctx.services;
            let xcall = services
                .get::<XCallService>()
                .ok_or_else(|| TransactionError::Unsupported("xcall".into()))?;
            let envelope = Envelope::new(
                AnyMessage::CallMessage {
                    data: text.to_vec(),
                },
                vec![],
                vec![CENTRALIZED.to_string()],
            );
            xcall.send_call(state, ctx, &fixtures::dapp_account(), envelope, from)?;
        }
        let mut inbox: Vec<(String, Vec<u8>)> = state.get_decoded(INBOX_KEY)?.unwrap_or_default();
        inbox.push((from.to_string(), data.to_vec()));
        state.insert_encoded(INBOX_KEY, &inbox)?;
        Ok(())
    }
}

fn boot(config: ChainConfig) -> Result<Chain> {
    let chain = Chain::genesis(config.network_id.clone(), config.genesis_time, |state| {
        let mut services = genesis::build(&config, state)?;
        services.push(Arc::new(Dapp) as Arc<dyn BlockchainService>);
        Ok(services)
    })?;
    Ok(chain)
}

/// Both networks and a relayer between them.
pub struct Networks {
    pub hub: Chain,
    pub spoke: Chain,
    pub relayer: Relayer,
}

impl Networks {
    pub fn new() -> Result<Self> {
        xcall_telemetry::init_test_tracing();
        Ok(Self {
            hub: boot(fixtures::hub_config())?,
            spoke: boot(fixtures::spoke_config())?,
            relayer: Relayer::new(fixtures::relayer()),
        })
    }

    pub async fn hub_to_spoke(&mut self) -> RelayReport {
        self.relayer.relay(&self.hub, &mut self.spoke).await
    }

    pub async fn spoke_to_hub(&mut self) -> RelayReport {
        self.relayer.relay(&self.spoke, &mut self.hub).await
    }
}

pub async fn send_call(
    chain: &mut Chain,
    signer: &AccountId,
    envelope: Envelope,
    to: NetworkAddress,
) -> Result<TxReceipt> {
    let params = SendCallParams { envelope, to };
    Ok(chain
        .call(signer, XCALL_SERVICE_ID, "send_call_message@v1", &params)
        .await?)
}

pub async fn execute_call(
    chain: &mut Chain,
    signer: &AccountId,
    request_id: u128,
    data: Vec<u8>,
) -> Result<TxReceipt> {
    let params = ExecuteCallParams { request_id, data };
    Ok(chain
        .call(signer, XCALL_SERVICE_ID, "execute_call@v1", &params)
        .await?)
}

pub async fn execute_rollback(chain: &mut Chain, signer: &AccountId, sn: u128) -> Result<TxReceipt> {
    Ok(chain
        .call(
            signer,
            XCALL_SERVICE_ID,
            "execute_rollback@v1",
            &ExecuteRollbackParams { sn },
        )
        .await?)
}

/// Native balance of `account`.
pub fn balance(chain: &Chain, account: &AccountId) -> Result<u128> {
    balance_of(chain, NATIVE_DENOM, account)
}

/// Balance of `account` in `denom`.
pub fn balance_of(chain: &Chain, denom: &str, account: &AccountId) -> Result<u128> {
    Ok(chain.query(|state, _| BankService.balance_of(state, denom, account))?)
}

/// Every call the test application accepted, as `(from, data)`.
pub fn inbox(chain: &Chain) -> Result<Vec<(String, Vec<u8>)>> {
    Ok(chain
        .query(|state, _| state.get_decoded::<Vec<(String, Vec<u8>)>>(INBOX_KEY))?
        .unwrap_or_default())
}

/// The request id and payload of the latest materialized inbound request.
pub fn last_call_message(chain: &Chain) -> Result<(u128, Vec<u8>)> {
    chain
        .events()
        .iter()
        .rev()
        .find_map(|committed| match &committed.event {
            Event::CallMessage { req_id, data, .. } => Some((*req_id, data.clone())),
            _ => None,
        })
        .ok_or_else(|| anyhow!("no CallMessage event on {}", chain.network_id()))
}

/// The sequence number of the latest outbound call.
pub fn last_sent_sn(chain: &Chain) -> Result<u128> {
    chain
        .events()
        .iter()
        .rev()
        .find_map(|committed| match &committed.event {
            Event::CallMessageSent { sn, .. } => Some(*sn),
            _ => None,
        })
        .ok_or_else(|| anyhow!("no CallMessageSent event on {}", chain.network_id()))
}

/// Why request `req_id` failed on `chain`, if its execution failed.
pub fn failed(chain: &Chain, req_id: u128) -> Option<String> {
    chain.events().iter().find_map(|c| match &c.event {
        Event::CallExecuted { req_id: id, code: 0, msg } if *id == req_id => Some(msg.clone()),
        _ => None,
    })
}

/// Whether `event` was committed on `chain`.
pub fn has_event(chain: &Chain, event: &Event) -> bool {
    chain.events().iter().any(|committed| &committed.event == event)
}

pub fn hub_dapp() -> NetworkAddress {
    fixtures::dapp(HUB_NID)
}

pub fn spoke_dapp() -> NetworkAddress {
    fixtures::dapp(SPOKE_NID)
}
