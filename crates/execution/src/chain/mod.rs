// Path: crates/execution/src/chain/mod.rs
//! A single network: committed state, registered services and the event log.

use crate::error::ExecutionError;
use parity_scale_codec::Encode;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use xcall_api::services::access::ServiceDirectory;
use xcall_api::services::BlockchainService;
use xcall_api::state::{StateAccess, StateOverlay};
use xcall_api::transaction::context::TxContext;
use xcall_state::memory::MemoryState;
use xcall_types::app::{AccountId, Event};
use xcall_types::error::TransactionError;

/// An event in the committed log, tagged with the height of its transaction.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CommittedEvent {
    /// Height of the transaction that emitted the event.
    pub height: u64,
    /// The event.
    pub event: Event,
}

/// The outcome of an accepted transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxReceipt {
    /// The height the transaction was committed at.
    pub height: u64,
    /// The events it emitted, in order.
    pub events: Vec<Event>,
}

/// A network that executes one service call per transaction.
///
/// Every transaction is all-or-nothing: it runs on a `StateOverlay` over the
/// committed state, and its writes and events are committed only if the
/// service returns `Ok`. A rejected transaction does not advance the height.
pub struct Chain {
    network_id: String,
    height: u64,
    timestamp: u64,
    state: MemoryState,
    services: ServiceDirectory,
    events: Vec<CommittedEvent>,
}

impl std::fmt::Debug for Chain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Chain")
            .field("network_id", &self.network_id)
            .field("height", &self.height)
            .field("timestamp", &self.timestamp)
            .field("services", &self.services)
            .finish()
    }
}

impl Chain {
    /// Creates a chain from a genesis closure that writes the initial state
    /// and returns the services to register.
    pub fn genesis<F>(
        network_id: impl Into<String>,
        genesis_time: u64,
        init: F,
    ) -> Result<Self, ExecutionError>
    where
        F: FnOnce(&mut dyn StateAccess) -> Result<Vec<Arc<dyn BlockchainService>>, TransactionError>,
    {
        let network_id = network_id.into();
        let mut state = MemoryState::new();
        let services = ServiceDirectory::new(init(&mut state)?);
        tracing::info!(
            target: "execution",
            event = "genesis_ready",
            network_id = %network_id,
            services = services.len(),
            root = %hex::encode(state.root_hash()),
        );
        Ok(Self {
            network_id,
            height: 0,
            timestamp: genesis_time,
            state,
            services,
            events: Vec::new(),
        })
    }

    pub fn network_id(&self) -> &str {
        &self.network_id
    }

    pub fn height(&self) -> u64 {
        self.height
    }

    /// The block timestamp the next transaction sees, in unix seconds.
    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    pub fn advance_time(&mut self, secs: u64) {
        self.timestamp = self.timestamp.saturating_add(secs);
    }

    pub fn state(&self) -> &MemoryState {
        &self.state
    }

    pub fn services(&self) -> &ServiceDirectory {
        &self.services
    }

    /// Every committed event, oldest first.
    pub fn events(&self) -> &[CommittedEvent] {
        &self.events
    }

    /// Committed events from position `cursor` on.
    pub fn events_since(&self, cursor: usize) -> &[CommittedEvent] {
        self.events.get(cursor..).unwrap_or(&[])
    }

    /// Runs a read-only closure against the committed state.
    pub fn query<R>(&self, f: impl FnOnce(&dyn StateAccess, &ServiceDirectory) -> R) -> R {
        f(&self.state, &self.services)
    }

    /// Executes `method` (e.g. `"send_call_message@v1"`) on `service_id` with
    /// SCALE-encoded `params`, signed by `signer`.
    pub async fn submit(
        &mut self,
        signer: &AccountId,
        service_id: &str,
        method: &str,
        params: &[u8],
    ) -> Result<TxReceipt, ExecutionError> {
        let services = self.services.clone();
        let service = services
            .get_by_id(service_id)
            .ok_or_else(|| ExecutionError::UnknownService(service_id.to_string()))?;
        let height = self.height + 1;
        let mut ctx = TxContext::new(
            height,
            self.timestamp,
            self.network_id.as_str(),
            signer.clone(),
            &services,
        )
        .with_entry_service(service_id);

        let (inserts, deletes) = {
            let mut overlay = StateOverlay::new(&self.state);
            if let Err(e) = service
                .handle_service_call(&mut overlay, method, params, &mut ctx)
                .await
            {
                log::debug!(
                    target: "execution",
                    "[Chain {}] {}::{} from {} rejected: {}",
                    self.network_id, service_id, method, signer, e
                );
                return Err(e.into());
            }
            overlay.into_ordered_batch()
        };
        self.state.batch_apply(&inserts, &deletes)?;
        self.height = height;

        let events = ctx.events;
        self.events.extend(events.iter().cloned().map(|event| CommittedEvent { height, event }));
        tracing::debug!(
            target: "execution",
            event = "commit",
            network_id = %self.network_id,
            height,
            %service_id,
            %method,
            writes = inserts.len() + deletes.len(),
            events = events.len(),
        );
        Ok(TxReceipt { height, events })
    }

    /// Encodes `params` and submits them.
    pub async fn call<P: Encode>(
        &mut self,
        signer: &AccountId,
        service_id: &str,
        method: &str,
        params: &P,
    ) -> Result<TxReceipt, ExecutionError> {
        let bytes = xcall_types::codec::to_bytes_canonical(params).map_err(ExecutionError::Encoding)?;
        self.submit(signer, service_id, method, &bytes).await
    }
}
