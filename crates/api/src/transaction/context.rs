// Path: crates/api/src/transaction/context.rs
//! Defines the context threaded through every service call of a transaction.

use crate::services::access::ServiceDirectory;
use xcall_types::app::{AccountId, Event};

/// Per-transaction context handed to services.
///
/// Everything except `events` is fixed for the lifetime of the transaction.
/// Events are buffered here and only reach the host's log if the transaction
/// commits; a caller that discards a nested execution must also truncate the
/// buffer back to where that execution started.
#[derive(Clone)]
pub struct TxContext<'a> {
    /// The current block height being processed.
    pub block_height: u64,
    /// The deterministic block timestamp, in unix seconds.
    pub block_timestamp: u64,
    /// The network id of the chain executing the transaction.
    pub network_id: String,
    /// The `AccountId` of the entity that signed the current transaction.
    /// This is the authoritative source for permission checks within services.
    pub signer_account_id: AccountId,
    /// The service the transaction was submitted to. Nested calls keep the
    /// outermost entry point; `None` outside a host.
    pub entry_service: Option<String>,
    /// A read-only directory of available services.
    pub services: &'a ServiceDirectory,
    /// If true, the transaction is being simulated and will not be committed.
    pub simulation: bool,
    /// Events emitted so far, in order.
    pub events: Vec<Event>,
}

impl<'a> TxContext<'a> {
    /// Creates a context with an empty event buffer.
    pub fn new(
        block_height: u64,
        block_timestamp: u64,
        network_id: impl Into<String>,
        signer_account_id: AccountId,
        services: &'a ServiceDirectory,
    ) -> Self {
        Self {
            block_height,
            block_timestamp,
            network_id: network_id.into(),
            signer_account_id,
            entry_service: None,
            services,
            simulation: false,
            events: Vec::new(),
        }
    }

    /// Records the service the transaction entered through.
    pub fn with_entry_service(mut self, service_id: impl Into<String>) -> Self {
        self.entry_service = Some(service_id.into());
        self
    }

    /// Buffers an event.
    pub fn emit(&mut self, event: Event) {
        log::debug!(target: "xcall::events", "{:?}", event);
        self.events.push(event);
    }

    /// The number of buffered events; use as a mark for [`Self::truncate_events`].
    pub fn events_len(&self) -> usize {
        self.events.len()
    }

    /// Drops every event emitted after `mark`.
    pub fn truncate_events(&mut self, mark: usize) {
        self.events.truncate(mark);
    }
}
