// Path: crates/types/src/app/xcall.rs
use crate::app::{AccountId, NetworkAddress};
use crate::wire::CSMessageRequest;
use parity_scale_codec::{Decode, Encode};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Maximum size of the application payload carried by a single call.
pub const MAX_DATA_SIZE: usize = 2048;
/// Maximum size of the rollback payload retained on the origin chain.
pub const MAX_ROLLBACK_SIZE: usize = 1024;

/// Per-chain singleton configuration and counters of the call router.
#[derive(Serialize, Deserialize, Encode, Decode, Debug, Clone, PartialEq, Eq)]
pub struct XCallConfig {
    /// Account allowed to change fees, handlers and default connections.
    pub admin: AccountId,
    /// Account receiving the protocol fee of every `sendCall`.
    pub fee_handler: AccountId,
    /// The network id of the chain hosting this router.
    pub network_id: String,
    /// Flat fee charged per outbound call, on top of connection fees.
    pub protocol_fee: u128,
    /// Last allocated outbound sequence number. Never reused.
    pub sequence_no: u128,
    /// Last allocated inbound request id. Never reused.
    pub last_request_id: u128,
}

/// Origin-side record of an outbound call that asked for rollback semantics.
///
/// Created by `sendCall`; deleted on a `Success` result or consumed by
/// `executeRollback` after a `Failure` result flipped `enabled`.
#[derive(Serialize, Deserialize, Encode, Decode, Debug, Clone, PartialEq, Eq)]
pub struct RollbackRecord {
    /// The local application that sent the call.
    pub from: AccountId,
    /// The destination of the call.
    pub to: NetworkAddress,
    /// True once a `Failure` result has been recorded.
    pub enabled: bool,
    /// Payload handed back to `from` when the rollback executes.
    pub rollback: Vec<u8>,
    /// The local connections the request was sent over; results must arrive through them.
    pub protocols: Vec<String>,
}

/// Destination-side record of an inbound request awaiting execution.
#[derive(Serialize, Deserialize, Encode, Decode, Debug, Clone, PartialEq, Eq)]
pub struct ProxyRequest {
    /// The locally allocated request id.
    pub request_id: u128,
    /// The local application the request is addressed to.
    pub owner: AccountId,
    /// The request exactly as delivered.
    pub request: CSMessageRequest,
}

/// Quorum bookkeeping for a message that must arrive over several protocols.
#[derive(Serialize, Deserialize, Encode, Decode, Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingAggregate {
    /// Keccak-256 of the first delivered payload; later deliveries must match it.
    pub payload_hash: [u8; 32],
    /// Protocols that have delivered the payload so far.
    pub seen_protocols: BTreeSet<String>,
}

/// Context of a rollback-enabled request while its application handler runs.
///
/// A plain call the handler sends back to `from`'s network during execution is
/// captured as the reply and carried inside the result instead of being relayed
/// on its own.
#[derive(Serialize, Deserialize, Encode, Decode, Debug, Clone, PartialEq, Eq)]
pub struct ReplyState {
    /// The origin of the request being executed.
    pub from: NetworkAddress,
    /// The origin sequence number of the request being executed.
    pub sequence_no: u128,
}
