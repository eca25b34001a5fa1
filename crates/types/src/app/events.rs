// Path: crates/types/src/app/events.rs
use crate::app::{AccountId, NetworkAddress};
use crate::wire::CSResponseType;
use parity_scale_codec::{Decode, Encode};
use serde::{Deserialize, Serialize};

/// An event emitted by a service during a transaction.
///
/// Events are buffered on the transaction context and only become visible in the
/// host's event log when the transaction commits. Events emitted by an application
/// handler that failed inside `executeCall` are discarded with its state writes.
#[derive(Serialize, Deserialize, Encode, Decode, Debug, Clone, PartialEq, Eq)]
pub enum Event {
    // --- Call router ---
    /// An outbound call was accepted and handed to its connections.
    CallMessageSent {
        /// The local sender.
        from: AccountId,
        /// The destination, as `"networkId/address"`.
        to: String,
        /// The allocated outbound sequence number.
        sn: u128,
    },
    /// An inbound request was materialized and awaits `executeCall`.
    CallMessage {
        /// The remote sender.
        from: NetworkAddress,
        /// The local destination application.
        to: String,
        /// The sender's sequence number.
        sn: u128,
        /// The locally allocated request id.
        req_id: u128,
        /// The application payload, needed to call `executeCall`.
        data: Vec<u8>,
    },
    /// An inbound request was executed (or force-rolled-back).
    CallExecuted {
        /// The request id.
        req_id: u128,
        /// `1` on success, `0` on application failure.
        code: u8,
        /// Failure description, empty on success.
        msg: String,
    },
    /// A result for an outbound call was accepted.
    ResponseMessage {
        /// The result code.
        code: CSResponseType,
        /// The outbound sequence number.
        sn: u128,
    },
    /// A failed outbound call is ready for `executeRollback`.
    RollbackMessage {
        /// The outbound sequence number.
        sn: u128,
    },
    /// A rollback was delivered to the originating application.
    RollbackExecuted {
        /// The outbound sequence number.
        sn: u128,
    },
    /// A multi-protocol delivery diverged and its partial quorum was dropped.
    PendingDiscarded {
        /// The network the message came from.
        from_nid: String,
        /// The sequence number of the diverging message.
        sn: u128,
    },

    // --- Connections ---
    /// A message was handed to a connection for relay.
    SendMessage {
        /// The connection instance carrying the message.
        connection: String,
        /// The destination network.
        target_network: String,
        /// The connection's own sequence number, unique per connection.
        conn_sn: u128,
        /// The router's view of the message: positive for a request expecting a
        /// result, zero for a one-way request, negative for a result.
        sn: i128,
        /// The encoded `CSMessage`.
        msg: Vec<u8>,
    },

    // --- Protocol registry ---
    /// The trusted protocol set was replaced.
    ProtocolsConfigured {
        /// New inbound protocols.
        sources: Vec<String>,
        /// New outbound protocols.
        destinations: Vec<String>,
    },
    /// A protocol was proposed for removal.
    RemovalProposed {
        /// The protocol to be removed.
        protocol: String,
    },

    // --- Asset vault ---
    /// Tokens were locked and a deposit message sent.
    Deposited {
        /// The denomination.
        token: String,
        /// The depositor.
        from: AccountId,
        /// The recipient on the remote network.
        to: String,
        /// Locked amount.
        amount: u128,
        /// Sequence number of the deposit call.
        sn: u128,
    },
    /// Tokens were released to a recipient by a remote withdrawal.
    Withdrawn {
        /// The denomination.
        token: String,
        /// The recipient.
        to: AccountId,
        /// Released amount.
        amount: u128,
    },
    /// A failed deposit was refunded.
    DepositReverted {
        /// The denomination.
        token: String,
        /// The refunded depositor.
        account: AccountId,
        /// Refunded amount.
        amount: u128,
    },
    /// A token's rate limit was (re)configured.
    RateLimitConfigured {
        /// The denomination.
        token: String,
        /// Recovery period in seconds.
        period: u64,
        /// Withdrawable share in basis points.
        percentage: u128,
    },

    // --- Balanced dollar ---
    /// Tokens were burned and a cross transfer sent to the hub.
    CrossTransferSent {
        /// The sender.
        from: AccountId,
        /// The recipient on the hub, as `"networkId/address"`.
        to: String,
        /// Burned amount.
        value: u128,
        /// Sequence number of the transfer call.
        sn: u128,
    },
    /// Tokens were minted for an inbound cross transfer.
    CrossTransferReceived {
        /// The hub sender, as `"networkId/address"`.
        from: String,
        /// The local recipient.
        to: AccountId,
        /// Minted amount.
        value: u128,
    },
    /// A failed cross transfer was minted back to its sender.
    CrossTransferReverted {
        /// The sender.
        account: AccountId,
        /// Re-minted amount.
        amount: u128,
    },
}
