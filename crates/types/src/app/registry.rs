// Path: crates/types/src/app/registry.rs
use crate::app::{AccountId, NetworkAddress};
use parity_scale_codec::{Decode, Encode};
use serde::{Deserialize, Serialize};

/// Two-step removal of a protocol from the trusted set.
#[derive(Serialize, Deserialize, Encode, Decode, Debug, Clone, Default, PartialEq, Eq)]
pub enum RemovalState {
    /// No removal is in progress.
    #[default]
    None,
    /// The admin proposed dropping this protocol; `sources` is untouched until
    /// a later `setProtocols` (local or via governance) applies the change.
    Proposed(String),
}

/// The governance-controlled set of connections an application trusts.
#[derive(Serialize, Deserialize, Encode, Decode, Debug, Clone, PartialEq, Eq)]
pub struct ProtocolSet {
    /// Account allowed to change the set locally.
    pub admin: AccountId,
    /// The local call router.
    pub xcall: AccountId,
    /// The only remote address allowed to send governance commands.
    pub governance: NetworkAddress,
    /// Connections inbound messages must have been delivered through.
    pub sources: Vec<String>,
    /// Connections outbound messages must be received through on the remote side.
    pub destinations: Vec<String>,
    /// Pending removal proposal.
    pub removal: RemovalState,
}
