// Path: crates/types/src/app/mod.rs
//! Application-level data structures shared by every xcall service.

/// Configuration of the bridged stablecoin.
pub mod balanced_dollar;
/// Per-instance bookkeeping of a connection (relay pathway).
pub mod connection;
/// Events emitted by services and recorded by the host.
pub mod events;
/// State of the protocol-governance registry.
pub mod registry;
/// State of the rate-limited asset vault.
pub mod vault;
/// Durable records of the call router state machine.
pub mod xcall;

pub use balanced_dollar::*;
pub use connection::*;
pub use events::*;
pub use registry::*;
pub use vault::*;
pub use xcall::*;

use crate::error::CodecError;
use parity_scale_codec::{Decode, Encode};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A chain-local account identifier.
///
/// Services and users share one namespace: a service's account is its service id
/// (`"xcall"`, `"asset_manager"`, a connection id), which is also the `to` of any
/// cross-chain request addressed to it.
#[derive(
    Serialize, Deserialize, Encode, Decode, Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
#[serde(transparent)]
pub struct AccountId(pub String);

impl AccountId {
    /// Creates an account id from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the account id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<[u8]> for AccountId {
    fn as_ref(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AccountId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for AccountId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A globally unique address: an account qualified by the network it lives on.
///
/// The canonical text form is `"networkId/address"`; that form is what travels
/// on the wire and what applications compare against their configured peers.
#[derive(Serialize, Deserialize, Encode, Decode, Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct NetworkAddress {
    network_id: String,
    account: String,
}

impl NetworkAddress {
    /// Creates a network address from its two components.
    pub fn new(network_id: impl Into<String>, account: impl Into<String>) -> Self {
        Self {
            network_id: network_id.into(),
            account: account.into(),
        }
    }

    /// The network component.
    pub fn network_id(&self) -> &str {
        &self.network_id
    }

    /// The account component, interpreted by the destination network.
    pub fn account(&self) -> &str {
        &self.account
    }

    /// The account component as a local `AccountId`.
    pub fn account_id(&self) -> AccountId {
        AccountId::new(self.account.clone())
    }
}

impl fmt::Display for NetworkAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network_id, self.account)
    }
}

impl FromStr for NetworkAddress {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('/') {
            Some((nid, account)) if !nid.is_empty() && !account.is_empty() => {
                Ok(Self::new(nid, account))
            }
            _ => Err(CodecError::InvalidNetworkAddress(s.to_string())),
        }
    }
}

impl TryFrom<String> for NetworkAddress {
    type Error = CodecError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<NetworkAddress> for String {
    fn from(addr: NetworkAddress) -> Self {
        addr.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn network_address_splits_on_first_slash() {
        let addr: NetworkAddress = "0x1.icon/cx/with/slashes".parse().unwrap();
        assert_eq!(addr.network_id(), "0x1.icon");
        assert_eq!(addr.account(), "cx/with/slashes");
        assert_eq!(addr.to_string(), "0x1.icon/cx/with/slashes");
    }

    #[test]
    fn network_address_rejects_missing_parts() {
        for bad in ["", "0x1.icon", "/cx", "0x1.icon/"] {
            assert!(bad.parse::<NetworkAddress>().is_err(), "{bad:?} should not parse");
        }
    }

    #[test]
    fn network_address_deserializes_from_text() {
        let addr: NetworkAddress = serde_json::from_str("\"0x2.sol/asset_manager\"").unwrap();
        assert_eq!(addr, NetworkAddress::new("0x2.sol", "asset_manager"));
        assert!(serde_json::from_str::<NetworkAddress>("\"no-slash\"").is_err());
    }
}
