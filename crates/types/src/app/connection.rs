// Path: crates/types/src/app/connection.rs
use crate::app::AccountId;
use parity_scale_codec::{Decode, Encode};
use serde::{Deserialize, Serialize};

/// Administrative state of a single connection instance.
#[derive(Serialize, Deserialize, Encode, Decode, Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// The relayer/admin account: the only one allowed to deliver messages,
    /// revert messages, change fees and claim accumulated fees.
    pub admin: AccountId,
}

/// Fees a connection charges for messages to one remote network.
#[derive(Serialize, Deserialize, Encode, Decode, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NetworkFee {
    /// Charged for every request message.
    pub message_fee: u128,
    /// Charged for every result message.
    pub response_fee: u128,
}

impl NetworkFee {
    /// The fee for one message, depending on whether it carries a result.
    pub fn for_message(&self, is_response: bool) -> u128 {
        if is_response {
            self.response_fee
        } else {
            self.message_fee
        }
    }
}
