// Path: crates/types/src/wire/envelope.rs
use super::MessageType;
use parity_scale_codec::{Decode, Encode};
use serde::{Deserialize, Serialize};

/// The message an application hands to the router.
#[derive(Serialize, Deserialize, Encode, Decode, Debug, Clone, PartialEq, Eq)]
pub enum AnyMessage {
    /// One-way call.
    CallMessage {
        /// Application payload.
        data: Vec<u8>,
    },
    /// Call whose failure hands `rollback` back to the sender.
    CallMessageWithRollback {
        /// Application payload.
        data: Vec<u8>,
        /// Payload delivered to the sender if the call fails remotely.
        rollback: Vec<u8>,
    },
    /// Call the destination must execute successfully.
    CallMessagePersisted {
        /// Application payload.
        data: Vec<u8>,
    },
}

/// An application's outbound call: the message plus the protocols to use.
#[derive(Serialize, Deserialize, Encode, Decode, Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    /// The message to deliver.
    pub message: AnyMessage,
    /// Local connections to send through. Empty selects the default connection
    /// for the destination network.
    pub sources: Vec<String>,
    /// Destination-side connections that must each deliver the request.
    pub destinations: Vec<String>,
}

impl Envelope {
    /// Builds an envelope.
    pub fn new(message: AnyMessage, sources: Vec<String>, destinations: Vec<String>) -> Self {
        Self {
            message,
            sources,
            destinations,
        }
    }

    /// The delivery semantics of the wrapped message.
    pub fn message_type(&self) -> MessageType {
        match self.message {
            AnyMessage::CallMessage { .. } => MessageType::CallMessage,
            AnyMessage::CallMessageWithRollback { .. } => MessageType::CallMessageWithRollback,
            AnyMessage::CallMessagePersisted { .. } => MessageType::CallMessagePersisted,
        }
    }

    /// The application payload.
    pub fn data(&self) -> &[u8] {
        match &self.message {
            AnyMessage::CallMessage { data }
            | AnyMessage::CallMessageWithRollback { data, .. }
            | AnyMessage::CallMessagePersisted { data } => data,
        }
    }

    /// The rollback payload, if the message requests rollback semantics.
    pub fn rollback(&self) -> Option<&[u8]> {
        match &self.message {
            AnyMessage::CallMessageWithRollback { rollback, .. } => Some(rollback),
            _ => None,
        }
    }
}
