// Path: crates/types/src/wire/mod.rs
//! The RLP wire format for cross-chain messages.
//!
//! Everything a connection relays is an RLP-encoded [`CSMessage`]: a list of
//! `[kind, payload]` where `payload` is itself the RLP encoding of a
//! [`CSMessageRequest`] or a [`CSMessageResult`]. No schema is embedded; both
//! ends agree on field order. Decoding never panics and rejects trailing bytes,
//! so a relayed message is either accepted exactly or refused with
//! [`CodecError::DecodeFailed`].
//!
//! Numeric tags follow the protocol's published constants:
//!
//! | type | variant | tag |
//! |---|---|---|
//! | `CSMessageType` | `Request` / `Result` | `1` / `2` |
//! | `MessageType` | `CallMessage` / `CallMessageWithRollback` / `CallMessagePersisted` | `0` / `1` / `2` |
//! | `CSResponseType` | `Failure` / `Success` | `0` / `1` |

mod envelope;
mod payloads;

pub use envelope::{AnyMessage, Envelope};
pub use payloads::{GovernanceCommand, TransferMessage, VaultMessage};

use crate::app::NetworkAddress;
use crate::error::CodecError;
use alloy_rlp::{BufMut, Decodable, Encodable, Header};
use serde::{Deserialize, Serialize};

/// Encodes any RLP value into a fresh buffer.
pub fn encode<T: Encodable + ?Sized>(value: &T) -> Vec<u8> {
    let mut out = Vec::with_capacity(value.length());
    value.encode(&mut out);
    out
}

/// Decodes a complete RLP value, rejecting trailing bytes.
pub fn decode<T: Decodable>(bytes: &[u8]) -> Result<T, CodecError> {
    let mut buf = bytes;
    let value = T::decode(&mut buf)?;
    if !buf.is_empty() {
        return Err(CodecError::DecodeFailed(format!(
            "{} trailing bytes after message",
            buf.len()
        )));
    }
    Ok(value)
}

// --- RLP primitives shared by the message and payload codecs ---

pub(crate) fn list_header(payload_length: usize) -> Header {
    Header {
        list: true,
        payload_length,
    }
}

pub(crate) fn list_length(payload_length: usize) -> usize {
    list_header(payload_length).length() + payload_length
}

fn take<'a>(buf: &mut &'a [u8], len: usize) -> alloy_rlp::Result<&'a [u8]> {
    let data: &'a [u8] = *buf;
    match (data.get(..len), data.get(len..)) {
        (Some(head), Some(rest)) => {
            *buf = rest;
            Ok(head)
        }
        _ => Err(alloy_rlp::Error::InputTooShort),
    }
}

/// Consumes a list header and returns its payload.
pub(crate) fn take_list<'a>(buf: &mut &'a [u8]) -> alloy_rlp::Result<&'a [u8]> {
    let header = Header::decode(buf)?;
    if !header.list {
        return Err(alloy_rlp::Error::UnexpectedString);
    }
    take(buf, header.payload_length)
}

/// Consumes a byte string.
pub(crate) fn take_bytes(buf: &mut &[u8]) -> alloy_rlp::Result<Vec<u8>> {
    let header = Header::decode(buf)?;
    if header.list {
        return Err(alloy_rlp::Error::UnexpectedList);
    }
    take(buf, header.payload_length).map(<[u8]>::to_vec)
}

pub(crate) fn string_list_length(items: &[String]) -> usize {
    list_length(items.iter().map(|s| s.as_str().length()).sum())
}

pub(crate) fn encode_string_list(items: &[String], out: &mut dyn BufMut) {
    list_header(items.iter().map(|s| s.as_str().length()).sum()).encode(out);
    for item in items {
        item.as_str().encode(out);
    }
}

pub(crate) fn take_string_list(buf: &mut &[u8]) -> alloy_rlp::Result<Vec<String>> {
    let mut payload = take_list(buf)?;
    let mut items = Vec::new();
    while !payload.is_empty() {
        items.push(String::decode(&mut payload)?);
    }
    Ok(items)
}

pub(crate) fn ensure_consumed(payload: &[u8]) -> alloy_rlp::Result<()> {
    if payload.is_empty() {
        Ok(())
    } else {
        Err(alloy_rlp::Error::Custom("unexpected trailing list items"))
    }
}

// --- Message kinds ---

/// The kind of payload carried by a [`CSMessage`].
#[derive(
    Serialize,
    Deserialize,
    parity_scale_codec::Encode,
    parity_scale_codec::Decode,
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
)]
pub enum CSMessageType {
    /// The payload is a [`CSMessageRequest`].
    Request,
    /// The payload is a [`CSMessageResult`].
    Result,
}

impl CSMessageType {
    fn tag(self) -> u8 {
        match self {
            Self::Request => 1,
            Self::Result => 2,
        }
    }

    fn from_tag(tag: u8) -> alloy_rlp::Result<Self> {
        match tag {
            1 => Ok(Self::Request),
            2 => Ok(Self::Result),
            _ => Err(alloy_rlp::Error::Custom("unknown message kind")),
        }
    }
}

/// Delivery semantics requested by the sender of a call.
#[derive(
    Serialize,
    Deserialize,
    parity_scale_codec::Encode,
    parity_scale_codec::Decode,
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
)]
pub enum MessageType {
    /// Fire and forget; the outcome is only reported as an event.
    CallMessage,
    /// The destination reports the outcome; a failure triggers the sender's rollback.
    CallMessageWithRollback,
    /// The destination must execute successfully; a failing execution is retried.
    CallMessagePersisted,
}

impl MessageType {
    fn tag(self) -> u8 {
        match self {
            Self::CallMessage => 0,
            Self::CallMessageWithRollback => 1,
            Self::CallMessagePersisted => 2,
        }
    }

    fn from_tag(tag: u8) -> alloy_rlp::Result<Self> {
        match tag {
            0 => Ok(Self::CallMessage),
            1 => Ok(Self::CallMessageWithRollback),
            2 => Ok(Self::CallMessagePersisted),
            _ => Err(alloy_rlp::Error::Custom("unknown call message type")),
        }
    }
}

/// Outcome reported by a [`CSMessageResult`].
#[derive(
    Serialize,
    Deserialize,
    parity_scale_codec::Encode,
    parity_scale_codec::Decode,
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
)]
pub enum CSResponseType {
    /// The destination application failed; the sender may roll back.
    Failure,
    /// The destination application succeeded.
    Success,
}

impl CSResponseType {
    /// The numeric code used on the wire and in `CallExecuted` events.
    pub fn code(self) -> u8 {
        match self {
            Self::Failure => 0,
            Self::Success => 1,
        }
    }

    fn from_tag(tag: u8) -> alloy_rlp::Result<Self> {
        match tag {
            0 => Ok(Self::Failure),
            1 => Ok(Self::Success),
            _ => Err(alloy_rlp::Error::Custom("unknown response code")),
        }
    }
}

// --- CSMessage ---

/// The outer envelope every connection relays.
#[derive(
    Serialize,
    Deserialize,
    parity_scale_codec::Encode,
    parity_scale_codec::Decode,
    Debug,
    Clone,
    PartialEq,
    Eq,
)]
pub struct CSMessage {
    /// What `payload` contains.
    pub message_type: CSMessageType,
    /// The RLP encoding of the inner message.
    pub payload: Vec<u8>,
}

/// A fully decoded [`CSMessage`].
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub enum DecodedMessage {
    /// A call request.
    Request(CSMessageRequest),
    /// A call result.
    Result(CSMessageResult),
}

impl CSMessage {
    /// Wraps a request.
    pub fn request(request: &CSMessageRequest) -> Self {
        Self {
            message_type: CSMessageType::Request,
            payload: encode(request),
        }
    }

    /// Wraps a result.
    pub fn result(result: &CSMessageResult) -> Self {
        Self {
            message_type: CSMessageType::Result,
            payload: encode(result),
        }
    }

    /// Encodes the envelope for relay.
    pub fn to_bytes(&self) -> Vec<u8> {
        encode(self)
    }

    /// Decodes a relayed envelope.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CodecError> {
        decode(bytes)
    }

    /// Decodes the inner message according to `message_type`.
    pub fn decode_payload(&self) -> Result<DecodedMessage, CodecError> {
        match self.message_type {
            CSMessageType::Request => decode(&self.payload).map(DecodedMessage::Request),
            CSMessageType::Result => decode(&self.payload).map(DecodedMessage::Result),
        }
    }

    fn payload_length(&self) -> usize {
        self.message_type.tag().length() + self.payload.as_slice().length()
    }
}

impl Encodable for CSMessage {
    fn encode(&self, out: &mut dyn BufMut) {
        list_header(self.payload_length()).encode(out);
        self.message_type.tag().encode(out);
        self.payload.as_slice().encode(out);
    }

    fn length(&self) -> usize {
        list_length(self.payload_length())
    }
}

impl Decodable for CSMessage {
    fn decode(buf: &mut &[u8]) -> alloy_rlp::Result<Self> {
        let mut payload = take_list(buf)?;
        let message_type = CSMessageType::from_tag(u8::decode(&mut payload)?)?;
        let inner = take_bytes(&mut payload)?;
        ensure_consumed(payload)?;
        Ok(Self {
            message_type,
            payload: inner,
        })
    }
}

// --- CSMessageRequest ---

/// A call from an application on one network to an application on another.
#[derive(
    Serialize,
    Deserialize,
    parity_scale_codec::Encode,
    parity_scale_codec::Decode,
    Debug,
    Clone,
    PartialEq,
    Eq,
)]
pub struct CSMessageRequest {
    /// The sending application, qualified by its network.
    pub from: NetworkAddress,
    /// The destination application, interpreted by the destination network.
    pub to: String,
    /// The sender's outbound sequence number.
    pub sequence_no: u128,
    /// Delivery semantics.
    pub msg_type: MessageType,
    /// Opaque application payload.
    pub data: Vec<u8>,
    /// Destination-side connections that must each deliver this request.
    pub protocols: Vec<String>,
}

impl CSMessageRequest {
    fn payload_length(&self) -> usize {
        self.from.to_string().as_str().length()
            + self.to.as_str().length()
            + self.sequence_no.length()
            + self.msg_type.tag().length()
            + self.data.as_slice().length()
            + string_list_length(&self.protocols)
    }
}

impl Encodable for CSMessageRequest {
    fn encode(&self, out: &mut dyn BufMut) {
        list_header(self.payload_length()).encode(out);
        self.from.to_string().as_str().encode(out);
        self.to.as_str().encode(out);
        self.sequence_no.encode(out);
        self.msg_type.tag().encode(out);
        self.data.as_slice().encode(out);
        encode_string_list(&self.protocols, out);
    }

    fn length(&self) -> usize {
        list_length(self.payload_length())
    }
}

impl Decodable for CSMessageRequest {
    fn decode(buf: &mut &[u8]) -> alloy_rlp::Result<Self> {
        let mut payload = take_list(buf)?;
        let from = String::decode(&mut payload)?
            .parse::<NetworkAddress>()
            .map_err(|_| alloy_rlp::Error::Custom("invalid network address"))?;
        let to = String::decode(&mut payload)?;
        let sequence_no = u128::decode(&mut payload)?;
        let msg_type = MessageType::from_tag(u8::decode(&mut payload)?)?;
        let data = take_bytes(&mut payload)?;
        let protocols = take_string_list(&mut payload)?;
        ensure_consumed(payload)?;
        Ok(Self {
            from,
            to,
            sequence_no,
            msg_type,
            data,
            protocols,
        })
    }
}

// --- CSMessageResult ---

/// The outcome of a rollback-enabled request, sent back to its origin.
#[derive(
    Serialize,
    Deserialize,
    parity_scale_codec::Encode,
    parity_scale_codec::Decode,
    Debug,
    Clone,
    PartialEq,
    Eq,
)]
pub struct CSMessageResult {
    /// The origin's sequence number of the request.
    pub sequence_no: u128,
    /// Success or failure of the destination application.
    pub response_code: CSResponseType,
    /// On success, optionally an encoded [`CSMessageRequest`] replying to the origin.
    pub message: Vec<u8>,
}

impl CSMessageResult {
    fn payload_length(&self) -> usize {
        self.sequence_no.length()
            + self.response_code.code().length()
            + self.message.as_slice().length()
    }
}

impl Encodable for CSMessageResult {
    fn encode(&self, out: &mut dyn BufMut) {
        list_header(self.payload_length()).encode(out);
        self.sequence_no.encode(out);
        self.response_code.code().encode(out);
        self.message.as_slice().encode(out);
    }

    fn length(&self) -> usize {
        list_length(self.payload_length())
    }
}

impl Decodable for CSMessageResult {
    fn decode(buf: &mut &[u8]) -> alloy_rlp::Result<Self> {
        let mut payload = take_list(buf)?;
        let sequence_no = u128::decode(&mut payload)?;
        let response_code = CSResponseType::from_tag(u8::decode(&mut payload)?)?;
        let message = take_bytes(&mut payload)?;
        ensure_consumed(payload)?;
        Ok(Self {
            sequence_no,
            response_code,
            message,
        })
    }
}
