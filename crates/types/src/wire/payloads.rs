// Path: crates/types/src/wire/payloads.rs
//! Application payloads carried inside `CSMessageRequest::data`.
//!
//! Each payload is an RLP list whose first item is a method tag
//! (`["WithdrawTo", token, to, amount]`). The tag is matched once, here, into an
//! exhaustive enum; services never switch on strings.

use super::{
    encode_string_list, ensure_consumed, list_header, list_length, string_list_length,
    take_bytes, take_list, take_string_list,
};
use crate::error::CodecError;
use alloy_rlp::{BufMut, Decodable, Encodable};
use serde::{Deserialize, Serialize};

const DEPOSIT: &str = "Deposit";
const DEPOSIT_REVERT: &str = "DepositRevert";
const WITHDRAW_TO: &str = "WithdrawTo";
const WITHDRAW_NATIVE_TO: &str = "WithdrawNativeTo";
const CONFIGURE_PROTOCOLS: &str = "ConfigureProtocols";
const CROSS_TRANSFER: &str = "xCrossTransfer";
const CROSS_TRANSFER_REVERT: &str = "xCrossTransferRevert";

enum Field<'a> {
    Str(&'a str),
    Bytes(&'a [u8]),
    Amount(u128),
    Strings(&'a [String]),
}

impl Field<'_> {
    fn length(&self) -> usize {
        match self {
            Field::Str(s) => s.length(),
            Field::Bytes(b) => b.length(),
            Field::Amount(a) => a.length(),
            Field::Strings(items) => string_list_length(items),
        }
    }

    fn encode(&self, out: &mut dyn BufMut) {
        match self {
            Field::Str(s) => s.encode(out),
            Field::Bytes(b) => b.encode(out),
            Field::Amount(a) => a.encode(out),
            Field::Strings(items) => encode_string_list(items, out),
        }
    }
}

fn encode_fields(fields: &[Field<'_>]) -> Vec<u8> {
    let payload_length = fields.iter().map(Field::length).sum();
    let mut out = Vec::with_capacity(list_length(payload_length));
    list_header(payload_length).encode(&mut out);
    for field in fields {
        field.encode(&mut out);
    }
    out
}

/// Splits a tagged payload into its method tag and remaining fields.
fn split_method(bytes: &[u8]) -> Result<(String, &[u8]), CodecError> {
    let mut buf = bytes;
    let payload = take_list(&mut buf)?;
    if !buf.is_empty() {
        return Err(CodecError::DecodeFailed("trailing bytes after payload".into()));
    }
    let mut fields = payload;
    let method = String::decode(&mut fields)?;
    Ok((method, fields))
}

/// Messages understood by the asset vault.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub enum VaultMessage {
    /// Tokens were locked on the sending network for `to` on the receiving network.
    Deposit {
        /// The denomination.
        token: String,
        /// The depositor, as `"networkId/address"`.
        from: String,
        /// The recipient on the receiving network.
        to: String,
        /// The locked amount.
        amount: u128,
        /// Opaque data for the receiving application.
        data: Vec<u8>,
    },
    /// Refund a deposit whose call failed on the remote network.
    DepositRevert {
        /// The denomination.
        token: String,
        /// The depositor to refund.
        account: String,
        /// The refunded amount.
        amount: u128,
    },
    /// Release tokens held by the vault to `to`.
    WithdrawTo {
        /// The denomination.
        token: String,
        /// The local recipient.
        to: String,
        /// The released amount.
        amount: u128,
    },
    /// Release native currency held by the vault to `to`.
    WithdrawNativeTo {
        /// The native denomination.
        token: String,
        /// The local recipient.
        to: String,
        /// The released amount.
        amount: u128,
    },
}

impl VaultMessage {
    /// Encodes the message as a tagged RLP list.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Self::Deposit {
                token,
                from,
                to,
                amount,
                data,
            } => encode_fields(&[
                Field::Str(DEPOSIT),
                Field::Str(token),
                Field::Str(from),
                Field::Str(to),
                Field::Amount(*amount),
                Field::Bytes(data),
            ]),
            Self::DepositRevert {
                token,
                account,
                amount,
            } => encode_fields(&[
                Field::Str(DEPOSIT_REVERT),
                Field::Str(token),
                Field::Str(account),
                Field::Amount(*amount),
            ]),
            Self::WithdrawTo { token, to, amount } => encode_fields(&[
                Field::Str(WITHDRAW_TO),
                Field::Str(token),
                Field::Str(to),
                Field::Amount(*amount),
            ]),
            Self::WithdrawNativeTo { token, to, amount } => encode_fields(&[
                Field::Str(WITHDRAW_NATIVE_TO),
                Field::Str(token),
                Field::Str(to),
                Field::Amount(*amount),
            ]),
        }
    }

    /// Decodes a tagged RLP list. Unknown tags fail with `UnknownMethod`.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CodecError> {
        let (method, mut fields) = split_method(bytes)?;
        let message = match method.as_str() {
            DEPOSIT => Self::Deposit {
                token: String::decode(&mut fields)?,
                from: String::decode(&mut fields)?,
                to: String::decode(&mut fields)?,
                amount: u128::decode(&mut fields)?,
                data: take_bytes(&mut fields)?,
            },
            DEPOSIT_REVERT => Self::DepositRevert {
                token: String::decode(&mut fields)?,
                account: String::decode(&mut fields)?,
                amount: u128::decode(&mut fields)?,
            },
            WITHDRAW_TO => Self::WithdrawTo {
                token: String::decode(&mut fields)?,
                to: String::decode(&mut fields)?,
                amount: u128::decode(&mut fields)?,
            },
            WITHDRAW_NATIVE_TO => Self::WithdrawNativeTo {
                token: String::decode(&mut fields)?,
                to: String::decode(&mut fields)?,
                amount: u128::decode(&mut fields)?,
            },
            _ => return Err(CodecError::UnknownMethod(method)),
        };
        ensure_consumed(fields)?;
        Ok(message)
    }
}

/// Messages understood by the bridged stablecoin.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub enum TransferMessage {
    /// `value` was burned on the sending network for `to` on the receiving one.
    CrossTransfer {
        /// The sender, as `"networkId/address"`.
        from: String,
        /// The recipient, as `"networkId/address"` or a bare local account.
        to: String,
        /// The transferred amount.
        value: u128,
        /// Opaque data for the receiving application.
        data: Vec<u8>,
    },
    /// Re-mint a transfer whose call failed on the remote network.
    CrossTransferRevert {
        /// The sender to re-mint to.
        account: String,
        /// The re-minted amount.
        amount: u128,
    },
}

impl TransferMessage {
    /// Encodes the message as a tagged RLP list.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Self::CrossTransfer {
                from,
                to,
                value,
                data,
            } => encode_fields(&[
                Field::Str(CROSS_TRANSFER),
                Field::Str(from),
                Field::Str(to),
                Field::Amount(*value),
                Field::Bytes(data),
            ]),
            Self::CrossTransferRevert { account, amount } => encode_fields(&[
                Field::Str(CROSS_TRANSFER_REVERT),
                Field::Str(account),
                Field::Amount(*amount),
            ]),
        }
    }

    /// Decodes a tagged RLP list. Unknown tags fail with `UnknownMethod`.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CodecError> {
        let (method, mut fields) = split_method(bytes)?;
        let message = match method.as_str() {
            CROSS_TRANSFER => Self::CrossTransfer {
                from: String::decode(&mut fields)?,
                to: String::decode(&mut fields)?,
                value: u128::decode(&mut fields)?,
                data: take_bytes(&mut fields)?,
            },
            CROSS_TRANSFER_REVERT => Self::CrossTransferRevert {
                account: String::decode(&mut fields)?,
                amount: u128::decode(&mut fields)?,
            },
            _ => return Err(CodecError::UnknownMethod(method)),
        };
        ensure_consumed(fields)?;
        Ok(message)
    }
}

/// Commands the governance network may send to a protocol registry.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub enum GovernanceCommand {
    /// Replace the trusted protocol set.
    ConfigureProtocols {
        /// New inbound protocols.
        sources: Vec<String>,
        /// New outbound protocols.
        destinations: Vec<String>,
    },
}

impl GovernanceCommand {
    /// Encodes the command as a tagged RLP list.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Self::ConfigureProtocols {
                sources,
                destinations,
            } => encode_fields(&[
                Field::Str(CONFIGURE_PROTOCOLS),
                Field::Strings(sources),
                Field::Strings(destinations),
            ]),
        }
    }

    /// Decodes a tagged RLP list. Unknown tags fail with `UnknownMethod`.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CodecError> {
        let (method, mut fields) = split_method(bytes)?;
        let command = match method.as_str() {
            CONFIGURE_PROTOCOLS => Self::ConfigureProtocols {
                sources: take_string_list(&mut fields)?,
                destinations: take_string_list(&mut fields)?,
            },
            _ => return Err(CodecError::UnknownMethod(method)),
        };
        ensure_consumed(fields)?;
        Ok(command)
    }
}
