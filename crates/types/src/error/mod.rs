// Path: crates/types/src/error/mod.rs
//! Core error types for the xcall workspace.
//!
//! Every module has its own enum; `TransactionError` is the umbrella returned by
//! service dispatch and converts from each of them.

use thiserror::Error;

/// A trait for assigning a stable, machine-readable string code to an error.
pub trait ErrorCode {
    /// Returns the unique, stable string identifier for this error variant.
    fn code(&self) -> &'static str;
}

/// Errors related to the state backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    /// The requested key was not found in the state.
    #[error("Key not found in state")]
    KeyNotFound,
    /// An error occurred in the state backend.
    #[error("State backend error: {0}")]
    Backend(String),
    /// The stored value was invalid.
    #[error("Invalid value: {0}")]
    InvalidValue(String),
    /// An error occurred during state deserialization.
    #[error("Decode error: {0}")]
    Decode(String),
}

impl ErrorCode for StateError {
    fn code(&self) -> &'static str {
        match self {
            Self::KeyNotFound => "STATE_KEY_NOT_FOUND",
            Self::Backend(_) => "STATE_BACKEND_ERROR",
            Self::InvalidValue(_) => "STATE_INVALID_VALUE",
            Self::Decode(_) => "STATE_DECODE_ERROR",
        }
    }
}

/// Errors raised by the RLP wire codec.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// The input was truncated or malformed.
    #[error("Decode failed: {0}")]
    DecodeFailed(String),
    /// A network address was not of the form `networkId/address`.
    #[error("Invalid network address: {0}")]
    InvalidNetworkAddress(String),
    /// A tagged payload named a method its receiver does not understand.
    #[error("Unknown method: {0}")]
    UnknownMethod(String),
}

impl ErrorCode for CodecError {
    fn code(&self) -> &'static str {
        match self {
            Self::DecodeFailed(_) => "CODEC_DECODE_FAILED",
            Self::InvalidNetworkAddress(_) => "CODEC_INVALID_NETWORK_ADDRESS",
            Self::UnknownMethod(_) => "CODEC_UNKNOWN_METHOD",
        }
    }
}

impl From<alloy_rlp::Error> for CodecError {
    fn from(e: alloy_rlp::Error) -> Self {
        CodecError::DecodeFailed(e.to_string())
    }
}

/// Errors raised by the call router.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum XCallError {
    /// The caller is not the router admin.
    #[error("Only the admin may perform this action")]
    OnlyAdmin,
    /// The application payload exceeds the size cap.
    #[error("Message data exceeds {max} bytes (got {got})")]
    MaxDataSizeExceeded {
        /// The cap.
        max: usize,
        /// The offending size.
        got: usize,
    },
    /// The rollback payload exceeds the size cap.
    #[error("Rollback data exceeds {max} bytes (got {got})")]
    MaxRollbackSizeExceeded {
        /// The cap.
        max: usize,
        /// The offending size.
        got: usize,
    },
    /// A rollback was requested with an empty rollback payload.
    #[error("Rollback data is empty")]
    NoRollbackData,
    /// No outbound call is awaiting a result under this sequence number.
    #[error("Invalid sequence number: {0}")]
    InvalidSn(u128),
    /// The rollback exists but no failure has been recorded yet.
    #[error("Rollback for sequence number {0} is not enabled")]
    RollbackNotEnabled(u128),
    /// The request id is zero or already in use.
    #[error("Invalid request id: {0}")]
    InvalidRequestId(u128),
    /// No proxy request exists under this id (never created or already consumed).
    #[error("Call request {0} not found")]
    CallRequestNotFound(u128),
    /// `executeCall` data does not match the stored request.
    #[error("Data does not match the stored request")]
    DataMismatch,
    /// The delivering connection is not one of the message's protocols.
    #[error("Connection '{0}' is not among the message protocols")]
    ProtocolMismatch(String),
    /// No protocol was given and none could be defaulted.
    #[error("No protocol specified")]
    ProtocolNotSpecified,
    /// A message claims to come from a network other than the one it arrived from.
    #[error("Invalid source network: {0}")]
    InvalidSource(String),
    /// The same protocol delivered a message whose quorum is still incomplete.
    #[error("Request is already pending on connection '{0}'")]
    RequestPending(String),
    /// Forced rollback was requested for a message without rollback semantics.
    #[error("Rollback is not possible for this request")]
    RollbackNotPossible,
    /// A reply embedded in a result did not come from the called network.
    #[error("Invalid reply received")]
    InvalidReplyReceived,
    /// The referenced connection sequence has no delivery receipt.
    #[error("No receipt for {network_id}/{conn_sn} on the given connection")]
    InvalidMessageSequence {
        /// The source network.
        network_id: String,
        /// The connection sequence number.
        conn_sn: u128,
    },
    /// The caller is not the application that owns the request.
    #[error("Only the destination application may perform this action")]
    OnlyApplication,
    /// A named connection is not registered on this chain.
    #[error("Unknown connection: {0}")]
    UnknownConnection(String),
    /// The destination application is not registered or cannot receive calls.
    #[error("Unknown application: {0}")]
    UnknownApplication(String),
    /// The router has not been initialized.
    #[error("Router is not initialized")]
    NotInitialized,
}

impl ErrorCode for XCallError {
    fn code(&self) -> &'static str {
        match self {
            Self::OnlyAdmin => "XCALL_ONLY_ADMIN",
            Self::MaxDataSizeExceeded { .. } => "XCALL_MAX_DATA_SIZE_EXCEEDED",
            Self::MaxRollbackSizeExceeded { .. } => "XCALL_MAX_ROLLBACK_SIZE_EXCEEDED",
            Self::NoRollbackData => "XCALL_NO_ROLLBACK_DATA",
            Self::InvalidSn(_) => "XCALL_INVALID_SN",
            Self::RollbackNotEnabled(_) => "XCALL_ROLLBACK_NOT_ENABLED",
            Self::InvalidRequestId(_) => "XCALL_INVALID_REQUEST_ID",
            Self::CallRequestNotFound(_) => "XCALL_CALL_REQUEST_NOT_FOUND",
            Self::DataMismatch => "XCALL_DATA_MISMATCH",
            Self::ProtocolMismatch(_) => "XCALL_PROTOCOL_MISMATCH",
            Self::ProtocolNotSpecified => "XCALL_PROTOCOL_NOT_SPECIFIED",
            Self::InvalidSource(_) => "XCALL_INVALID_SOURCE",
            Self::RequestPending(_) => "XCALL_REQUEST_PENDING",
            Self::RollbackNotPossible => "XCALL_ROLLBACK_NOT_POSSIBLE",
            Self::InvalidReplyReceived => "XCALL_INVALID_REPLY_RECEIVED",
            Self::InvalidMessageSequence { .. } => "XCALL_INVALID_MESSAGE_SEQUENCE",
            Self::OnlyApplication => "XCALL_ONLY_APPLICATION",
            Self::UnknownConnection(_) => "XCALL_UNKNOWN_CONNECTION",
            Self::UnknownApplication(_) => "XCALL_UNKNOWN_APPLICATION",
            Self::NotInitialized => "XCALL_NOT_INITIALIZED",
        }
    }
}

/// Errors raised by a connection.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectionError {
    /// The caller is not the connection admin.
    #[error("Only the connection admin may perform this action")]
    OnlyAdmin,
    /// The message was already delivered.
    #[error("Duplicate message {conn_sn} from {network_id}")]
    DuplicateMessage {
        /// The source network.
        network_id: String,
        /// The connection sequence number.
        conn_sn: u128,
    },
    /// The connection has not been initialized.
    #[error("Connection '{0}' is not initialized")]
    NotInitialized(String),
}

impl ErrorCode for ConnectionError {
    fn code(&self) -> &'static str {
        match self {
            Self::OnlyAdmin => "CONN_ONLY_ADMIN",
            Self::DuplicateMessage { .. } => "CONN_DUPLICATE_MESSAGE",
            Self::NotInitialized(_) => "CONN_NOT_INITIALIZED",
        }
    }
}

/// Errors raised by the protocol registry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// The caller is not the registry admin.
    #[error("Only the admin may perform this action")]
    OnlyAdmin,
    /// `sources` and `destinations` differ in length.
    #[error("Sources and destinations differ in length ({sources} vs {destinations})")]
    LengthMismatch {
        /// Number of sources.
        sources: usize,
        /// Number of destinations.
        destinations: usize,
    },
    /// A governance message came from an address other than the configured governance.
    #[error("Sender {0} is not the governance address")]
    InvalidSender(String),
    /// The delivered protocols do not match the trusted set.
    #[error("Protocols do not match the trusted set")]
    ProtocolMismatch,
    /// A governance command whose exact bytes were not whitelisted by the admin.
    #[error("Governance action is not whitelisted")]
    ActionNotWhitelisted,
    /// A governance message that did not arrive through the configured router.
    #[error("Only {0} may deliver governance messages")]
    OnlyXcall(String),
    /// The registry has not been initialized.
    #[error("Registry is not initialized")]
    NotInitialized,
}

impl ErrorCode for RegistryError {
    fn code(&self) -> &'static str {
        match self {
            Self::OnlyAdmin => "REGISTRY_ONLY_ADMIN",
            Self::LengthMismatch { .. } => "REGISTRY_LENGTH_MISMATCH",
            Self::InvalidSender(_) => "REGISTRY_INVALID_SENDER",
            Self::ProtocolMismatch => "REGISTRY_PROTOCOL_MISMATCH",
            Self::ActionNotWhitelisted => "REGISTRY_ACTION_NOT_WHITELISTED",
            Self::OnlyXcall(_) => "REGISTRY_ONLY_XCALL",
            Self::NotInitialized => "REGISTRY_NOT_INITIALIZED",
        }
    }
}

/// Errors raised by the asset vault.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VaultError {
    /// The caller is not the vault admin.
    #[error("Only the admin may perform this action")]
    OnlyAdmin,
    /// A rate-limit percentage above 100%.
    #[error("Percentage {0} exceeds 10000 basis points")]
    PercentageTooHigh(u128),
    /// The withdrawal exceeds the current limit.
    #[error("Withdrawal of {requested} exceeds the current limit of {available}")]
    RateLimitExceeded {
        /// The requested amount.
        requested: u128,
        /// The currently withdrawable amount.
        available: u128,
    },
    /// A message came from an address not allowed to send it.
    #[error("Sender {0} may not send this message")]
    InvalidSender(String),
    /// The delivered protocols do not match the registry's trusted set.
    #[error("Protocols do not match the trusted set")]
    ProtocolMismatch,
    /// A native withdrawal named a non-native token.
    #[error("Token {0} is not the native token")]
    NotNativeToken(String),
    /// Deposits and withdrawals must move a positive amount.
    #[error("Amount must be positive")]
    ZeroAmount,
    /// The vault has not been initialized.
    #[error("Vault is not initialized")]
    NotInitialized,
}

impl ErrorCode for VaultError {
    fn code(&self) -> &'static str {
        match self {
            Self::OnlyAdmin => "VAULT_ONLY_ADMIN",
            Self::PercentageTooHigh(_) => "VAULT_PERCENTAGE_TOO_HIGH",
            Self::RateLimitExceeded { .. } => "VAULT_RATE_LIMIT_EXCEEDED",
            Self::InvalidSender(_) => "VAULT_INVALID_SENDER",
            Self::ProtocolMismatch => "VAULT_PROTOCOL_MISMATCH",
            Self::NotNativeToken(_) => "VAULT_NOT_NATIVE_TOKEN",
            Self::ZeroAmount => "VAULT_ZERO_AMOUNT",
            Self::NotInitialized => "VAULT_NOT_INITIALIZED",
        }
    }
}

/// Errors raised by the bridged stablecoin.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BalancedDollarError {
    /// The caller is not the token admin.
    #[error("Only the admin may perform this action")]
    OnlyAdmin,
    /// A message came from an address not allowed to send it.
    #[error("Sender {0} may not send this message")]
    InvalidSender(String),
    /// The delivered protocols do not match the registry's trusted set.
    #[error("Protocols do not match the trusted set")]
    ProtocolMismatch,
    /// Transfers must move a positive amount.
    #[error("Amount must be positive")]
    ZeroAmount,
    /// The token has not been initialized.
    #[error("Balanced dollar is not initialized")]
    NotInitialized,
}

impl ErrorCode for BalancedDollarError {
    fn code(&self) -> &'static str {
        match self {
            Self::OnlyAdmin => "BNUSD_ONLY_ADMIN",
            Self::InvalidSender(_) => "BNUSD_INVALID_SENDER",
            Self::ProtocolMismatch => "BNUSD_PROTOCOL_MISMATCH",
            Self::ZeroAmount => "BNUSD_ZERO_AMOUNT",
            Self::NotInitialized => "BNUSD_NOT_INITIALIZED",
        }
    }
}

/// Errors raised by the token ledger.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BankError {
    /// The source account cannot cover the amount.
    #[error("Insufficient funds: {account} holds {balance} {denom}, needs {needed}")]
    InsufficientFunds {
        /// The debited account.
        account: String,
        /// The denomination.
        denom: String,
        /// The current balance.
        balance: u128,
        /// The requested amount.
        needed: u128,
    },
    /// The credit would overflow the destination balance.
    #[error("Balance overflow")]
    BalanceOverflow,
}

impl ErrorCode for BankError {
    fn code(&self) -> &'static str {
        match self {
            Self::InsufficientFunds { .. } => "BANK_INSUFFICIENT_FUNDS",
            Self::BalanceOverflow => "BANK_BALANCE_OVERFLOW",
        }
    }
}

/// The umbrella error returned by service dispatch.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransactionError {
    /// An error occurred during serialization.
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// An error occurred during deserialization.
    #[error("Deserialization error: {0}")]
    Deserialization(String),
    /// The transaction is invalid for a service-specific reason.
    #[error("Invalid transaction: {0}")]
    Invalid(String),
    /// The service or method does not exist.
    #[error("Unsupported: {0}")]
    Unsupported(String),
    /// An error originating from the state backend.
    #[error("State error: {0}")]
    State(#[from] StateError),
    /// An error originating from the wire codec.
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),
    /// An error originating from the call router.
    #[error("xcall error: {0}")]
    XCall(#[from] XCallError),
    /// An error originating from a connection.
    #[error("Connection error: {0}")]
    Connection(#[from] ConnectionError),
    /// An error originating from the protocol registry.
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),
    /// An error originating from the asset vault.
    #[error("Vault error: {0}")]
    Vault(#[from] VaultError),
    /// An error originating from the bridged stablecoin.
    #[error("Balanced dollar error: {0}")]
    BalancedDollar(#[from] BalancedDollarError),
    /// An error originating from the token ledger.
    #[error("Bank error: {0}")]
    Bank(#[from] BankError),
}

impl ErrorCode for TransactionError {
    fn code(&self) -> &'static str {
        match self {
            Self::Serialization(_) => "TX_SERIALIZATION_ERROR",
            Self::Deserialization(_) => "TX_DESERIALIZATION_ERROR",
            Self::Invalid(_) => "TX_INVALID",
            Self::Unsupported(_) => "TX_UNSUPPORTED",
            Self::State(e) => e.code(),
            Self::Codec(e) => e.code(),
            Self::XCall(e) => e.code(),
            Self::Connection(e) => e.code(),
            Self::Registry(e) => e.code(),
            Self::Vault(e) => e.code(),
            Self::BalancedDollar(e) => e.code(),
            Self::Bank(e) => e.code(),
        }
    }
}

impl From<String> for TransactionError {
    fn from(s: String) -> Self {
        TransactionError::Invalid(s)
    }
}

impl From<parity_scale_codec::Error> for TransactionError {
    fn from(e: parity_scale_codec::Error) -> Self {
        TransactionError::State(StateError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn module_errors_keep_their_code_through_the_umbrella() {
        let err: TransactionError = XCallError::CallRequestNotFound(3).into();
        assert_eq!(err.code(), "XCALL_CALL_REQUEST_NOT_FOUND");
        let err: TransactionError = ConnectionError::DuplicateMessage {
            network_id: "0x1.icon".into(),
            conn_sn: 9,
        }
        .into();
        assert_eq!(err.code(), "CONN_DUPLICATE_MESSAGE");
    }

    #[test]
    fn rlp_failures_become_decode_failed() {
        let err: CodecError = alloy_rlp::Error::InputTooShort.into();
        assert!(matches!(err, CodecError::DecodeFailed(_)));
    }
}
