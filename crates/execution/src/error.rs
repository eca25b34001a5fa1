// Path: crates/execution/src/error.rs
use thiserror::Error;
use xcall_types::error::{ErrorCode, StateError, TransactionError};

/// Errors returned by [`crate::Chain`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExecutionError {
    /// No service is registered under the id.
    #[error("Unknown service: {0}")]
    UnknownService(String),
    /// Parameters could not be encoded.
    #[error("Parameter encoding failed: {0}")]
    Encoding(String),
    /// The call itself failed; nothing was committed.
    #[error("Transaction failed: {0}")]
    Transaction(#[from] TransactionError),
    /// Committing the call's writes failed.
    #[error("State error: {0}")]
    State(#[from] StateError),
}

impl ExecutionError {
    /// The transaction error, if the call itself failed.
    pub fn as_transaction(&self) -> Option<&TransactionError> {
        match self {
            Self::Transaction(e) => Some(e),
            _ => None,
        }
    }
}

impl ErrorCode for ExecutionError {
    fn code(&self) -> &'static str {
        match self {
            Self::UnknownService(_) => "EXEC_UNKNOWN_SERVICE",
            Self::Encoding(_) => "EXEC_ENCODING_ERROR",
            Self::Transaction(e) => e.code(),
            Self::State(e) => e.code(),
        }
    }
}
