// Path: crates/api/src/error/mod.rs
// Re-export all core error types from the central types crate.
pub use xcall_types::error::{
    BankError, CodecError, ConnectionError, ErrorCode, RegistryError, StateError,
    TransactionError, VaultError, XCallError,
};
pub use xcall_types::Result;
