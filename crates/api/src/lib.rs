// Path: crates/api/src/lib.rs

//! # xcall API Crate Lints
//!
//! This crate enforces a strict set of lints to ensure high-quality,
//! panic-free, and well-documented code. Panics are disallowed in non-test
//! code to promote robust error handling.
#![cfg_attr(
    not(test),
    deny(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::todo,
        clippy::unimplemented,
        clippy::indexing_slicing
    )
)]
#![deny(missing_docs)]
//! # xcall API
//!
//! The stable contract between the host that executes transactions and the
//! services that implement the protocol: state access, service dispatch, the
//! cross-service capability traits and the per-transaction context.

/// Re-exports all core error types from the central `xcall-types` crate.
pub mod error;
/// Traits for pluggable services and the capability interfaces they expose to each other.
pub mod services;
/// Core traits for state access and the copy-on-write overlay.
pub mod state;
/// The per-transaction execution context.
pub mod transaction;

/// A curated set of the most commonly used traits and types.
pub mod prelude {
    pub use crate::error::{ErrorCode, StateError, TransactionError};
    pub use crate::services::access::ServiceDirectory;
    pub use crate::services::{BlockchainService, CallServiceReceiver, CrossChainConnection};
    pub use crate::state::{StateAccess, StateAccessExt, StateOverlay};
    pub use crate::transaction::context::TxContext;
}
