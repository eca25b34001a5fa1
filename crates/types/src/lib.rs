// Path: crates/types/src/lib.rs
#![forbid(unsafe_code)]
#![deny(missing_docs)]

//! # xcall Types
//!
//! The foundational library of the xcall workspace: the protocol data model,
//! the RLP wire codec for cross-chain messages, the SCALE codec for chain-local
//! state, error enums and genesis configuration.
//!
//! ## Architectural Role
//!
//! As the base crate, `xcall-types` has minimal dependencies and is a
//! dependency of every other crate in the workspace. Everything that crosses a
//! crate boundary (`AccountId`, `NetworkAddress`, `CSMessage`, `Event`, the
//! error enums) is defined here exactly once.

/// Application-level data structures: accounts, network addresses, records and events.
pub mod app;
/// The canonical, deterministic binary codec for chain-local state.
pub mod codec;
/// Genesis configuration for a single network.
pub mod config;
/// A unified set of all error types used across the workspace.
pub mod error;
/// Constants and builders for well-known state keys.
pub mod keys;
/// Service metadata shared between the host and services.
pub mod service_configs;
/// The RLP wire format for cross-chain messages and application payloads.
pub mod wire;

/// The native denomination held by the token ledger.
pub const NATIVE_DENOM: &str = "native";

/// A top-level, crate-wide `Result` type alias with a default error type.
pub type Result<T, E = crate::error::TransactionError> = std::result::Result<T, E>;
