// Path: crates/execution/src/lib.rs
//! # xcall Execution Crate Lints
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
        clippy::unimplemented,
        clippy::todo,
        clippy::indexing_slicing
    )
)]
//! # xcall Execution
//!
//! A single-network host for xcall services. [`Chain`] owns the state and
//! the service directory, runs each submitted call against a copy-on-write
//! overlay, and commits the call's writes and events only if it succeeds.

pub mod chain;
pub mod error;

pub use chain::{Chain, CommittedEvent, TxReceipt};
pub use error::ExecutionError;
