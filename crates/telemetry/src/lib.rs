// Path: crates/telemetry/src/lib.rs
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

//! # xcall Telemetry
//!
//! Structured logging initialization. Services log through `log` and
//! `tracing` under the targets `xcall`, `connection`, `relayer` and
//! `execution`; this crate installs the subscriber that renders them.

/// The initialization routines for global structured logging.
pub mod init;

pub use init::{init_test_tracing, init_tracing};
