// Path: crates/test_utils/src/lib.rs
#![cfg_attr(
    not(test),
    deny(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::unimplemented,
        clippy::todo,
        clippy::indexing_slicing
    )
)]

//! # xcall Test Utilities
//!
//! Assertion macros and fixtures shared by the workspace's integration tests.

pub mod assertions;
pub mod fixtures;

#[doc(hidden)]
pub use hex;
