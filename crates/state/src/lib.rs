// Path: crates/state/src/lib.rs
//! # xcall State Crate Lints
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
        clippy::indexing_slicing
    )
)]
//! # xcall State
//!
//! State backends implementing `xcall_api::state::StateAccess`.

pub mod memory;

/// A prelude for easily importing the most common types.
pub mod prelude {
    pub use crate::memory::MemoryState;
}
