// Path: crates/api/src/transaction/mod.rs
//! Transaction-scoped execution types.

pub mod context;
