// Path: crates/types/src/codec.rs

//! Canonical binary codec for chain-local state.
//!
//! Every record a service writes through `StateAccess` (router config, rollback
//! records, proxy requests, balances, rate-limit state) is SCALE-encoded with
//! these helpers. Cross-chain payloads use the RLP codec in [`crate::wire`]
//! instead; SCALE never leaves the chain.

use parity_scale_codec::{Decode, DecodeAll, Encode};

/// Encodes a value into its canonical SCALE byte representation.
pub fn to_bytes_canonical<T: Encode>(v: &T) -> Result<Vec<u8>, String> {
    Ok(v.encode())
}

/// Decodes a value from its canonical SCALE byte representation.
///
/// Trailing bytes are rejected, so a stored record can only decode into the
/// exact type that wrote it.
pub fn from_bytes_canonical<T: Decode>(b: &[u8]) -> Result<T, String> {
    T::decode_all(&mut &*b).map_err(|e| format!("canonical decode failed: {}", e))
}
