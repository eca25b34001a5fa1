// Path: crates/api/src/state/mod.rs
//! Core traits for state management.
//!
//! - `StateAccess`: the dyn-safe key-value interface every service writes through.
//! - `StateAccessExt`: typed reads and writes on top of it, using the canonical codec.
//! - `StateOverlay`: a copy-on-write layer used to run a call speculatively and
//!   either commit or discard its writes as a unit.

use std::sync::Arc;
use xcall_types::error::StateError;

// --- Type Aliases for common state patterns ---
/// An atomically reference-counted, owned key slice.
pub type StateKey = Arc<[u8]>;
/// An atomically reference-counted, owned value slice.
pub type StateVal = Arc<[u8]>;
/// An owned key-value pair from the state, using cheap-to-clone Arcs.
pub type StateKVPair = (StateKey, StateVal);
/// A streaming iterator over key-value pairs from the state.
pub type StateScanIter<'a> = Box<dyn Iterator<Item = Result<StateKVPair, StateError>> + Send + 'a>;

mod accessor;
mod overlay;

pub use accessor::*;
pub use overlay::*;
