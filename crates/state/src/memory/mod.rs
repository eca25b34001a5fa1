// Path: crates/state/src/memory/mod.rs
//! An ordered, in-memory key-value store.

use std::collections::BTreeMap;
use std::sync::Arc;
use xcall_api::state::{StateAccess, StateScanIter};
use xcall_types::error::StateError;
use xcall_types::keys::keccak256;

/// The committed state of one chain.
///
/// Keys are kept sorted so prefix scans and the state root are deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryState {
    data: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl MemoryState {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// A Keccak-256 digest over every key-value pair in key order.
    ///
    /// Each key and value is length-prefixed, so two stores share a root only if
    /// they hold exactly the same entries.
    pub fn root_hash(&self) -> [u8; 32] {
        let mut buf = Vec::new();
        for (k, v) in &self.data {
            buf.extend_from_slice(&(k.len() as u64).to_be_bytes());
            buf.extend_from_slice(k);
            buf.extend_from_slice(&(v.len() as u64).to_be_bytes());
            buf.extend_from_slice(v);
        }
        keccak256(&buf)
    }
}

impl StateAccess for MemoryState {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StateError> {
        Ok(self.data.get(key).cloned())
    }

    fn insert(&mut self, key: &[u8], value: &[u8]) -> Result<(), StateError> {
        self.data.insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> Result<(), StateError> {
        self.data.remove(key);
        Ok(())
    }

    fn batch_set(&mut self, updates: &[(Vec<u8>, Vec<u8>)]) -> Result<(), StateError> {
        for (key, value) in updates {
            self.data.insert(key.clone(), value.clone());
        }
        Ok(())
    }

    fn batch_get(&self, keys: &[Vec<u8>]) -> Result<Vec<Option<Vec<u8>>>, StateError> {
        Ok(keys.iter().map(|k| self.data.get(k).cloned()).collect())
    }

    fn batch_apply(
        &mut self,
        inserts: &[(Vec<u8>, Vec<u8>)],
        deletes: &[Vec<u8>],
    ) -> Result<(), StateError> {
        for key in deletes {
            self.data.remove(key);
        }
        log::trace!(
            "applying batch: {} inserts, {} deletes",
            inserts.len(),
            deletes.len()
        );
        self.batch_set(inserts)
    }

    fn prefix_scan(&self, prefix: &[u8]) -> Result<StateScanIter<'_>, StateError> {
        let prefix = prefix.to_vec();
        let iter = self
            .data
            .range(prefix.clone()..)
            .take_while(move |(k, _)| k.starts_with(&prefix))
            .map(|(k, v)| Ok((Arc::from(k.as_slice()), Arc::from(v.as_slice()))));
        Ok(Box::new(iter))
    }
}
