// Path: crates/api/src/state/overlay.rs

//! A copy-on-write state overlay.
//!
//! Application handlers run on an overlay so that a failing handler leaves no
//! trace: the caller either applies the overlay's ordered batch to the layer
//! below or simply drops it.

use crate::state::{StateAccess, StateKVPair, StateScanIter};
use std::cmp::Ordering;
use std::collections::btree_map;
use std::collections::BTreeMap;
use std::iter::{Fuse, Peekable};
use std::ops::Bound::{Excluded, Included, Unbounded};
use std::sync::Arc;
use xcall_types::error::StateError;

/// A batch of key-value pairs to be inserted or updated in the state.
pub type StateInserts = Vec<(Vec<u8>, Vec<u8>)>;

/// A batch of keys to be deleted from the state.
pub type StateDeletes = Vec<Vec<u8>>;

/// A complete set of state changes (inserts/updates and deletes).
pub type StateChangeSet = (StateInserts, StateDeletes);

/// The smallest key strictly greater than every key starting with `prefix`,
/// or `None` if no such key exists (empty or all-`0xFF` prefix).
fn next_prefix(prefix: &[u8]) -> Option<Vec<u8>> {
    let mut ub = prefix.to_vec();
    while let Some(last) = ub.pop() {
        if last != 0xFF {
            ub.push(last + 1);
            return Some(ub);
        }
    }
    None
}

/// Merges the base scan with the overlay's writes. On equal keys the write wins;
/// a tombstone hides the base entry.
struct MergingIterator<'a> {
    base: Peekable<Fuse<StateScanIter<'a>>>,
    writes: Peekable<btree_map::Range<'a, Vec<u8>, Option<Vec<u8>>>>,
}

impl<'a> MergingIterator<'a> {
    fn take_write(&mut self) -> Option<StateKVPair> {
        match self.writes.next() {
            Some((key, Some(val))) => Some((Arc::from(key.as_slice()), Arc::from(val.as_slice()))),
            _ => None,
        }
    }
}

impl<'a> Iterator for MergingIterator<'a> {
    type Item = Result<StateKVPair, StateError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let order = {
                let base_key = match self.base.peek() {
                    Some(Err(_)) => return self.base.next(),
                    Some(Ok((k, _))) => Some(k.as_ref()),
                    None => None,
                };
                let write_key = self.writes.peek().map(|(k, _)| k.as_slice());
                match (base_key, write_key) {
                    (Some(bk), Some(wk)) => bk.cmp(wk),
                    (Some(_), None) => Ordering::Less,
                    (None, Some(_)) => Ordering::Greater,
                    (None, None) => return None,
                }
            };

            match order {
                Ordering::Less => return self.base.next(),
                Ordering::Greater => {
                    if let Some(kv) = self.take_write() {
                        return Some(Ok(kv));
                    }
                }
                Ordering::Equal => {
                    self.base.next();
                    if let Some(kv) = self.take_write() {
                        return Some(Ok(kv));
                    }
                }
            }
        }
    }
}

/// An in-memory, copy-on-write overlay for any `StateAccess`.
///
/// Reads consult the local write set first and fall through to `base`.
/// Writes never reach `base`; `into_ordered_batch` hands them back for the
/// caller to apply.
#[derive(Clone)]
pub struct StateOverlay<'a> {
    base: &'a dyn StateAccess,
    // BTreeMap for a deterministic commit order; `None` is a tombstone.
    writes: BTreeMap<Vec<u8>, Option<Vec<u8>>>,
}

impl<'a> StateOverlay<'a> {
    /// Creates a new, empty overlay on top of a base state accessor.
    pub fn new(base: &'a dyn StateAccess) -> Self {
        Self {
            base,
            writes: BTreeMap::new(),
        }
    }

    /// True if nothing has been written or deleted.
    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    /// Consumes the overlay and returns its writes in key order.
    pub fn into_ordered_batch(self) -> StateChangeSet {
        let mut inserts = Vec::new();
        let mut deletes = Vec::new();
        for (key, value) in self.writes {
            match value {
                Some(value) => inserts.push((key, value)),
                None => deletes.push(key),
            }
        }
        (inserts, deletes)
    }
}

impl<'a> StateAccess for StateOverlay<'a> {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StateError> {
        match self.writes.get(key) {
            Some(value) => Ok(value.clone()),
            None => self.base.get(key),
        }
    }

    fn insert(&mut self, key: &[u8], value: &[u8]) -> Result<(), StateError> {
        self.writes.insert(key.to_vec(), Some(value.to_vec()));
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> Result<(), StateError> {
        self.writes.insert(key.to_vec(), None);
        Ok(())
    }

    fn batch_set(&mut self, updates: &[(Vec<u8>, Vec<u8>)]) -> Result<(), StateError> {
        for (key, value) in updates {
            self.insert(key, value)?;
        }
        Ok(())
    }

    fn batch_get(&self, keys: &[Vec<u8>]) -> Result<Vec<Option<Vec<u8>>>, StateError> {
        keys.iter().map(|key| self.get(key)).collect()
    }

    fn batch_apply(
        &mut self,
        inserts: &[(Vec<u8>, Vec<u8>)],
        deletes: &[Vec<u8>],
    ) -> Result<(), StateError> {
        for key in deletes {
            self.delete(key)?;
        }
        self.batch_set(inserts)
    }

    fn prefix_scan(&self, prefix: &[u8]) -> Result<StateScanIter<'_>, StateError> {
        let base = self.base.prefix_scan(prefix)?.fuse().peekable();
        let start = Included(prefix.to_vec());
        let end = match next_prefix(prefix) {
            Some(ub) => Excluded(ub),
            None => Unbounded,
        };
        let writes = self.writes.range((start, end)).peekable();
        Ok(Box::new(MergingIterator { base, writes }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct MapState(BTreeMap<Vec<u8>, Vec<u8>>);

    impl StateAccess for MapState {
        fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StateError> {
            Ok(self.0.get(key).cloned())
        }
        fn insert(&mut self, key: &[u8], value: &[u8]) -> Result<(), StateError> {
            self.0.insert(key.to_vec(), value.to_vec());
            Ok(())
        }
        fn delete(&mut self, key: &[u8]) -> Result<(), StateError> {
            self.0.remove(key);
            Ok(())
        }
        fn batch_set(&mut self, updates: &[(Vec<u8>, Vec<u8>)]) -> Result<(), StateError> {
            for (k, v) in updates {
                self.insert(k, v)?;
            }
            Ok(())
        }
        fn batch_get(&self, keys: &[Vec<u8>]) -> Result<Vec<Option<Vec<u8>>>, StateError> {
            keys.iter().map(|k| self.get(k)).collect()
        }
        fn batch_apply(
            &mut self,
            inserts: &[(Vec<u8>, Vec<u8>)],
            deletes: &[Vec<u8>],
        ) -> Result<(), StateError> {
            for k in deletes {
                self.delete(k)?;
            }
            self.batch_set(inserts)
        }
        fn prefix_scan(&self, prefix: &[u8]) -> Result<StateScanIter<'_>, StateError> {
            let items: Vec<_> = self
                .0
                .iter()
                .filter(|(k, _)| k.starts_with(prefix))
                .map(|(k, v)| Ok((Arc::from(k.as_slice()), Arc::from(v.as_slice()))))
                .collect();
            Ok(Box::new(items.into_iter()))
        }
    }

    fn base() -> MapState {
        let mut state = MapState::default();
        state.insert(b"p::a", b"1").unwrap();
        state.insert(b"p::c", b"3").unwrap();
        state.insert(b"q::z", b"9").unwrap();
        state
    }

    #[test]
    fn reads_fall_through_and_writes_shadow() {
        let base = base();
        let mut overlay = StateOverlay::new(&base);
        overlay.insert(b"p::a", b"one").unwrap();
        overlay.delete(b"p::c").unwrap();
        assert_eq!(overlay.get(b"p::a").unwrap(), Some(b"one".to_vec()));
        assert_eq!(overlay.get(b"p::c").unwrap(), None);
        assert_eq!(overlay.get(b"q::z").unwrap(), Some(b"9".to_vec()));
        assert_eq!(base.get(b"p::a").unwrap(), Some(b"1".to_vec()));
    }

    #[test]
    fn prefix_scan_merges_in_key_order() {
        let base = base();
        let mut overlay = StateOverlay::new(&base);
        overlay.insert(b"p::b", b"2").unwrap();
        overlay.delete(b"p::c").unwrap();
        overlay.insert(b"p::d", b"4").unwrap();
        let keys: Vec<Vec<u8>> = overlay
            .prefix_scan(b"p::")
            .unwrap()
            .map(|kv| kv.unwrap().0.to_vec())
            .collect();
        assert_eq!(keys, vec![b"p::a".to_vec(), b"p::b".to_vec(), b"p::d".to_vec()]);
    }

    #[test]
    fn ordered_batch_applies_onto_base() {
        let mut base = base();
        let (inserts, deletes) = {
            let mut overlay = StateOverlay::new(&base);
            overlay.insert(b"p::b", b"2").unwrap();
            overlay.delete(b"q::z").unwrap();
            overlay.into_ordered_batch()
        };
        base.batch_apply(&inserts, &deletes).unwrap();
        assert_eq!(base.get(b"p::b").unwrap(), Some(b"2".to_vec()));
        assert_eq!(base.get(b"q::z").unwrap(), None);
    }

    #[test]
    fn next_prefix_handles_trailing_ff() {
        assert_eq!(next_prefix(b"a\xff"), Some(b"b".to_vec()));
        assert_eq!(next_prefix(b"\xff\xff"), None);
        assert_eq!(next_prefix(b""), None);
    }
}
