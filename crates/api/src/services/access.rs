// Path: crates/api/src/services/access.rs

//! Read-only access to the services registered on a chain.

use crate::services::{BlockchainService, CallServiceReceiver, CrossChainConnection};
use std::any::TypeId;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

/// A read-only, type-safe service locator.
///
/// Singleton services are found by type; services that exist in several
/// instances (connections) are found by id.
#[derive(Clone, Default)]
pub struct ServiceDirectory {
    /// Services sorted by id, for deterministic iteration.
    ordered: Arc<Vec<Arc<dyn BlockchainService>>>,
    /// The first service registered for each concrete type.
    by_type: Arc<HashMap<TypeId, Arc<dyn BlockchainService>>>,
    /// Every service, by id.
    by_id: Arc<BTreeMap<String, Arc<dyn BlockchainService>>>,
}

impl fmt::Debug for ServiceDirectory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceDirectory")
            .field("services", &self.by_id.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ServiceDirectory {
    /// Creates a new directory from a list of services.
    /// Services are sorted lexicographically by their `id()` to ensure deterministic iteration order.
    pub fn new(mut services: Vec<Arc<dyn BlockchainService>>) -> Self {
        services.sort_by(|a, b| a.id().cmp(b.id()));
        let mut by_type = HashMap::new();
        let mut by_id = BTreeMap::new();
        for s in &services {
            by_type
                .entry(s.as_any().type_id())
                .or_insert_with(|| s.clone());
            by_id.insert(s.id().to_string(), s.clone());
        }
        Self {
            ordered: Arc::new(services),
            by_type: Arc::new(by_type),
            by_id: Arc::new(by_id),
        }
    }

    /// Gets a service by its concrete type.
    pub fn get<T: BlockchainService>(&self) -> Option<&T> {
        self.by_type
            .get(&TypeId::of::<T>())
            .and_then(|svc| svc.as_any().downcast_ref::<T>())
    }

    /// Gets a service by id.
    pub fn get_by_id(&self, id: &str) -> Option<&Arc<dyn BlockchainService>> {
        self.by_id.get(id)
    }

    /// Gets a service by id, if it has the concrete type `T`.
    pub fn downcast_by_id<T: BlockchainService>(&self, id: &str) -> Option<&T> {
        self.get_by_id(id)
            .and_then(|svc| svc.as_any().downcast_ref::<T>())
    }

    /// The application registered under `id`, if it can receive calls.
    pub fn call_receiver(&self, id: &str) -> Option<&dyn CallServiceReceiver> {
        self.get_by_id(id).and_then(|svc| svc.as_call_receiver())
    }

    /// The connection registered under `id`.
    pub fn connection(&self, id: &str) -> Option<&dyn CrossChainConnection> {
        self.get_by_id(id).and_then(|svc| svc.as_connection())
    }

    /// An efficient, deterministic iterator over all services.
    pub fn iter_deterministic(&self) -> std::slice::Iter<'_, Arc<dyn BlockchainService>> {
        self.ordered.iter()
    }

    /// The number of registered services.
    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    /// True if no service is registered.
    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }
}
