// SPDX-License-Identifier: MIT OR Apache-2.0
//! Thread-safe handle to a graph store.

use crate::graph::GraphStore;
use crate::node::NodeCatalog;
use parking_lot::{Mutex, MutexGuard};
use std::sync::Arc;

/// Cloneable handle sharing one [`GraphStore`].
///
/// Each `with` call holds the lock for its whole closure, so a mutation
/// and its history checkpoint are never observed half-done.
#[derive(Debug, Clone)]
pub struct SharedGraphStore {
    inner: Arc<Mutex<GraphStore>>,
}

impl SharedGraphStore {
    /// Wrap an existing store
    pub fn new(store: GraphStore) -> Self {
        Self {
            inner: Arc::new(Mutex::new(store)),
        }
    }

    /// Create an empty shared store over a catalog
    pub fn with_catalog(catalog: Arc<NodeCatalog>) -> Self {
        Self::new(GraphStore::new(catalog))
    }

    /// Run a closure with exclusive access
    pub fn with<R>(&self, f: impl FnOnce(&mut GraphStore) -> R) -> R {
        f(&mut *self.inner.lock())
    }

    /// Lock the store directly
    pub fn lock(&self) -> MutexGuard<'_, GraphStore> {
        self.inner.lock()
    }
}

impl From<GraphStore> for SharedGraphStore {
    fn from(store: GraphStore) -> Self {
        Self::new(store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::builtin_catalog;
    use crate::node::Node;
    use std::thread;

    #[test]
    fn test_concurrent_mutations_are_serialized() {
        let shared = SharedGraphStore::with_catalog(Arc::new(builtin_catalog()));

        let handles: Vec<_> = (0..4)
            .map(|t| {
                let shared = shared.clone();
                thread::spawn(move || {
                    for i in 0..10 {
                        shared.with(|store| {
                            store.add_node(Node::new(format!("t{t}-{i}"), "Resize")).unwrap()
                        });
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let store = shared.lock();
        assert_eq!(store.node_count(), 40);
        assert_eq!(store.history().undo_depth(), 40);
    }
}
