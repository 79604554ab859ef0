//! Shared object catalog: eager materialization of named containers.

use std::sync::Arc;

use tracing::debug;

use crate::storage::SharedStorage;

pub struct SharedObjectCatalog {
    storage: Arc<dyn SharedStorage>,
}

impl SharedObjectCatalog {
    pub fn new(storage: Arc<dyn SharedStorage>) -> Self { Self { storage } }

    /// Touch every name so the container exists and is visible to all processes.
    /// Accessing a container is not an error-producing operation, so this always
    /// returns true.
    pub fn ensure_containers<S: AsRef<str>>(&self, names: &[S]) -> bool {
        for name in names {
            let handle = self.storage.get_or_create(name.as_ref());
            debug!(target: "grid_bootstrap::objects", "ensured container '{}'", handle.name());
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::KvStoresRegistry;

    #[test]
    fn ensure_is_repeatable() {
        let reg = KvStoresRegistry::new();
        let catalog = SharedObjectCatalog::new(Arc::new(reg.clone()));
        assert!(catalog.ensure_containers(&["b", "a"]));
        assert!(catalog.ensure_containers(&["a", "b", "c"]));
        assert_eq!(reg.list_stores(), vec!["a", "b", "c"]);
    }
}
