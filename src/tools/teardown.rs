//! Inventory and cleanup of the shared object space.
//!
//! Lists every object with its kind, destroys containers in name order and anything
//! else as it is found, then checks the number destroyed against the inventory.
//! Intended for resetting a test cluster between bootstrap runs.

use std::sync::Arc;

use anyhow::{anyhow, Result};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::storage::{ObjectKind, SharedStorage};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DestroyedObject {
    pub name: String,
    pub kind: String,
    /// Entry count at the time of destruction; containers only.
    pub size: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TeardownSummary {
    pub destroyed: Vec<DestroyedObject>,
    /// Objects whose kind was not a container.
    pub unexpected: Vec<String>,
}

impl TeardownSummary {
    pub fn count(&self) -> usize { self.destroyed.len() }
}

/// List the objects without touching them, containers first, each group sorted.
pub fn inventory(storage: &Arc<dyn SharedStorage>) -> Result<Vec<(String, ObjectKind)>> {
    let mut objects: Vec<(String, ObjectKind)> = storage.objects()?.into_iter().map(|o| (o.name, o.kind)).collect();
    objects.sort_by(|a, b| (a.1 != ObjectKind::Map, &a.0).cmp(&(b.1 != ObjectKind::Map, &b.0)));
    Ok(objects)
}

pub fn teardown(storage: &Arc<dyn SharedStorage>) -> Result<TeardownSummary> {
    let objects = storage.objects()?;
    let expected = objects.len();
    let mut summary = TeardownSummary::default();
    let mut containers: Vec<String> = Vec::new();

    for obj in objects {
        match obj.kind {
            ObjectKind::Map => containers.push(obj.name),
            ObjectKind::Other(kind) => {
                error!(target: "grid_bootstrap::teardown", "'{}': {} unexpected", obj.name, kind);
                if storage.destroy_object(&obj.name)? {
                    summary.destroyed.push(DestroyedObject { name: obj.name.clone(), kind, size: None });
                }
                summary.unexpected.push(obj.name);
            }
        }
    }

    containers.sort();
    for name in containers {
        let handle = storage.get_or_create(&name);
        let size = handle.size()?;
        info!(target: "grid_bootstrap::teardown", "'{}': map, size()=={}", name, size);
        handle.destroy()?;
        summary.destroyed.push(DestroyedObject { name, kind: ObjectKind::Map.label().to_string(), size: Some(size) });
    }

    if summary.count() != expected {
        return Err(anyhow!("Deleted {} instead of {}", summary.count(), expected));
    }
    if expected == 0 {
        warn!(target: "grid_bootstrap::teardown", "nothing to delete");
    } else {
        info!(target: "grid_bootstrap::teardown", "{} deleted", expected);
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{KvStoresRegistry, KvValue};

    #[test]
    fn destroys_everything_and_counts() {
        let reg = KvStoresRegistry::new();
        reg.get_store("b").set("k", KvValue::from("v"));
        reg.get_store("a");
        reg.register_object("trades-topic", "topic");
        let storage: Arc<dyn SharedStorage> = Arc::new(reg.clone());

        let inv = inventory(&storage).unwrap();
        let names: Vec<&str> = inv.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "trades-topic"]);

        let summary = teardown(&storage).unwrap();
        assert_eq!(summary.count(), 3);
        assert_eq!(summary.unexpected, vec!["trades-topic".to_string()]);
        let b = summary.destroyed.iter().find(|d| d.name == "b").unwrap();
        assert_eq!(b.size, Some(1));
        assert!(storage.objects().unwrap().is_empty());
    }

    #[test]
    fn empty_space_is_fine() {
        let storage: Arc<dyn SharedStorage> = Arc::new(KvStoresRegistry::new());
        assert_eq!(teardown(&storage).unwrap(), TeardownSummary::default());
    }
}
