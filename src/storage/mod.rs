//!
//! grid-bootstrap storage module
//! -----------------------------
//! The shared key/value storage the bootstrap writes into. Production deployments put a
//! cluster client behind these traits; `kv` provides the in-process implementation used
//! by single-process embedders and by the test suite.
//!
//! Key responsibilities:
//! - `SharedStorage::get_or_create` materializes a named container on first reference and
//!   cannot fail; every later operation on the handle can.
//! - `SharedStorage::objects` enumerates what exists with its kind, for inventory tools.
//!
//! Components never reach storage through a global; they are handed an
//! `Arc<dyn SharedStorage>` at construction.

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::Result;
use serde::{Deserialize, Serialize};

pub mod kv;

pub use kv::{KvStore, KvStoresRegistry, KvValue};

/// What kind of distributed object a name refers to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObjectKind {
    /// A key/value container.
    Map,
    /// Anything else the cluster hosts (topics, queues, ...), labelled by the backend.
    Other(String),
}

impl ObjectKind {
    pub fn label(&self) -> &str {
        match self {
            ObjectKind::Map => "map",
            ObjectKind::Other(s) => s.as_str(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectInfo {
    pub name: String,
    pub kind: ObjectKind,
}

/// Handle to one named shared container.
pub trait SharedContainer: Send + Sync {
    fn name(&self) -> &str;
    fn is_empty(&self) -> Result<bool>;
    fn size(&self) -> Result<usize>;
    fn get(&self, key: &str) -> Result<Option<KvValue>>;
    fn put(&self, key: &str, value: KvValue) -> Result<()>;
    /// Bulk write. Existing keys are overwritten.
    fn put_all(&self, entries: BTreeMap<String, KvValue>) -> Result<()>;
    /// Write only if the key is absent. Returns the value already present, if any.
    fn put_if_absent(&self, key: &str, value: KvValue) -> Result<Option<KvValue>>;
    fn keys(&self) -> Result<Vec<String>>;
    /// Remove the container and its contents from the cluster.
    fn destroy(&self) -> Result<()>;
}

/// The cluster-wide object space.
pub trait SharedStorage: Send + Sync {
    /// Return the named container, creating it if it does not exist yet.
    fn get_or_create(&self, name: &str) -> Arc<dyn SharedContainer>;
    /// Every object currently present, with its kind.
    fn objects(&self) -> Result<Vec<ObjectInfo>>;
    /// Destroy a non-container object by name. Returns whether it existed.
    fn destroy_object(&self, name: &str) -> Result<bool>;
}

#[cfg(test)]
#[path = "storage_tests.rs"]
mod storage_tests;
