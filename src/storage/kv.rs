use std::collections::{BTreeMap, HashMap as StdHashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tracing::debug;

use super::{ObjectInfo, ObjectKind, SharedContainer, SharedStorage};

/// Value variants supported by the in-memory KV store.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum KvValue {
    Str(String),
    Int(i64),
    Json(JsonValue),
    /// Raw binary value
    Bytes(Vec<u8>),
}

impl KvValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            KvValue::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_json(&self) -> Option<&JsonValue> {
        match self {
            KvValue::Json(j) => Some(j),
            _ => None,
        }
    }

    /// Stable byte encoding, used to compare values written by different callers.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            KvValue::Str(s) => s.as_bytes().to_vec(),
            KvValue::Int(i) => i.to_le_bytes().to_vec(),
            KvValue::Json(j) => serde_json::to_vec(j).unwrap_or_default(),
            KvValue::Bytes(b) => b.clone(),
        }
    }
}

impl From<&str> for KvValue {
    fn from(s: &str) -> Self { KvValue::Str(s.to_string()) }
}

impl From<String> for KvValue {
    fn from(s: String) -> Self { KvValue::Str(s) }
}

/// A single named in-memory KV store.
#[derive(Clone)]
pub struct KvStore {
    name: String,
    map: Arc<parking_lot::RwLock<StdHashMap<String, KvValue>>>,
    /// Count of mutating operations that reached the map
    writes: Arc<AtomicU64>,
    /// Back-reference used by `destroy` to unlink from the owning registry
    registry: Option<Weak<parking_lot::RwLock<StdHashMap<String, KvStore>>>>,
}

impl KvStore {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), map: Arc::new(parking_lot::RwLock::new(StdHashMap::new())), writes: Arc::new(AtomicU64::new(0)), registry: None }
    }

    pub fn name(&self) -> &str { &self.name }

    pub fn set(&self, key: impl Into<String>, value: KvValue) {
        self.map.write().insert(key.into(), value);
        self.writes.fetch_add(1, Ordering::SeqCst);
    }

    pub fn get(&self, key: &str) -> Option<KvValue> { self.map.read().get(key).cloned() }

    /// Insert every entry under one write lock.
    pub fn set_all(&self, entries: BTreeMap<String, KvValue>) {
        if entries.is_empty() { return; }
        let mut w = self.map.write();
        for (k, v) in entries { w.insert(k, v); }
        self.writes.fetch_add(1, Ordering::SeqCst);
    }

    /// Insert if absent under one write lock; returns the existing value otherwise.
    pub fn set_if_absent(&self, key: &str, value: KvValue) -> Option<KvValue> {
        let mut w = self.map.write();
        if let Some(existing) = w.get(key) { return Some(existing.clone()); }
        w.insert(key.to_string(), value);
        self.writes.fetch_add(1, Ordering::SeqCst);
        None
    }

    pub fn delete(&self, key: &str) -> bool {
        let removed = self.map.write().remove(key).is_some();
        if removed { self.writes.fetch_add(1, Ordering::SeqCst); }
        removed
    }
    pub fn clear(&self) { self.map.write().clear(); }
    pub fn len(&self) -> usize { self.map.read().len() }
    pub fn is_empty(&self) -> bool { self.map.read().is_empty() }
    /// Return a sorted snapshot of all keys in this store
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.map.read().keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Sorted copy of the contents.
    pub fn snapshot(&self) -> BTreeMap<String, KvValue> {
        self.map.read().iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }

    /// Number of mutating operations applied so far.
    pub fn write_count(&self) -> u64 { self.writes.load(Ordering::SeqCst) }
}

impl SharedContainer for KvStore {
    fn name(&self) -> &str { &self.name }
    fn is_empty(&self) -> Result<bool> { Ok(KvStore::is_empty(self)) }
    fn size(&self) -> Result<usize> { Ok(self.len()) }
    fn get(&self, key: &str) -> Result<Option<KvValue>> { Ok(KvStore::get(self, key)) }
    fn put(&self, key: &str, value: KvValue) -> Result<()> { self.set(key, value); Ok(()) }
    fn put_all(&self, entries: BTreeMap<String, KvValue>) -> Result<()> { self.set_all(entries); Ok(()) }
    fn put_if_absent(&self, key: &str, value: KvValue) -> Result<Option<KvValue>> { Ok(self.set_if_absent(key, value)) }
    fn keys(&self) -> Result<Vec<String>> { Ok(KvStore::keys(self)) }

    fn destroy(&self) -> Result<()> {
        self.clear();
        if let Some(reg) = self.registry.as_ref().and_then(Weak::upgrade) {
            let mut w = reg.write();
            // Only unlink if the registry still holds this instance
            if w.get(&self.name).map(|s| Arc::ptr_eq(&s.map, &self.map)).unwrap_or(false) {
                w.remove(&self.name);
            }
        }
        debug!(target: "grid_bootstrap::storage", "destroyed store '{}'", self.name);
        Ok(())
    }
}

/// Registry of named KV stores plus any other object kinds the cluster hosts.
#[derive(Clone, Default)]
pub struct KvStoresRegistry {
    /// store_name -> KvStore
    inner: Arc<parking_lot::RwLock<StdHashMap<String, KvStore>>>,
    /// object_name -> kind label, for non-map objects
    others: Arc<parking_lot::RwLock<BTreeMap<String, String>>>,
}

impl KvStoresRegistry {
    pub fn new() -> Self { Self::default() }

    /// List existing KV stores, sorted.
    pub fn list_stores(&self) -> Vec<String> {
        let mut out: Vec<String> = self.inner.read().keys().cloned().collect();
        out.sort();
        out
    }

    pub fn get_store(&self, store_name: &str) -> KvStore {
        // Fast path read
        if let Some(st) = self.inner.read().get(store_name).cloned() { return st; }
        let mut w = self.inner.write();
        // Another caller may have created it between the read and the write lock
        w.entry(store_name.to_string())
            .or_insert_with(|| {
                debug!(target: "grid_bootstrap::storage", "materialized store '{}'", store_name);
                let mut kv = KvStore::new(store_name);
                kv.registry = Some(Arc::downgrade(&self.inner));
                kv
            })
            .clone()
    }

    /// True if the store has been materialized.
    pub fn contains_store(&self, store_name: &str) -> bool { self.inner.read().contains_key(store_name) }

    /// Drop a store: remove from registry and clear it. Returns true if it existed.
    pub fn drop_store(&self, store_name: &str) -> bool {
        match self.inner.write().remove(store_name) {
            Some(kv) => { kv.clear(); true }
            None => false,
        }
    }

    /// Record a non-map object, e.g. a topic created by another subsystem.
    pub fn register_object(&self, name: impl Into<String>, kind: impl Into<String>) {
        self.others.write().insert(name.into(), kind.into());
    }
}

impl SharedStorage for KvStoresRegistry {
    fn get_or_create(&self, name: &str) -> Arc<dyn SharedContainer> { Arc::new(self.get_store(name)) }

    fn objects(&self) -> Result<Vec<ObjectInfo>> {
        let mut out: Vec<ObjectInfo> = self.list_stores().into_iter().map(|name| ObjectInfo { name, kind: ObjectKind::Map }).collect();
        for (name, kind) in self.others.read().iter() {
            out.push(ObjectInfo { name: name.clone(), kind: ObjectKind::Other(kind.clone()) });
        }
        Ok(out)
    }

    fn destroy_object(&self, name: &str) -> Result<bool> {
        if self.others.write().remove(name).is_some() { return Ok(true); }
        Ok(self.drop_store(name))
    }
}
