#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::{bail, Result};
use grid_bootstrap::query::{MappingCatalog, QueryEngine};
use grid_bootstrap::reference::NasdaqListedSource;
use grid_bootstrap::storage::{KvStoresRegistry, KvValue, ObjectInfo, SharedContainer, SharedStorage};
use grid_bootstrap::{InitConfig, InitializationCoordinator};

pub const ADDRESS: &str = "kafka-broker0:9092";

/// Storage whose writes to one named container fail while the switch is on.
pub struct FlakyStorage {
    pub inner: KvStoresRegistry,
    pub failing: String,
    pub fail: Arc<AtomicBool>,
}

impl FlakyStorage {
    pub fn new(inner: KvStoresRegistry, failing: &str) -> Self {
        Self { inner, failing: failing.to_string(), fail: Arc::new(AtomicBool::new(true)) }
    }
    pub fn heal(&self) { self.fail.store(false, Ordering::SeqCst); }
}

struct FlakyContainer {
    inner: Arc<dyn SharedContainer>,
    fail: Option<Arc<AtomicBool>>,
}

impl FlakyContainer {
    fn check(&self) -> Result<()> {
        if self.fail.as_ref().map(|f| f.load(Ordering::SeqCst)).unwrap_or(false) {
            bail!("member unreachable");
        }
        Ok(())
    }
}

impl SharedContainer for FlakyContainer {
    fn name(&self) -> &str { self.inner.name() }
    fn is_empty(&self) -> Result<bool> { self.inner.is_empty() }
    fn size(&self) -> Result<usize> { self.inner.size() }
    fn get(&self, key: &str) -> Result<Option<KvValue>> { self.inner.get(key) }
    fn put(&self, key: &str, value: KvValue) -> Result<()> { self.check()?; self.inner.put(key, value) }
    fn put_all(&self, entries: BTreeMap<String, KvValue>) -> Result<()> { self.check()?; self.inner.put_all(entries) }
    fn put_if_absent(&self, key: &str, value: KvValue) -> Result<Option<KvValue>> { self.check()?; self.inner.put_if_absent(key, value) }
    fn keys(&self) -> Result<Vec<String>> { self.inner.keys() }
    fn destroy(&self) -> Result<()> { self.inner.destroy() }
}

impl SharedStorage for FlakyStorage {
    fn get_or_create(&self, name: &str) -> Arc<dyn SharedContainer> {
        let fail = if name == self.failing { Some(self.fail.clone()) } else { None };
        Arc::new(FlakyContainer { inner: self.inner.get_or_create(name), fail })
    }
    fn objects(&self) -> Result<Vec<ObjectInfo>> { self.inner.objects() }
    fn destroy_object(&self, name: &str) -> Result<bool> { self.inner.destroy_object(name) }
}

/// Engine that rejects the statement at a given zero-based position, passing the rest
/// through to a real catalog.
pub struct RejectNth {
    pub catalog: Arc<MappingCatalog>,
    pub reject_at: usize,
    seen: AtomicUsize,
}

impl RejectNth {
    pub fn new(catalog: Arc<MappingCatalog>, reject_at: usize) -> Self {
        Self { catalog, reject_at, seen: AtomicUsize::new(0) }
    }
}

impl QueryEngine for RejectNth {
    fn execute(&self, statement: &str) -> Result<()> {
        if self.seen.fetch_add(1, Ordering::SeqCst) == self.reject_at {
            bail!("statement rejected by engine");
        }
        self.catalog.execute(statement)
    }
}

pub fn coordinator(storage: Arc<dyn SharedStorage>, engine: Arc<dyn QueryEngine>) -> InitializationCoordinator {
    InitializationCoordinator::new(InitConfig::new(ADDRESS), storage, engine, Arc::new(NasdaqListedSource::bundled()))
}

/// Every container's contents, by name.
pub fn dump(reg: &KvStoresRegistry) -> BTreeMap<String, BTreeMap<String, KvValue>> {
    reg.list_stores().into_iter().map(|n| { let snap = reg.get_store(&n).snapshot(); (n, snap) }).collect()
}
