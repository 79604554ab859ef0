//! In-process mapping catalog.
//!
//! Registry of logical name -> mapping definition, driven by statements through
//! `QueryEngine::execute`. Create-if-absent is idempotent for an identical definition;
//! a differently shaped definition under a taken name is rejected and the registered
//! one is left as it was.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::{bail, Result};
use tracing::{debug, info};

use crate::query::mapping::{FieldDef, MappingDefinition};
use crate::query::parse::{parse_mapping_statement, MappingStatement};
use crate::query::QueryEngine;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub definition: MappingDefinition,
    pub fingerprint: u128,
    /// Registration order, starting at 1
    pub seq: u64,
}

#[derive(Default)]
pub struct MappingCatalog {
    entries: parking_lot::RwLock<BTreeMap<String, CatalogEntry>>,
    seq: AtomicU64,
    statements: AtomicU64,
}

impl MappingCatalog {
    pub fn new() -> Self { Self::default() }

    pub fn get(&self, name: &str) -> Option<CatalogEntry> { self.entries.read().get(name).cloned() }
    pub fn names(&self) -> Vec<String> { self.entries.read().keys().cloned().collect() }
    pub fn len(&self) -> usize { self.entries.read().len() }
    pub fn is_empty(&self) -> bool { self.entries.read().is_empty() }

    /// Name -> definition, ignoring registration order.
    pub fn definitions(&self) -> BTreeMap<String, MappingDefinition> {
        self.entries.read().iter().map(|(k, e)| (k.clone(), e.definition.clone())).collect()
    }

    /// Number of statements executed, accepted or not.
    pub fn statements_executed(&self) -> u64 { self.statements.load(Ordering::SeqCst) }

    /// Columns a query against `name` would see. A container is only queryable through
    /// a registered mapping, so unregistered names fail even if the container exists.
    /// Mappings without explicit fields expose `__key` and `this` typed by their formats.
    pub fn resolve(&self, name: &str) -> Result<Vec<FieldDef>> {
        let entry = match self.get(name) {
            Some(e) => e,
            None => bail!("Object '{}' not found, did you forget to CREATE MAPPING?", name),
        };
        let def = entry.definition;
        if !def.fields().is_empty() { return Ok(def.fields().to_vec()); }
        let mut cols = Vec::new();
        if let Some(k) = def.key_format() { cols.push(FieldDef { name: "__key".into(), field_type: k.implied_type() }); }
        if let Some(v) = def.value_format() { cols.push(FieldDef { name: "this".into(), field_type: v.implied_type() }); }
        Ok(cols)
    }

    fn create(&self, definition: MappingDefinition, if_not_exists: bool, or_replace: bool) -> Result<()> {
        let name = definition.name().to_string();
        let fingerprint = definition.fingerprint();
        let mut w = self.entries.write();
        if let Some(existing) = w.get(&name) {
            if or_replace {
                debug!(target: "grid_bootstrap::catalog", "replacing mapping '{}' {:032x} -> {:032x}", name, existing.fingerprint, fingerprint);
            } else if existing.definition == definition && if_not_exists {
                debug!(target: "grid_bootstrap::catalog", "mapping '{}' already registered {:032x}", name, fingerprint);
                return Ok(());
            } else if if_not_exists {
                bail!("Mapping '{}' already exists with a different definition (registered {:032x}, requested {:032x})", name, existing.fingerprint, fingerprint);
            } else {
                bail!("Mapping already exists: {}", name);
            }
        }
        let seq = self.seq.fetch_add(1, Ordering::SeqCst) + 1;
        w.insert(name.clone(), CatalogEntry { definition, fingerprint, seq });
        info!(target: "grid_bootstrap::catalog", "registered mapping '{}' seq={} {:032x}", name, seq, fingerprint);
        Ok(())
    }

    fn drop_mapping(&self, name: &str, if_exists: bool) -> Result<()> {
        let removed = self.entries.write().remove(name).is_some();
        if !removed && !if_exists { bail!("Mapping not found: {}", name); }
        if removed { info!(target: "grid_bootstrap::catalog", "dropped mapping '{}'", name); }
        Ok(())
    }
}

impl QueryEngine for MappingCatalog {
    fn execute(&self, statement: &str) -> Result<()> {
        self.statements.fetch_add(1, Ordering::SeqCst);
        crate::tprintln!("[catalog.execute] {}", statement);
        match parse_mapping_statement(statement)? {
            MappingStatement::Create { definition, if_not_exists, or_replace } => self.create(definition, if_not_exists, or_replace),
            MappingStatement::Drop { name, if_exists } => self.drop_mapping(&name, if_exists),
        }
    }
}
